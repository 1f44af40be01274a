//! Deterministic in-memory policy catalog.
//!
//! Design decisions (kept intentionally simple/deterministic):
//! - Two views: a staged `draft` that every mutating call edits, and a `live`
//!   view replaced wholesale by `publish_revision`.
//! - `list_sections` / `list_rules` read the draft, so staged moves are visible
//!   on the next read even when publish never happened.
//! - Ids for created sections are `sec-NNNN`, drawn from a counter that skips
//!   ids already in use. No randomness, no timestamps.
//! - Every successful mutating call is appended to a journal so callers can
//!   assert on the exact call sequence.

use std::cell::RefCell;
use std::collections::BTreeMap;

use crate::{
    CatalogError, CatalogRule, CatalogSection, EntityKind, PolicyCatalog, PolicyDomain,
    RulePosition, SectionPosition,
};

/// Kinds of catalog calls, used for call counting and failure injection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CallKind {
    ListSections,
    ListRules,
    AddSection,
    MoveSection,
    MoveRule,
    Publish,
}

/// A successful mutating call, as recorded in the journal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CatalogCall {
    AddSection {
        id: String,
        name: String,
        at: SectionPosition,
    },
    MoveSection {
        id: String,
        to: SectionPosition,
    },
    MoveRule {
        id: String,
        to: RulePosition,
    },
    Publish {
        revision: u64,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct SectionState {
    id: String,
    name: String,
    /// Rule ids in in-section order.
    rules: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct RuleState {
    name: String,
    description: String,
    enabled: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct PolicyState {
    sections: Vec<SectionState>,
    rules: BTreeMap<String, RuleState>,
}

impl PolicyState {
    fn section_pos(&self, id: &str) -> Option<usize> {
        self.sections.iter().position(|s| s.id == id)
    }

    /// (section index, index within section) of a rule id.
    fn rule_pos(&self, id: &str) -> Option<(usize, usize)> {
        self.sections
            .iter()
            .enumerate()
            .find_map(|(si, s)| s.rules.iter().position(|r| r == id).map(|ri| (si, ri)))
    }

    fn sections(&self) -> Vec<CatalogSection> {
        self.sections
            .iter()
            .map(|s| CatalogSection::new(s.id.clone(), s.name.clone()))
            .collect()
    }

    fn rules(&self) -> Vec<CatalogRule> {
        let mut out = Vec::with_capacity(self.rules.len());
        for s in &self.sections {
            for rid in &s.rules {
                if let Some(r) = self.rules.get(rid) {
                    out.push(CatalogRule {
                        id: rid.clone(),
                        name: r.name.clone(),
                        section_id: s.id.clone(),
                        section_name: s.name.clone(),
                        description: r.description.clone(),
                        enabled: r.enabled,
                    });
                }
            }
        }
        out
    }
}

#[derive(Clone, Debug)]
struct Fault {
    kind: CallKind,
    /// 1-based call number (per kind) that fails.
    nth: usize,
    error: CatalogError,
}

/// Deterministic in-memory [`PolicyCatalog`].
#[derive(Clone, Debug)]
pub struct InMemoryCatalog {
    domain: PolicyDomain,
    draft: PolicyState,
    live: PolicyState,
    revision: u64,
    next_section_seq: u64,
    journal: Vec<CatalogCall>,
    calls: RefCell<BTreeMap<CallKind, usize>>,
    faults: Vec<Fault>,
}

impl InMemoryCatalog {
    pub fn new(domain: PolicyDomain) -> Self {
        Self {
            domain,
            draft: PolicyState::default(),
            live: PolicyState::default(),
            revision: 0,
            next_section_seq: 1,
            journal: Vec::new(),
            calls: RefCell::new(BTreeMap::new()),
            faults: Vec::new(),
        }
    }

    /// Seed a pre-existing, already-published section at the end of the policy.
    ///
    /// Seeding bypasses the journal: it models state that existed before any
    /// reconciliation ran.
    pub fn seed_section(
        &mut self,
        id: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<(), CatalogError> {
        let id = id.into();
        if self.draft.section_pos(&id).is_some() {
            return Err(CatalogError::Rejected(format!(
                "section id '{id}' already exists"
            )));
        }
        let section = SectionState {
            id,
            name: name.into(),
            rules: Vec::new(),
        };
        self.draft.sections.push(section.clone());
        self.live.sections.push(section);
        Ok(())
    }

    /// Seed a pre-existing, already-published rule at the end of `section_id`.
    pub fn seed_rule(
        &mut self,
        section_id: &str,
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        enabled: bool,
    ) -> Result<(), CatalogError> {
        let id = id.into();
        if self.draft.rules.contains_key(&id) {
            return Err(CatalogError::Rejected(format!("rule id '{id}' already exists")));
        }
        let si = self
            .draft
            .section_pos(section_id)
            .ok_or_else(|| CatalogError::NotFound {
                kind: EntityKind::Section,
                id: section_id.to_string(),
            })?;
        let state = RuleState {
            name: name.into(),
            description: description.into(),
            enabled,
        };
        for view in [&mut self.draft, &mut self.live] {
            view.sections[si].rules.push(id.clone());
            view.rules.insert(id.clone(), state.clone());
        }
        Ok(())
    }

    /// Replace the staged draft with the given layout, leaving the live view
    /// untouched. Used when loading a snapshot that carries unpublished moves.
    ///
    /// `sections` is the draft chain; each entry lists its rule ids in order.
    /// Every rule id must already be seeded.
    pub fn stage_layout(
        &mut self,
        sections: Vec<(CatalogSection, Vec<String>)>,
    ) -> Result<(), CatalogError> {
        let mut draft = PolicyState::default();
        for (section, rule_ids) in sections {
            for rid in &rule_ids {
                let state = self
                    .live
                    .rules
                    .get(rid)
                    .or_else(|| self.draft.rules.get(rid))
                    .cloned()
                    .ok_or_else(|| CatalogError::NotFound {
                        kind: EntityKind::Rule,
                        id: rid.clone(),
                    })?;
                draft.rules.insert(rid.clone(), state);
            }
            draft.sections.push(SectionState {
                id: section.id,
                name: section.name,
                rules: rule_ids,
            });
        }
        self.draft = draft;
        Ok(())
    }

    /// Overwrite the revision counter (snapshot loading).
    pub fn set_revision(&mut self, revision: u64) {
        self.revision = revision;
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// `true` when the draft differs from the live policy.
    pub fn has_unpublished_changes(&self) -> bool {
        self.draft != self.live
    }

    /// Live (published) sections, in chain order.
    pub fn published_sections(&self) -> Vec<CatalogSection> {
        self.live.sections()
    }

    /// Live (published) rules, globally ordered.
    pub fn published_rules(&self) -> Vec<CatalogRule> {
        self.live.rules()
    }

    /// Staged (draft) sections without going through the counted list call.
    pub fn staged_sections(&self) -> Vec<CatalogSection> {
        self.draft.sections()
    }

    /// Staged (draft) rules, globally ordered, without a counted list call.
    pub fn staged_rules(&self) -> Vec<CatalogRule> {
        self.draft.rules()
    }

    /// Successful mutating calls, oldest first.
    pub fn journal(&self) -> &[CatalogCall] {
        &self.journal
    }

    pub fn clear_journal(&mut self) {
        self.journal.clear();
    }

    /// Number of calls of `kind` attempted so far (including failed ones).
    pub fn call_count(&self, kind: CallKind) -> usize {
        self.calls.borrow().get(&kind).copied().unwrap_or(0)
    }

    /// Make the `nth` (1-based) call of `kind` fail with `error`.
    #[cfg(any(test, feature = "testkit"))]
    pub fn fail_on(&mut self, kind: CallKind, nth: usize, error: CatalogError) {
        self.faults.push(Fault { kind, nth, error });
    }

    /// Count the call and return the injected failure for it, if any.
    fn enter(&self, kind: CallKind) -> Result<(), CatalogError> {
        let n = {
            let mut calls = self.calls.borrow_mut();
            let n = calls.entry(kind).or_insert(0);
            *n += 1;
            *n
        };
        match self.faults.iter().find(|f| f.kind == kind && f.nth == n) {
            Some(f) => Err(f.error.clone()),
            None => Ok(()),
        }
    }

    fn allocate_section_id(&mut self) -> String {
        loop {
            let id = format!("sec-{:04}", self.next_section_seq);
            self.next_section_seq += 1;
            if self.draft.section_pos(&id).is_none() && self.live.section_pos(&id).is_none() {
                return id;
            }
        }
    }

    fn section_not_found(id: &str) -> CatalogError {
        CatalogError::NotFound {
            kind: EntityKind::Section,
            id: id.to_string(),
        }
    }

    fn rule_not_found(id: &str) -> CatalogError {
        CatalogError::NotFound {
            kind: EntityKind::Rule,
            id: id.to_string(),
        }
    }
}

impl PolicyCatalog for InMemoryCatalog {
    fn domain(&self) -> PolicyDomain {
        self.domain
    }

    fn list_sections(&self) -> Result<Vec<CatalogSection>, CatalogError> {
        self.enter(CallKind::ListSections)?;
        Ok(self.draft.sections())
    }

    fn list_rules(&self) -> Result<Vec<CatalogRule>, CatalogError> {
        self.enter(CallKind::ListRules)?;
        Ok(self.draft.rules())
    }

    fn add_section(
        &mut self,
        name: &str,
        at: SectionPosition,
    ) -> Result<CatalogSection, CatalogError> {
        self.enter(CallKind::AddSection)?;

        if name.trim().is_empty() {
            return Err(CatalogError::Rejected("section name is empty".to_string()));
        }
        if self.draft.sections.iter().any(|s| s.name == name) {
            return Err(CatalogError::Rejected(format!(
                "section name '{name}' already exists"
            )));
        }
        let insert_at = match &at {
            SectionPosition::LastInPolicy => self.draft.sections.len(),
            SectionPosition::AfterSection(r) => {
                self.draft
                    .section_pos(r)
                    .ok_or_else(|| Self::section_not_found(r))?
                    + 1
            }
        };

        let id = self.allocate_section_id();
        self.draft.sections.insert(
            insert_at,
            SectionState {
                id: id.clone(),
                name: name.to_string(),
                rules: Vec::new(),
            },
        );
        self.journal.push(CatalogCall::AddSection {
            id: id.clone(),
            name: name.to_string(),
            at,
        });
        Ok(CatalogSection::new(id, name))
    }

    fn move_section(&mut self, id: &str, to: SectionPosition) -> Result<(), CatalogError> {
        self.enter(CallKind::MoveSection)?;

        let from = self
            .draft
            .section_pos(id)
            .ok_or_else(|| Self::section_not_found(id))?;
        if let SectionPosition::AfterSection(r) = &to {
            if r == id {
                return Err(CatalogError::Rejected(format!(
                    "section '{id}' cannot be moved relative to itself"
                )));
            }
            if self.draft.section_pos(r).is_none() {
                return Err(Self::section_not_found(r));
            }
        }

        let section = self.draft.sections.remove(from);
        let insert_at = match &to {
            SectionPosition::LastInPolicy => self.draft.sections.len(),
            // Presence checked above; the remove cannot drop the reference.
            SectionPosition::AfterSection(r) => self.draft.section_pos(r).map_or(0, |p| p + 1),
        };
        self.draft.sections.insert(insert_at, section);
        self.journal.push(CatalogCall::MoveSection {
            id: id.to_string(),
            to,
        });
        Ok(())
    }

    fn move_rule(&mut self, id: &str, to: RulePosition) -> Result<(), CatalogError> {
        self.enter(CallKind::MoveRule)?;

        let (from_s, from_r) = self
            .draft
            .rule_pos(id)
            .ok_or_else(|| Self::rule_not_found(id))?;
        match &to {
            RulePosition::FirstInSection(sid) => {
                if self.draft.section_pos(sid).is_none() {
                    return Err(Self::section_not_found(sid));
                }
            }
            RulePosition::AfterRule(r) => {
                if r == id {
                    return Err(CatalogError::Rejected(format!(
                        "rule '{id}' cannot be moved relative to itself"
                    )));
                }
                if self.draft.rule_pos(r).is_none() {
                    return Err(Self::rule_not_found(r));
                }
            }
        }

        let rule_id = self.draft.sections[from_s].rules.remove(from_r);
        match &to {
            RulePosition::FirstInSection(sid) => {
                if let Some(si) = self.draft.section_pos(sid) {
                    self.draft.sections[si].rules.insert(0, rule_id);
                }
            }
            RulePosition::AfterRule(r) => {
                if let Some((si, ri)) = self.draft.rule_pos(r) {
                    self.draft.sections[si].rules.insert(ri + 1, rule_id);
                }
            }
        }
        self.journal.push(CatalogCall::MoveRule {
            id: id.to_string(),
            to,
        });
        Ok(())
    }

    fn publish_revision(&mut self) -> Result<(), CatalogError> {
        self.enter(CallKind::Publish)?;

        self.live = self.draft.clone();
        self.revision += 1;
        self.journal.push(CatalogCall::Publish {
            revision: self.revision,
        });
        Ok(())
    }
}
