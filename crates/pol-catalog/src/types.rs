use serde::{Deserialize, Serialize};

/// The three policy domains served by the same reorder engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyDomain {
    InternetFirewall,
    WanFirewall,
    WanNetwork,
}

impl PolicyDomain {
    pub const ALL: [PolicyDomain; 3] = [
        PolicyDomain::InternetFirewall,
        PolicyDomain::WanFirewall,
        PolicyDomain::WanNetwork,
    ];

    /// Stable wire name (matches the serde representation).
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyDomain::InternetFirewall => "internet_firewall",
            PolicyDomain::WanFirewall => "wan_firewall",
            PolicyDomain::WanNetwork => "wan_network",
        }
    }

    /// Name given to the section created when bootstrapping an empty policy.
    pub fn default_section_name(&self) -> &'static str {
        "Default"
    }

    /// Accepts the wire name plus the short/hyphenated aliases operators type.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "internet_firewall" | "if" | "ifw" => Some(PolicyDomain::InternetFirewall),
            "wan_firewall" | "wf" | "wfw" => Some(PolicyDomain::WanFirewall),
            "wan_network" | "wnw" | "wan" => Some(PolicyDomain::WanNetwork),
            _ => None,
        }
    }
}

impl std::fmt::Display for PolicyDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A section as listed by the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSection {
    pub id: String,
    pub name: String,
}

impl CatalogSection {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A rule as listed by the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRule {
    pub id: String,
    pub name: String,
    pub section_id: String,
    pub section_name: String,
    pub description: String,
    pub enabled: bool,
}

/// Target of a section move/insert.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "position", content = "ref", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SectionPosition {
    /// Directly after the section with this id.
    AfterSection(String),
    /// At the end of the policy.
    LastInPolicy,
}

/// Target of a rule move.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "position", content = "ref", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RulePosition {
    /// At the head of the section with this id.
    FirstInSection(String),
    /// Directly after the rule with this id (in that rule's section).
    AfterRule(String),
}

impl std::fmt::Display for SectionPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SectionPosition::AfterSection(id) => write!(f, "AFTER_SECTION {id}"),
            SectionPosition::LastInPolicy => f.write_str("LAST_IN_POLICY"),
        }
    }
}

impl std::fmt::Display for RulePosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RulePosition::FirstInSection(id) => write!(f, "FIRST_IN_SECTION {id}"),
            RulePosition::AfterRule(id) => write!(f, "AFTER_RULE {id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_parse_accepts_aliases() {
        assert_eq!(
            PolicyDomain::parse("Internet-Firewall"),
            Some(PolicyDomain::InternetFirewall)
        );
        assert_eq!(PolicyDomain::parse(" wf "), Some(PolicyDomain::WanFirewall));
        assert_eq!(PolicyDomain::parse("wnw"), Some(PolicyDomain::WanNetwork));
        assert_eq!(PolicyDomain::parse("lan"), None);
    }

    #[test]
    fn domain_wire_name_matches_serde() {
        for d in PolicyDomain::ALL {
            let json = serde_json::to_string(&d).unwrap();
            assert_eq!(json, format!("\"{}\"", d.as_str()));
        }
    }

    #[test]
    fn positions_serialize_with_position_and_ref() {
        let v = serde_json::to_value(RulePosition::AfterRule("r-1".to_string())).unwrap();
        assert_eq!(v, serde_json::json!({"position": "AFTER_RULE", "ref": "r-1"}));

        let v = serde_json::to_value(SectionPosition::LastInPolicy).unwrap();
        assert_eq!(v, serde_json::json!({"position": "LAST_IN_POLICY"}));
    }
}
