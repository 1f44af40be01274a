use anyhow::{bail, Result};
use serde_json::Value;

use pol_catalog::PolicyDomain;
use pol_reorder::ReorderOptions;

/// Typed view of the `catalog` / `reorder` config sections.
///
/// Every key is optional. Absent keys fall back to engine defaults; present
/// keys with the wrong type are errors rather than silently ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReorderSettings {
    /// Expected catalog domain. When set, callers check it against the
    /// catalog they were handed.
    pub domain: Option<PolicyDomain>,
    pub default_section_name: Option<String>,
    pub publish: bool,
    pub start_anchor_id: Option<String>,
}

impl Default for ReorderSettings {
    fn default() -> Self {
        Self {
            domain: None,
            default_section_name: None,
            publish: true,
            start_anchor_id: None,
        }
    }
}

impl ReorderSettings {
    pub fn from_config_json(config: &Value) -> Result<Self> {
        let mut out = ReorderSettings::default();

        if let Some(raw) = opt_str(config, "/catalog/domain")? {
            out.domain = match PolicyDomain::parse(&raw) {
                Some(d) => Some(d),
                None => bail!(
                    "CONFIG_INVALID /catalog/domain='{raw}': expected one of \
                     internet_firewall | wan_firewall | wan_network"
                ),
            };
        }
        out.default_section_name = opt_str(config, "/reorder/default_section_name")?;
        out.start_anchor_id = opt_str(config, "/reorder/start_anchor_id")?;

        match config.pointer("/reorder/publish") {
            None | Some(Value::Null) => {}
            Some(Value::Bool(b)) => out.publish = *b,
            Some(other) => bail!("CONFIG_INVALID /reorder/publish: expected bool, got {other}"),
        }

        Ok(out)
    }

    pub fn reorder_options(&self) -> ReorderOptions {
        ReorderOptions {
            default_section_name: self.default_section_name.clone(),
            publish: self.publish,
        }
    }
}

/// Non-blank string at `pointer`; `None` when absent, null or blank.
fn opt_str(config: &Value, pointer: &str) -> Result<Option<String>> {
    match config.pointer(pointer) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => {
            let t = s.trim();
            Ok((!t.is_empty()).then(|| t.to_string()))
        }
        Some(other) => bail!("CONFIG_INVALID {pointer}: expected string, got {other}"),
    }
}
