//! Command handlers for polctl.
//!
//! Shared loading/saving helpers live here; the reorder commands live in
//! [`reorder`].

pub mod reorder;

use anyhow::{bail, Context, Result};
use clap::Args;
use pol_catalog::snapshot_adapter::{self, RawCatalogSnapshot};
use pol_catalog::{InMemoryCatalog, PolicyCatalog};
use pol_config::{
    load_layered_yaml, report_unused_keys, ConfigMode, LoadedConfig, ReorderSettings,
    UnusedKeyPolicy,
};
use pol_reorder::DesiredTopology;
use std::fs;
use tracing::{info, warn};

/// Catalog snapshot + config arguments shared by every reorder command.
#[derive(Args, Debug, Clone)]
pub struct Target {
    /// Catalog snapshot JSON (read, and written back by apply/publish)
    #[arg(long)]
    pub catalog: String,

    /// Layered config paths in merge order
    #[arg(long = "config")]
    pub config_paths: Vec<String>,

    /// Fail instead of warn when the config carries keys this command never reads
    #[arg(long, default_value_t = false)]
    pub strict_config: bool,
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Read a text file, tolerating a UTF-8 BOM.
fn read_text(path: &str, what: &str) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("read {what} failed: {path}"))?;
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(&bytes);
    String::from_utf8(bytes.to_vec()).with_context(|| format!("{what} must be UTF-8 text: {path}"))
}

/// Load config for `mode` and run the unused-key guard.
pub fn load_config(target: &Target, mode: ConfigMode) -> Result<(LoadedConfig, ReorderSettings)> {
    let loaded = if target.config_paths.is_empty() {
        LoadedConfig::empty()?
    } else {
        let path_refs: Vec<&str> = target.config_paths.iter().map(|s| s.as_str()).collect();
        load_layered_yaml(&path_refs)?
    };

    let policy = if target.strict_config {
        UnusedKeyPolicy::Fail
    } else {
        UnusedKeyPolicy::Warn
    };
    let report = report_unused_keys(mode, &loaded.config_json, policy)?;
    if !report.is_clean() {
        warn!(
            mode = %report.mode,
            unused = ?report.unused_leaf_pointers,
            "config carries keys this command does not read"
        );
    }

    let settings = ReorderSettings::from_config_json(&loaded.config_json)?;
    info!(config_hash = %loaded.config_hash, mode = mode.as_str(), "config loaded");
    Ok((loaded, settings))
}

/// Load the catalog snapshot and check it against the configured domain.
pub fn load_catalog(path: &str, settings: &ReorderSettings) -> Result<InMemoryCatalog> {
    let raw = read_text(path, "catalog snapshot")?;
    let doc: RawCatalogSnapshot = serde_json::from_str(raw.trim())
        .with_context(|| format!("catalog snapshot must be valid JSON: {path}"))?;
    let catalog = snapshot_adapter::normalize(doc)
        .with_context(|| format!("invalid catalog snapshot: {path}"))?;

    if let Some(expected) = settings.domain {
        if catalog.domain() != expected {
            bail!(
                "DOMAIN_MISMATCH: config expects {} but snapshot {} is {}",
                expected,
                path,
                catalog.domain()
            );
        }
    }
    Ok(catalog)
}

pub fn save_catalog(path: &str, catalog: &InMemoryCatalog) -> Result<()> {
    let doc = snapshot_adapter::snapshot(catalog);
    let json = serde_json::to_string_pretty(&doc).context("serialize catalog snapshot failed")?;
    fs::write(path, json + "\n").with_context(|| format!("write catalog snapshot failed: {path}"))
}

/// Load a desired topology. YAML parser, so JSON files work too.
/// A configured `start_anchor_id` applies only when the file has none.
pub fn load_topology(path: &str, settings: &ReorderSettings) -> Result<DesiredTopology> {
    let raw = read_text(path, "topology")?;
    let mut desired: DesiredTopology = serde_yaml::from_str(&raw)
        .with_context(|| format!("topology must be valid YAML or JSON: {path}"))?;
    if desired.start_anchor_id.is_none() {
        desired.start_anchor_id = settings.start_anchor_id.clone();
    }
    Ok(desired)
}
