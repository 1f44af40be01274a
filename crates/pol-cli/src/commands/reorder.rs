//! plan / apply / read / publish.
//!
//! Output is `key=value` lines followed by the payload, like the rest of the
//! CLI. Read-back state is printed as pretty JSON.

use anyhow::{Context, Result};
use chrono::Utc;
use pol_config::ConfigMode;
use pol_reorder::{detect_drift, read_back, ReorderError};
use tracing::error;

use super::{load_catalog, load_config, load_topology, save_catalog, Target};

pub fn plan(target: &Target, topology: &str) -> Result<()> {
    let (_, settings) = load_config(target, ConfigMode::Plan)?;
    let catalog = load_catalog(&target.catalog, &settings)?;
    let desired = load_topology(topology, &settings)?;

    let plan = pol_reorder::plan(&catalog, &desired, &settings.reorder_options())?;
    let observed = read_back(&catalog, Some(&desired))?;
    let drift = detect_drift(&desired, &observed)?;

    println!("domain={}", plan.domain);
    println!("anchor={}", plan.anchor);
    println!("section_moves={}", plan.section_moves());
    println!("rule_moves={}", plan.rule_moves());
    println!("publish={}", plan.publishes());
    println!("in_sync={}", drift.is_clean());
    println!("calls:");
    for (i, call) in plan.calls.iter().enumerate() {
        println!("{:>4}. {call}", i + 1);
    }
    println!("drift:");
    print!("{drift}");
    if drift.is_clean() {
        println!();
    }
    Ok(())
}

pub fn apply(target: &Target, topology: &str, no_publish: bool) -> Result<()> {
    let (_, settings) = load_config(target, ConfigMode::Apply)?;
    let mut catalog = load_catalog(&target.catalog, &settings)?;
    let desired = load_topology(topology, &settings)?;

    let mut options = settings.reorder_options();
    if no_publish {
        options.publish = false;
    }

    let outcome = match pol_reorder::reconcile(&mut catalog, &desired, &options) {
        Ok(o) => o,
        Err(e @ ReorderError::Catalog { .. }) => {
            // Calls issued before the failure are real; keep them on disk.
            save_catalog(&target.catalog, &catalog)?;
            error!(error = %e, "reconciliation aborted; partial moves kept in draft");
            return Err(e).context("apply failed");
        }
        Err(e) => return Err(e).context("apply refused before any catalog call"),
    };
    save_catalog(&target.catalog, &catalog)?;

    let observed = read_back(&catalog, Some(&desired))?;
    println!("applied_at_utc={}", Utc::now().to_rfc3339());
    println!("domain={}", outcome.plan.domain);
    println!("calls_issued={}", outcome.calls_issued);
    println!("published={}", outcome.published);
    println!("revision={}", catalog.revision());
    if let Some(s) = &outcome.bootstrapped_section {
        println!("bootstrapped_section={} ({})", s.name, s.id);
    }
    println!(
        "{}",
        serde_json::to_string_pretty(&observed).context("serialize read-back failed")?
    );
    Ok(())
}

pub fn read(target: &Target, topology: Option<&str>) -> Result<()> {
    let (_, settings) = load_config(target, ConfigMode::Read)?;
    let catalog = load_catalog(&target.catalog, &settings)?;
    let managed = topology
        .map(|p| load_topology(p, &settings))
        .transpose()?;

    let observed = read_back(&catalog, managed.as_ref())?;
    println!(
        "{}",
        serde_json::to_string_pretty(&observed).context("serialize read-back failed")?
    );
    Ok(())
}

pub fn publish(target: &Target) -> Result<()> {
    let (_, settings) = load_config(target, ConfigMode::Publish)?;
    let mut catalog = load_catalog(&target.catalog, &settings)?;

    let had_changes = catalog.has_unpublished_changes();
    pol_reorder::publish(&mut catalog, 0)?;
    save_catalog(&target.catalog, &catalog)?;

    println!("published=true");
    println!("had_staged_changes={had_changes}");
    println!("revision={}", catalog.revision());
    Ok(())
}
