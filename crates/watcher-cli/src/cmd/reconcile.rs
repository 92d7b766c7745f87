use crate::cmd::watch::open_store;
use crate::output::print_json;
use anyhow::Context;
use chrono::{DateTime, Utc};
use std::path::Path;

/// Align a watch's stored action statuses with its configured actions.
pub fn run(root: &Path, id: &str, at: Option<DateTime<Utc>>, json: bool) -> anyhow::Result<()> {
    let store = open_store(root)?;
    let definition = store
        .definition(id)
        .with_context(|| format!("watch '{id}' not found"))?;
    let mut status = store
        .load_status(id)
        .with_context(|| format!("failed to load status for '{id}'"))?;
    let report = status.reconcile(&definition.actions, at.unwrap_or_else(Utc::now));
    if !report.is_empty() {
        store
            .save_status(id, &mut status)
            .context("failed to save watch status")?;
        tracing::info!(watch = %id, ?report, "reconciled actions");
    }

    if json {
        print_json(&serde_json::json!({
            "id": id,
            "added": report.added,
            "removed": report.removed,
        }))?;
    } else if report.is_empty() {
        println!("Watch '{id}' is in sync");
    } else {
        println!(
            "Reconciled '{id}': added [{}], removed [{}]",
            report.added.join(", "),
            report.removed.join(", ")
        );
    }
    Ok(())
}
