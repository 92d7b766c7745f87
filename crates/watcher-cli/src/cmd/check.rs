use crate::cmd::watch::{open_store, print_status};
use crate::output::print_json;
use anyhow::Context;
use chrono::{DateTime, Utc};
use std::path::Path;
use watcher_core::types::ExecutionState;

pub fn run(
    root: &Path,
    id: &str,
    condition_met: bool,
    execution_state: Option<&str>,
    at: Option<DateTime<Utc>>,
    json: bool,
) -> anyhow::Result<()> {
    let execution_state = execution_state
        .map(|s| s.parse::<ExecutionState>())
        .transpose()?;
    let timestamp = at.unwrap_or_else(Utc::now);
    let store = open_store(root)?;
    let mut status = store
        .load_for_update(id, timestamp)
        .with_context(|| format!("watch '{id}' not found"))?;

    status.on_check(condition_met, timestamp);
    if let Some(state) = execution_state {
        status.set_execution_state(state);
    }
    store
        .save_status(id, &mut status)
        .context("failed to save watch status")?;
    tracing::info!(watch = %id, condition_met, "recorded condition check");

    if json {
        print_json(&status)?;
    } else {
        print_status(id, &status);
    }
    Ok(())
}
