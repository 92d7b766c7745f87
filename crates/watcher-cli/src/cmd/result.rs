use crate::cmd::watch::open_store;
use crate::output::print_json;
use anyhow::Context;
use chrono::{DateTime, Utc};
use std::path::Path;
use watcher_core::action::ActionResult;

pub fn run(
    root: &Path,
    id: &str,
    action: &str,
    outcome: &str,
    reason: Option<String>,
    at: Option<DateTime<Utc>>,
    json: bool,
) -> anyhow::Result<()> {
    let result = ActionResult::parse(outcome, reason)?;
    let store = open_store(root)?;
    let status = store
        .record_result(id, action, at.unwrap_or_else(Utc::now), result)
        .with_context(|| format!("cannot record result on watch '{id}'"))?;
    tracing::info!(watch = %id, action = %action, outcome = %outcome, "recorded action result");

    let action_status = status
        .action_status(action)
        .context("action vanished after update")?;
    if json {
        print_json(&serde_json::json!({ "id": id, "action": action, "status": action_status }))?;
    } else {
        println!(
            "Recorded {outcome} for '{action}' on '{id}' (ack: {})",
            action_status.ack_status().state()
        );
    }
    Ok(())
}
