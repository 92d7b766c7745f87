use crate::cmd::watch::open_store;
use crate::output::print_json;
use anyhow::Context;
use chrono::{DateTime, Utc};
use std::path::Path;
use watcher_core::watch::ALL_ACTIONS;

pub fn run(
    root: &Path,
    id: &str,
    actions: &[String],
    at: Option<DateTime<Utc>>,
    json: bool,
) -> anyhow::Result<()> {
    let store = open_store(root)?;
    let mut status = store
        .load_status(id)
        .with_context(|| format!("watch '{id}' not found"))?;

    let targets: Vec<&str> = if actions.is_empty() {
        vec![ALL_ACTIONS]
    } else {
        actions.iter().map(String::as_str).collect()
    };
    for target in &targets {
        if *target != ALL_ACTIONS && status.action_status(target).is_none() {
            tracing::warn!(watch = %id, action = %target, "ignoring ack for unknown action");
        }
    }

    let changed = status.on_ack(at.unwrap_or_else(Utc::now), &targets);
    if !changed.is_empty() {
        store
            .save_status(id, &mut status)
            .context("failed to save watch status")?;
    }

    let states: serde_json::Map<String, serde_json::Value> = status
        .actions()
        .map(|(action_id, a)| {
            (
                action_id.to_string(),
                serde_json::Value::from(a.ack_status().state().as_str()),
            )
        })
        .collect();
    if json {
        print_json(&serde_json::json!({ "id": id, "changed": changed, "ack": states }))?;
    } else if !changed.is_empty() {
        println!("Acknowledged {} on '{id}'", changed.join(", "));
    } else {
        println!("Nothing to acknowledge on '{id}'");
    }
    Ok(())
}
