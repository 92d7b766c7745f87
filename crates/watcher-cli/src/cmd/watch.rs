use crate::output::{or_dash, print_json, print_table};
use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Subcommand;
use std::path::Path;
use watcher_core::definition::{ActionDefinition, WatchDefinition};
use watcher_core::params::RenderParams;
use watcher_core::store::WatchStore;
use watcher_core::watch::WatchStatus;

#[derive(Subcommand)]
pub enum WatchSubcommand {
    /// Register a watch with its actions
    Add {
        id: String,
        /// Action id; append `:unackable` for actions that cannot be acknowledged
        #[arg(long = "action", short = 'a')]
        actions: Vec<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// List registered watches
    List,
    /// Show the status of one watch
    Show {
        id: String,
        /// Include captured request headers (internal view)
        #[arg(long)]
        reveal_headers: bool,
    },
    /// Delete a watch and its status
    Delete { id: String },
}

pub fn run(root: &Path, subcmd: WatchSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        WatchSubcommand::Add {
            id,
            actions,
            description,
        } => add(root, &id, &actions, description, json),
        WatchSubcommand::List => list(root, json),
        WatchSubcommand::Show { id, reveal_headers } => show(root, &id, reveal_headers, json),
        WatchSubcommand::Delete { id } => delete(root, &id, json),
    }
}

pub fn open_store(root: &Path) -> anyhow::Result<WatchStore> {
    WatchStore::open(root).context("failed to open watcher store")
}

fn add(
    root: &Path,
    id: &str,
    actions: &[String],
    description: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let store = open_store(root)?;
    let mut definition = WatchDefinition::new(
        id,
        actions.iter().map(|a| ActionDefinition::parse(a)).collect(),
    );
    definition.description = description;
    let status = store
        .create(&definition)
        .with_context(|| format!("failed to create watch '{id}'"))?;

    if json {
        print_json(&status)?;
    } else {
        println!(
            "Created watch '{id}' with {} action(s)",
            definition.actions.len()
        );
    }
    Ok(())
}

fn list(root: &Path, json: bool) -> anyhow::Result<()> {
    let store = open_store(root)?;
    let ids = store.list().context("failed to list watches")?;
    let mut statuses = Vec::with_capacity(ids.len());
    for id in &ids {
        let status = store
            .load_status(id)
            .with_context(|| format!("failed to load status for '{id}'"))?;
        statuses.push((id.as_str(), status));
    }

    if json {
        let docs: serde_json::Map<String, serde_json::Value> = statuses
            .iter()
            .map(|(id, s)| Ok::<_, anyhow::Error>((id.to_string(), serde_json::to_value(s)?)))
            .collect::<anyhow::Result<_>>()?;
        print_json(&docs)?;
        return Ok(());
    }

    if statuses.is_empty() {
        println!("No watches.");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = statuses
        .iter()
        .map(|(id, s)| {
            vec![
                id.to_string(),
                if s.state().active { "active" } else { "inactive" }.to_string(),
                or_dash(s.last_checked()),
                or_dash(s.last_met_condition()),
                s.actions().count().to_string(),
            ]
        })
        .collect();
    print_table(
        &["WATCH", "STATE", "LAST CHECKED", "LAST MET", "ACTIONS"],
        &rows,
    );
    Ok(())
}

fn show(root: &Path, id: &str, reveal_headers: bool, json: bool) -> anyhow::Result<()> {
    let store = open_store(root)?;
    let status = store
        .load_status(id)
        .with_context(|| format!("watch '{id}' not found"))?;
    let params = RenderParams::builder()
        .hide_headers(!reveal_headers)
        .build();

    if json {
        print_json(&status.with_params(&params))?;
        return Ok(());
    }

    print_status(id, &status);
    if let Some(headers) = status.headers().filter(|_| !params.hide_headers()) {
        println!();
        let rows: Vec<Vec<String>> = headers
            .iter()
            .map(|(k, v)| vec![k.clone(), v.clone()])
            .collect();
        print_table(&["HEADER", "VALUE"], &rows);
    }
    Ok(())
}

pub fn print_status(id: &str, status: &WatchStatus) {
    let state = if status.state().active {
        "active"
    } else {
        "inactive"
    };
    println!("Watch:          {id} ({state}, version {})", status.version());
    println!("Last checked:   {}", or_dash(status.last_checked()));
    println!("Last met:       {}", or_dash(status.last_met_condition()));
    println!("Execution:      {}", or_dash(status.execution_state()));
    println!();

    let rows: Vec<Vec<String>> = status
        .actions()
        .map(|(action_id, a)| {
            vec![
                action_id.to_string(),
                a.ack_status().state().to_string(),
                a.ack_status().timestamp().to_rfc3339(),
                or_dash(a.last_execution().map(|e| execution_cell(e.timestamp, e.successful))),
                or_dash(a.last_successful_execution().map(|e| e.timestamp)),
            ]
        })
        .collect();
    print_table(
        &["ACTION", "ACK", "ACK SINCE", "LAST EXECUTION", "LAST SUCCESS"],
        &rows,
    );
}

fn execution_cell(timestamp: DateTime<Utc>, successful: bool) -> String {
    let outcome = if successful { "ok" } else { "failed" };
    format!("{} ({outcome})", timestamp.to_rfc3339())
}

fn delete(root: &Path, id: &str, json: bool) -> anyhow::Result<()> {
    let store = open_store(root)?;
    store
        .delete(id)
        .with_context(|| format!("failed to delete watch '{id}'"))?;
    if json {
        print_json(&serde_json::json!({ "id": id, "deleted": true }))?;
    } else {
        println!("Deleted watch '{id}'");
    }
    Ok(())
}

pub fn set_active(root: &Path, id: &str, active: bool, json: bool) -> anyhow::Result<()> {
    let store = open_store(root)?;
    let mut status = store
        .load_status(id)
        .with_context(|| format!("watch '{id}' not found"))?;
    let changed = status.set_active(active, Utc::now());
    if changed {
        store
            .save_status(id, &mut status)
            .context("failed to save watch status")?;
        tracing::info!(watch = %id, active, "watch activation changed");
    }

    if json {
        print_json(&serde_json::json!({ "id": id, "active": active, "changed": changed }))?;
    } else if changed {
        let verb = if active { "Activated" } else { "Deactivated" };
        println!("{verb} watch '{id}'");
    } else {
        let state = if active { "active" } else { "inactive" };
        println!("Watch '{id}' is already {state}");
    }
    Ok(())
}
