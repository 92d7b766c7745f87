use crate::output::print_json;
use anyhow::Context;
use std::path::Path;
use watcher_core::config::WarnLevel;
use watcher_core::store::WatchStore;

pub fn run(root: &Path, name: Option<&str>, json: bool) -> anyhow::Result<()> {
    let default_name = root
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("watcher");
    let store = WatchStore::init(root, name.unwrap_or(default_name))
        .context("failed to initialize watcher store")?;

    let warnings = store.config().validate();
    for w in &warnings {
        match w.level {
            WarnLevel::Warning => tracing::warn!("{}", w.message),
            WarnLevel::Error => tracing::error!("{}", w.message),
        }
    }

    if json {
        print_json(&serde_json::json!({
            "root": root.display().to_string(),
            "name": store.config().name,
            "reconcile": store.config().reconcile,
            "warnings": warnings,
        }))?;
    } else {
        println!("Initialized watcher in {}", root.display());
    }
    Ok(())
}
