use crate::cmd::watch::open_store;
use crate::output::print_json;
use anyhow::{bail, Context};
use clap::Subcommand;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Subcommand)]
pub enum HeadersSubcommand {
    /// Replace the captured request headers
    Set {
        id: String,
        /// Header as KEY=VALUE
        #[arg(required = true)]
        headers: Vec<String>,
    },
    /// Remove the captured request headers
    Clear { id: String },
}

pub fn run(root: &Path, subcmd: HeadersSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        HeadersSubcommand::Set { id, headers } => set(root, &id, &headers, json),
        HeadersSubcommand::Clear { id } => clear(root, &id, json),
    }
}

fn parse_headers(pairs: &[String]) -> anyhow::Result<BTreeMap<String, String>> {
    let mut headers = BTreeMap::new();
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("invalid header '{pair}': expected KEY=VALUE");
        };
        if key.trim().is_empty() {
            bail!("invalid header '{pair}': empty name");
        }
        headers.insert(key.trim().to_string(), value.to_string());
    }
    Ok(headers)
}

fn set(root: &Path, id: &str, pairs: &[String], json: bool) -> anyhow::Result<()> {
    let headers = parse_headers(pairs)?;
    let count = headers.len();
    let store = open_store(root)?;
    let mut status = store
        .load_status(id)
        .with_context(|| format!("watch '{id}' not found"))?;
    status.set_headers(headers);
    store
        .save_status(id, &mut status)
        .context("failed to save watch status")?;
    // Only the count is reported; values stay out of logs and output.
    tracing::info!(watch = %id, count, "replaced captured headers");

    if json {
        print_json(&serde_json::json!({ "id": id, "headers": count }))?;
    } else {
        println!("Stored {count} header(s) on '{id}'");
    }
    Ok(())
}

fn clear(root: &Path, id: &str, json: bool) -> anyhow::Result<()> {
    let store = open_store(root)?;
    let mut status = store
        .load_status(id)
        .with_context(|| format!("watch '{id}' not found"))?;
    status.clear_headers();
    store
        .save_status(id, &mut status)
        .context("failed to save watch status")?;

    if json {
        print_json(&serde_json::json!({ "id": id, "headers": 0 }))?;
    } else {
        println!("Cleared headers on '{id}'");
    }
    Ok(())
}
