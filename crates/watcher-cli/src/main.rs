mod cmd;
mod output;
mod root;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use cmd::{headers::HeadersSubcommand, watch::WatchSubcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "watcher",
    about = "Watch status tracking: condition checks, action results, and acknowledgments",
    version,
    propagate_version = true
)]
struct Cli {
    /// Store root (default: auto-detect from .watcher/)
    #[arg(long, global = true, env = "WATCHER_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a watcher store in the current directory
    Init {
        /// Store name (default: directory name)
        #[arg(long)]
        name: Option<String>,
    },

    /// Manage watches
    Watch {
        #[command(subcommand)]
        subcommand: WatchSubcommand,
    },

    /// Record the outcome of a condition check
    Check {
        id: String,
        /// The watch condition held
        #[arg(long, conflicts_with = "not_met", required_unless_present = "not_met")]
        met: bool,
        /// The watch condition did not hold
        #[arg(long = "not-met")]
        not_met: bool,
        /// Execution state reported alongside the check (e.g. executed, throttled)
        #[arg(long)]
        execution_state: Option<String>,
        /// Check time, RFC 3339 (default: now)
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },

    /// Record the outcome of one action run
    #[command(name = "result")]
    ActionResult {
        id: String,
        action: String,
        /// success, failure, or throttled
        outcome: String,
        /// Summary on success, reason on failure or throttle
        #[arg(long, short = 'r')]
        reason: Option<String>,
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },

    /// Acknowledge actions (all actions when none are given)
    Ack {
        id: String,
        actions: Vec<String>,
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },

    /// Align stored action statuses with the watch's configured actions
    Reconcile {
        id: String,
        /// Timestamp for newly created actions, RFC 3339 (default: now)
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },

    /// Activate a watch
    Activate { id: String },

    /// Deactivate a watch
    Deactivate { id: String },

    /// Manage captured request headers
    Headers {
        #[command(subcommand)]
        subcommand: HeadersSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init { name } => cmd::init::run(&root, name.as_deref(), cli.json),
        Commands::Watch { subcommand } => cmd::watch::run(&root, subcommand, cli.json),
        Commands::Check {
            id,
            met,
            not_met: _,
            execution_state,
            at,
        } => cmd::check::run(
            &root,
            &id,
            met,
            execution_state.as_deref(),
            at,
            cli.json,
        ),
        Commands::ActionResult {
            id,
            action,
            outcome,
            reason,
            at,
        } => cmd::result::run(&root, &id, &action, &outcome, reason, at, cli.json),
        Commands::Ack { id, actions, at } => cmd::ack::run(&root, &id, &actions, at, cli.json),
        Commands::Reconcile { id, at } => cmd::reconcile::run(&root, &id, at, cli.json),
        Commands::Activate { id } => cmd::watch::set_active(&root, &id, true, cli.json),
        Commands::Deactivate { id } => cmd::watch::set_active(&root, &id, false, cli.json),
        Commands::Headers { subcommand } => cmd::headers::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
