use crate::error::{Result, WatcherError};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const WATCHER_DIR: &str = ".watcher";
pub const WATCHES_DIR: &str = ".watcher/watches";
pub const CONFIG_FILE: &str = ".watcher/config.yaml";

pub const DEFINITION_FILE: &str = "watch.yaml";
pub const STATUS_FILE: &str = "status.yaml";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn watches_dir(root: &Path) -> PathBuf {
    root.join(WATCHES_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn watch_dir(root: &Path, id: &str) -> PathBuf {
    watches_dir(root).join(id)
}

pub fn definition_path(root: &Path, id: &str) -> PathBuf {
    watch_dir(root, id).join(DEFINITION_FILE)
}

pub fn status_path(root: &Path, id: &str) -> PathBuf {
    watch_dir(root, id).join(STATUS_FILE)
}

// ---------------------------------------------------------------------------
// Watch id validation
// ---------------------------------------------------------------------------

static WATCH_ID_RE: OnceLock<Regex> = OnceLock::new();

fn watch_id_re() -> &'static Regex {
    WATCH_ID_RE.get_or_init(|| {
        Regex::new(r"^[a-z0-9][a-z0-9_\-]*[a-z0-9]$|^[a-z0-9]$").expect("static regex")
    })
}

/// Watch ids become directory names, so they are restricted to a safe charset.
pub fn validate_watch_id(id: &str) -> Result<()> {
    if id.is_empty() || id.len() > 64 || !watch_id_re().is_match(id) {
        return Err(WatcherError::InvalidWatchId(id.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
