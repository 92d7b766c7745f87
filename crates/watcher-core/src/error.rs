use thiserror::Error;

#[derive(Debug, Error)]
pub enum WatcherError {
    #[error("not initialized: run 'watcher init'")]
    NotInitialized,

    #[error("watch not found: {0}")]
    WatchNotFound(String),

    #[error("watch already exists: {0}")]
    WatchExists(String),

    #[error("invalid watch id '{0}': must be lowercase alphanumeric with hyphens or underscores")]
    InvalidWatchId(String),

    #[error("invalid watch definition: {0}")]
    InvalidDefinition(String),

    #[error("action '{action}' is not configured on watch '{watch}'")]
    ActionNotFound { watch: String, action: String },

    #[error("version conflict on watch '{watch}': expected {expected}, found {actual}")]
    VersionConflict {
        watch: String,
        expected: u64,
        actual: u64,
    },

    #[error("invalid execution state: {0}")]
    InvalidExecutionState(String),

    #[error("invalid action result '{0}': expected success, failure, or throttled")]
    InvalidActionResult(String),

    /// A status document that parsed as JSON but not as a `WatchStatus`.
    #[error("invalid status document at '{path}': {source}")]
    Document {
        path: String,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, WatcherError>;
