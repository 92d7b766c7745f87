//! File-backed persistence for watch definitions and statuses.
//!
//! Layout:
//!   .watcher/
//!     config.yaml
//!     watches/
//!       <id>/
//!         watch.yaml    — configured actions
//!         status.yaml   — WatchStatus, internal view (headers included)
//!
//! Status writes are guarded by the document `version`: a save carrying a
//! stale version fails with `VersionConflict` instead of overwriting a
//! concurrent update.

use crate::action::ActionResult;
use crate::config::{validate_definition, ReconcilePolicy, WarnLevel, WatcherConfig};
use crate::definition::WatchDefinition;
use crate::error::{Result, WatcherError};
use crate::io;
use crate::params::RenderParams;
use crate::paths;
use crate::watch::WatchStatus;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

pub struct WatchStore {
    root: PathBuf,
    config: WatcherConfig,
}

impl WatchStore {
    /// Create the `.watcher/` tree. An existing config is kept.
    pub fn init(root: &Path, name: &str) -> Result<Self> {
        std::fs::create_dir_all(paths::watches_dir(root))?;
        let config = if paths::config_path(root).exists() {
            WatcherConfig::load(root)?
        } else {
            let config = WatcherConfig::new(name);
            config.save(root)?;
            tracing::info!(root = %root.display(), "initialized watcher store");
            config
        };
        Ok(Self {
            root: root.to_path_buf(),
            config,
        })
    }

    pub fn open(root: &Path) -> Result<Self> {
        let config = WatcherConfig::load(root)?;
        Ok(Self {
            root: root.to_path_buf(),
            config,
        })
    }

    pub fn config(&self) -> &WatcherConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Definitions
    // -----------------------------------------------------------------------

    /// Register a new watch and write its initial status.
    pub fn create(&self, definition: &WatchDefinition) -> Result<WatchStatus> {
        paths::validate_watch_id(&definition.id)?;
        if paths::definition_path(&self.root, &definition.id).exists() {
            return Err(WatcherError::WatchExists(definition.id.clone()));
        }
        if let Some(err) = validate_definition(definition)
            .into_iter()
            .find(|w| w.level == WarnLevel::Error)
        {
            return Err(WatcherError::InvalidDefinition(err.message));
        }

        definition.save(&self.root)?;
        let mut status = WatchStatus::from_definitions(&definition.actions, Utc::now());
        self.save_status(&definition.id, &mut status)?;
        tracing::info!(watch = %definition.id, actions = definition.actions.len(), "created watch");
        Ok(status)
    }

    pub fn definition(&self, id: &str) -> Result<WatchDefinition> {
        paths::validate_watch_id(id)?;
        WatchDefinition::load(&self.root, id)
    }

    /// Ids of all registered watches, sorted.
    pub fn list(&self) -> Result<Vec<String>> {
        let dir = paths::watches_dir(&self.root);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut ids = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            if !entry.path().join(paths::DEFINITION_FILE).exists() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                ids.push(name.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        paths::validate_watch_id(id)?;
        let dir = paths::watch_dir(&self.root, id);
        if !dir.exists() {
            return Err(WatcherError::WatchNotFound(id.to_string()));
        }
        std::fs::remove_dir_all(&dir)?;
        tracing::info!(watch = %id, "deleted watch");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Status
    // -----------------------------------------------------------------------

    pub fn load_status(&self, id: &str) -> Result<WatchStatus> {
        paths::validate_watch_id(id)?;
        let path = paths::status_path(&self.root, id);
        if !path.exists() {
            return Err(WatcherError::WatchNotFound(id.to_string()));
        }
        let data = std::fs::read_to_string(&path)?;
        WatchStatus::from_yaml(&data)
    }

    /// Load a status about to be mutated, applying the configured reconcile
    /// policy against the watch definition. Actions created by the reconcile
    /// are stamped with `now`, the time of the event being recorded.
    pub fn load_for_update(&self, id: &str, now: DateTime<Utc>) -> Result<WatchStatus> {
        let mut status = self.load_status(id)?;
        if self.config.reconcile == ReconcilePolicy::OnCheck {
            let definition = self.definition(id)?;
            let report = status.reconcile(&definition.actions, now);
            if !report.is_empty() {
                tracing::debug!(watch = %id, ?report, "reconciled actions before update");
            }
        }
        Ok(status)
    }

    /// Record one action run and save. Fails with `ActionNotFound` when the
    /// action is not part of the status after reconciling.
    pub fn record_result(
        &self,
        id: &str,
        action: &str,
        timestamp: DateTime<Utc>,
        result: ActionResult,
    ) -> Result<WatchStatus> {
        let mut status = self.load_for_update(id, timestamp)?;
        if !status.on_action_result(action, timestamp, result) {
            return Err(WatcherError::ActionNotFound {
                watch: id.to_string(),
                action: action.to_string(),
            });
        }
        self.save_status(id, &mut status)?;
        Ok(status)
    }

    /// Persist `status` if nobody saved since it was loaded. On success the
    /// status carries its new version, which is also returned.
    pub fn save_status(&self, id: &str, status: &mut WatchStatus) -> Result<u64> {
        paths::validate_watch_id(id)?;
        let path = paths::status_path(&self.root, id);
        let stored = if path.exists() {
            self.load_status(id)?.version()
        } else {
            0
        };
        if stored != status.version() {
            return Err(WatcherError::VersionConflict {
                watch: id.to_string(),
                expected: status.version(),
                actual: stored,
            });
        }

        let next = stored + 1;
        status.set_version(next);
        let data = status.to_yaml(&RenderParams::internal())?;
        io::atomic_write(&path, data.as_bytes())?;
        tracing::debug!(watch = %id, version = next, "saved watch status");
        Ok(next)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::ActionDefinition;
    use crate::types::AckState;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn store_with_watch(dir: &TempDir) -> WatchStore {
        let store = WatchStore::init(dir.path(), "test").unwrap();
        store
            .create(&WatchDefinition::new(
                "disk-full",
                vec![
                    ActionDefinition::new("email"),
                    ActionDefinition::unackable("index"),
                ],
            ))
            .unwrap();
        store
    }

    #[test]
    fn create_seeds_status() {
        let dir = TempDir::new().unwrap();
        let store = store_with_watch(&dir);
        let status = store.load_status("disk-full").unwrap();
        assert_eq!(status.version(), 1);
        assert!(status.last_checked().is_none());
        assert_eq!(
            status.action_status("email").unwrap().ack_status().state(),
            AckState::Ackable
        );
        assert_eq!(
            status.action_status("index").unwrap().ack_status().state(),
            AckState::NotAckable
        );
    }

    #[test]
    fn create_rejects_duplicates_and_bad_ids() {
        let dir = TempDir::new().unwrap();
        let store = store_with_watch(&dir);
        assert!(matches!(
            store.create(&WatchDefinition::new("disk-full", Vec::new())),
            Err(WatcherError::WatchExists(_))
        ));
        assert!(matches!(
            store.create(&WatchDefinition::new("Bad Id", Vec::new())),
            Err(WatcherError::InvalidWatchId(_))
        ));
        assert!(matches!(
            store.create(&WatchDefinition::new(
                "dup",
                vec![ActionDefinition::new("a"), ActionDefinition::new("a")]
            )),
            Err(WatcherError::InvalidDefinition(_))
        ));
    }

    #[test]
    fn stored_status_keeps_headers() {
        let dir = TempDir::new().unwrap();
        let store = store_with_watch(&dir);
        let mut status = store.load_status("disk-full").unwrap();
        let headers = BTreeMap::from([("x-api-key".to_string(), "secret".to_string())]);
        status.set_headers(headers.clone());
        store.save_status("disk-full", &mut status).unwrap();

        let raw = std::fs::read_to_string(paths::status_path(dir.path(), "disk-full")).unwrap();
        assert!(raw.contains("x-api-key"));
        let loaded = store.load_status("disk-full").unwrap();
        assert_eq!(loaded.headers(), Some(&headers));
    }

    #[test]
    fn stale_save_is_rejected() {
        let dir = TempDir::new().unwrap();
        let store = store_with_watch(&dir);
        let mut first = store.load_status("disk-full").unwrap();
        let mut second = store.load_status("disk-full").unwrap();

        first.on_check(true, Utc::now());
        assert_eq!(store.save_status("disk-full", &mut first).unwrap(), 2);
        assert_eq!(first.version(), 2);

        second.on_check(false, Utc::now());
        let err = store.save_status("disk-full", &mut second).unwrap_err();
        assert!(matches!(
            err,
            WatcherError::VersionConflict {
                expected: 1,
                actual: 2,
                ..
            }
        ));
    }

    #[test]
    fn load_for_update_reconciles_new_actions() {
        let dir = TempDir::new().unwrap();
        let store = store_with_watch(&dir);
        let mut definition = store.definition("disk-full").unwrap();
        definition.actions.push(ActionDefinition::new("pager"));
        definition.save(dir.path()).unwrap();

        let mut status = store.load_for_update("disk-full", Utc::now()).unwrap();
        assert!(status.action_status("pager").is_some());
        assert!(status.on_action_result("pager", Utc::now(), ActionResult::success("paged")));
        store.save_status("disk-full", &mut status).unwrap();
    }

    #[test]
    fn reconciled_actions_take_the_event_time() {
        let dir = TempDir::new().unwrap();
        let store = store_with_watch(&dir);
        let mut definition = store.definition("disk-full").unwrap();
        definition.actions.push(ActionDefinition::new("pager"));
        definition.save(dir.path()).unwrap();

        let at: DateTime<Utc> = "2024-05-01T10:00:00Z".parse().unwrap();
        let status = store.load_for_update("disk-full", at).unwrap();
        let pager = status.action_status("pager").unwrap();
        assert_eq!(pager.ack_status().timestamp(), at);
    }

    #[test]
    fn record_result_saves_and_bumps_version() {
        let dir = TempDir::new().unwrap();
        let store = store_with_watch(&dir);
        let at: DateTime<Utc> = "2024-05-01T10:00:00Z".parse().unwrap();
        let status = store
            .record_result("disk-full", "email", at, ActionResult::failure("smtp down"))
            .unwrap();
        assert_eq!(status.version(), 2);

        let loaded = store.load_status("disk-full").unwrap();
        let email = loaded.action_status("email").unwrap();
        assert_eq!(email.last_execution().unwrap().timestamp, at);
        assert!(!email.last_execution().unwrap().successful);
    }

    #[test]
    fn record_result_names_watch_and_action_when_missing() {
        let dir = TempDir::new().unwrap();
        let store = store_with_watch(&dir);
        let err = store
            .record_result("disk-full", "pager", Utc::now(), ActionResult::success("paged"))
            .unwrap_err();
        match &err {
            WatcherError::ActionNotFound { watch, action } => {
                assert_eq!(watch, "disk-full");
                assert_eq!(action, "pager");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(
            err.to_string(),
            "action 'pager' is not configured on watch 'disk-full'"
        );
        assert_eq!(store.load_status("disk-full").unwrap().version(), 1);
    }

    #[test]
    fn manual_policy_skips_reconcile() {
        let dir = TempDir::new().unwrap();
        let store = store_with_watch(&dir);
        let mut config = store.config().clone();
        config.reconcile = ReconcilePolicy::Manual;
        config.save(dir.path()).unwrap();
        let store = WatchStore::open(dir.path()).unwrap();

        let mut definition = store.definition("disk-full").unwrap();
        definition.actions.push(ActionDefinition::new("pager"));
        definition.save(dir.path()).unwrap();

        let status = store.load_for_update("disk-full", Utc::now()).unwrap();
        assert!(status.action_status("pager").is_none());
    }

    #[test]
    fn list_and_delete() {
        let dir = TempDir::new().unwrap();
        let store = store_with_watch(&dir);
        store
            .create(&WatchDefinition::new("cpu-high", vec![ActionDefinition::new("log")]))
            .unwrap();
        assert_eq!(store.list().unwrap(), vec!["cpu-high", "disk-full"]);

        store.delete("cpu-high").unwrap();
        assert_eq!(store.list().unwrap(), vec!["disk-full"]);
        assert!(matches!(
            store.load_status("cpu-high"),
            Err(WatcherError::WatchNotFound(_))
        ));
    }

    #[test]
    fn open_requires_init() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            WatchStore::open(dir.path()),
            Err(WatcherError::NotInitialized)
        ));
    }
}
