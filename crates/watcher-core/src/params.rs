//! Render context for status documents.
//!
//! The only switch is `hide_headers`. It defaults to `true`, so anything
//! returned to API callers drops the captured request headers; the store
//! renders with [`RenderParams::internal`] to keep them.

use crate::watch::{field, WatchStatus};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderParams {
    hide_headers: bool,
}

impl Default for RenderParams {
    fn default() -> Self {
        Self { hide_headers: true }
    }
}

impl RenderParams {
    pub fn builder() -> RenderParamsBuilder {
        RenderParamsBuilder::default()
    }

    /// Full view for trusted storage.
    pub fn internal() -> Self {
        Self {
            hide_headers: false,
        }
    }

    pub fn hide_headers(&self) -> bool {
        self.hide_headers
    }
}

#[derive(Debug, Clone)]
pub struct RenderParamsBuilder {
    hide_headers: bool,
}

impl Default for RenderParamsBuilder {
    fn default() -> Self {
        Self { hide_headers: true }
    }
}

impl RenderParamsBuilder {
    pub fn hide_headers(mut self, hide: bool) -> Self {
        self.hide_headers = hide;
        self
    }

    pub fn build(self) -> RenderParams {
        RenderParams {
            hide_headers: self.hide_headers,
        }
    }
}

// ---------------------------------------------------------------------------
// StatusDocument
// ---------------------------------------------------------------------------

/// A `WatchStatus` paired with the params it should be rendered under.
pub struct StatusDocument<'a> {
    status: &'a WatchStatus,
    params: RenderParams,
}

impl<'a> StatusDocument<'a> {
    pub fn new(status: &'a WatchStatus, params: RenderParams) -> Self {
        Self { status, params }
    }
}

impl Serialize for StatusDocument<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let status = self.status;
        let headers = status.headers().filter(|_| !self.params.hide_headers());

        let len = if headers.is_some() { 7 } else { 6 };
        let mut doc = serializer.serialize_struct("WatchStatus", len)?;
        doc.serialize_field(field::VERSION, &status.version())?;
        doc.serialize_field(field::STATE, status.state())?;
        doc.serialize_field(field::LAST_CHECKED, &status.last_checked())?;
        doc.serialize_field(field::LAST_MET_CONDITION, &status.last_met_condition())?;
        doc.serialize_field(field::ACTIONS, &ActionsView(status))?;
        doc.serialize_field(field::EXECUTION_STATE, &status.execution_state())?;
        match headers {
            Some(headers) => doc.serialize_field(field::HEADERS, headers)?,
            None => doc.skip_field(field::HEADERS)?,
        }
        doc.end()
    }
}

struct ActionsView<'a>(&'a WatchStatus);

impl Serialize for ActionsView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.actions())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionResult, ActionStatus};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use std::collections::BTreeMap;

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::seconds(secs)
    }

    fn status_with_headers() -> (WatchStatus, BTreeMap<String, String>) {
        let mut action = ActionStatus::new(t(0));
        action.update(t(1), ActionResult::success("sent"));
        let mut status =
            WatchStatus::new(Some(t(0)), BTreeMap::from([("email".to_string(), action)]));
        let headers = BTreeMap::from([(
            "Authorization".to_string(),
            "Basic dXNlcjpwYXNz".to_string(),
        )]);
        status.set_headers(headers.clone());
        (status, headers)
    }

    #[test]
    fn default_params_hide_headers() {
        assert!(RenderParams::default().hide_headers());
        assert!(RenderParams::builder().build().hide_headers());
        assert!(!RenderParams::internal().hide_headers());
        assert_eq!(
            RenderParams::builder().hide_headers(false).build(),
            RenderParams::internal()
        );
    }

    #[test]
    fn headers_hidden_by_default() {
        let (status, _) = status_with_headers();
        let doc = serde_json::to_value(&status).unwrap();
        let fields = doc.as_object().unwrap();
        assert!(!fields.contains_key(field::HEADERS));
        assert!(!doc.to_string().contains("dXNlcjpwYXNz"));

        let doc = serde_json::to_value(status.with_params(&RenderParams::default())).unwrap();
        assert!(!doc.as_object().unwrap().contains_key(field::HEADERS));
    }

    #[test]
    fn headers_revealed_when_requested() {
        let (status, headers) = status_with_headers();
        let params = RenderParams::builder().hide_headers(false).build();
        let doc = serde_json::to_value(status.with_params(&params)).unwrap();
        let extracted: BTreeMap<String, String> =
            serde_json::from_value(doc[field::HEADERS].clone()).unwrap();
        assert_eq!(extracted, headers);
    }

    #[test]
    fn other_fields_emitted_under_both_views() {
        let (status, _) = status_with_headers();
        for params in [RenderParams::default(), RenderParams::internal()] {
            let doc = serde_json::to_value(status.with_params(&params)).unwrap();
            let fields = doc.as_object().unwrap();
            for key in [
                field::VERSION,
                field::STATE,
                field::LAST_CHECKED,
                field::LAST_MET_CONDITION,
                field::ACTIONS,
                field::EXECUTION_STATE,
            ] {
                assert!(fields.contains_key(key), "missing {key}");
            }
            let email = &doc[field::ACTIONS]["email"];
            assert_eq!(email["ack"]["state"], "ackable");
            assert_eq!(email["last_execution"]["successful"], true);
            assert!(email["last_successful_execution"].is_object());
        }
    }

    #[test]
    fn revealed_view_with_no_headers_omits_field() {
        let status = WatchStatus::new(None, BTreeMap::new());
        let doc = serde_json::to_value(status.with_params(&RenderParams::internal())).unwrap();
        assert!(!doc.as_object().unwrap().contains_key(field::HEADERS));
    }

    #[test]
    fn internal_roundtrip_keeps_headers() {
        let (status, headers) = status_with_headers();
        let json = status.to_json(&RenderParams::internal()).unwrap();
        let parsed = WatchStatus::from_json(&json).unwrap();
        assert_eq!(parsed.headers(), Some(&headers));
        assert_eq!(parsed, status);
    }

    #[test]
    fn external_roundtrip_drops_headers() {
        let (status, _) = status_with_headers();
        let json = status.to_json(&RenderParams::default()).unwrap();
        let parsed = WatchStatus::from_json(&json).unwrap();
        assert!(parsed.headers().is_none());
        assert_eq!(
            parsed.action_status("email"),
            status.action_status("email")
        );
        assert_eq!(parsed.last_checked(), status.last_checked());
    }

    #[test]
    fn yaml_roundtrip_matches_json() {
        let (status, _) = status_with_headers();
        let yaml = status.to_yaml(&RenderParams::internal()).unwrap();
        assert!(yaml.contains("headers:"));
        assert_eq!(WatchStatus::from_yaml(&yaml).unwrap(), status);
    }
}
