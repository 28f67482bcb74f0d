//! Current dashboard model and the hooks that re-render it.
//!
//! [`DashboardState`] is an explicitly owned slot: it starts empty, is filled
//! by the first [`DashboardState::publish`] and shallow-merged by every later
//! one. Render callbacks are supplied per publish through [`RenderHooks`];
//! each is optional and invoked only when present.

pub mod status;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

use crate::models::BusinessData;

pub use status::{StatusBoard, StatusMessage};

/// Message severity for notifications and the status surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Error,
}

/// Message passed to the notify hook after a successful publish.
pub const PUBLISHED_MESSAGE: &str = "Dashboard updated with the new data!";

/// Callback with no arguments (full refresh, overview refresh).
pub type RefreshHook = Arc<dyn Fn() + Send + Sync>;

/// Callback receiving a message and its severity.
pub type NotifyHook = Arc<dyn Fn(&str, Severity) + Send + Sync>;

/// Optional render callbacks run after every publish.
#[derive(Clone, Default)]
pub struct RenderHooks {
    refresh: Option<RefreshHook>,
    refresh_overview: Option<RefreshHook>,
    notify: Option<NotifyHook>,
}

impl RenderHooks {
    /// No hooks at all.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_refresh(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.refresh = Some(Arc::new(hook));
        self
    }

    pub fn with_refresh_overview(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.refresh_overview = Some(Arc::new(hook));
        self
    }

    pub fn with_notify(mut self, hook: impl Fn(&str, Severity) + Send + Sync + 'static) -> Self {
        self.notify = Some(Arc::new(hook));
        self
    }

    /// Run every present hook once: refresh, overview refresh, then notify.
    fn run(&self) {
        if let Some(refresh) = &self.refresh {
            refresh();
        }
        if let Some(refresh_overview) = &self.refresh_overview {
            refresh_overview();
        }
        if let Some(notify) = &self.notify {
            notify(PUBLISHED_MESSAGE, Severity::Success);
        }
    }
}

impl fmt::Debug for RenderHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderHooks")
            .field("refresh", &self.refresh.is_some())
            .field("refresh_overview", &self.refresh_overview.is_some())
            .field("notify", &self.notify.is_some())
            .finish()
    }
}

/// Owned slot holding the current model as a JSON object.
///
/// The object form keeps keys a structured upload carries even when they are
/// not part of [`BusinessData`], so merges stay key-for-key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardState {
    current: Option<Map<String, Value>>,
    revision: u64,
}

impl DashboardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_none()
    }

    /// Number of publishes applied so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn current(&self) -> Option<&Map<String, Value>> {
        self.current.as_ref()
    }

    /// Current model as a JSON value.
    pub fn snapshot(&self) -> Option<Value> {
        self.current.clone().map(Value::Object)
    }

    /// Typed view of the current model.
    ///
    /// `Some(Err(_))` when a structured upload left the model in a shape that
    /// does not deserialize.
    pub fn model(&self) -> Option<serde_json::Result<BusinessData>> {
        self.snapshot().map(serde_json::from_value)
    }

    /// Replace or shallow-merge, then run the render hooks.
    ///
    /// With no current model the update becomes current in full. Otherwise
    /// each top-level key of `update` overwrites the same key of the current
    /// model; keys the update omits are left untouched.
    pub fn publish(&mut self, update: Map<String, Value>, hooks: &RenderHooks) {
        match self.current.as_mut() {
            Some(current) => current.extend(update),
            None => self.current = Some(update),
        }
        self.revision += 1;
        hooks.run();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DashboardConfig;
    use serde_json::json;
    use std::sync::Mutex;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_first_publish_replaces() {
        let mut state = DashboardState::new();
        assert!(state.is_empty());

        let model = BusinessData::with_branches(["Hamdan"], &DashboardConfig::default());
        state.publish(model.to_object().unwrap(), &RenderHooks::none());

        assert_eq!(state.revision(), 1);
        assert_eq!(state.model().unwrap().unwrap(), model);
    }

    #[test]
    fn test_shallow_merge_keeps_omitted_keys() {
        let mut state = DashboardState::new();
        state.publish(
            object(json!({ "branches": ["Hamdan"], "userEntries": [{"note": "manual"}] })),
            &RenderHooks::none(),
        );
        state.publish(
            object(json!({ "branches": ["Khalidiya"], "extra": true })),
            &RenderHooks::none(),
        );

        let current = state.current().unwrap();
        assert_eq!(current["branches"], json!(["Khalidiya"]));
        assert_eq!(current["userEntries"], json!([{"note": "manual"}]));
        assert_eq!(current["extra"], json!(true));
    }

    #[test]
    fn test_merge_is_not_deep() {
        let mut state = DashboardState::new();
        state.publish(
            object(json!({ "branchNames": { "Hamdan": "A", "Khalidiya": "B" } })),
            &RenderHooks::none(),
        );
        state.publish(object(json!({ "branchNames": { "Hamdan": "C" } })), &RenderHooks::none());

        assert_eq!(state.current().unwrap()["branchNames"], json!({ "Hamdan": "C" }));
    }

    #[test]
    fn test_hooks_run_in_order() {
        let calls = Arc::new(Mutex::new(Vec::<String>::new()));
        let (a, b, c) = (calls.clone(), calls.clone(), calls.clone());
        let hooks = RenderHooks::none()
            .with_refresh(move || a.lock().unwrap().push("refresh".into()))
            .with_refresh_overview(move || b.lock().unwrap().push("overview".into()))
            .with_notify(move |msg, severity| {
                c.lock().unwrap().push(format!("{:?}: {}", severity, msg))
            });

        let mut state = DashboardState::new();
        state.publish(Map::new(), &hooks);

        let calls = calls.lock().unwrap();
        assert_eq!(calls[0], "refresh");
        assert_eq!(calls[1], "overview");
        assert_eq!(calls[2], format!("Success: {}", PUBLISHED_MESSAGE));
    }

    #[test]
    fn test_missing_hooks_are_skipped() {
        let calls = Arc::new(Mutex::new(0));
        let counter = calls.clone();
        let hooks = RenderHooks::none().with_refresh_overview(move || *counter.lock().unwrap() += 1);

        let mut state = DashboardState::new();
        state.publish(Map::new(), &hooks);
        state.publish(Map::new(), &hooks);

        assert_eq!(*calls.lock().unwrap(), 2);
        assert_eq!(format!("{:?}", hooks), "RenderHooks { refresh: false, refresh_overview: true, notify: false }");
    }

    #[test]
    fn test_model_view_reports_bad_shape() {
        let mut state = DashboardState::new();
        state.publish(object(json!({ "months": 12 })), &RenderHooks::none());
        assert!(state.model().unwrap().is_err());
    }
}
