//! Explicit execution context passed into every call.

use crate::observers::{ErrorHandler, Observer};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Caller identity, cancellation, and extra observers for one or more calls.
///
/// Hosts that have their own notion of a "current run" build one of these at the
/// boundary and hand it to the executor; nothing inside the crate looks it up implicitly.
#[derive(Clone, Default)]
pub struct ExecutionContext {
    pub run_id: Option<String>,
    pub session_id: Option<String>,
    pub user_id: Option<String>,
    /// Set when the call is nested inside another instrumented call.
    pub parent_call_id: Option<String>,
    pub cancellation: Option<CancellationToken>,
    /// Overrides the configured error handler for observer failures.
    pub error_handler: Option<ErrorHandler>,
    /// Run-level observers, notified after global and before per-call observers.
    pub observers: Vec<Arc<dyn Observer>>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_parent_call_id(mut self, call_id: impl Into<String>) -> Self {
        self.parent_call_id = Some(call_id.into());
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn with_error_handler(mut self, handler: ErrorHandler) -> Self {
        self.error_handler = Some(handler);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observers.push(observer);
        self
    }
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("run_id", &self.run_id)
            .field("session_id", &self.session_id)
            .field("user_id", &self.user_id)
            .field("parent_call_id", &self.parent_call_id)
            .field("cancellable", &self.cancellation.is_some())
            .field("observers", &self.observers.len())
            .finish()
    }
}
