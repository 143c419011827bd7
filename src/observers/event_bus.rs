use super::Observer;
use crate::types::LifecycleEvent;
use crate::Error;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Fallback sink for observer failures.
pub type ErrorHandler = Arc<dyn Fn(&Error) + Send + Sync>;

/// Error handler that logs observer failures at `warn`.
pub fn default_error_handler() -> ErrorHandler {
    Arc::new(|err: &Error| {
        tracing::warn!(error = %err, "lifecycle observer failed");
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_string()
    }
}

/// Delivers lifecycle events to an ordered list of observers.
///
/// Every observer gets every event, in list order. A failing or panicking
/// observer is reported to the error handler and skipped; it never reaches the
/// emitting call.
#[derive(Clone)]
pub struct EventBus {
    observers: Vec<Arc<dyn Observer>>,
    error_handler: ErrorHandler,
}

impl EventBus {
    pub fn new(observers: Vec<Arc<dyn Observer>>, error_handler: ErrorHandler) -> Self {
        Self {
            observers,
            error_handler,
        }
    }

    pub fn notify(&self, event: &LifecycleEvent) {
        for observer in &self.observers {
            match catch_unwind(AssertUnwindSafe(|| observer.on_event(event))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => self.report(&err),
                Err(payload) => self.report(&Error::Observer {
                    observer: observer.name().to_string(),
                    message: panic_message(payload.as_ref()),
                }),
            }
        }
    }

    fn report(&self, err: &Error) {
        if catch_unwind(AssertUnwindSafe(|| (self.error_handler)(err))).is_err() {
            tracing::error!(error = %err, "observer error handler panicked");
        }
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field(
                "observers",
                &self.observers.iter().map(|o| o.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
