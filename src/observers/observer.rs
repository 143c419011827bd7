use crate::types::{CallResult, LifecycleEvent};
use crate::Result;
use std::sync::{PoisonError, RwLock};

/// Receives lifecycle events.
///
/// Implementations may fail or even panic; the [`EventBus`](super::EventBus)
/// isolates each observer and routes the failure to its error handler.
pub trait Observer: Send + Sync {
    fn on_event(&self, event: &LifecycleEvent) -> Result<()>;

    /// Name used when reporting this observer's failures.
    fn name(&self) -> &str {
        "observer"
    }
}

/// Closure-backed observer.
pub struct FnObserver<F> {
    name: String,
    func: F,
}

impl<F> FnObserver<F>
where
    F: Fn(&LifecycleEvent) -> Result<()> + Send + Sync,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Observer for FnObserver<F>
where
    F: Fn(&LifecycleEvent) -> Result<()> + Send + Sync,
{
    fn on_event(&self, event: &LifecycleEvent) -> Result<()> {
        (self.func)(event)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Observer that keeps every event it receives.
#[derive(Default)]
pub struct InMemoryObserver {
    events: RwLock<Vec<LifecycleEvent>>,
}

impl InMemoryObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_events(&self) -> Vec<LifecycleEvent> {
        self.events
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn events_for_call(&self, call_id: &str) -> Vec<LifecycleEvent> {
        self.events
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|e| e.call_id() == call_id)
            .cloned()
            .collect()
    }

    pub fn started_count(&self) -> usize {
        self.count(LifecycleEvent::is_started)
    }

    pub fn finished_count(&self) -> usize {
        self.count(LifecycleEvent::is_finished)
    }

    /// Outcomes of all recorded `finished` events, in arrival order.
    pub fn results(&self) -> Vec<CallResult> {
        self.events
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter_map(|e| e.result().cloned())
            .collect()
    }

    pub fn clear(&self) {
        self.events
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.events.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn count(&self, pred: fn(&LifecycleEvent) -> bool) -> usize {
        self.events
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|e| pred(e))
            .count()
    }
}

impl Observer for InMemoryObserver {
    fn on_event(&self, event: &LifecycleEvent) -> Result<()> {
        self.events
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}
