//! 调用观察者模块：生命周期事件的分发、日志输出与收集。
//!
//! Observers and lifecycle event fan-out.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`Observer`] | Trait implemented by anything that wants lifecycle events |
//! | [`EventBus`] | Ordered fan-out with per-observer failure isolation |
//! | [`LogFormat`] | Selects the built-in logging observer |
//! | [`InMemoryObserver`] | Collects events, mostly for tests and run logs |
//! | [`FnObserver`] | Adapts a closure into an observer |

mod event_bus;
mod logging;
mod observer;

pub use event_bus::{default_error_handler, EventBus, ErrorHandler};
pub use logging::{
    clean_event, init_tracing, logger_for, BasicTextObserver, DetailedJsonObserver,
    DetailedObjectObserver, LogFormat, CALL_LOG_TARGET,
};
pub use observer::{FnObserver, InMemoryObserver, Observer};
