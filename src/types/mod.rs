//! Core type definitions: call metadata, lifecycle events, stream deltas.

pub mod delta;
pub mod events;
pub mod metadata;

pub use delta::Delta;
pub use events::{CallResult, LifecycleEvent, Usage};
pub use metadata::{CallMetadata, FunctionType};
