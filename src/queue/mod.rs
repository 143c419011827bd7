//! 多消费者广播队列：单生产者追加、多个独立消费者从头重放。
//!
//! # Broadcast Queue
//!
//! An unbounded, append-only, multi-consumer asynchronous sequence. One producer
//! pushes values, an optional terminal error, and a close signal; any number of
//! readers iterate the shared log from index 0 and all observe the same ordered
//! sequence, no matter when they attach.
//!
//! ## Layout
//!
//! ```text
//!  BroadcastQueue (producer) ──push──► [ v0 | v1 | v2 | err? ]  closed
//!                                        ▲          ▲
//!                         QueueReader A ─┘          │ cursor
//!                         QueueReader B ────────────┘ cursor
//! ```
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`BroadcastQueue`] | Producer handle: `push`, `push_error`, `close` |
//! | [`QueueHandle`] | Read-only, cloneable handle given to downstream code |
//! | [`QueueReader`] | Private cursor over the shared log |
//!
//! ## Semantics
//!
//! - `push` on a closed queue fails with [`Error::QueueClosed`](crate::Error::QueueClosed).
//! - `push_error` appends a terminal error and closes the queue.
//! - `close` is idempotent; buffered values stay readable after it.
//! - A reader blocked at the tail wakes on the next push, error, or close. All blocked
//!   readers wake on the same event.
//! - Dropping a reader only discards its cursor; the log and other readers are untouched.
//! - Dropping the producer closes the queue so readers never wait forever.

mod broadcast;

#[cfg(test)]
mod tests;

pub use broadcast::{BroadcastQueue, QueueHandle, QueueReader};
