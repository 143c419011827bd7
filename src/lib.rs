//! # ai-lib-instrument
//!
//! 这是 AI 模型调用的统一埋点运行时：生命周期事件、耗时统计、取消处理与多消费者流式输出。
//!
//! Call instrumentation runtime for asynchronous model functions (text generation,
//! embeddings, image generation, speech, transcription, tool calls).
//!
//! ## Overview
//!
//! Any unit of work, a single request/response call or a streaming request
//! producing many partial results, is wrapped with:
//!
//! - **Lifecycle events**: exactly one `started` and one `finished` event per call
//! - **Duration measurement**: monotonic elapsed time plus a wall-clock start timestamp
//! - **Cancellation**: a cancellation token in the [`ExecutionContext`] aborts the call
//! - **Observer isolation**: a failing observer never affects the call or other observers
//! - **Multi-consumer streaming**: streaming output is buffered in a [`BroadcastQueue`]
//!   so several readers can replay the same sequence independently
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ai_lib_instrument::executor::{CallExecutor, CallOptions};
//! use ai_lib_instrument::observers::LogFormat;
//! use ai_lib_instrument::types::{Delta, FunctionType};
//! use ai_lib_instrument::InstrumentationConfig;
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> ai_lib_instrument::Result<()> {
//!     let executor = CallExecutor::new(
//!         InstrumentationConfig::new().with_log_format(LogFormat::BasicText),
//!     );
//!
//!     let call = executor
//!         .execute_stream(
//!             CallOptions::new(FunctionType::StreamText),
//!             |_scope| async {
//!                 Ok(futures::stream::iter(vec![Delta::Value("Hello"), Delta::Value(" World")]))
//!             },
//!             |delta: &str| Some(delta.to_string()),
//!         )
//!         .await?;
//!
//!     // Two independent consumers of the same output.
//!     let mut first = call.stream();
//!     let second = call.output().collect().await?;
//!     while let Some(chunk) = first.next().await {
//!         print!("{}", chunk?);
//!     }
//!     assert_eq!(second.concat(), "Hello World");
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`executor`] | Standard and streaming call executors |
//! | [`queue`] | Multi-consumer broadcast queue |
//! | [`observers`] | Observer trait, event bus, logging observers |
//! | [`types`] | Call metadata, lifecycle events, deltas |
//! | [`context`] | Explicit execution context (run ids, cancellation) |
//! | [`config`] | Instrumentation configuration |
//! | [`utils`] | Duration measurement and guarded execution |

pub mod config;
pub mod context;
pub mod executor;
pub mod observers;
pub mod queue;
pub mod types;
pub mod utils;

// Re-export main types for convenience
pub use config::InstrumentationConfig;
pub use context::ExecutionContext;
pub use executor::{CallExecutor, CallOptions, CallOutput, CallResponse, CallScope, StreamCall};
pub use observers::{EventBus, LogFormat, Observer};
pub use queue::{BroadcastQueue, QueueHandle, QueueReader};
pub use types::{CallMetadata, CallResult, Delta, FunctionType, LifecycleEvent, Usage};
pub use utils::{DurationMeasurement, SafeResult};

use futures::Stream;
use std::pin::Pin;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// A unified pinned, boxed stream that emits `Result<T>`
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = Result<T>> + Send + 'a>>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
