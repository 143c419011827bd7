//! 调用执行器：为单次调用与流式调用统一生成生命周期事件、计时与取消处理。
//!
//! # Call Executors
//!
//! [`CallExecutor`] wraps a unit of work with the call lifecycle:
//!
//! ```text
//! idle → started → { succeeded | failed | aborted } → done            (execute)
//! idle → started → streaming → { completed | upstream-error | aborted } → done   (execute_stream)
//! ```
//!
//! Every call publishes exactly one `started` and one `finished` event through an
//! [`EventBus`]. Observers are assembled per call in this order:
//!
//! 1. the logging observer selected by the configured [`LogFormat`](crate::observers::LogFormat)
//! 2. observers from the [`InstrumentationConfig`]
//! 3. observers from the call's [`ExecutionContext`]
//! 4. observers from the [`CallOptions`]
//!
//! ## Example
//!
//! ```rust,no_run
//! use ai_lib_instrument::executor::{CallExecutor, CallOptions, CallOutput};
//! use ai_lib_instrument::types::FunctionType;
//! use ai_lib_instrument::InstrumentationConfig;
//!
//! # async fn demo() -> ai_lib_instrument::Result<()> {
//! let executor = CallExecutor::new(InstrumentationConfig::from_env()?);
//! let embedding = executor
//!     .execute(CallOptions::new(FunctionType::Embed), |_scope| async move {
//!         Ok(CallOutput::new(vec![0.1_f32, 0.2, 0.3]))
//!     })
//!     .await?
//!     .into_value();
//! # let _ = embedding;
//! # Ok(())
//! # }
//! ```

mod standard;
mod streaming;

pub use standard::{CallOutput, CallResponse};
pub use streaming::StreamCall;

use crate::config::InstrumentationConfig;
use crate::context::ExecutionContext;
use crate::observers::{logger_for, EventBus, Observer};
use crate::types::metadata::new_call_id;
use crate::types::{CallMetadata, CallResult, FunctionType, LifecycleEvent};
use crate::utils::duration::{epoch_millis, DurationMeasurement};
use serde_json::Value;
use std::sync::Arc;
use std::time::SystemTime;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Per-call options.
#[derive(Clone)]
pub struct CallOptions {
    pub function_type: FunctionType,
    pub function_id: Option<String>,
    pub input: Value,
    /// Model settings snapshot recorded in the metadata.
    pub settings: Value,
    pub observers: Vec<Arc<dyn Observer>>,
    pub context: Option<ExecutionContext>,
}

impl CallOptions {
    pub fn new(function_type: FunctionType) -> Self {
        Self {
            function_type,
            function_id: None,
            input: Value::Null,
            settings: Value::Null,
            observers: Vec::new(),
            context: None,
        }
    }

    pub fn with_function_id(mut self, id: impl Into<String>) -> Self {
        self.function_id = Some(id.into());
        self
    }

    pub fn with_input(mut self, input: Value) -> Self {
        self.input = input;
        self
    }

    pub fn with_settings(mut self, settings: Value) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn with_context(mut self, context: ExecutionContext) -> Self {
        self.context = Some(context);
        self
    }
}

impl std::fmt::Debug for CallOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallOptions")
            .field("function_type", &self.function_type)
            .field("function_id", &self.function_id)
            .field("observers", &self.observers.len())
            .field("context", &self.context)
            .finish()
    }
}

/// Handed to the unit of work: who it is, and how it gets cancelled.
#[derive(Clone, Debug)]
pub struct CallScope {
    metadata: Arc<CallMetadata>,
    cancellation: CancellationToken,
    context: ExecutionContext,
}

impl CallScope {
    pub fn metadata(&self) -> &CallMetadata {
        &self.metadata
    }

    pub fn call_id(&self) -> &str {
        &self.metadata.call_id
    }

    /// Fires when the caller's context is cancelled.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Context for calls nested inside this one.
    pub fn child_context(&self) -> ExecutionContext {
        let mut child = self.context.clone();
        child.parent_call_id = Some(self.metadata.call_id.clone());
        child.cancellation = Some(self.cancellation.child_token());
        child
    }
}

/// A started call: its bus, metadata, and timer.
///
/// Emits at most one `finished` event. Dropping a started call that never finished
/// (the caller dropped the `execute` future, a task was aborted) emits `abort`.
pub(crate) struct PreparedCall {
    bus: EventBus,
    metadata: CallMetadata,
    timer: DurationMeasurement,
    cancellation: Option<CancellationToken>,
    scope: CallScope,
    started: bool,
    finished: bool,
}

impl PreparedCall {
    fn emit_started(&mut self) {
        debug!(
            call_id = %self.metadata.call_id,
            function_type = %self.metadata.function_type,
            "call started"
        );
        self.started = true;
        self.bus.notify(&LifecycleEvent::Started {
            metadata: self.metadata.clone(),
            timestamp_ms: self.timer.start_timestamp_ms(),
        });
    }

    fn emit_finished(&mut self, result: CallResult) {
        if self.finished {
            return;
        }
        self.finished = true;
        let duration_ms = self.timer.elapsed_ms();
        debug!(
            call_id = %self.metadata.call_id,
            status = result.status(),
            duration_ms,
            "call finished"
        );
        self.bus.notify(&LifecycleEvent::Finished {
            metadata: self.metadata.clone(),
            finished_at_ms: epoch_millis(SystemTime::now()),
            duration_ms,
            result,
        });
    }

    fn is_finished(&self) -> bool {
        self.finished
    }
}

impl Drop for PreparedCall {
    fn drop(&mut self) {
        if self.started && !self.finished {
            debug!(call_id = %self.metadata.call_id, "call dropped before finishing");
            self.emit_finished(CallResult::Abort);
        }
    }
}

/// Runs units of work with uniform lifecycle instrumentation.
#[derive(Clone, Debug)]
pub struct CallExecutor {
    config: Arc<InstrumentationConfig>,
}

impl CallExecutor {
    pub fn new(config: InstrumentationConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Executor over the process-wide default configuration.
    pub fn from_global() -> Self {
        Self {
            config: crate::config::global(),
        }
    }

    pub fn config(&self) -> &InstrumentationConfig {
        &self.config
    }

    fn prepare(&self, options: CallOptions) -> PreparedCall {
        let context = options.context.unwrap_or_default();

        let mut observers: Vec<Arc<dyn Observer>> = Vec::new();
        observers.extend(logger_for(self.config.log_format));
        observers.extend(self.config.observers.iter().cloned());
        observers.extend(context.observers.iter().cloned());
        observers.extend(options.observers);

        let error_handler = context
            .error_handler
            .clone()
            .unwrap_or_else(|| self.config.error_handler.clone());

        let timer = DurationMeasurement::start();
        let metadata = CallMetadata {
            call_id: new_call_id(),
            parent_call_id: context.parent_call_id.clone(),
            run_id: context.run_id.clone(),
            session_id: context.session_id.clone(),
            user_id: context.user_id.clone(),
            function_id: options.function_id,
            function_type: options.function_type,
            input: options.input,
            settings: options.settings,
            started_at_ms: timer.start_timestamp_ms(),
        };

        let cancellation = context.cancellation.clone();
        let scope = CallScope {
            metadata: Arc::new(metadata.clone()),
            cancellation: cancellation
                .as_ref()
                .map(CancellationToken::child_token)
                .unwrap_or_default(),
            context,
        };

        PreparedCall {
            bus: EventBus::new(observers, error_handler),
            metadata,
            timer,
            cancellation,
            scope,
            started: false,
            finished: false,
        }
    }
}

impl Default for CallExecutor {
    fn default() -> Self {
        Self::new(InstrumentationConfig::default())
    }
}
