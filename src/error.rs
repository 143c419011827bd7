use std::sync::Arc;
use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ErrorContext {
    /// Field path or configuration key that caused the error (e.g., "log_format")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected value, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "event_bus", "stream_executor")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Opaque failure raised by a provider client or any other wrapped unit of work.
pub type UpstreamError = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Unified error type for the instrumentation runtime.
///
/// `Error` is cheap to clone: non-clone sources live behind an `Arc`, so one failure
/// can be recorded in a lifecycle event, replayed to every queue consumer, and handed
/// back to the caller without losing its identity.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// The call was aborted through its cancellation signal.
    #[error("Call cancelled{}", .reason.as_ref().map(|r| format!(": {}", r)).unwrap_or_default())]
    Cancelled { reason: Option<String> },

    #[error("Broadcast queue is closed")]
    QueueClosed,

    #[error("Upstream error: {0}")]
    Upstream(UpstreamError),

    #[error("Observer '{observer}' failed: {message}")]
    Observer { observer: String, message: String },

    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Runtime error: {message}{}", format_context(.context))]
    Runtime {
        message: String,
        context: ErrorContext,
    },

    #[error("Serialization error: {0}")]
    Serialization(Arc<serde_json::Error>),
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    /// Cancellation without a reason.
    pub fn cancelled() -> Self {
        Error::Cancelled { reason: None }
    }

    pub fn cancelled_with_reason(reason: impl Into<String>) -> Self {
        Error::Cancelled {
            reason: Some(reason.into()),
        }
    }

    /// Wrap an arbitrary provider/collaborator error.
    pub fn upstream<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Upstream(Arc::new(err))
    }

    /// Create a new runtime error with structured context
    pub fn runtime_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Runtime {
            message: msg.into(),
            context,
        }
    }

    /// Create a new configuration error with structured context
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    /// True if this error is the dedicated cancellation kind.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled { .. })
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. } | Error::Runtime { context, .. } => Some(context),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(Arc::new(err))
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        // anyhow already owns the chain; keep it intact behind the Arc.
        Error::Upstream(Arc::from(Box::<dyn std::error::Error + Send + Sync>::from(err)))
    }
}
