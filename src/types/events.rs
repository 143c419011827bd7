//! Lifecycle events published for every instrumented call.

use super::metadata::CallMetadata;
use crate::Error;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// Token usage reported by a provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_tokens: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_tokens: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u64>,
}

fn serialize_error<S: Serializer>(error: &Error, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&error.to_string())
}

/// Outcome carried by a `finished` event.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CallResult {
    Success {
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        raw_response: Option<Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        usage: Option<Usage>,
    },
    Error {
        #[serde(serialize_with = "serialize_error")]
        error: Error,
    },
    Abort,
}

impl CallResult {
    pub fn status(&self) -> &'static str {
        match self {
            CallResult::Success { .. } => "success",
            CallResult::Error { .. } => "error",
            CallResult::Abort => "abort",
        }
    }

    /// `Abort` for cancellation, `Error` otherwise.
    pub fn from_error(error: Error) -> Self {
        if error.is_cancelled() {
            CallResult::Abort
        } else {
            CallResult::Error { error }
        }
    }
}

/// A `started` or `finished` notification.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum LifecycleEvent {
    Started {
        metadata: CallMetadata,
        timestamp_ms: u64,
    },
    Finished {
        metadata: CallMetadata,
        finished_at_ms: u64,
        duration_ms: u64,
        result: CallResult,
    },
}

impl LifecycleEvent {
    pub fn metadata(&self) -> &CallMetadata {
        match self {
            LifecycleEvent::Started { metadata, .. } | LifecycleEvent::Finished { metadata, .. } => {
                metadata
            }
        }
    }

    pub fn call_id(&self) -> &str {
        &self.metadata().call_id
    }

    pub fn is_started(&self) -> bool {
        matches!(self, LifecycleEvent::Started { .. })
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, LifecycleEvent::Finished { .. })
    }

    /// Outcome of a `finished` event; `None` for `started`.
    pub fn result(&self) -> Option<&CallResult> {
        match self {
            LifecycleEvent::Finished { result, .. } => Some(result),
            LifecycleEvent::Started { .. } => None,
        }
    }
}
