//! Single-result calls.

use super::{CallExecutor, CallOptions, CallScope};
use crate::types::{CallMetadata, CallResult, FunctionType, Usage};
use crate::utils::safe::{run_safe_with_cancel, SafeResult};
use crate::{Error, Result};
use serde::Serialize;
use serde_json::Value;
use std::future::Future;

/// What a unit of work returns: the extracted value plus provider details.
#[derive(Debug, Clone)]
pub struct CallOutput<T> {
    pub value: T,
    pub raw_response: Option<Value>,
    pub usage: Option<Usage>,
}

impl<T> CallOutput<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            raw_response: None,
            usage: None,
        }
    }

    pub fn with_raw_response(mut self, raw: Value) -> Self {
        self.raw_response = Some(raw);
        self
    }

    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = Some(usage);
        self
    }
}

/// Full response of an instrumented call.
#[derive(Debug, Clone)]
pub struct CallResponse<T> {
    pub value: T,
    pub raw_response: Option<Value>,
    pub usage: Option<Usage>,
    pub metadata: CallMetadata,
}

impl<T> CallResponse<T> {
    pub fn into_value(self) -> T {
        self.value
    }
}

impl CallExecutor {
    /// Run one non-streaming unit of work.
    ///
    /// Emits `started`, awaits `work`, emits exactly one `finished`, then returns
    /// the value or re-raises. Failures and cancellations come back as the same
    /// error value the unit of work produced; a fired context token comes back as
    /// [`Error::Cancelled`]. Dropping the returned future finishes the call as `abort`.
    pub async fn execute<T, F, Fut>(&self, options: CallOptions, work: F) -> Result<CallResponse<T>>
    where
        T: Serialize,
        F: FnOnce(CallScope) -> Fut,
        Fut: Future<Output = Result<CallOutput<T>>>,
    {
        self.run_call(options, work, |value: &T, call_id: &str| {
            match serde_json::to_value(value) {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!(
                        call_id = %call_id,
                        error = %e,
                        "call value is not serializable; omitted from finished event"
                    );
                    None
                }
            }
        })
        .await
    }

    /// Like [`execute`](Self::execute) for values with no JSON form (handles,
    /// streams, clients). The `finished` event records success without a value.
    pub async fn execute_opaque<T, F, Fut>(
        &self,
        options: CallOptions,
        work: F,
    ) -> Result<CallResponse<T>>
    where
        F: FnOnce(CallScope) -> Fut,
        Fut: Future<Output = Result<CallOutput<T>>>,
    {
        self.run_call(options, work, |_: &T, _: &str| None).await
    }

    async fn run_call<T, F, Fut, V>(
        &self,
        options: CallOptions,
        work: F,
        snapshot: V,
    ) -> Result<CallResponse<T>>
    where
        F: FnOnce(CallScope) -> Fut,
        Fut: Future<Output = Result<CallOutput<T>>>,
        V: FnOnce(&T, &str) -> Option<Value>,
    {
        let mut call = self.prepare(options);
        call.emit_started();

        let outcome =
            run_safe_with_cancel(work(call.scope.clone()), call.cancellation.as_ref()).await;
        match outcome {
            SafeResult::Ok(output) => {
                let value = snapshot(&output.value, &call.metadata.call_id);
                call.emit_finished(CallResult::Success {
                    value,
                    raw_response: output.raw_response.clone(),
                    usage: output.usage.clone(),
                });
                Ok(CallResponse {
                    value: output.value,
                    raw_response: output.raw_response,
                    usage: output.usage,
                    metadata: call.metadata.clone(),
                })
            }
            SafeResult::Cancelled(err) => {
                call.emit_finished(CallResult::Abort);
                Err(err)
            }
            SafeResult::Failed(err) => {
                call.emit_finished(CallResult::Error { error: err.clone() });
                Err(err)
            }
        }
    }

    /// Instrument a plain async function (`execute-function`) and return its value.
    pub async fn execute_function<T, F, Fut>(
        &self,
        function_id: impl Into<String>,
        input: Value,
        context: Option<crate::context::ExecutionContext>,
        function: F,
    ) -> Result<T>
    where
        T: Serialize,
        F: FnOnce(CallScope) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut options = CallOptions::new(FunctionType::ExecuteFunction)
            .with_function_id(function_id)
            .with_input(input);
        options.context = context;

        let response = self
            .execute(options, |scope| async move {
                function(scope).await.map(CallOutput::new)
            })
            .await?;
        Ok(response.into_value())
    }
}
