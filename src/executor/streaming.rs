//! Streaming calls republished through a broadcast queue.

use super::{CallExecutor, CallOptions, CallScope, PreparedCall};
use crate::queue::{BroadcastQueue, QueueHandle, QueueReader};
use crate::types::{CallMetadata, CallResult, Delta};
use crate::utils::safe::{run_safe_with_cancel, SafeResult};
use crate::{BoxStream, Error, ErrorContext, Result};
use futures::{FutureExt, Stream, StreamExt};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tokio_util::sync::CancellationToken;

/// A running streaming call.
///
/// The output is buffered in a broadcast queue, so any number of consumers can
/// read the full sequence independently via [`reader`](Self::reader) or
/// [`stream`](Self::stream).
#[derive(Debug, Clone)]
pub struct StreamCall<T> {
    output: QueueHandle<T>,
    metadata: CallMetadata,
}

impl<T> StreamCall<T> {
    pub fn metadata(&self) -> &CallMetadata {
        &self.metadata
    }

    pub fn call_id(&self) -> &str {
        &self.metadata.call_id
    }

    pub fn output(&self) -> &QueueHandle<T> {
        &self.output
    }

    pub fn reader(&self) -> QueueReader<T> {
        self.output.reader()
    }
}

impl<T: Clone + Send + 'static> StreamCall<T> {
    pub fn stream(&self) -> BoxStream<'static, T> {
        self.output.stream()
    }
}

impl CallExecutor {
    /// Start a streaming call.
    ///
    /// `start` opens the raw delta stream. A failure to open it finishes the call
    /// immediately and is returned. Otherwise the output handle is returned right
    /// away while a background task drains the raw stream: each delta goes through
    /// `transform`, and `Some` results are pushed to the output (`None` skips the
    /// delta).
    pub async fn execute_stream<D, T, F, Fut, S, M>(
        &self,
        options: CallOptions,
        start: F,
        transform: M,
    ) -> Result<StreamCall<T>>
    where
        D: Send + 'static,
        T: Clone + Send + 'static,
        F: FnOnce(CallScope) -> Fut,
        Fut: Future<Output = Result<S>>,
        S: Stream<Item = Delta<D>> + Send + 'static,
        M: FnMut(D) -> Option<T> + Send + 'static,
    {
        self.start_stream(options, start, transform, None::<fn() -> Option<T>>)
            .await
    }

    /// Like [`execute_stream`](Self::execute_stream); after graceful exhaustion,
    /// `on_completion` runs once and its `Some` result is pushed as the last value.
    pub async fn execute_stream_with_completion<D, T, F, Fut, S, M, C>(
        &self,
        options: CallOptions,
        start: F,
        transform: M,
        on_completion: C,
    ) -> Result<StreamCall<T>>
    where
        D: Send + 'static,
        T: Clone + Send + 'static,
        F: FnOnce(CallScope) -> Fut,
        Fut: Future<Output = Result<S>>,
        S: Stream<Item = Delta<D>> + Send + 'static,
        M: FnMut(D) -> Option<T> + Send + 'static,
        C: FnOnce() -> Option<T> + Send + 'static,
    {
        self.start_stream(options, start, transform, Some(on_completion))
            .await
    }

    async fn start_stream<D, T, F, Fut, S, M, C>(
        &self,
        options: CallOptions,
        start: F,
        transform: M,
        on_completion: Option<C>,
    ) -> Result<StreamCall<T>>
    where
        D: Send + 'static,
        T: Clone + Send + 'static,
        F: FnOnce(CallScope) -> Fut,
        Fut: Future<Output = Result<S>>,
        S: Stream<Item = Delta<D>> + Send + 'static,
        M: FnMut(D) -> Option<T> + Send + 'static,
        C: FnOnce() -> Option<T> + Send + 'static,
    {
        let mut call = self.prepare(options);
        call.emit_started();

        let outcome =
            run_safe_with_cancel(start(call.scope.clone()), call.cancellation.as_ref()).await;
        let raw = match outcome {
            SafeResult::Ok(raw) => raw,
            SafeResult::Cancelled(err) => {
                call.emit_finished(CallResult::Abort);
                return Err(err);
            }
            SafeResult::Failed(err) => {
                call.emit_finished(CallResult::Error { error: err.clone() });
                return Err(err);
            }
        };

        let queue = BroadcastQueue::new();
        let stream_call = StreamCall {
            output: queue.handle(),
            metadata: call.metadata.clone(),
        };

        let task = StreamTask { call, queue };
        tokio::spawn(task.run(raw, transform, on_completion));

        Ok(stream_call)
    }
}

/// Background producer for one streaming call.
///
/// If the task is dropped before the call finished (runtime shutdown, abort),
/// `Drop` finishes the call as aborted and fails the queue.
struct StreamTask<T> {
    call: PreparedCall,
    queue: BroadcastQueue<T>,
}

impl<T: Clone + Send + 'static> StreamTask<T> {
    async fn run<D, S, M, C>(mut self, raw: S, transform: M, on_completion: Option<C>)
    where
        S: Stream<Item = Delta<D>> + Send + 'static,
        M: FnMut(D) -> Option<T> + Send + 'static,
        C: FnOnce() -> Option<T> + Send + 'static,
    {
        let cancellation = self.call.cancellation.clone();
        let pumped = AssertUnwindSafe(pump(
            &self.queue,
            raw,
            transform,
            on_completion,
            cancellation,
        ))
        .catch_unwind()
        .await;

        match pumped {
            Ok(Ok(())) => self.complete(),
            Ok(Err(err)) => self.fail(err),
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "panic".to_string());
                self.fail(Error::runtime_with_context(
                    format!("stream processing panicked: {}", message),
                    ErrorContext::new().with_source("stream_executor"),
                ));
            }
        }
    }
}

impl<T> StreamTask<T> {
    fn complete(&mut self) {
        self.call.emit_finished(CallResult::Success {
            value: None,
            raw_response: None,
            usage: None,
        });
        self.queue.close();
    }

    fn fail(&mut self, err: Error) {
        self.call.emit_finished(CallResult::from_error(err.clone()));
        // Only this task pushes to the queue, so it is still open here.
        let _ = self.queue.push_error(err);
    }
}

impl<T> Drop for StreamTask<T> {
    fn drop(&mut self) {
        if !self.call.is_finished() {
            self.fail(Error::cancelled_with_reason("stream task dropped"));
        }
    }
}

async fn pump<D, T, S, M, C>(
    queue: &BroadcastQueue<T>,
    raw: S,
    mut transform: M,
    on_completion: Option<C>,
    cancellation: Option<CancellationToken>,
) -> Result<()>
where
    S: Stream<Item = Delta<D>>,
    M: FnMut(D) -> Option<T>,
    C: FnOnce() -> Option<T>,
{
    let mut raw = Box::pin(raw);
    loop {
        let next = match &cancellation {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => return Err(Error::cancelled()),
                    item = raw.next() => item,
                }
            }
            None => raw.next().await,
        };

        match next {
            Some(Delta::Value(delta)) => {
                if let Some(value) = transform(delta) {
                    queue.push(value)?;
                }
            }
            Some(Delta::Error(err)) => return Err(err),
            None => break,
        }
    }

    if let Some(on_completion) = on_completion {
        if let Some(value) = on_completion() {
            queue.push(value)?;
        }
    }
    Ok(())
}
