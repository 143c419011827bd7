use crate::{BoxStream, Error, Result};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::Poll;
use tokio::sync::Notify;

#[derive(Debug)]
enum Entry<T> {
    Value(T),
    Error(Error),
}

#[derive(Debug)]
struct State<T> {
    entries: Vec<Entry<T>>,
    closed: bool,
}

#[derive(Debug)]
struct Shared<T> {
    state: Mutex<State<T>>,
    wakeup: Notify,
}

impl<T> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        // State transitions are single assignments, so a poisoned guard is still consistent.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn append(&self, entry: Entry<T>, close: bool) -> Result<()> {
        {
            let mut state = self.lock();
            if state.closed {
                return Err(Error::QueueClosed);
            }
            state.entries.push(entry);
            state.closed = close;
        }
        self.wakeup.notify_waiters();
        Ok(())
    }

    fn close(&self) {
        {
            let mut state = self.lock();
            if state.closed {
                return;
            }
            state.closed = true;
        }
        self.wakeup.notify_waiters();
    }
}

/// Producer side of the queue.
///
/// Not `Clone`: the queue has a single logical producer. Hand out
/// [`QueueHandle`]s to consumers instead.
#[derive(Debug)]
pub struct BroadcastQueue<T> {
    shared: Arc<Shared<T>>,
}

impl<T> BroadcastQueue<T> {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    entries: Vec::new(),
                    closed: false,
                }),
                wakeup: Notify::new(),
            }),
        }
    }

    /// Append a value and wake every blocked reader.
    pub fn push(&self, value: T) -> Result<()> {
        self.shared.append(Entry::Value(value), false)
    }

    /// Append a terminal error; readers raise it after the values pushed before it.
    pub fn push_error(&self, error: Error) -> Result<()> {
        self.shared.append(Entry::Error(error), true)
    }

    /// Mark the queue closed. Calling it again is a no-op.
    pub fn close(&self) {
        self.shared.close();
    }

    pub fn is_closed(&self) -> bool {
        self.shared.lock().closed
    }

    /// Read-only handle for consumers.
    pub fn handle(&self) -> QueueHandle<T> {
        QueueHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Shortcut for `self.handle().reader()`.
    pub fn reader(&self) -> QueueReader<T> {
        self.handle().reader()
    }
}

impl<T> Default for BroadcastQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for BroadcastQueue<T> {
    fn drop(&mut self) {
        self.shared.close();
    }
}

/// Cloneable read-only view of a [`BroadcastQueue`].
#[derive(Debug)]
pub struct QueueHandle<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for QueueHandle<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> QueueHandle<T> {
    /// A fresh reader positioned at index 0.
    pub fn reader(&self) -> QueueReader<T> {
        QueueReader {
            shared: Arc::clone(&self.shared),
            cursor: 0,
        }
    }

    /// Number of buffered entries, including a terminal error.
    pub fn len(&self) -> usize {
        self.shared.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.shared.lock().closed
    }
}

impl<T: Clone + Send + 'static> QueueHandle<T> {
    /// A fresh reader adapted to a `Stream`.
    pub fn stream(&self) -> BoxStream<'static, T> {
        self.reader().into_stream()
    }

    /// Drain a fresh reader to the end, failing on a terminal error.
    pub async fn collect(&self) -> Result<Vec<T>> {
        let mut reader = self.reader();
        let mut values = Vec::new();
        while let Some(item) = reader.recv().await {
            values.push(item?);
        }
        Ok(values)
    }
}

/// One consumer's private cursor over the shared log.
#[derive(Debug)]
pub struct QueueReader<T> {
    shared: Arc<Shared<T>>,
    cursor: usize,
}

impl<T: Clone> QueueReader<T> {
    /// Read the entry at the cursor without waiting.
    ///
    /// `Pending` means the reader is at the tail of an open queue.
    pub fn try_recv(&mut self) -> Poll<Option<Result<T>>> {
        let state = self.shared.lock();
        match state.entries.get(self.cursor) {
            Some(entry) => {
                let item = match entry {
                    Entry::Value(value) => Ok(value.clone()),
                    Entry::Error(err) => Err(err.clone()),
                };
                self.cursor += 1;
                Poll::Ready(Some(item))
            }
            None if state.closed => Poll::Ready(None),
            None => Poll::Pending,
        }
    }

    /// Next entry, waiting if the reader is at the tail of an open queue.
    ///
    /// Returns `None` once the queue is closed and fully read, or after the
    /// terminal error has been yielded.
    pub async fn recv(&mut self) -> Option<Result<T>> {
        let shared = Arc::clone(&self.shared);
        loop {
            // Register interest before inspecting state so a push in between is not missed.
            let notified = shared.wakeup.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Poll::Ready(item) = self.try_recv() {
                return item;
            }
            notified.await;
        }
    }

    /// Position of the next entry this reader will yield.
    pub fn position(&self) -> usize {
        self.cursor
    }
}

impl<T: Clone + Send + 'static> QueueReader<T> {
    pub fn into_stream(self) -> BoxStream<'static, T> {
        Box::pin(futures::stream::unfold(self, |mut reader| async move {
            reader.recv().await.map(|item| (item, reader))
        }))
    }
}
