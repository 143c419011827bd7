use super::{BroadcastQueue, QueueHandle};
use crate::Error;
use futures::StreamExt;
use std::task::Poll;
use tokio_test::{assert_pending, assert_ready, task};

async fn drain(handle: &QueueHandle<u32>) -> (Vec<u32>, Option<Error>) {
    let mut reader = handle.reader();
    let mut values = Vec::new();
    while let Some(item) = reader.recv().await {
        match item {
            Ok(v) => values.push(v),
            Err(e) => return (values, Some(e)),
        }
    }
    (values, None)
}

#[tokio::test]
async fn readers_attached_at_any_time_see_every_value() {
    let queue = BroadcastQueue::new();
    let handle = queue.handle();

    let early = tokio::spawn({
        let handle = handle.clone();
        async move { drain(&handle).await }
    });

    queue.push(1).unwrap();
    queue.push(2).unwrap();
    let middle = tokio::spawn({
        let handle = handle.clone();
        async move { drain(&handle).await }
    });
    queue.push(3).unwrap();
    queue.close();

    let (late_values, late_err) = drain(&handle).await;
    let (early_values, early_err) = early.await.unwrap();
    let (middle_values, middle_err) = middle.await.unwrap();

    assert_eq!(early_values, vec![1, 2, 3]);
    assert_eq!(middle_values, vec![1, 2, 3]);
    assert_eq!(late_values, vec![1, 2, 3]);
    assert!(early_err.is_none() && middle_err.is_none() && late_err.is_none());
}

#[test]
fn push_after_close_fails_and_close_is_idempotent() {
    let queue = BroadcastQueue::new();
    queue.push("a").unwrap();
    queue.close();
    queue.close();
    queue.close();

    assert!(matches!(queue.push("b"), Err(Error::QueueClosed)));
    assert!(matches!(
        queue.push_error(Error::cancelled()),
        Err(Error::QueueClosed)
    ));
    assert!(queue.is_closed());
    assert_eq!(queue.handle().len(), 1);
}

#[tokio::test]
async fn error_follows_values_pushed_before_it() {
    let queue = BroadcastQueue::new();
    let handle = queue.handle();
    queue.push(10).unwrap();
    queue.push(20).unwrap();
    queue
        .push_error(Error::runtime_with_context("stream broke", Default::default()))
        .unwrap();

    assert!(matches!(queue.push(30), Err(Error::QueueClosed)));

    for _ in 0..2 {
        let (values, err) = drain(&handle).await;
        assert_eq!(values, vec![10, 20]);
        assert_eq!(err.unwrap().to_string(), "Runtime error: stream broke");
    }
}

#[test]
fn reader_ends_after_yielding_the_error() {
    let queue = BroadcastQueue::<u32>::new();
    let mut reader = queue.reader();
    queue.push_error(Error::cancelled()).unwrap();

    assert!(matches!(reader.try_recv(), Poll::Ready(Some(Err(e))) if e.is_cancelled()));
    assert!(matches!(reader.try_recv(), Poll::Ready(None)));
    assert!(matches!(reader.try_recv(), Poll::Ready(None)));
}

#[test]
fn blocked_readers_wake_on_push() {
    let queue = BroadcastQueue::new();
    let mut a = queue.reader();
    let mut b = queue.reader();

    let mut recv_a = task::spawn(a.recv());
    let mut recv_b = task::spawn(b.recv());
    assert_pending!(recv_a.poll());
    assert_pending!(recv_b.poll());

    queue.push(42).unwrap();
    assert!(recv_a.is_woken());
    assert!(recv_b.is_woken());

    let item_a = assert_ready!(recv_a.poll());
    let item_b = assert_ready!(recv_b.poll());
    assert_eq!(item_a.unwrap().unwrap(), 42);
    assert_eq!(item_b.unwrap().unwrap(), 42);
}

#[test]
fn blocked_reader_wakes_on_close_with_end_of_sequence() {
    let queue = BroadcastQueue::<u32>::new();
    let mut reader = queue.reader();
    let mut recv = task::spawn(reader.recv());
    assert_pending!(recv.poll());

    queue.close();
    assert!(recv.is_woken());
    assert!(assert_ready!(recv.poll()).is_none());
}

#[test]
fn blocked_reader_wakes_on_error() {
    let queue = BroadcastQueue::<u32>::new();
    let mut reader = queue.reader();
    let mut recv = task::spawn(reader.recv());
    assert_pending!(recv.poll());

    queue.push_error(Error::QueueClosed).unwrap();
    assert!(recv.is_woken());
    let item = assert_ready!(recv.poll());
    assert!(matches!(item, Some(Err(Error::QueueClosed))));
}

#[tokio::test]
async fn dropping_a_reader_midway_leaves_others_intact() {
    let queue = BroadcastQueue::new();
    let handle = queue.handle();
    for i in 0..5 {
        queue.push(i).unwrap();
    }

    {
        let mut quitter = handle.reader();
        assert_eq!(quitter.recv().await.unwrap().unwrap(), 0);
        assert_eq!(quitter.position(), 1);
    }

    // A consumer task that panics mid-iteration must not affect the queue either.
    let panicking = tokio::spawn({
        let handle = handle.clone();
        async move {
            let mut reader = handle.reader();
            let _ = reader.recv().await;
            panic!("consumer failure");
        }
    });
    assert!(panicking.await.is_err());

    queue.push(5).unwrap();
    queue.close();
    let (values, err) = drain(&handle).await;
    assert_eq!(values, vec![0, 1, 2, 3, 4, 5]);
    assert!(err.is_none());
}

#[tokio::test]
async fn concurrent_attach_and_push_delivers_each_value_once() {
    let queue = BroadcastQueue::new();
    let handle = queue.handle();

    let producer = tokio::spawn(async move {
        for i in 0..500u32 {
            queue.push(i).unwrap();
            if i % 50 == 0 {
                tokio::task::yield_now().await;
            }
        }
        queue.close();
    });

    let mut consumers = Vec::new();
    for _ in 0..8 {
        let handle = handle.clone();
        consumers.push(tokio::spawn(async move {
            tokio::task::yield_now().await;
            handle.stream().map(|r| r.unwrap()).collect::<Vec<_>>().await
        }));
    }

    producer.await.unwrap();
    let expected: Vec<u32> = (0..500).collect();
    for consumer in consumers {
        assert_eq!(consumer.await.unwrap(), expected);
    }
}

#[tokio::test]
async fn dropping_the_producer_closes_the_queue() {
    let queue = BroadcastQueue::new();
    let handle = queue.handle();
    queue.push("only").unwrap();
    drop(queue);

    assert!(handle.is_closed());
    assert_eq!(handle.collect().await.unwrap(), vec!["only"]);
}

#[tokio::test]
async fn collect_surfaces_the_terminal_error() {
    let queue = BroadcastQueue::new();
    queue.push(1u32).unwrap();
    queue.push_error(Error::cancelled()).unwrap();

    let err = queue.handle().collect().await.unwrap_err();
    assert!(err.is_cancelled());
}
