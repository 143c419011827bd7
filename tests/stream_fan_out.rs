use ai_lib_instrument::executor::{CallExecutor, CallOptions};
use ai_lib_instrument::types::{Delta, FunctionType};
use ai_lib_instrument::Error;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn consumers_attached_during_streaming_see_identical_output() {
    let (tx, rx) = mpsc::unbounded_channel::<Delta<u32>>();

    let call = CallExecutor::default()
        .execute_stream(
            CallOptions::new(FunctionType::StreamText),
            |_scope| async move { Ok(UnboundedReceiverStream::new(rx)) },
            // Odd deltas are control frames.
            |d: u32| (d % 2 == 0).then_some(d),
        )
        .await
        .unwrap();

    let mut consumers = Vec::new();
    for i in 0..200u32 {
        tx.send(Delta::Value(i)).unwrap();
        if i % 40 == 0 {
            let stream = call.stream();
            consumers.push(tokio::spawn(async move {
                stream.map(|r| r.unwrap()).collect::<Vec<_>>().await
            }));
        }
    }
    drop(tx);

    let late = call.output().collect().await.unwrap();
    let expected: Vec<u32> = (0..200).filter(|d| d % 2 == 0).collect();
    assert_eq!(late, expected);
    for consumer in consumers {
        assert_eq!(consumer.await.unwrap(), expected);
    }
}

#[tokio::test]
async fn error_after_j_items_is_replayed_to_every_consumer() {
    let call = CallExecutor::default()
        .execute_stream(
            CallOptions::new(FunctionType::StreamSpeech),
            |_scope| async {
                Ok(futures::stream::iter(vec![
                    Delta::Value(vec![1u8, 2]),
                    Delta::Value(vec![3u8]),
                    Delta::Error(Error::runtime_with_context("socket reset", Default::default())),
                    Delta::Value(vec![9u8]),
                ]))
            },
            |chunk: Vec<u8>| Some(chunk),
        )
        .await
        .unwrap();

    for _ in 0..3 {
        let items: Vec<_> = call.stream().collect().await;
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].as_ref().unwrap(), &vec![1u8, 2]);
        assert_eq!(items[1].as_ref().unwrap(), &vec![3u8]);
        assert_eq!(
            items[2].as_ref().unwrap_err().to_string(),
            "Runtime error: socket reset"
        );
    }
}
