//! Guarded execution that turns failures into values.

use crate::{Error, Result};
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Outcome of a guarded execution. Exactly one variant is produced per run.
///
/// `Cancelled` keeps the cancellation error as raised, reason included.
#[derive(Debug)]
pub enum SafeResult<T> {
    Ok(T),
    Cancelled(Error),
    Failed(Error),
}

impl<T> SafeResult<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, SafeResult::Ok(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, SafeResult::Cancelled(_))
    }
}

impl<T> From<Result<T>> for SafeResult<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(value) => SafeResult::Ok(value),
            Err(err) if err.is_cancelled() => SafeResult::Cancelled(err),
            Err(err) => SafeResult::Failed(err),
        }
    }
}

/// Await `operation` once and classify its outcome instead of propagating it.
pub async fn run_safe<T, Fut>(operation: Fut) -> SafeResult<T>
where
    Fut: Future<Output = Result<T>>,
{
    operation.await.into()
}

/// Like [`run_safe`], but a fired `cancel` token wins the race and yields `Cancelled`
/// with a fresh [`Error::Cancelled`] even if `operation` never observes the token itself.
pub async fn run_safe_with_cancel<T, Fut>(
    operation: Fut,
    cancel: Option<&CancellationToken>,
) -> SafeResult<T>
where
    Fut: Future<Output = Result<T>>,
{
    match cancel {
        Some(token) => {
            tokio::select! {
                biased;
                _ = token.cancelled() => SafeResult::Cancelled(Error::cancelled()),
                result = operation => result.into(),
            }
        }
        None => run_safe(operation).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn classifies_success() {
        let r = run_safe(async { Ok::<_, Error>(7) }).await;
        assert!(matches!(r, SafeResult::Ok(7)));
    }

    #[tokio::test]
    async fn classifies_cancellation_separately_from_failure() {
        let cancelled =
            run_safe(async { Err::<(), _>(Error::cancelled_with_reason("user pressed stop")) })
                .await;
        match cancelled {
            SafeResult::Cancelled(err) => {
                assert_eq!(err.to_string(), "Call cancelled: user pressed stop")
            }
            other => panic!("expected cancellation, got {:?}", other),
        }

        let failed = run_safe(async { Err::<(), _>(Error::QueueClosed) }).await;
        assert!(matches!(failed, SafeResult::Failed(Error::QueueClosed)));
    }

    #[tokio::test]
    async fn fired_token_interrupts_pending_operation() {
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });

        let r = run_safe_with_cancel(
            async {
                futures::future::pending::<()>().await;
                Ok(())
            },
            Some(&token),
        )
        .await;
        assert!(r.is_cancelled());
    }

    #[tokio::test]
    async fn untriggered_token_lets_operation_finish() {
        let token = CancellationToken::new();
        let r = run_safe_with_cancel(async { Ok::<_, Error>("done") }, Some(&token)).await;
        assert!(matches!(r, SafeResult::Ok("done")));
    }
}
