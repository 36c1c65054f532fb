//! Per-call deadlines for registry and collaborator calls.

use catalogue_core::{Error, Result};
use std::future::Future;
use std::time::Duration;

/// Run `fut`, failing with `Error::Timeout` once `limit` elapses.
pub async fn with_deadline<T, F>(operation: &str, limit: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!("{} exceeded its {:?} deadline", operation, limit);
            Err(Error::Timeout {
                operation: operation.to_string(),
                millis: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn passes_through_fast_calls() {
        let v = with_deadline("fast", Duration::from_millis(100), async { Ok(7) }).await.unwrap();
        assert_eq!(v, 7);
    }

    #[tokio::test]
    async fn times_out_slow_calls() {
        let err = with_deadline("slow", Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Timeout { millis: 10, .. }));
    }
}
