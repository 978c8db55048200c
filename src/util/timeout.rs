//! Timeout helper.

use std::future::Future;
use std::time::Duration;

use crate::error::SyllabusError;

/// Wrap a fallible future with a timeout.
pub async fn with_timeout<T>(
    duration: Duration,
    future: impl Future<Output = Result<T, SyllabusError>>,
) -> Result<T, SyllabusError> {
    match tokio::time::timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(SyllabusError::Timeout(duration.as_millis() as u64)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn slow_future_times_out() {
        let err = with_timeout(Duration::from_millis(50), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "Timeout after 50ms");
    }

    #[tokio::test]
    async fn inner_error_passes_through() {
        let result: Result<(), _> = with_timeout(Duration::from_secs(1), async {
            Err(SyllabusError::Session("gone".into()))
        })
        .await;
        assert!(matches!(result, Err(SyllabusError::Session(_))));
    }
}
