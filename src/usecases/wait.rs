//! Render-wait primitive: the single suspension mechanism in the system.
//!
//! The host UI offers no render-complete event, so every wait is a bounded
//! predicate poll. Predicates only read live state; they never mutate it.

use std::future::Future;
use std::time::Duration;

use crate::domain::DomainError;

/// Poll `predicate` every `poll_interval` until it holds or `timeout`
/// elapses.
///
/// On timeout the error names the failed `condition`; the caller decides
/// whether that is fatal. An error from the predicate itself (gateway gone)
/// propagates immediately.
pub async fn await_condition<F, Fut>(
    condition: &str,
    poll_interval: Duration,
    timeout: Duration,
    mut predicate: F,
) -> Result<(), DomainError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, DomainError>>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if predicate().await? {
            return Ok(());
        }
        if tokio::time::Instant::now() >= deadline {
            return Err(DomainError::WaitTimeout {
                condition: condition.to_string(),
            });
        }
        tokio::time::sleep(poll_interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_returns_once_predicate_holds() {
        let calls = AtomicU32::new(0);
        let result = await_condition(
            "third poll",
            Duration::from_millis(100),
            Duration::from_secs(5),
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move { Ok(n >= 2) }
            },
        )
        .await;
        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_names_the_condition() {
        let result = await_condition(
            "result rows",
            Duration::from_millis(100),
            Duration::from_millis(350),
            || async { Ok(false) },
        )
        .await;
        match result {
            Err(DomainError::WaitTimeout { condition }) => assert_eq!(condition, "result rows"),
            other => panic!("expected WaitTimeout, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_predicate_error_propagates() {
        let result = await_condition(
            "anything",
            Duration::from_millis(100),
            Duration::from_secs(5),
            || async { Err(DomainError::PageGateway("session gone".into())) },
        )
        .await;
        assert!(matches!(result, Err(DomainError::PageGateway(_))));
    }
}
