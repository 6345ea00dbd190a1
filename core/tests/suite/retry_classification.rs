//! The retry primitive driven by real `LottoError` classification.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use lotto_core::retry::{RetryClassifiable, RetryConfig, with_retry};
use lotto_core::{LottoError, PurchasePolicy};
use pretty_assertions::assert_eq;

fn config() -> RetryConfig<LottoError> {
    RetryConfig::new(3, Duration::from_millis(100), Duration::from_secs(1)).quiet()
}

#[tokio::test(start_paused = true)]
async fn transient_vendor_errors_are_retried_until_success() {
    let calls = AtomicU32::new(0);
    let counter = &calls;

    let result = with_retry(
        move || async move {
            match counter.fetch_add(1, Ordering::SeqCst) {
                0 => Err(LottoError::vendor("connection reset by peer")),
                1 => Err(LottoError::vendor("request timed out")),
                _ => Ok("bought"),
            }
        },
        &config(),
    )
    .await;

    assert_eq!(result.ok(), Some("bought"));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn login_failure_stops_immediately() {
    let calls = AtomicU32::new(0);
    let counter = &calls;

    let result: Result<(), _> = with_retry(
        move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(LottoError::InvalidCredentials)
        },
        &config(),
    )
    .await;

    assert!(matches!(result, Err(LottoError::InvalidCredentials)));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn purchase_policy_retries_unclassified_page_errors() {
    let calls = AtomicU32::new(0);
    let counter = &calls;
    let policy = PurchasePolicy {
        max_retries: 2,
        base_delay: Duration::from_millis(10),
        max_delay: Duration::from_millis(50),
    };

    let err = LottoError::unexpected_page("purchase popup did not open");
    assert!(!err.is_retryable());

    let result: Result<(), _> = with_retry(
        move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(LottoError::unexpected_page("purchase popup did not open"))
        },
        &policy.action_retry_config(),
    )
    .await;

    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}
