//! Tests for the condition poller

use crate::poll::{wait_for, wait_for_async, WaitCondition, Waited};
use crate::AutomationError;
use std::time::{Duration, Instant};

fn condition(timeout_ms: u64, interval_ms: u64) -> WaitCondition {
    WaitCondition::from_millis(timeout_ms).with_poll_interval(Duration::from_millis(interval_ms))
}

#[tokio::test]
async fn test_true_predicate_returns_immediately() {
    let waited = wait_for(condition(1_000, 100), || Ok(true)).await;
    assert!(waited.is_satisfied());
    assert_eq!(waited.attempts(), 1);
    assert!(waited.elapsed() < Duration::from_millis(50));
}

#[tokio::test]
async fn test_false_predicate_times_out_within_one_interval() {
    let start = Instant::now();
    let waited = wait_for(condition(300, 50), || Ok(false)).await;
    let elapsed = start.elapsed();
    assert!(!waited.is_satisfied());
    assert!(elapsed >= Duration::from_millis(300), "{elapsed:?}");
    assert!(elapsed < Duration::from_millis(300 + 50 + 100), "{elapsed:?}");
    // immediate sample, one per interval, final sample at the deadline
    assert!(waited.attempts() >= 5, "{waited:?}");
}

#[tokio::test]
async fn test_becomes_true_after_some_attempts() {
    let mut calls = 0;
    let waited = wait_for(condition(2_000, 10), || {
        calls += 1;
        Ok(calls >= 4)
    })
    .await;
    assert!(waited.is_satisfied());
    assert_eq!(waited.attempts(), 4);
}

#[tokio::test]
async fn test_errors_count_as_not_yet() {
    let mut calls = 0;
    let waited = wait_for(condition(1_000, 5), || {
        calls += 1;
        if calls < 3 {
            Err(AutomationError::ElementDetached("gone".into()))
        } else {
            Ok(true)
        }
    })
    .await;
    assert!(waited.is_satisfied());

    let waited = wait_for(condition(30, 5), || {
        Err(AutomationError::ElementNotFound("never".into()))
    })
    .await;
    match &waited {
        Waited::TimedOut { last_error, .. } => {
            assert!(matches!(last_error, Some(AutomationError::ElementNotFound(_))))
        }
        other => panic!("expected a timeout, got {other:?}"),
    }
    let err = waited.into_result("the widget showing up").unwrap_err();
    assert!(matches!(err, AutomationError::Timeout(_)));
    assert!(err.to_string().contains("the widget showing up"));
}

#[tokio::test]
async fn test_zero_timeout_samples_once() {
    let waited = wait_for(condition(0, 100), || Ok(false)).await;
    assert_eq!(waited.attempts(), 1);
    assert!(!waited.is_satisfied());
}

#[tokio::test]
async fn test_async_predicate() {
    let start = Instant::now();
    let waited = wait_for_async(condition(1_000, 10), || async move {
        tokio::time::sleep(Duration::from_millis(5)).await;
        Ok(start.elapsed() > Duration::from_millis(50))
    })
    .await;
    assert!(waited.is_satisfied());
}

#[test]
fn test_poll_interval_never_zero() {
    let c = WaitCondition::new(Duration::from_secs(1)).with_poll_interval(Duration::ZERO);
    assert_eq!(c.poll_interval(), Duration::from_millis(1));
    assert_eq!(WaitCondition::from_millis(5).poll_interval(), Duration::from_millis(100));
}
