use super::*;
use proptest::prelude::*;
use std::time::Duration;

fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

#[test]
fn test_can_retry() {
    let policy = RetryPolicy::API;
    assert!(policy.can_retry(0));
    assert!(policy.can_retry(2));
    assert!(!policy.can_retry(3));
}

#[test]
fn test_delay_without_jitter() {
    let policy = RetryPolicy::new(5, Duration::from_millis(100), Duration::from_millis(1000));
    assert_eq!(policy.get_delay(0), Duration::from_millis(100));
    assert_eq!(policy.get_delay(1), Duration::from_millis(100));
    assert_eq!(policy.get_delay(2), Duration::from_millis(200));
    assert_eq!(policy.get_delay(3), Duration::from_millis(400));
    assert_eq!(policy.get_delay(5), Duration::from_millis(1000));
    assert_eq!(policy.get_delay(40), Duration::from_millis(1000));
}

#[test]
fn test_backend_restart_preset() {
    let policy = RetryPolicy::BACKEND_RESTART;
    assert_eq!(policy.get_delay(1), Duration::from_millis(2000));
    assert_eq!(policy.get_delay(2), Duration::from_millis(3000));
    assert_eq!(policy.get_delay(3), Duration::from_millis(4500));
    assert!(!policy.use_jitter);
}

#[test]
fn test_presets_are_valid() {
    for policy in [
        RetryPolicy::API,
        RetryPolicy::BACKEND_RESTART,
        RetryPolicy::HEALTH_CHECK,
        RetryPolicy::RECONNECT,
    ] {
        assert!(policy.validate().is_ok());
    }
    let broken = RetryPolicy::new(1, Duration::from_secs(5), Duration::from_secs(1));
    assert!(broken.validate().is_err());
}

#[test]
fn test_huge_attempt_stays_capped() {
    let policy = RetryPolicy::RECONNECT.with_jitter(false);
    assert_eq!(policy.get_delay(u32::MAX), Duration::from_millis(60_000));
}

proptest! {
    #[test]
    fn prop_delay_within_bounds(
        base in 1u64..5_000,
        extra in 0u64..100_000,
        multiplier in 1.0f64..4.0,
        jitter in any::<bool>(),
        attempt in 1u32..64,
    ) {
        let policy = RetryPolicy {
            max_retries: 10,
            base_delay_ms: base,
            max_delay_ms: base + extra,
            use_jitter: jitter,
            multiplier,
        };
        let delay = millis(policy.get_delay(attempt));
        prop_assert!(delay >= base as f64 - 0.001);
        prop_assert!(delay <= (base + extra) as f64 * (1.0 + JITTER_FACTOR) + 0.001);
    }

    #[test]
    fn prop_delay_non_decreasing(
        base in 1u64..5_000,
        extra in 0u64..100_000,
        multiplier in 1.0f64..4.0,
        attempt in 1u32..63,
    ) {
        let policy = RetryPolicy {
            max_retries: 10,
            base_delay_ms: base,
            max_delay_ms: base + extra,
            use_jitter: false,
            multiplier,
        };
        prop_assert!(policy.get_delay(attempt) <= policy.get_delay(attempt + 1));
    }
}

#[tokio::test(start_paused = true)]
async fn test_executor_bounded_calls() {
    let executor = RetryExecutor::new(RetryPolicy::HEALTH_CHECK);
    let mut calls = 0u32;

    let result: Result<(), &str> = executor
        .execute(|| {
            calls += 1;
            async { Err("always fails") }
        })
        .await;

    assert_eq!(result, Err("always fails"));
    assert_eq!(calls, RetryPolicy::HEALTH_CHECK.max_retries + 1);
}

#[tokio::test(start_paused = true)]
async fn test_executor_zero_retries_runs_once() {
    let executor = RetryExecutor::new(RetryPolicy::API.with_max_retries(0));
    let mut calls = 0u32;

    let result: Result<(), String> = executor
        .execute(|| {
            calls += 1;
            async { Err("nope".to_string()) }
        })
        .await;

    assert!(result.is_err());
    assert_eq!(calls, 1);
}

#[tokio::test(start_paused = true)]
async fn test_executor_succeeds_after_failures() {
    let executor = RetryExecutor::new(RetryPolicy::HEALTH_CHECK);
    let mut calls = 0u32;
    let mut retries = Vec::new();

    let result = executor
        .execute_with(
            || {
                calls += 1;
                let current = calls;
                async move {
                    if current < 3 {
                        Err(format!("attempt {} failed", current))
                    } else {
                        Ok(current)
                    }
                }
            },
            |_| true,
            |attempt, _, delay| retries.push((attempt, delay)),
        )
        .await;

    assert_eq!(result, Ok(3));
    assert_eq!(
        retries,
        vec![
            (1, Duration::from_millis(500)),
            (2, Duration::from_millis(1000)),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_executor_respects_should_retry() {
    let executor = RetryExecutor::new(RetryPolicy::API);
    let mut calls = 0u32;
    let mut retried = false;

    let result: Result<(), u16> = executor
        .execute_with(
            || {
                calls += 1;
                async { Err(404u16) }
            },
            |status| *status >= 500,
            |_, _, _| retried = true,
        )
        .await;

    assert_eq!(result, Err(404));
    assert_eq!(calls, 1);
    assert!(!retried);
}

#[tokio::test(start_paused = true)]
async fn test_executor_returns_last_original_error() {
    let executor = RetryExecutor::new(RetryPolicy::HEALTH_CHECK.with_max_retries(2));
    let mut calls = 0u32;

    let result: Result<(), String> = executor
        .execute(|| {
            calls += 1;
            let current = calls;
            async move { Err(format!("failure #{}", current)) }
        })
        .await;

    assert_eq!(result, Err("failure #3".to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_limiter_blocks_after_max_attempts() {
    let window = Duration::from_secs(300);
    let mut limiter = RetryLimiter::new(3, window);

    for _ in 0..3 {
        assert!(limiter.can_attempt());
        limiter.record_attempt();
    }

    assert!(!limiter.can_attempt());
    assert_eq!(limiter.wait_time(), Some(window));

    tokio::time::advance(Duration::from_secs(100)).await;
    assert!(!limiter.can_attempt());
    assert_eq!(limiter.wait_time(), Some(Duration::from_secs(200)));

    tokio::time::advance(Duration::from_secs(201)).await;
    assert!(limiter.can_attempt());
    assert_eq!(limiter.wait_time(), None);
    assert_eq!(limiter.attempts_in_window(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_limiter_sliding_window() {
    let mut limiter = RetryLimiter::new(2, Duration::from_secs(10));

    limiter.record_attempt();
    tokio::time::advance(Duration::from_secs(6)).await;
    limiter.record_attempt();
    assert!(!limiter.can_attempt());

    tokio::time::advance(Duration::from_secs(5)).await;
    assert!(limiter.can_attempt());
    assert_eq!(limiter.attempts_in_window(), 1);

    limiter.reset();
    assert_eq!(limiter.attempts_in_window(), 0);
}
