// SPDX-License-Identifier: Apache-2.0

//! Timing tests against the global refill scheduler.

use shared_ratelimit::{Error, RateLimitConfig, RateLimiter, TICK_INTERVAL};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn test_concurrent_waiters_are_throttled() {
    let start = Instant::now();
    let limiter = Arc::new(RateLimiter::new(5, Duration::from_secs(1)).unwrap());
    let done = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let limiter = Arc::clone(&limiter);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                limiter.wait();
                let _ = done.fetch_add(1, Ordering::SeqCst);
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("waiter thread");
    }

    assert_eq!(done.load(Ordering::SeqCst), 10);
    assert!(
        start.elapsed() >= Duration::from_secs(1),
        "10 actions at 5/s finished in {:?}",
        start.elapsed()
    );
}

#[test]
fn test_burst_is_immediate() {
    let limiter = RateLimiter::new(10, Duration::from_secs(1)).unwrap();

    let start = Instant::now();
    for _ in 0..limiter.capacity() {
        limiter.wait();
    }
    assert!(!limiter.can_or_wait());

    let elapsed = start.elapsed();
    assert!(elapsed < TICK_INTERVAL, "expected fast but got {elapsed:?}");
}

#[test]
fn test_multiple_intervals() {
    let start = Instant::now();
    let limiter = RateLimiter::new(2, Duration::from_secs(2)).unwrap();
    for _ in 0..4 {
        limiter.wait();
    }

    let elapsed = start.elapsed();
    assert!(
        elapsed >= Duration::from_secs(2),
        "4 actions at 2 per 2s finished in {elapsed:?}"
    );
}

#[test]
fn test_can_recovers_after_period() {
    let limiter = RateLimiter::new(1, Duration::from_secs(1)).unwrap();

    limiter.wait();
    assert!(!limiter.can());

    thread::sleep(Duration::from_secs(2));
    assert!(limiter.can());
}

#[test]
fn test_can_or_wait() {
    let limiter = RateLimiter::new(1, Duration::from_millis(200)).unwrap();

    assert!(limiter.can_or_wait());
    assert!(!limiter.can_or_wait());
    assert!(!limiter.can_or_wait());

    thread::sleep(Duration::from_millis(400));
    assert!(limiter.can_or_wait());
}

#[test]
fn test_closed_limiter_is_never_refilled() {
    let limiter = RateLimiter::new(2, Duration::from_millis(100)).unwrap();
    limiter.close();

    thread::sleep(Duration::from_millis(300));
    limiter.wait();
    assert!(limiter.can_or_wait());
    assert!(!limiter.can_or_wait());

    thread::sleep(Duration::from_millis(600));
    assert!(!limiter.can());
    assert!(!limiter.wait_timeout(Duration::from_millis(100)));
}

#[test]
fn test_wait_timeout_succeeds_after_refill() {
    let limiter = RateLimiter::new(1, Duration::from_millis(100)).unwrap();
    limiter.wait();

    assert!(!limiter.wait_timeout(Duration::from_millis(10)));
    assert!(limiter.wait_timeout(Duration::from_secs(2)));
}

#[test]
fn test_from_config() {
    let config = RateLimitConfig::new(3, Duration::from_millis(500));
    let limiter = RateLimiter::from_config(&config).unwrap();
    assert_eq!(limiter.capacity(), 3);
    assert_eq!(limiter.available(), 3);

    let invalid = RateLimitConfig::new(0, Duration::from_millis(500));
    assert!(matches!(
        RateLimiter::from_config(&invalid),
        Err(Error::InvalidCapacity { .. })
    ));
}

#[test]
fn test_invalid_period_is_rejected() {
    assert!(matches!(
        RateLimiter::new(1, Duration::ZERO),
        Err(Error::InvalidPeriod { .. })
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_wait_async() {
    let start = tokio::time::Instant::now();
    let limiter = RateLimiter::new(1, Duration::from_millis(200)).unwrap();
    limiter.wait_async().await;
    tokio::time::timeout(Duration::from_secs(2), limiter.wait_async())
        .await
        .expect("refill within two seconds");

    assert!(start.elapsed() >= Duration::from_millis(200));
}
