//! Simple example demonstrating the shared-scheduler rate limiter.

use shared_ratelimit::{RateLimitConfig, RateLimiter};
use std::time::{Duration, Instant};

fn main() {
    println!("Rate Limiter Example");
    println!("===================");

    // 3 actions per 500ms; the first 3 pass immediately.
    let config = RateLimitConfig::new(3, Duration::from_millis(500));

    println!("Configuration:");
    println!("  Capacity: {} actions", config.capacity);
    println!("  Period: {:?}", config.period);

    let limiter = match RateLimiter::from_config(&config) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to create rate limiter: {}", e);
            return;
        }
    };

    let start = Instant::now();
    for i in 1..=9 {
        limiter.wait();
        println!("action {} at {:?}", i, start.elapsed());
    }

    println!("\nNon-blocking check: {}", limiter.can_or_wait());

    limiter.close();
    println!("Closed; {} permits left, no more refills", limiter.available());
}
