// SPDX-License-Identifier: Apache-2.0

//! Token bucket rate limiting with a shared refill scheduler.
//!
//! A [`RateLimiter`] allows `capacity` actions per `period`. Instead of each
//! limiter owning a timer, every limiter in the process registers with one
//! background scheduler thread that refills due limiters on a fixed
//! [`TICK_INTERVAL`]. Creating a million limiters still costs one thread.
//!
//! ```no_run
//! use shared_ratelimit::RateLimiter;
//! use std::time::Duration;
//!
//! let limiter = RateLimiter::new(10, Duration::from_secs(1))?;
//! for _ in 0..25 {
//!     limiter.wait();
//!     // at most 10 of these per second
//! }
//! limiter.close();
//! # Ok::<(), shared_ratelimit::Error>(())
//! ```

mod config;
mod error;
mod limiter;
mod scheduler;
mod store;

pub use config::RateLimitConfig;
pub use error::Error;
pub use limiter::RateLimiter;
pub use scheduler::TICK_INTERVAL;
