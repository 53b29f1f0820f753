// SPDX-License-Identifier: Apache-2.0

//! Configuration for a rate limiter.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default number of permits per period.
const DEFAULT_CAPACITY: usize = 100;

/// Default refill period.
const DEFAULT_PERIOD: Duration = Duration::from_secs(1);

/// Quota of a rate limiter: `capacity` actions per `period`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitConfig {
    /// Permits granted per period. This is also the burst size, since
    /// the bucket starts full and refills to full.
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Time between refills, e.g. "1s" or "250ms". Values below the
    /// scheduler tick behave as one refill per tick.
    #[serde(default = "default_period", with = "humantime_serde")]
    pub period: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            period: DEFAULT_PERIOD,
        }
    }
}

impl RateLimitConfig {
    /// Create a configuration allowing `capacity` actions per `period`.
    pub fn new(capacity: usize, period: Duration) -> Self {
        Self { capacity, period }
    }

    /// Checks that the quota can be turned into a limiter.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidCapacity` if capacity is zero and
    /// `Error::InvalidPeriod` if period is zero.
    pub fn validate(&self) -> Result<(), Error> {
        if self.capacity == 0 {
            return Err(Error::InvalidCapacity {
                capacity: self.capacity,
            });
        }
        if self.period.is_zero() {
            return Err(Error::InvalidPeriod {
                period: self.period,
            });
        }
        Ok(())
    }
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

fn default_period() -> Duration {
    DEFAULT_PERIOD
}
