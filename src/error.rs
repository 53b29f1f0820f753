// SPDX-License-Identifier: Apache-2.0

//! Errors for the rate limit crate.

use std::time::Duration;

/// Errors that can occur when constructing a rate limiter.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The capacity is invalid (zero).
    #[error("Invalid capacity: {capacity}. Capacity must be greater than zero.")]
    InvalidCapacity {
        /// The invalid capacity.
        capacity: usize,
    },

    /// The refill period is invalid (zero).
    #[error("Invalid period: {period:?}. Period must be greater than zero.")]
    InvalidPeriod {
        /// The invalid period.
        period: Duration,
    },

    /// The background refill thread could not be started.
    #[error("Refill scheduler unavailable: {source}")]
    SchedulerUnavailable {
        /// The error returned by the thread spawn.
        #[from]
        source: std::io::Error,
    },
}
