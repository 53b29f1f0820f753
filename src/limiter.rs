// SPDX-License-Identifier: Apache-2.0

//! Token bucket rate limiter refilled by the shared scheduler.

use crate::config::RateLimitConfig;
use crate::scheduler::RefillScheduler;
use crate::store::TokenStore;
use crate::Error;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Source of registration keys, unique for the life of the process.
static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// State shared between a limiter handle and its scheduler registration.
#[derive(Debug)]
pub(crate) struct LimiterState {
    /// Key of this limiter in the scheduler's registry.
    pub(crate) id: u64,
    pub(crate) store: TokenStore,
    pub(crate) period: Duration,
}

impl LimiterState {
    /// Creates the state with a full store and a fresh id.
    pub(crate) fn new(capacity: usize, period: Duration) -> Self {
        let store = TokenStore::new(capacity);
        let _ = store.fill_to_capacity();
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            store,
            period,
        }
    }
}

/// Allows at most `capacity` actions per `period`.
///
/// The bucket starts full, so the first `capacity` calls pass immediately.
/// After that, the shared refill scheduler tops the bucket back up to
/// capacity once per elapsed period; permits do not trickle in gradually.
///
/// All methods take `&self`; wrap the limiter in an `Arc` to share it
/// between threads or tasks. Dropping the limiter ends its registration
/// with the scheduler.
pub struct RateLimiter {
    state: Arc<LimiterState>,
    scheduler: Arc<RefillScheduler>,
    closed: AtomicBool,
}

impl RateLimiter {
    /// Creates a limiter allowing `capacity` actions per `period`, filled to
    /// capacity and registered with the process-wide refill scheduler.
    ///
    /// Periods shorter than [`crate::TICK_INTERVAL`] are accepted but refill
    /// on every tick.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidCapacity` if capacity is zero,
    /// `Error::InvalidPeriod` if period is zero, and
    /// `Error::SchedulerUnavailable` if the refill thread cannot be started.
    pub fn new(capacity: usize, period: Duration) -> Result<Self, Error> {
        let scheduler = RefillScheduler::global();
        scheduler.start()?;
        Self::with_scheduler(capacity, period, Arc::clone(scheduler))
    }

    /// Creates a limiter from a configuration.
    ///
    /// # Errors
    ///
    /// Same as [`RateLimiter::new`].
    pub fn from_config(config: &RateLimitConfig) -> Result<Self, Error> {
        Self::new(config.capacity, config.period)
    }

    pub(crate) fn with_scheduler(
        capacity: usize,
        period: Duration,
        scheduler: Arc<RefillScheduler>,
    ) -> Result<Self, Error> {
        RateLimitConfig::new(capacity, period).validate()?;

        if period < scheduler.tick() {
            warn!(
                ?period,
                tick = ?scheduler.tick(),
                "Rate limit period is shorter than the refill tick; refilling every tick"
            );
        }

        let state = Arc::new(LimiterState::new(capacity, period));
        scheduler.register(&state);

        Ok(Self {
            state,
            scheduler,
            closed: AtomicBool::new(false),
        })
    }

    /// Blocks the calling thread until a permit is available and takes it.
    ///
    /// There is no timeout: on a closed, drained limiter this never returns.
    /// Do not call from inside an async task; use [`Self::wait_async`].
    pub fn wait(&self) {
        self.state.store.acquire_blocking();
    }

    /// Suspends the calling task until a permit is available and takes it.
    pub async fn wait_async(&self) {
        self.state.store.acquire_async().await;
    }

    /// Like [`Self::wait`], giving up after `timeout`. Returns true if a
    /// permit was taken.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        self.state.store.acquire_timeout(timeout)
    }

    /// Returns true if a permit is available right now, without taking it.
    ///
    /// Other callers may take the permit first, so a following
    /// [`Self::wait`] can still block.
    pub fn can(&self) -> bool {
        self.state.store.peek_available()
    }

    /// Takes a permit if one is available right now.
    ///
    /// Returns true if the action may proceed; false leaves the limiter
    /// untouched.
    pub fn can_or_wait(&self) -> bool {
        self.state.store.try_acquire()
    }

    /// Stops refills for this limiter. Remaining permits can still be
    /// taken. Calling it again has no effect.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let _ = self.scheduler.deregister(&self.state);
        debug!(
            capacity = self.capacity(),
            remaining = self.available(),
            "Closed rate limiter"
        );
    }

    /// Returns true once [`Self::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Permits currently in the bucket.
    pub fn available(&self) -> usize {
        self.state.store.available()
    }

    /// Maximum number of permits, granted again on each refill.
    pub fn capacity(&self) -> usize {
        self.state.store.capacity()
    }

    /// Configured time between refills.
    pub fn period(&self) -> Duration {
        self.state.period
    }
}

impl fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("capacity", &self.capacity())
            .field("period", &self.period())
            .field("available", &self.available())
            .field("closed", &self.is_closed())
            .finish()
    }
}
