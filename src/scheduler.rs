// SPDX-License-Identifier: Apache-2.0

//! The shared refill scheduler.
//!
//! Every limiter in the process is refilled by one background thread that
//! wakes up every [`TICK_INTERVAL`] and tops up each registered limiter whose
//! period has elapsed since its last refill. The cost of an extra limiter is
//! one registry entry, never an extra thread or timer. Entries are keyed by
//! limiter id, so closing a limiter does not scan the registry.
//!
//! Periods shorter than the tick cannot be honored: such limiters are
//! refilled once per tick, so the tick is the effective minimum period.

use crate::limiter::LimiterState;
use crate::Error;
use lazy_static::lazy_static;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, trace};

/// Interval between two refill passes of the global scheduler.
pub const TICK_INTERVAL: Duration = Duration::from_millis(50);

lazy_static! {
    static ref GLOBAL: Arc<RefillScheduler> = Arc::new(RefillScheduler::new(TICK_INTERVAL));
}

/// A limiter known to the scheduler.
struct Registration {
    /// Non-owning; the limiter handle owns the state.
    limiter: Weak<LimiterState>,
    /// Time of the last refill (or of registration).
    last_refill: Instant,
}

/// Drives periodic refills for all registered limiters.
pub(crate) struct RefillScheduler {
    tick: Duration,
    registrations: Mutex<HashMap<u64, Registration>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl RefillScheduler {
    /// Creates a scheduler without a worker thread. Call [`Self::start`] to
    /// run it, or drive it manually with [`Self::tick_at`].
    pub(crate) fn new(tick: Duration) -> Self {
        Self {
            tick,
            registrations: Mutex::new(HashMap::new()),
            worker: Mutex::new(None),
        }
    }

    /// The process-wide scheduler shared by every limiter.
    pub(crate) fn global() -> &'static Arc<RefillScheduler> {
        &GLOBAL
    }

    pub(crate) fn tick(&self) -> Duration {
        self.tick
    }

    /// Spawns the worker thread unless it is already running.
    ///
    /// # Errors
    ///
    /// Returns `Error::SchedulerUnavailable` if the thread cannot be spawned.
    /// A later call tries again.
    pub(crate) fn start(self: &Arc<Self>) -> Result<(), Error> {
        let mut worker = self.worker.lock();
        if worker.is_some() {
            return Ok(());
        }

        let scheduler = Arc::downgrade(self);
        let tick = self.tick;
        let handle = thread::Builder::new()
            .name("ratelimit-refill".into())
            .spawn(move || run(scheduler, tick))
            .map_err(|e| {
                error!("Failed to spawn refill scheduler thread: {}", e);
                e
            })?;

        info!(tick = ?self.tick, "Started refill scheduler");
        *worker = Some(handle);
        Ok(())
    }

    /// Adds a limiter to the refill registry. Its period starts counting now.
    pub(crate) fn register(&self, limiter: &Arc<LimiterState>) {
        let mut registrations = self.registrations.lock();
        let _ = registrations.insert(
            limiter.id,
            Registration {
                limiter: Arc::downgrade(limiter),
                last_refill: Instant::now(),
            },
        );
        trace!(registered = registrations.len(), "Registered rate limiter");
    }

    /// Removes a limiter from the refill registry. Unknown limiters are
    /// ignored.
    ///
    /// Returns true if an entry was removed.
    pub(crate) fn deregister(&self, limiter: &LimiterState) -> bool {
        let mut registrations = self.registrations.lock();
        let removed = registrations.remove(&limiter.id).is_some();
        trace!(
            removed,
            registered = registrations.len(),
            "Deregistered rate limiter"
        );
        removed
    }

    /// Number of registrations, including dropped limiters not yet pruned.
    #[cfg(test)]
    pub(crate) fn registered(&self) -> usize {
        self.registrations.lock().len()
    }

    /// Runs one refill pass as if the tick fired at `now`.
    ///
    /// A limiter is refilled to capacity when strictly more than its period
    /// has passed since its last refill. Registrations whose limiter was
    /// dropped are removed. Returns the number of limiters refilled.
    pub(crate) fn tick_at(&self, now: Instant) -> usize {
        let mut refilled = 0;
        let mut registrations = self.registrations.lock();
        registrations.retain(|_, reg| {
            let Some(limiter) = reg.limiter.upgrade() else {
                return false;
            };
            if now.saturating_duration_since(reg.last_refill) > limiter.period {
                let _ = limiter.store.fill_to_capacity();
                reg.last_refill = now;
                refilled += 1;
            }
            true
        });
        refilled
    }
}

/// Worker loop. Exits only once the scheduler itself is gone, which never
/// happens for the global instance.
fn run(scheduler: Weak<RefillScheduler>, tick: Duration) {
    let mut next = Instant::now() + tick;
    loop {
        thread::sleep(next.saturating_duration_since(Instant::now()));
        let now = Instant::now();

        let Some(scheduler) = scheduler.upgrade() else {
            debug!("Refill scheduler dropped, stopping worker");
            return;
        };
        let refilled = scheduler.tick_at(now);
        drop(scheduler);

        if refilled > 0 {
            trace!(refilled, "Refilled rate limiters");
        }

        // Missed ticks are skipped, not replayed.
        next += tick;
        if next <= now {
            next = now + tick;
        }
    }
}
