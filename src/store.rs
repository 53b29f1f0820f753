// SPDX-License-Identifier: Apache-2.0

//! Bounded permit buffer backing each rate limiter.
//!
//! The store is a bounded channel of unit values: every queued value is one
//! permit. Receiving takes a permit, sending adds one, and the channel bound
//! is the bucket capacity. Holding both halves keeps the channel connected
//! for the lifetime of the store, so receives never observe a disconnect.

use std::time::Duration;

/// A concurrency-safe bucket of at most `capacity` permits.
#[derive(Debug)]
pub(crate) struct TokenStore {
    capacity: usize,
    tx: flume::Sender<()>,
    rx: flume::Receiver<()>,
}

impl TokenStore {
    /// Creates an empty store. `capacity` must be non-zero.
    pub(crate) fn new(capacity: usize) -> Self {
        let (tx, rx) = flume::bounded(capacity);
        Self { capacity, tx, rx }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of permits currently held. Advisory under concurrent use.
    pub(crate) fn available(&self) -> usize {
        self.rx.len()
    }

    /// Blocks until a permit is available and consumes it.
    pub(crate) fn acquire_blocking(&self) {
        // The store owns a sender, so the channel cannot disconnect.
        let _ = self.rx.recv();
    }

    /// Waits asynchronously for a permit and consumes it.
    pub(crate) async fn acquire_async(&self) {
        let _ = self.rx.recv_async().await;
    }

    /// Blocks for at most `timeout`. Returns true if a permit was consumed.
    pub(crate) fn acquire_timeout(&self, timeout: Duration) -> bool {
        self.rx.recv_timeout(timeout).is_ok()
    }

    /// Consumes a permit if one is available right now.
    pub(crate) fn try_acquire(&self) -> bool {
        self.rx.try_recv().is_ok()
    }

    /// Reports whether a permit exists without consuming it.
    ///
    /// Another consumer may take the permit before the caller acts on the
    /// answer; this is a hint, not a reservation.
    pub(crate) fn peek_available(&self) -> bool {
        !self.rx.is_empty()
    }

    /// Tops the store up to capacity and returns how many permits were added.
    ///
    /// Sends that would exceed the bound are dropped, so concurrent fills
    /// saturate at capacity instead of accumulating.
    pub(crate) fn fill_to_capacity(&self) -> usize {
        let mut added = 0;
        for _ in 0..self.capacity {
            if self.tx.try_send(()).is_err() {
                break;
            }
            added += 1;
        }
        added
    }
}
