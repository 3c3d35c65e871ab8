//! Global atomic counters for watcher observability.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event (e.g. when a host shuts down).

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Lightweight atomic counters — no allocations, no locking.
pub struct Metrics {
    watchers_registered: AtomicU64,
    watchers_settled: AtomicU64,
    redirects_skipped: AtomicU64,
    events_ignored: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            watchers_registered: AtomicU64::new(0),
            watchers_settled: AtomicU64::new(0),
            redirects_skipped: AtomicU64::new(0),
            events_ignored: AtomicU64::new(0),
        }
    }

    pub fn inc_watchers_registered(&self) {
        self.watchers_registered.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "watchers_registered", "counter incremented");
    }

    pub fn inc_watchers_settled(&self) {
        self.watchers_settled.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "watchers_settled", "counter incremented");
    }

    pub fn inc_redirects_skipped(&self) {
        self.redirects_skipped.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "redirects_skipped", "counter incremented");
    }

    pub fn inc_events_ignored(&self) {
        self.events_ignored.fetch_add(1, Ordering::Relaxed);
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            watchers_registered = self.watchers_registered(),
            watchers_settled = self.watchers_settled(),
            redirects_skipped = self.redirects_skipped(),
            events_ignored = self.events_ignored(),
        );
    }

    pub fn watchers_registered(&self) -> u64 {
        self.watchers_registered.load(Ordering::Relaxed)
    }

    pub fn watchers_settled(&self) -> u64 {
        self.watchers_settled.load(Ordering::Relaxed)
    }

    pub fn redirects_skipped(&self) -> u64 {
        self.redirects_skipped.load(Ordering::Relaxed)
    }

    pub fn events_ignored(&self) -> u64 {
        self.events_ignored.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.watchers_registered.store(0, Ordering::Relaxed);
        self.watchers_settled.store(0, Ordering::Relaxed);
        self.redirects_skipped.store(0, Ordering::Relaxed);
        self.events_ignored.store(0, Ordering::Relaxed);
    }
}
