//! Structured observability hooks for navigation watchers.
//!
//! This module provides:
//! - Watch-scoped tracing spans via the `WatchSpan` RAII guard
//! - Emission functions for the watcher lifecycle: registration, skipped
//!   redirects, settlement, early source closure, receiver lag
//!
//! Lifecycle events are emitted at `debug!`; anomalies at `warn!`.
//! Filter with `RUST_LOG=navwatch_core=debug`.

use tracing::{debug, warn};

use crate::domain::Outcome;
use crate::watcher::WatchId;

/// RAII guard that enters a span tagged with the watcher's id.
///
/// # Example
///
/// ```ignore
/// let _span = WatchSpan::enter(watcher.id());
/// // tracing calls here carry watch_id = watch-3
/// ```
pub struct WatchSpan {
    _span: tracing::span::EnteredSpan,
}

impl WatchSpan {
    pub fn enter(id: WatchId) -> Self {
        let span = tracing::debug_span!("navwatch.watch", watch_id = %id);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: a watcher was registered on a source.
pub fn emit_watcher_registered(id: WatchId) {
    debug!(event = "watcher.registered", watch_id = %id);
}

/// Emit event: a redirecting cancellation was skipped while waiting.
pub fn emit_redirect_skipped(id: WatchId, navigation_id: Option<u64>) {
    debug!(
        event = "watcher.redirect_skipped",
        watch_id = %id,
        navigation_id = navigation_id,
    );
}

/// Emit event: the watcher saw a terminal outcome and ran its action.
pub fn emit_watcher_settled(id: WatchId, outcome: Outcome, navigation_id: Option<u64>) {
    debug!(
        event = "watcher.settled",
        watch_id = %id,
        outcome = %outcome,
        navigation_id = navigation_id,
    );
}

/// Emit event: the source closed before any terminal outcome.
pub fn emit_source_closed_unsettled(id: WatchId) {
    debug!(event = "watcher.closed_unsettled", watch_id = %id);
}

/// Emit event: a broadcast receiver fell behind and dropped events (warning level).
pub fn emit_receiver_lagged(skipped: u64) {
    warn!(event = "watcher.receiver_lagged", skipped = skipped);
}
