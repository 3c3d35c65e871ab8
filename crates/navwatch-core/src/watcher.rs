//! One-shot navigation completion watcher.
//!
//! [`after_next_navigation`] registers an action that runs exactly once, when
//! the navigation chain currently in flight settles. Redirecting
//! cancellations (`Redirect`, `SupersededByNewNavigation`) mean another
//! navigation has already started, so the watcher keeps waiting for that one.
//!
//! # Usage
//!
//! ```rust
//! use navwatch_core::{after_next_navigation, NavigationEvent, NavigationEventBus};
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use std::sync::Arc;
//!
//! let bus = NavigationEventBus::new();
//! let done = Arc::new(AtomicBool::new(false));
//! let flag = done.clone();
//! after_next_navigation(&bus, move || flag.store(true, Ordering::SeqCst));
//!
//! bus.publish(NavigationEvent::end(1, "/home")).unwrap();
//! assert!(done.load(Ordering::SeqCst));
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::trace;

use crate::domain::{classify, NavigationEvent, Outcome};
use crate::metrics::METRICS;
use crate::obs::{
    emit_redirect_skipped, emit_source_closed_unsettled, emit_watcher_registered,
    emit_watcher_settled, WatchSpan,
};
use crate::source::{EventSource, Flow, Listener, Subscription};

static NEXT_WATCH_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of one watcher registration, used in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(pub u64);

impl WatchId {
    fn next() -> Self {
        WatchId(NEXT_WATCH_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for WatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "watch-{}", self.0)
    }
}

/// Listener that runs its action on the first terminal outcome.
///
/// Most callers want [`after_next_navigation`]; this type is public so it
/// can be registered on custom [`EventSource`] implementations or driven
/// by hand.
pub struct NavigationOutcomeWatcher<F> {
    id: WatchId,
    action: Option<F>,
}

impl<F> NavigationOutcomeWatcher<F>
where
    F: FnOnce(Outcome) + Send,
{
    pub fn new(action: F) -> Self {
        Self {
            id: WatchId::next(),
            action: Some(action),
        }
    }

    pub fn id(&self) -> WatchId {
        self.id
    }

    /// Whether the action has run or the source has closed.
    pub fn is_finished(&self) -> bool {
        self.action.is_none()
    }
}

impl<F> Listener for NavigationOutcomeWatcher<F>
where
    F: FnOnce(Outcome) + Send,
{
    fn on_event(&mut self, event: &NavigationEvent) -> Flow {
        let _span = WatchSpan::enter(self.id);
        match classify(event) {
            None => {
                METRICS.inc_events_ignored();
                trace!(kind = event.kind(), "ignoring non-terminal event");
                Flow::Continue
            }
            Some(Outcome::Redirecting) => {
                METRICS.inc_redirects_skipped();
                emit_redirect_skipped(self.id, event.navigation_id());
                Flow::Continue
            }
            Some(outcome) => {
                // Taken before the call so a panicking action still cannot run twice.
                if let Some(action) = self.action.take() {
                    METRICS.inc_watchers_settled();
                    emit_watcher_settled(self.id, outcome, event.navigation_id());
                    action(outcome);
                }
                Flow::Unsubscribe
            }
        }
    }

    fn on_close(&mut self) {
        if self.action.take().is_some() {
            emit_source_closed_unsettled(self.id);
        }
    }
}

/// Run `action` once, when the next navigation chain on `source` settles.
///
/// The action fires on the first `NavigationEnd`, `NavigationSkipped`,
/// `NavigationError`, or non-redirecting `NavigationCancel`, after which the
/// watcher unsubscribes. If the source closes first the action never runs.
///
/// The returned [`Subscription`] may be used to cancel the watcher before it
/// settles; dropping it has no effect.
pub fn after_next_navigation<S, F>(source: &S, action: F) -> Subscription
where
    S: EventSource + ?Sized,
    F: FnOnce() + Send + 'static,
{
    after_next_navigation_with(source, move |_| action())
}

/// Like [`after_next_navigation`], but the action receives the settling
/// outcome ([`Outcome::Complete`] or [`Outcome::Failed`]).
pub fn after_next_navigation_with<S, F>(source: &S, action: F) -> Subscription
where
    S: EventSource + ?Sized,
    F: FnOnce(Outcome) + Send + 'static,
{
    let watcher = NavigationOutcomeWatcher::new(action);
    METRICS.inc_watchers_registered();
    emit_watcher_registered(watcher.id());
    source.subscribe(Box::new(watcher))
}
