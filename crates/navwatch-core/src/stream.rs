//! Async adapters for hosts that carry navigation events over tokio or
//! `futures` streams instead of the synchronous [`NavigationEventBus`].
//!
//! - [`next_navigation_outcome`] resolves with the first terminal outcome of
//!   any `Stream` of events (filter-map, filter, take one).
//! - [`NavigationEventChannel`] is a broadcast channel of router events, and
//!   [`spawn_after_next_navigation`] runs a one-shot watcher on it as a task.
//!
//! [`NavigationEventBus`]: crate::bus::NavigationEventBus

use futures::future;
use futures::{Stream, StreamExt};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::trace;

use crate::domain::{classify, terminal_outcome, NavigationEvent, Outcome};
use crate::error::{NavWatchError, Result};
use crate::metrics::METRICS;
use crate::obs::{emit_receiver_lagged, emit_watcher_registered};
use crate::source::{Flow, Listener};
use crate::watcher::{NavigationOutcomeWatcher, WatchId};

/// Wait for the first event on `events` that settles the navigation chain.
///
/// Returns `None` if the stream ends first. The stream is dropped as soon as
/// the outcome is known, so later events are never polled.
pub async fn next_navigation_outcome<S>(events: S) -> Option<Outcome>
where
    S: Stream<Item = NavigationEvent>,
{
    let settled = events
        .filter_map(|event| {
            let outcome = classify(&event);
            trace!(kind = event.kind(), outcome = ?outcome, "classified navigation event");
            future::ready(outcome)
        })
        .filter(|outcome| future::ready(outcome.is_terminal()));
    let mut settled = std::pin::pin!(settled);
    settled.next().await
}

/// Configuration for [`NavigationEventChannel`].
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Events buffered per receiver before the slowest one starts lagging.
    pub capacity: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self { capacity: 64 }
    }
}

/// Broadcast channel of navigation events for async hosts.
///
/// The channel closes for receivers once every clone of it is dropped.
#[derive(Debug, Clone)]
pub struct NavigationEventChannel {
    sender: broadcast::Sender<NavigationEvent>,
}

impl NavigationEventChannel {
    pub fn new(config: ChannelConfig) -> Self {
        let (sender, _) = broadcast::channel(config.capacity.max(1));
        Self { sender }
    }

    /// Send an event to every current receiver. Returns how many there were.
    pub fn publish(&self, event: NavigationEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NavigationEvent> {
        self.sender.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for NavigationEventChannel {
    fn default() -> Self {
        Self::new(ChannelConfig::default())
    }
}

/// Handle to a watcher spawned by [`spawn_after_next_navigation`].
#[derive(Debug)]
pub struct WatchHandle {
    id: WatchId,
    task: JoinHandle<Option<Outcome>>,
}

impl WatchHandle {
    pub fn id(&self) -> WatchId {
        self.id
    }

    /// Stop waiting. The action will not run unless it already has.
    pub fn cancel(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the watcher to finish.
    ///
    /// `Ok(None)` means the channel closed before the navigation settled.
    pub async fn join(self) -> Result<Option<Outcome>> {
        match self.task.await {
            Ok(outcome) => Ok(outcome),
            Err(err) if err.is_panic() => Err(NavWatchError::ActionPanicked),
            Err(_) => Err(NavWatchError::Cancelled),
        }
    }
}

/// Spawn a task that runs `action` once, when the next navigation chain seen
/// on `receiver` settles. Must be called from within a tokio runtime.
///
/// A lagging receiver logs a warning and keeps waiting on the events it can
/// still see. If the dropped events included the terminal event of the chain
/// in flight, the watcher settles on the next terminal event it does see,
/// which may belong to a later navigation. Size [`ChannelConfig::capacity`]
/// so that receivers do not fall behind.
pub fn spawn_after_next_navigation<F>(
    mut receiver: broadcast::Receiver<NavigationEvent>,
    action: F,
) -> WatchHandle
where
    F: FnOnce(Outcome) + Send + 'static,
{
    let mut watcher = NavigationOutcomeWatcher::new(action);
    let id = watcher.id();
    METRICS.inc_watchers_registered();
    emit_watcher_registered(id);

    let task = tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if watcher.on_event(&event) == Flow::Unsubscribe {
                        return terminal_outcome(&event);
                    }
                }
                Err(RecvError::Lagged(skipped)) => emit_receiver_lagged(skipped),
                Err(RecvError::Closed) => {
                    watcher.on_close();
                    return None;
                }
            }
        }
    });

    WatchHandle { id, task }
}
