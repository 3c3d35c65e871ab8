//! In-memory navigation event bus for a single router instance.
//!
//! [`NavigationEventBus`] is the synchronous [`EventSource`] used by the
//! watcher and by tests. Delivery is strictly sequential: a `publish` or
//! `close` issued while another delivery is running (from inside a listener,
//! or from another thread) is queued and handled by the dispatcher that is
//! already running, once the current event has reached every listener.
//!
//! The state lock is never held while listener code runs, so listeners may
//! subscribe, unsubscribe, publish or close from inside their callbacks.
//!
//! A listener that panics is removed. The dispatcher still delivers every
//! queued event and close, then re-raises the first panic to its caller.

use std::any::Any;
use std::collections::{BTreeMap, VecDeque};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tracing::{debug, trace, warn};

use crate::domain::NavigationEvent;
use crate::error::{NavWatchError, Result};
use crate::source::{EventSource, Flow, Listener, Subscription, SubscriptionControl, SubscriptionId};

enum Signal {
    Event(NavigationEvent),
    Close,
}

type PanicPayload = Box<dyn Any + Send + 'static>;

#[derive(Default)]
struct BusState {
    next_id: u64,
    /// `None` while the listener is out of the map being called.
    listeners: BTreeMap<SubscriptionId, Option<Box<dyn Listener>>>,
    pending: VecDeque<Signal>,
    dispatching: bool,
    closed: bool,
}

#[derive(Default)]
struct BusInner {
    state: Mutex<BusState>,
}

fn keep_first(slot: &mut Option<PanicPayload>, payload: PanicPayload) {
    if slot.is_none() {
        *slot = Some(payload);
    }
}

impl BusInner {
    fn state(&self) -> MutexGuard<'_, BusState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a signal and run the dispatch loop unless one is already running.
    fn submit(&self, signal: Signal) -> Result<()> {
        let must_drain = {
            let mut state = self.state();
            if state.closed {
                return Err(NavWatchError::SourceClosed);
            }
            if matches!(signal, Signal::Close) {
                state.closed = true;
            }
            state.pending.push_back(signal);
            !std::mem::replace(&mut state.dispatching, true)
        };
        if must_drain {
            self.drain();
        }
        Ok(())
    }

    fn drain(&self) {
        let mut panicked = None;
        loop {
            let signal = {
                let mut state = self.state();
                match state.pending.pop_front() {
                    Some(signal) => signal,
                    None => {
                        state.dispatching = false;
                        break;
                    }
                }
            };
            match signal {
                Signal::Event(event) => self.deliver(&event, &mut panicked),
                Signal::Close => self.shut_down(&mut panicked),
            }
        }
        if let Some(payload) = panicked {
            panic::resume_unwind(payload);
        }
    }

    fn deliver(&self, event: &NavigationEvent, panicked: &mut Option<PanicPayload>) {
        let ids: Vec<SubscriptionId> = self.state().listeners.keys().copied().collect();
        trace!(kind = event.kind(), listeners = ids.len(), "delivering navigation event");

        for id in ids {
            let taken = self
                .state()
                .listeners
                .get_mut(&id)
                .and_then(Option::take);
            let Some(mut listener) = taken else {
                continue;
            };

            let flow = match panic::catch_unwind(AssertUnwindSafe(|| listener.on_event(event))) {
                Ok(flow) => flow,
                Err(payload) => {
                    warn!(subscription = %id, kind = event.kind(), "listener panicked, removing it");
                    self.state().listeners.remove(&id);
                    keep_first(panicked, payload);
                    continue;
                }
            };

            let released = {
                let mut state = self.state();
                match flow {
                    Flow::Continue => match state.listeners.get_mut(&id) {
                        Some(slot) => {
                            *slot = Some(listener);
                            None
                        }
                        // Unsubscribed from inside its own callback.
                        None => Some(listener),
                    },
                    Flow::Unsubscribe => {
                        state.listeners.remove(&id);
                        Some(listener)
                    }
                }
            };
            drop(released);
        }
    }

    fn shut_down(&self, panicked: &mut Option<PanicPayload>) {
        let listeners: Vec<Box<dyn Listener>> = std::mem::take(&mut self.state().listeners)
            .into_values()
            .flatten()
            .collect();
        debug!(listeners = listeners.len(), "navigation event bus closed");
        for mut listener in listeners {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| listener.on_close())) {
                warn!("listener panicked while closing");
                keep_first(panicked, payload);
            }
        }
    }
}

impl SubscriptionControl for BusInner {
    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.state().listeners.remove(&id);
        match removed {
            Some(listener) => {
                drop(listener);
                true
            }
            None => false,
        }
    }

    fn is_subscribed(&self, id: SubscriptionId) -> bool {
        self.state().listeners.contains_key(&id)
    }
}

/// Publish/subscribe channel for navigation events, scoped to one router.
///
/// Cloning yields another handle to the same bus.
#[derive(Clone, Default)]
pub struct NavigationEventBus {
    inner: Arc<BusInner>,
}

impl NavigationEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver an event to every live listener, in subscription order.
    ///
    /// Listeners registered while this event is being delivered do not see it.
    /// Fails with [`NavWatchError::SourceClosed`] once [`close`](Self::close)
    /// has been called.
    pub fn publish(&self, event: NavigationEvent) -> Result<()> {
        self.inner.submit(Signal::Event(event))
    }

    /// Close the bus. Every remaining listener gets `on_close` once queued
    /// events have been delivered. Calling this again is a no-op.
    pub fn close(&self) {
        if self.inner.submit(Signal::Close).is_err() {
            trace!("navigation event bus already closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.state().closed
    }

    /// Number of live registrations.
    pub fn listener_count(&self) -> usize {
        self.inner.state().listeners.len()
    }

    fn control(&self) -> Weak<dyn SubscriptionControl> {
        let weak: Weak<BusInner> = Arc::downgrade(&self.inner);
        weak
    }
}

impl EventSource for NavigationEventBus {
    fn subscribe(&self, mut listener: Box<dyn Listener>) -> Subscription {
        let id = {
            let mut state = self.inner.state();
            let id = SubscriptionId(state.next_id);
            state.next_id += 1;
            if !state.closed {
                state.listeners.insert(id, Some(listener));
                return Subscription::new(id, self.control());
            }
            id
        };
        listener.on_close();
        Subscription::inactive(id)
    }
}

impl std::fmt::Debug for NavigationEventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state();
        f.debug_struct("NavigationEventBus")
            .field("listeners", &state.listeners.len())
            .field("pending", &state.pending.len())
            .field("closed", &state.closed)
            .finish()
    }
}
