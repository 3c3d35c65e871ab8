//! Event source abstraction.
//!
//! An [`EventSource`] is the producer side of a router's navigation events.
//! Consumers register a [`Listener`] and get back a [`Subscription`] handle.
//!
//! Guarantees every implementation must provide:
//! - at most one event is delivered at a time, in emission order
//! - a listener never sees an event after it has been unsubscribed
//! - `on_close` is called at most once, and only for listeners still
//!   subscribed when the source closes

use std::sync::Weak;

use crate::domain::NavigationEvent;

/// What a listener wants after handling an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Unsubscribe,
}

/// Receives events from an [`EventSource`].
pub trait Listener: Send {
    /// Handle one event.
    fn on_event(&mut self, event: &NavigationEvent) -> Flow;

    /// The source closed while this listener was still subscribed.
    fn on_close(&mut self) {}
}

impl<F> Listener for F
where
    F: FnMut(&NavigationEvent) -> Flow + Send,
{
    fn on_event(&mut self, event: &NavigationEvent) -> Flow {
        self(event)
    }
}

/// Identifier of one registration on a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(pub u64);

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Control side of a source, used by [`Subscription`] handles.
pub trait SubscriptionControl: Send + Sync {
    /// Remove a registration. Returns `false` if it was already gone.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;

    /// Whether the registration is still live.
    fn is_subscribed(&self, id: SubscriptionId) -> bool;
}

/// A push-based producer of navigation events.
pub trait EventSource: Send + Sync {
    /// Register a listener. Events published after this call are delivered to it.
    fn subscribe(&self, listener: Box<dyn Listener>) -> Subscription;
}

/// Handle to a registration on an [`EventSource`].
///
/// Dropping the handle leaves the registration in place.
#[derive(Clone)]
pub struct Subscription {
    id: SubscriptionId,
    control: Option<Weak<dyn SubscriptionControl>>,
}

impl Subscription {
    pub fn new(id: SubscriptionId, control: Weak<dyn SubscriptionControl>) -> Self {
        Self {
            id,
            control: Some(control),
        }
    }

    /// A handle for a registration that was never live (e.g. the source was
    /// already closed).
    pub fn inactive(id: SubscriptionId) -> Self {
        Self { id, control: None }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Remove the registration. Returns `false` if it had already ended.
    pub fn unsubscribe(&self) -> bool {
        self.control
            .as_ref()
            .and_then(Weak::upgrade)
            .is_some_and(|control| control.unsubscribe(self.id))
    }

    pub fn is_active(&self) -> bool {
        self.control
            .as_ref()
            .and_then(Weak::upgrade)
            .is_some_and(|control| control.is_subscribed(self.id))
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}
