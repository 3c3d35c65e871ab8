//! navwatch core library
//!
//! Watches a router's navigation event stream and runs an action exactly
//! once, when the navigation chain in flight settles.
//!
//! - `domain`: navigation events and outcome classification
//! - `source` / `bus`: the event source abstraction and an in-memory bus
//! - `watcher`: the one-shot completion watcher
//! - `stream`: async adapters over `futures` streams and tokio broadcast
//! - `scenario`: recorded event scenarios and replay

pub mod bus;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod obs;
pub mod scenario;
pub mod source;
pub mod stream;
pub mod telemetry;
pub mod watcher;

pub use bus::NavigationEventBus;
pub use domain::{
    classify, terminal_outcome, CancellationCode, NavigationEvent, NavigationTrigger, Outcome,
    SkipCode,
};
pub use error::{NavWatchError, Result};
pub use scenario::{replay_scenario, replay_scenario_stream, ReplayReport, Scenario};
pub use source::{EventSource, Flow, Listener, Subscription, SubscriptionControl, SubscriptionId};
pub use stream::{
    next_navigation_outcome, spawn_after_next_navigation, ChannelConfig, NavigationEventChannel,
    WatchHandle,
};
pub use watcher::{
    after_next_navigation, after_next_navigation_with, NavigationOutcomeWatcher, WatchId,
};

pub use metrics::METRICS;
pub use obs::{
    emit_receiver_lagged, emit_redirect_skipped, emit_source_closed_unsettled,
    emit_watcher_registered, emit_watcher_settled, WatchSpan,
};
pub use telemetry::init_tracing;

/// navwatch version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
