//! Recorded navigation scenarios.
//!
//! A scenario is an ordered list of router events, stored as JSON either as
//! `{"name": "...", "events": [...]}` or as a bare array of events. Replaying
//! one publishes every event into a fresh bus that has a single watcher
//! registered, then closes the bus, and reports what the watcher did.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::bus::NavigationEventBus;
use crate::domain::{classify, NavigationEvent, Outcome};
use crate::error::{NavWatchError, Result};
use crate::stream::next_navigation_outcome;
use crate::watcher::after_next_navigation_with;

/// An ordered list of navigation events.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Scenario {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub events: Vec<NavigationEvent>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ScenarioFile {
    Named(Scenario),
    Bare(Vec<NavigationEvent>),
}

impl Scenario {
    pub fn new(events: Vec<NavigationEvent>) -> Self {
        Self { name: None, events }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let parsed: ScenarioFile = serde_json::from_str(json)?;
        Ok(match parsed {
            ScenarioFile::Named(scenario) => scenario,
            ScenarioFile::Bare(events) => Scenario::new(events),
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| NavWatchError::io(path, e))?;
        let mut scenario = Self::from_json_str(&json)?;
        if scenario.name.is_none() {
            scenario.name = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned());
        }
        debug!(path = %path.display(), events = scenario.events.len(), "loaded scenario");
        Ok(scenario)
    }
}

/// What a watcher did while a scenario was replayed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReplayReport {
    /// Index of the event that fired the action.
    pub fired_at: Option<usize>,
    /// Outcome the action received.
    pub outcome: Option<Outcome>,
    /// Events published before the bus was closed.
    pub events_published: usize,
    /// Redirecting cancellations seen before the action fired.
    pub redirects_skipped: usize,
    /// Unclassified events seen before the action fired.
    pub events_ignored: usize,
}

impl ReplayReport {
    pub fn fired(&self) -> bool {
        self.fired_at.is_some()
    }

    /// Fill the per-event counters from the events the watcher observed.
    fn tally(mut self, events: &[NavigationEvent]) -> Self {
        let observed = match self.fired_at {
            Some(index) => &events[..index],
            None => events,
        };
        for event in observed {
            match classify(event) {
                None => self.events_ignored += 1,
                Some(Outcome::Redirecting) => self.redirects_skipped += 1,
                Some(_) => {}
            }
        }
        self
    }
}

/// Replay `scenario` through a [`NavigationEventBus`] watched by
/// [`after_next_navigation_with`].
pub fn replay_scenario(scenario: &Scenario) -> Result<ReplayReport> {
    let bus = NavigationEventBus::new();
    let fired: Arc<Mutex<Option<Outcome>>> = Arc::new(Mutex::new(None));

    let slot = Arc::clone(&fired);
    after_next_navigation_with(&bus, move |outcome| {
        *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(outcome);
    });

    let mut report = ReplayReport::default();
    for (index, event) in scenario.events.iter().enumerate() {
        bus.publish(event.clone())?;
        report.events_published += 1;
        if report.fired_at.is_none() {
            if let Some(outcome) = *fired.lock().unwrap_or_else(PoisonError::into_inner) {
                report.fired_at = Some(index);
                report.outcome = Some(outcome);
            }
        }
    }
    bus.close();

    let report = report.tally(&scenario.events);
    info!(
        scenario = scenario.name.as_deref().unwrap_or("<unnamed>"),
        fired = report.fired(),
        outcome = ?report.outcome,
        "scenario replayed"
    );
    Ok(report)
}

/// Replay `scenario` through [`next_navigation_outcome`] over an in-memory stream.
pub async fn replay_scenario_stream(scenario: &Scenario) -> ReplayReport {
    let events = scenario.events.clone();
    let consumed = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&consumed);
    let stream = futures::stream::iter(events).inspect(move |_| {
        counter.fetch_add(1, Ordering::Relaxed);
    });
    let outcome = next_navigation_outcome(stream).await;
    let consumed = consumed.load(Ordering::Relaxed);

    let report = ReplayReport {
        fired_at: outcome.map(|_| consumed - 1),
        outcome,
        events_published: consumed,
        ..ReplayReport::default()
    };
    report.tally(&scenario.events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CancellationCode;

    #[test]
    fn parses_named_and_bare_forms() {
        let named = Scenario::from_json_str(
            r#"{"name":"login","events":[{"type":"navigation_end","id":1,"url":"/","url_after_redirects":"/"}]}"#,
        )
        .unwrap();
        assert_eq!(named.name.as_deref(), Some("login"));
        assert_eq!(named.events.len(), 1);

        let bare = Scenario::from_json_str(
            r#"[{"type":"navigation_start","id":1,"url":"/"},{"type":"resolve_start","id":1,"url":"/"}]"#,
        )
        .unwrap();
        assert_eq!(bare.name, None);
        assert_eq!(bare.events.len(), 2);
    }

    #[test]
    fn rejects_malformed_json() {
        let err = Scenario::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, NavWatchError::Serialization(_)));
    }

    #[test]
    fn replay_reports_firing_event_and_skips() {
        let scenario = Scenario::new(vec![
            NavigationEvent::start(1, "/old"),
            NavigationEvent::cancel(1, "/old", CancellationCode::Redirect),
            NavigationEvent::start(2, "/new"),
            NavigationEvent::end(2, "/new"),
            NavigationEvent::error(3, "/other", "ignored after settle"),
        ]);

        let report = replay_scenario(&scenario).unwrap();
        assert_eq!(report.fired_at, Some(3));
        assert_eq!(report.outcome, Some(Outcome::Complete));
        assert_eq!(report.events_published, 5);
        assert_eq!(report.redirects_skipped, 1);
        assert_eq!(report.events_ignored, 2);
    }

    #[test]
    fn replay_without_terminal_event_never_fires() {
        let scenario = Scenario::new(vec![
            NavigationEvent::cancel(1, "/", CancellationCode::SupersededByNewNavigation),
            NavigationEvent::start(2, "/"),
        ]);
        let report = replay_scenario(&scenario).unwrap();
        assert!(!report.fired());
        assert_eq!(report.outcome, None);
        assert_eq!(report.redirects_skipped, 1);
        assert_eq!(report.events_ignored, 1);
    }

    #[tokio::test]
    async fn stream_replay_matches_bus_replay() {
        let scenario = Scenario::new(vec![
            NavigationEvent::cancel(1, "/", CancellationCode::Redirect),
            NavigationEvent::error(2, "/login", "resolver failed"),
            NavigationEvent::end(3, "/"),
        ]);
        let from_stream = replay_scenario_stream(&scenario).await;
        let from_bus = replay_scenario(&scenario).unwrap();

        assert_eq!(from_stream.fired_at, from_bus.fired_at);
        assert_eq!(from_stream.outcome, Some(Outcome::Failed));
        assert_eq!(from_stream.events_published, 2);
        assert_eq!(from_bus.events_published, 3);
    }
}
