//! Outcome classification of navigation events.

use serde::{Deserialize, Serialize};

use super::event::NavigationEvent;

/// How a navigation event settles the navigation in flight.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The navigation finished or was skipped.
    Complete,

    /// The navigation was rejected, aborted or errored.
    Failed,

    /// The navigation was abandoned for another one already underway.
    Redirecting,
}

impl Outcome {
    /// `Complete` and `Failed` settle the navigation chain; `Redirecting` does not.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Redirecting)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Failed => "failed",
            Self::Redirecting => "redirecting",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify an event. Returns `None` for progress events and unknown kinds.
pub fn classify(event: &NavigationEvent) -> Option<Outcome> {
    match event {
        NavigationEvent::NavigationEnd { .. } | NavigationEvent::NavigationSkipped { .. } => {
            Some(Outcome::Complete)
        }
        NavigationEvent::NavigationCancel { code, .. } if code.is_redirecting() => {
            Some(Outcome::Redirecting)
        }
        NavigationEvent::NavigationCancel { .. } | NavigationEvent::NavigationError { .. } => {
            Some(Outcome::Failed)
        }
        NavigationEvent::NavigationStart { .. }
        | NavigationEvent::RoutesRecognized { .. }
        | NavigationEvent::GuardsCheckStart { .. }
        | NavigationEvent::GuardsCheckEnd { .. }
        | NavigationEvent::ResolveStart { .. }
        | NavigationEvent::ResolveEnd { .. }
        | NavigationEvent::Unknown => None,
    }
}

/// Classify an event and keep it only if it settles the navigation.
pub fn terminal_outcome(event: &NavigationEvent) -> Option<Outcome> {
    classify(event).filter(|outcome| outcome.is_terminal())
}
