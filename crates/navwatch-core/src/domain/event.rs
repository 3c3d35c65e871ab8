//! Router lifecycle events.

use serde::{Deserialize, Serialize};

/// Why a navigation was cancelled.
///
/// A URL that matches no route is not a cancellation: it arrives as
/// [`NavigationEvent::NavigationError`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CancellationCode {
    /// A guard or resolver redirected to another URL.
    Redirect,

    /// A newer navigation started before this one finished.
    SupersededByNewNavigation,

    /// A resolver completed without emitting a value.
    NoDataFromResolver,

    /// A guard returned `false`.
    GuardRejected,

    /// The navigation was aborted by the host.
    Aborted,
}

impl CancellationCode {
    /// Whether another navigation is already underway when this code is seen.
    pub fn is_redirecting(self) -> bool {
        matches!(self, Self::Redirect | Self::SupersededByNewNavigation)
    }
}

/// Why a navigation was skipped without running.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SkipCode {
    IgnoredSameUrlNavigation,
    IgnoredByUrlHandlingStrategy,
}

/// What started a navigation.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NavigationTrigger {
    #[default]
    Imperative,
    Popstate,
    Hashchange,
}

/// A single event emitted by a router while it processes navigations.
///
/// Only `NavigationEnd`, `NavigationSkipped`, `NavigationCancel` and
/// `NavigationError` end a navigation. The remaining kinds describe progress
/// and are ignored by outcome classification. Unrecognised `type` tags
/// deserialize to [`NavigationEvent::Unknown`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NavigationEvent {
    /// A navigation was requested.
    NavigationStart {
        id: u64,
        url: String,
        #[serde(default)]
        trigger: NavigationTrigger,
    },

    /// The target URL matched a route configuration.
    RoutesRecognized { id: u64, url: String },

    /// Guard evaluation started.
    GuardsCheckStart { id: u64, url: String },

    /// Guard evaluation finished.
    GuardsCheckEnd {
        id: u64,
        url: String,
        should_activate: bool,
    },

    /// Route data resolution started.
    ResolveStart { id: u64, url: String },

    /// Route data resolution finished.
    ResolveEnd { id: u64, url: String },

    /// The navigation finished and the new route is active.
    NavigationEnd {
        id: u64,
        url: String,
        url_after_redirects: String,
    },

    /// The navigation was skipped without running.
    NavigationSkipped {
        id: u64,
        url: String,
        code: SkipCode,
    },

    /// The navigation was cancelled before it finished.
    NavigationCancel {
        id: u64,
        url: String,
        code: CancellationCode,
        #[serde(default)]
        reason: String,
    },

    /// The navigation failed with an error.
    NavigationError { id: u64, url: String, error: String },

    /// Any event kind this crate does not model.
    #[serde(other)]
    Unknown,
}

impl NavigationEvent {
    /// The navigation id this event belongs to, if it carries one.
    pub fn navigation_id(&self) -> Option<u64> {
        match self {
            Self::NavigationStart { id, .. }
            | Self::RoutesRecognized { id, .. }
            | Self::GuardsCheckStart { id, .. }
            | Self::GuardsCheckEnd { id, .. }
            | Self::ResolveStart { id, .. }
            | Self::ResolveEnd { id, .. }
            | Self::NavigationEnd { id, .. }
            | Self::NavigationSkipped { id, .. }
            | Self::NavigationCancel { id, .. }
            | Self::NavigationError { id, .. } => Some(*id),
            Self::Unknown => None,
        }
    }

    /// Stable snake_case name of the event kind, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NavigationStart { .. } => "navigation_start",
            Self::RoutesRecognized { .. } => "routes_recognized",
            Self::GuardsCheckStart { .. } => "guards_check_start",
            Self::GuardsCheckEnd { .. } => "guards_check_end",
            Self::ResolveStart { .. } => "resolve_start",
            Self::ResolveEnd { .. } => "resolve_end",
            Self::NavigationEnd { .. } => "navigation_end",
            Self::NavigationSkipped { .. } => "navigation_skipped",
            Self::NavigationCancel { .. } => "navigation_cancel",
            Self::NavigationError { .. } => "navigation_error",
            Self::Unknown => "unknown",
        }
    }

    pub fn start(id: u64, url: impl Into<String>) -> Self {
        Self::NavigationStart {
            id,
            url: url.into(),
            trigger: NavigationTrigger::Imperative,
        }
    }

    pub fn end(id: u64, url: impl Into<String>) -> Self {
        let url = url.into();
        Self::NavigationEnd {
            id,
            url_after_redirects: url.clone(),
            url,
        }
    }

    pub fn skipped(id: u64, url: impl Into<String>, code: SkipCode) -> Self {
        Self::NavigationSkipped {
            id,
            url: url.into(),
            code,
        }
    }

    pub fn cancel(id: u64, url: impl Into<String>, code: CancellationCode) -> Self {
        Self::NavigationCancel {
            id,
            url: url.into(),
            code,
            reason: String::new(),
        }
    }

    pub fn error(id: u64, url: impl Into<String>, error: impl Into<String>) -> Self {
        Self::NavigationError {
            id,
            url: url.into(),
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_round_trips_with_snake_case_tags() {
        let event = NavigationEvent::cancel(3, "/admin", CancellationCode::GuardRejected);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "navigation_cancel");
        assert_eq!(json["code"], "guard_rejected");

        let back: NavigationEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn unrecognised_type_deserializes_to_unknown() {
        let event: NavigationEvent =
            serde_json::from_str(r#"{"type":"child_activation_end"}"#).unwrap();
        assert_eq!(event, NavigationEvent::Unknown);
        assert_eq!(event.navigation_id(), None);
        assert_eq!(event.kind(), "unknown");
    }

    #[test]
    fn start_trigger_defaults_to_imperative() {
        let event: NavigationEvent =
            serde_json::from_str(r#"{"type":"navigation_start","id":1,"url":"/"}"#).unwrap();
        assert_eq!(event, NavigationEvent::start(1, "/"));
    }

    #[test]
    fn redirecting_codes() {
        assert!(CancellationCode::Redirect.is_redirecting());
        assert!(CancellationCode::SupersededByNewNavigation.is_redirecting());
        assert!(!CancellationCode::GuardRejected.is_redirecting());
        assert!(!CancellationCode::NoDataFromResolver.is_redirecting());
        assert!(!CancellationCode::Aborted.is_redirecting());
    }

    #[test]
    fn navigation_id_is_reported_for_lifecycle_events() {
        assert_eq!(NavigationEvent::end(7, "/a").navigation_id(), Some(7));
        assert_eq!(
            NavigationEvent::error(8, "/b", "boom").navigation_id(),
            Some(8)
        );
    }
}
