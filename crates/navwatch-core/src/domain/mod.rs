//! Domain models for navwatch.
//!
//! - `NavigationEvent`: router lifecycle events
//! - `Outcome`: how an event settles the navigation in flight

pub mod event;
pub mod outcome;

pub use event::{CancellationCode, NavigationEvent, NavigationTrigger, SkipCode};
pub use outcome::{classify, terminal_outcome, Outcome};
