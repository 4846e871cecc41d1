//! Connectivity history and the health report.
//!
//! Read-only side channel: nothing in here feeds back into a state decision.
//! Escalations leave no other trace than these events and the counters.

pub mod event;
pub mod health;
pub mod metrics;
pub mod recorder;

pub use event::{ConnectivityEvent, TransitionCause};
pub use health::HealthReport;
pub use metrics::TransitionSummary;
pub use recorder::EventRecorder;
