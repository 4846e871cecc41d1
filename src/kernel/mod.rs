//! Connectivity core: the recovery ladder, its policy and its history.

pub mod connectivity;
pub mod policy;
pub mod state;
pub mod telemetry;
pub mod time;

pub use connectivity::ConnectivityStateMachine;
pub use policy::{RecoveryPolicy, SessionLayer};
pub use state::{ConnectionState, FailureCounters, RestartReason, RetryTimestamps};
pub use time::{Clock, MonotonicClock, Uptime};
