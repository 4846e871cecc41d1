//! Contracts for the two collaborators the connectivity core drives, plus the
//! host adapters the daemon uses when no modem or broker client is wired in.
//!
//! Every call is blocking from the caller's point of view and must be bounded
//! by the implementation. The core never spin-waits on its own.

pub mod host;
pub mod probe;
pub mod session;

pub use host::{AttachState, HostLink};
pub use probe::TcpProbe;
pub use session::LogSession;

/// The wide-area radio link.
pub trait NetworkLink {
    fn connect(&mut self) -> bool;
    fn disconnect(&mut self) -> bool;
    fn is_connected(&mut self) -> bool;
    /// Bounded probe that the link actually reaches the wider network.
    fn test_reachability(&mut self) -> bool;
    /// Bounded power-cycle and re-initialisation of the radio.
    fn hard_recover(&mut self) -> bool;

    /// Diagnostics only, never used for control decisions.
    fn signal_quality(&mut self) -> Option<i32> {
        None
    }

    fn carrier(&mut self) -> Option<String> {
        None
    }
}

/// The application publish/subscribe session riding on the link.
pub trait MessageSession {
    fn connect(&mut self) -> bool;
    fn is_connected(&mut self) -> bool;
    fn publish(&mut self, topic: &str, payload: &str) -> bool;
    fn subscribe(&mut self, topic: &str) -> bool;
    /// Keepalive and inbound dispatch. Driven once per control-loop iteration.
    fn tick(&mut self);
}
