use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Monotonic time since boot. Every core decision is made against an explicit
/// `Uptime` so the loop stays deterministic when driven from tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Uptime {
    pub ms: u64,
}

impl Uptime {
    pub const ZERO: Uptime = Uptime { ms: 0 };

    pub const fn from_millis(ms: u64) -> Self {
        Uptime { ms }
    }

    pub const fn from_secs(secs: u64) -> Self {
        Uptime { ms: secs.saturating_mul(1_000) }
    }

    pub fn as_secs(&self) -> u64 {
        self.ms / 1_000
    }

    /// Saturates at zero if `earlier` is actually later.
    pub fn since(&self, earlier: Uptime) -> Duration {
        Duration::from_millis(self.ms.saturating_sub(earlier.ms))
    }

    pub fn advance(&self, by: Duration) -> Self {
        let by_ms = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
        Uptime { ms: self.ms.saturating_add(by_ms) }
    }
}

/// `None` means the timer is unset and fires on the next evaluation.
pub fn interval_elapsed(now: Uptime, last: Option<Uptime>, interval: Duration) -> bool {
    match last {
        None => true,
        Some(last) => now.since(last) >= interval,
    }
}

pub trait Clock {
    fn now(&self) -> Uptime;
}

#[derive(Debug, Clone)]
pub struct MonotonicClock {
    boot: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self { boot: Instant::now() }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Uptime {
        let ms = u64::try_from(self.boot.elapsed().as_millis()).unwrap_or(u64::MAX);
        Uptime::from_millis(ms)
    }
}
