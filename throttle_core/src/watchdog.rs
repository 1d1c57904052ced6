//! Command freshness watchdog.
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    Stale,
}

/// Classify a command by age. No sample at all is treated as infinitely old.
///
/// Stale only when the age strictly exceeds `timeout`. Nothing is latched:
/// every call is independent of the previous one.
#[inline]
pub fn classify(now: Instant, arrival: Option<Instant>, timeout: Duration) -> Freshness {
    match arrival {
        Some(t) if now.saturating_duration_since(t) <= timeout => Freshness::Fresh,
        _ => Freshness::Stale,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Watchdog {
    timeout: Duration,
}

impl Watchdog {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn from_ms(timeout_ms: u64) -> Self {
        Self::new(Duration::from_millis(timeout_ms))
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    #[inline]
    pub fn classify(&self, now: Instant, arrival: Option<Instant>) -> Freshness {
        classify(now, arrival, self.timeout)
    }
}
