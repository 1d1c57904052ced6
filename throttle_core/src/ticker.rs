//! Absolute-deadline periodic scheduler.
//!
//! Deadline `n` is always `origin + n * period`. A late tick is counted as an
//! overrun and the next deadline stays on the original grid, so lateness never
//! accumulates into drift.
use std::time::{Duration, Instant};
use throttle_traits::clock::Clock;

pub struct Ticker<C: Clock> {
    clock: C,
    origin: Instant,
    period: Duration,
    tick: u64,
    overruns: u64,
    worst_lateness: Duration,
}

impl<C: Clock> Ticker<C> {
    /// Start a ticker whose grid is anchored at `clock.now()`.
    pub fn new(clock: C, period: Duration) -> Self {
        let origin = clock.now();
        Self::with_origin(clock, origin, period)
    }

    pub fn with_origin(clock: C, origin: Instant, period: Duration) -> Self {
        Self {
            clock,
            origin,
            period,
            tick: 0,
            overruns: 0,
            worst_lateness: Duration::ZERO,
        }
    }

    pub fn from_hz(clock: C, hz: u32) -> Self {
        Self::new(clock, crate::util::tick_period(hz))
    }

    /// Absolute deadline of tick `n`.
    pub fn deadline(&self, n: u64) -> Instant {
        let nanos = u64::try_from(self.period.as_nanos()).unwrap_or(u64::MAX);
        self.origin + Duration::from_nanos(nanos.saturating_mul(n))
    }

    /// Block until the next deadline on the grid. Returns the completed tick count.
    pub fn wait(&mut self) -> u64 {
        self.tick = self.tick.saturating_add(1);
        let deadline = self.deadline(self.tick);
        let now = self.clock.now();
        if now > deadline {
            let late = now - deadline;
            self.overruns = self.overruns.saturating_add(1);
            if late > self.worst_lateness {
                self.worst_lateness = late;
            }
            tracing::trace!(tick = self.tick, late_us = late.as_micros() as u64, "deadline overrun");
        } else {
            self.clock.sleep_until(deadline);
        }
        self.tick
    }

    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn origin(&self) -> Instant {
        self.origin
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn ticks(&self) -> u64 {
        self.tick
    }

    pub fn overruns(&self) -> u64 {
        self.overruns
    }

    pub fn worst_lateness(&self) -> Duration {
        self.worst_lateness
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use throttle_traits::clock::test_clock::TestClock;

    #[test]
    fn wakes_on_grid_without_drift() {
        let clock = TestClock::new();
        let mut t = Ticker::new(clock.clone(), Duration::from_millis(1));
        for n in 1..=1000u64 {
            // Simulated work of varying length inside the period.
            clock.advance(Duration::from_micros((n % 7) * 100));
            assert_eq!(t.wait(), n);
            assert_eq!(clock.now(), t.origin() + Duration::from_millis(n));
        }
        assert_eq!(t.overruns(), 0);
    }

    #[test]
    fn overrun_keeps_original_grid() {
        let clock = TestClock::new();
        let mut t = Ticker::new(clock.clone(), Duration::from_millis(1));
        clock.advance(Duration::from_micros(2500));
        t.wait(); // deadline 1 ms, now 2.5 ms
        assert_eq!(t.overruns(), 1);
        assert_eq!(t.worst_lateness(), Duration::from_micros(1500));
        t.wait(); // deadline 2 ms, still late
        assert_eq!(t.overruns(), 2);
        t.wait(); // deadline 3 ms: catches up on the grid
        assert_eq!(clock.now(), t.origin() + Duration::from_millis(3));
        assert_eq!(t.overruns(), 2);
    }

    #[test]
    fn from_hz_derives_period() {
        let t = Ticker::from_hz(TestClock::new(), 1000);
        assert_eq!(t.period(), Duration::from_millis(1));
        assert_eq!(t.deadline(5), t.origin() + Duration::from_millis(5));
    }

    #[rstest::rstest]
    #[case(3_000)]
    #[case(7_000)]
    #[case(9_999)]
    fn non_divisor_rates_hold_frequency(#[case] hz: u32) {
        let clock = TestClock::new();
        let mut t = Ticker::from_hz(clock.clone(), hz);
        for _ in 0..hz {
            t.wait();
        }
        let span = clock.now() - t.origin();
        let err = span.abs_diff(Duration::from_secs(1));
        assert!(err < Duration::from_micros(10), "{hz} Hz spanned {span:?}");
        assert_eq!(t.overruns(), 0);
    }
}
