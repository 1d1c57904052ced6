//! Per-tick control pipeline.
//!
//! Every tick is decided from scratch:
//! - stale command: fixed safe brake, nothing else runs
//! - fresh, positive after deadband, RPM above the reverse guard:
//!   derate by RPM, smooth, drive
//! - otherwise: brake proportional to the normalized command
use std::time::Instant;

use throttle_traits::Actuator;

use crate::actuator::ActuatorHandle;
use crate::config::{ControlCfg, CurrentCfg, SafetyCfg};
use crate::deadband::Deadband;
use crate::derating::SpeedGovernor;
use crate::latch::CommandSample;
use crate::smoother::{FilterState, OutputSmoother};
use crate::status::{FailsafeCause, TickStatus};
use crate::watchdog::{Freshness, Watchdog};

pub struct Throttle {
    control: ControlCfg,
    current: CurrentCfg,
    safety: SafetyCfg,
    watchdog: Watchdog,
    deadband: Deadband,
    governor: SpeedGovernor,
    smoother: OutputSmoother,
    freshness: Freshness,
}

impl core::fmt::Debug for Throttle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Throttle")
            .field("freshness", &self.freshness)
            .field("filter", &self.smoother.state())
            .finish_non_exhaustive()
    }
}

impl Throttle {
    pub fn builder() -> crate::builder::ThrottleBuilder {
        crate::builder::ThrottleBuilder::default()
    }

    pub(crate) fn new(
        control: ControlCfg,
        current: CurrentCfg,
        safety: SafetyCfg,
        filter_state: FilterState,
    ) -> Self {
        Self {
            watchdog: Watchdog::from_ms(safety.stale_timeout_ms),
            deadband: Deadband::new(control.hysteresis),
            governor: SpeedGovernor::from_cfg(&control, &current),
            smoother: OutputSmoother::with_state(current.authority_floor_a, filter_state),
            // No command has arrived yet.
            freshness: Freshness::Stale,
            control,
            current,
            safety,
        }
    }

    pub fn control_cfg(&self) -> &ControlCfg {
        &self.control
    }

    pub fn current_cfg(&self) -> &CurrentCfg {
        &self.current
    }

    pub fn safety_cfg(&self) -> &SafetyCfg {
        &self.safety
    }

    pub fn filter_state(&self) -> FilterState {
        self.smoother.state()
    }

    /// Freshness seen on the most recent tick.
    pub fn freshness(&self) -> Freshness {
        self.freshness
    }

    /// Decide this tick's output without touching an actuator.
    ///
    /// `read_rpm` is only called when the command is fresh; `None` means the
    /// speed could not be read.
    pub fn evaluate<F>(
        &mut self,
        now: Instant,
        sample: Option<CommandSample>,
        read_rpm: F,
    ) -> TickStatus
    where
        F: FnOnce() -> Option<f32>,
    {
        let freshness = self.watchdog.classify(now, sample.map(|s| s.arrival));
        if freshness != self.freshness {
            match freshness {
                Freshness::Stale => tracing::warn!(
                    timeout_ms = self.safety.stale_timeout_ms,
                    "command stale; applying safe brake"
                ),
                Freshness::Fresh => tracing::info!("command fresh; resuming control"),
            }
            self.freshness = freshness;
        }

        let sample = match (freshness, sample) {
            (Freshness::Fresh, Some(s)) => s,
            _ => return self.failsafe(FailsafeCause::StaleCommand),
        };

        let clean = self.deadband.normalize(sample.value);
        let Some(rpm) = read_rpm() else {
            return self.failsafe(FailsafeCause::RpmUnavailable);
        };

        if clean > 0.0 && rpm > self.control.reverse_guard_rpm {
            let requested = self.governor.derate(clean, rpm);
            let current_a = self.smoother.smooth(requested);
            tracing::trace!(clean, rpm, requested, current_a, "drive");
            TickStatus::Driving { current_a }
        } else {
            let current_a = clean * self.current.min_drive_a;
            tracing::trace!(clean, rpm, current_a, "brake");
            TickStatus::Braking { current_a }
        }
    }

    /// Evaluate one tick and write the result through `actuator`.
    ///
    /// Actuator errors are logged and never stop the loop.
    pub fn tick<A: Actuator>(
        &mut self,
        now: Instant,
        sample: Option<CommandSample>,
        actuator: &ActuatorHandle<A>,
    ) -> TickStatus {
        let status = self.evaluate(now, sample, || match actuator.rpm() {
            Ok(rpm) => Some(rpm),
            Err(e) => {
                tracing::warn!(error = %e, "rpm read failed");
                None
            }
        });
        if let Err(e) = actuator.apply(status.command()) {
            tracing::warn!(error = %e, command = ?status.command(), "actuator write failed");
        }
        status
    }

    fn failsafe(&self, cause: FailsafeCause) -> TickStatus {
        TickStatus::Failsafe {
            current_a: self.safety.safe_brake_a,
            cause,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn throttle() -> Throttle {
        Throttle::builder().build().expect("defaults build")
    }

    #[test]
    fn starts_stale_and_brakes_safely() {
        let mut t = throttle();
        let status = t.evaluate(Instant::now(), None, || panic!("rpm read while stale"));
        assert_eq!(
            status,
            TickStatus::Failsafe {
                current_a: -10.0,
                cause: FailsafeCause::StaleCommand
            }
        );
    }

    #[test]
    fn negative_command_brakes_proportionally() {
        let mut t = throttle();
        let now = Instant::now();
        let s = CommandSample::new(-0.5625, now);
        match t.evaluate(now, Some(s), || Some(0.0)) {
            TickStatus::Braking { current_a } => {
                // clean = -0.525, min_drive = -60 A
                assert!((current_a - 31.5).abs() < 1e-4, "got {current_a}");
            }
            other => panic!("expected Braking, got {other:?}"),
        }
    }

    #[test]
    fn deadband_command_brakes_with_zero() {
        let mut t = throttle();
        let now = Instant::now();
        let s = CommandSample::new(0.05, now);
        assert_eq!(
            t.evaluate(now, Some(s), || Some(0.0)),
            TickStatus::Braking { current_a: 0.0 }
        );
    }

    #[test]
    fn reverse_spin_below_guard_blocks_drive() {
        let mut t = throttle();
        let now = Instant::now();
        let s = CommandSample::new(0.5, now);
        let status = t.evaluate(now, Some(s), || Some(-600.0));
        // Positive command on this branch still scales min_drive_a (-60 A).
        let clean = 0.5 / 0.9 - 0.1;
        match status {
            TickStatus::Braking { current_a } => {
                assert!(current_a < 0.0, "got {current_a}");
                assert!((current_a + clean * 60.0).abs() < 1e-3, "got {current_a}");
            }
            other => panic!("expected Braking, got {other:?}"),
        }
        // Filter history untouched on the braking branch.
        assert_eq!(t.filter_state(), FilterState::default());
    }

    #[test]
    fn missing_rpm_is_failsafe() {
        let mut t = throttle();
        let now = Instant::now();
        let s = CommandSample::new(0.5, now);
        let status = t.evaluate(now, Some(s), || None);
        assert_eq!(
            status,
            TickStatus::Failsafe {
                current_a: -10.0,
                cause: FailsafeCause::RpmUnavailable
            }
        );
    }

    #[test]
    fn freshness_is_recomputed_each_tick() {
        let mut t = throttle();
        let t0 = Instant::now();
        let s = CommandSample::new(0.5, t0);
        assert!(!t.evaluate(t0, Some(s), || Some(0.0)).is_failsafe());
        let late = t0 + Duration::from_millis(501);
        assert!(t.evaluate(late, Some(s), || Some(0.0)).is_failsafe());
        assert_eq!(t.freshness(), Freshness::Stale);
        let s2 = CommandSample::new(0.5, late);
        assert!(!t.evaluate(late, Some(s2), || Some(0.0)).is_failsafe());
        assert_eq!(t.freshness(), Freshness::Fresh);
    }
}
