//! RPM-based drive derating (two-point speed governor).
//!
//! Full authority below `soft_rpm`, a linear roll-off through the band, and
//! the negative authority floor at and above `hard_rpm`. The roll-off starts
//! at the unmodified base current and ends at the floor value, so the curve
//! is continuous at both thresholds.
use crate::config::{ControlCfg, CurrentCfg};
use crate::util::map_range;

#[derive(Debug, Clone, Copy)]
pub struct SpeedGovernor {
    soft_rpm: f32,
    hard_rpm: f32,
    max_drive_a: f32,
    floor_a: f32,
}

impl SpeedGovernor {
    pub fn new(soft_rpm: f32, hard_rpm: f32, max_drive_a: f32, floor_a: f32) -> Self {
        Self {
            soft_rpm,
            hard_rpm,
            max_drive_a,
            floor_a,
        }
    }

    pub fn from_cfg(control: &ControlCfg, current: &CurrentCfg) -> Self {
        Self::new(
            control.soft_rpm,
            control.hard_rpm,
            current.max_drive_a,
            current.authority_floor_a,
        )
    }

    /// Current requested at the hard stop: the negated authority floor.
    #[inline]
    pub fn stop_current(&self) -> f32 {
        -self.floor_a
    }

    /// Requested current for a positive normalized command at `rpm`.
    pub fn derate(&self, command: f32, rpm: f32) -> f32 {
        let base = command * self.max_drive_a;
        let stop = self.stop_current();
        if rpm >= self.hard_rpm {
            stop
        } else if rpm >= self.soft_rpm {
            // Rounding near hard_rpm must not dip below the hard-stop value.
            map_range(rpm, self.soft_rpm, self.hard_rpm, base, stop).max(stop)
        } else {
            base
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn governor() -> SpeedGovernor {
        SpeedGovernor::new(41_000.0, 44_000.0, 60.0, 1.0)
    }

    #[test]
    fn below_soft_threshold_is_unmodified() {
        let g = governor();
        assert_eq!(g.derate(0.5, 0.0), 30.0);
        assert_eq!(g.derate(0.5, 40_999.0), 30.0);
    }

    #[test]
    fn continuous_at_both_thresholds() {
        let g = governor();
        assert_eq!(g.derate(0.5, 41_000.0), 30.0);
        let just_below_hard = g.derate(0.5, 43_999.99);
        assert!((just_below_hard - g.stop_current()).abs() < 1e-2);
        assert_eq!(g.derate(0.5, 44_000.0), -1.0);
    }

    #[test]
    fn midpoint_is_average_of_base_and_floor() {
        let g = governor();
        assert_eq!(g.derate(0.5, 42_500.0), 14.5);
    }

    #[test]
    fn beyond_hard_threshold_is_floor() {
        let g = governor();
        assert_eq!(g.derate(1.0, 80_000.0), -1.0);
    }
}
