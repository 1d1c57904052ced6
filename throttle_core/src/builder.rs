//! Builder for `Throttle`.
//!
//! Every section is optional and falls back to its `Default`; `build()`
//! rejects combinations the pipeline cannot honor.

use crate::config::{ControlCfg, CurrentCfg, SafetyCfg};
use crate::control::Throttle;
use crate::error::{BuildError, Result};
use crate::smoother::FilterState;

#[derive(Debug, Default)]
pub struct ThrottleBuilder {
    control: Option<ControlCfg>,
    current: Option<CurrentCfg>,
    safety: Option<SafetyCfg>,
    filter_state: Option<FilterState>,
}

impl ThrottleBuilder {
    pub fn with_control(mut self, control: ControlCfg) -> Self {
        self.control = Some(control);
        self
    }

    pub fn with_current(mut self, current: CurrentCfg) -> Self {
        self.current = Some(current);
        self
    }

    pub fn with_safety(mut self, safety: SafetyCfg) -> Self {
        self.safety = Some(safety);
        self
    }

    /// Seed the smoother history; defaults to zeros.
    pub fn with_filter_state(mut self, state: FilterState) -> Self {
        self.filter_state = Some(state);
        self
    }

    /// Apply all sections from a validated TOML config.
    pub fn apply_config(self, cfg: &throttle_config::Config) -> Self {
        self.with_control((&cfg.control).into())
            .with_current((&cfg.current).into())
            .with_safety((&cfg.safety).into())
    }

    pub fn build(self) -> Result<Throttle> {
        let control = self.control.unwrap_or_default();
        let current = self.current.unwrap_or_default();
        let safety = self.safety.unwrap_or_default();

        if !(0.0..1.0).contains(&control.hysteresis) {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "hysteresis must be in [0, 1)",
            )));
        }
        if control.soft_rpm.is_nan() || control.hard_rpm.is_nan() {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "rpm thresholds must not be NaN",
            )));
        }
        if control.soft_rpm >= control.hard_rpm {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "soft_rpm must be below hard_rpm",
            )));
        }
        if current.max_drive_a.is_nan() || current.max_drive_a <= 0.0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "max_drive_a must be > 0",
            )));
        }
        if current.min_drive_a.is_nan() || current.min_drive_a >= 0.0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "min_drive_a must be < 0",
            )));
        }
        if current.authority_floor_a.is_nan() || current.authority_floor_a <= 0.0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "authority_floor_a must be > 0",
            )));
        }
        if current.authority_floor_a >= current.max_drive_a {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "authority_floor_a must be below max_drive_a",
            )));
        }
        if safety.stale_timeout_ms == 0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "stale_timeout_ms must be >= 1",
            )));
        }
        if safety.safe_brake_a.is_nan() || safety.safe_brake_a >= 0.0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "safe_brake_a must be < 0",
            )));
        }

        Ok(Throttle::new(
            control,
            current,
            safety,
            self.filter_state.unwrap_or_default(),
        ))
    }
}
