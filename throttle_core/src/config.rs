//! Runtime configuration types for the control loop.
//!
//! These are the plain structs consumed by `Throttle` and the runner.
//! They are separate from the TOML-deserialized config in `throttle_config`.

/// Command shaping and speed governor thresholds.
#[derive(Debug, Clone)]
pub struct ControlCfg {
    /// Deadband half-width as a fraction of full scale. Default: 0.10.
    pub hysteresis: f32,
    /// Derating starts at this electrical RPM.
    pub soft_rpm: f32,
    /// Drive is forced to the authority floor at and above this RPM.
    pub hard_rpm: f32,
    /// Drive requires RPM above this guard; tolerates sensor noise near zero.
    pub reverse_guard_rpm: f32,
}

impl Default for ControlCfg {
    fn default() -> Self {
        Self {
            hysteresis: 0.10,
            soft_rpm: 41_000.0,
            hard_rpm: 44_000.0,
            reverse_guard_rpm: -500.0,
        }
    }
}

/// Current limits in amperes.
#[derive(Debug, Clone)]
pub struct CurrentCfg {
    /// Full-scale drive current.
    pub max_drive_a: f32,
    /// Braking-direction scale; negative.
    pub min_drive_a: f32,
    /// Smallest non-zero magnitude the drive branch will command.
    pub authority_floor_a: f32,
}

impl Default for CurrentCfg {
    fn default() -> Self {
        Self {
            max_drive_a: 60.0,
            min_drive_a: -60.0,
            authority_floor_a: 1.0,
        }
    }
}

/// Command freshness watchdog.
#[derive(Debug, Clone)]
pub struct SafetyCfg {
    /// A command older than this is stale.
    pub stale_timeout_ms: u64,
    /// Brake current applied while stale; negative and distinct from any computed value.
    pub safe_brake_a: f32,
}

impl Default for SafetyCfg {
    fn default() -> Self {
        Self {
            stale_timeout_ms: 500,
            safe_brake_a: -10.0,
        }
    }
}

/// Scheduler settings.
#[derive(Debug, Clone)]
pub struct LoopCfg {
    pub tick_hz: u32,
    /// Per-read timeout handed to the command source.
    pub source_timeout_ms: u64,
}

impl Default for LoopCfg {
    fn default() -> Self {
        Self {
            tick_hz: 1000,
            source_timeout_ms: 100,
        }
    }
}
