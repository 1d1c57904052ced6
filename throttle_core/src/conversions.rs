//! `From` implementations bridging `throttle_config` types to `throttle_core` types.

use crate::config::{ControlCfg, CurrentCfg, LoopCfg, SafetyCfg};

// ── ControlCfg ───────────────────────────────────────────────────────────────

impl From<&throttle_config::ControlCfg> for ControlCfg {
    fn from(c: &throttle_config::ControlCfg) -> Self {
        Self {
            hysteresis: c.hysteresis,
            soft_rpm: c.soft_rpm,
            hard_rpm: c.hard_rpm,
            reverse_guard_rpm: c.reverse_guard_rpm,
        }
    }
}

// ── CurrentCfg ───────────────────────────────────────────────────────────────

impl From<&throttle_config::CurrentCfg> for CurrentCfg {
    fn from(c: &throttle_config::CurrentCfg) -> Self {
        let limits = c.resolve();
        Self {
            max_drive_a: limits.max_drive_a,
            min_drive_a: limits.min_drive_a,
            authority_floor_a: limits.authority_floor_a,
        }
    }
}

// ── SafetyCfg ────────────────────────────────────────────────────────────────

impl From<&throttle_config::Safety> for SafetyCfg {
    fn from(c: &throttle_config::Safety) -> Self {
        Self {
            stale_timeout_ms: c.stale_timeout_ms,
            safe_brake_a: c.safe_brake_a,
        }
    }
}

// ── LoopCfg ──────────────────────────────────────────────────────────────────

impl From<&throttle_config::Config> for LoopCfg {
    fn from(c: &throttle_config::Config) -> Self {
        Self {
            tick_hz: c.runner.tick_hz,
            source_timeout_ms: c.source.read_timeout_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preset_flows_into_core_limits() {
        let cfg = throttle_config::load_toml(
            r#"
[current]
preset = "sten"
[runner]
tick_hz = 500
[source]
read_timeout_ms = 20
"#,
        )
        .expect("parse");
        let current = CurrentCfg::from(&cfg.current);
        assert_eq!(current.max_drive_a, 45.0);
        assert_eq!(current.min_drive_a, -30.0);
        let lp = LoopCfg::from(&cfg);
        assert_eq!(lp.tick_hz, 500);
        assert_eq!(lp.source_timeout_ms, 20);
    }
}
