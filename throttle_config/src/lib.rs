#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas for the throttle controller.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Every section is optional; omitted values fall back to the stock
//!   outrunner parameter set.
//! - Current limits may start from a named preset and override single fields.
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ControlCfg {
    /// Deadband half-width as a fraction of full scale, in [0.0, 1.0).
    pub hysteresis: f32,
    /// Start derating drive current at this electrical RPM.
    pub soft_rpm: f32,
    /// Drive authority is forced to the floor at and above this RPM.
    pub hard_rpm: f32,
    /// Drive is only allowed while RPM is above this (slightly negative) guard.
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

/// Named current-limit tables for known motor setups.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CurrentPreset {
    #[default]
    Outrunner1,
    Sten,
}

/// Resolved current limits, in amperes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrentLimits {
    pub max_drive_a: f32,
    /// Braking-direction limit; negative.
    pub min_drive_a: f32,
    pub authority_floor_a: f32,
}

impl CurrentPreset {
    pub fn limits(self) -> CurrentLimits {
        match self {
            CurrentPreset::Outrunner1 => CurrentLimits {
                max_drive_a: 60.0,
                min_drive_a: -60.0,
                authority_floor_a: 1.0,
            },
            CurrentPreset::Sten => CurrentLimits {
                max_drive_a: 45.0,
                min_drive_a: -30.0,
                authority_floor_a: 0.05,
            },
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct CurrentCfg {
    /// Base table; explicit fields below override single values.
    pub preset: Option<CurrentPreset>,
    pub max_drive_a: Option<f32>,
    pub min_drive_a: Option<f32>,
    pub authority_floor_a: Option<f32>,
}

impl CurrentCfg {
    pub fn resolve(&self) -> CurrentLimits {
        let base = self.preset.unwrap_or_default().limits();
        CurrentLimits {
            max_drive_a: self.max_drive_a.unwrap_or(base.max_drive_a),
            min_drive_a: self.min_drive_a.unwrap_or(base.min_drive_a),
            authority_floor_a: self.authority_floor_a.unwrap_or(base.authority_floor_a),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Safety {
    /// Brake with `safe_brake_a` once the last command is older than this.
    pub stale_timeout_ms: u64,
    /// Fixed failsafe brake current; negative.
    pub safe_brake_a: f32,
}

impl Default for Safety {
    fn default() -> Self {
        Self {
            stale_timeout_ms: 500,
            safe_brake_a: -10.0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RunnerCfg {
    /// Control loop rate.
    pub tick_hz: u32,
}

impl Default for RunnerCfg {
    fn default() -> Self {
        Self { tick_hz: 1000 }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SourceCfg {
    /// UART device for the command stream (hardware builds only).
    pub device: Option<String>,
    pub baud: u32,
    /// Max time a single byte read may block before the sampler re-polls.
    #[serde(alias = "timeout_ms")]
    pub read_timeout_ms: u64,
}

impl Default for SourceCfg {
    fn default() -> Self {
        Self {
            device: None,
            baud: 9600,
            read_timeout_ms: 100,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub control: ControlCfg,
    pub current: CurrentCfg,
    pub safety: Safety,
    pub runner: RunnerCfg,
    pub source: SourceCfg,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Control
        let c = &self.control;
        if !(0.0..1.0).contains(&c.hysteresis) {
            eyre::bail!("control.hysteresis must be in [0.0, 1.0)");
        }
        if !c.soft_rpm.is_finite() || !c.hard_rpm.is_finite() {
            eyre::bail!("control.soft_rpm and control.hard_rpm must be finite");
        }
        if c.soft_rpm >= c.hard_rpm {
            eyre::bail!("control.soft_rpm must be < control.hard_rpm");
        }
        if c.reverse_guard_rpm.is_nan() || c.reverse_guard_rpm > 0.0 {
            eyre::bail!("control.reverse_guard_rpm must be <= 0");
        }

        // Current
        let limits = self.current.resolve();
        if !limits.max_drive_a.is_finite() || limits.max_drive_a <= 0.0 {
            eyre::bail!("current.max_drive_a must be > 0");
        }
        if !limits.min_drive_a.is_finite() || limits.min_drive_a >= 0.0 {
            eyre::bail!("current.min_drive_a must be < 0");
        }
        if limits.authority_floor_a.is_nan() || limits.authority_floor_a <= 0.0 {
            eyre::bail!("current.authority_floor_a must be > 0");
        }
        if limits.authority_floor_a >= limits.max_drive_a {
            eyre::bail!("current.authority_floor_a must be < current.max_drive_a");
        }

        // Safety
        if self.safety.stale_timeout_ms == 0 {
            eyre::bail!("safety.stale_timeout_ms must be >= 1");
        }
        if self.safety.stale_timeout_ms > 60 * 1000 {
            eyre::bail!("safety.stale_timeout_ms must be <= 60000");
        }
        if !self.safety.safe_brake_a.is_finite() || self.safety.safe_brake_a >= 0.0 {
            eyre::bail!("safety.safe_brake_a must be < 0");
        }

        // Runner
        if self.runner.tick_hz == 0 {
            eyre::bail!("runner.tick_hz must be > 0");
        }
        if self.runner.tick_hz > 10_000 {
            eyre::bail!("runner.tick_hz must be <= 10000");
        }

        // Source
        if self.source.baud == 0 {
            eyre::bail!("source.baud must be > 0");
        }
        if self.source.read_timeout_ms == 0 {
            eyre::bail!("source.read_timeout_ms must be >= 1");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_outrunner_defaults() {
        let cfg = load_toml("").expect("parse empty");
        cfg.validate().expect("defaults validate");
        assert_eq!(cfg.current.resolve(), CurrentPreset::Outrunner1.limits());
        assert_eq!(cfg.safety.stale_timeout_ms, 500);
        assert_eq!(cfg.runner.tick_hz, 1000);
    }

    #[test]
    fn explicit_fields_override_preset() {
        let cfg = load_toml(
            r#"
[current]
preset = "sten"
max_drive_a = 40.0
"#,
        )
        .expect("parse");
        let limits = cfg.current.resolve();
        assert_eq!(limits.max_drive_a, 40.0);
        assert_eq!(limits.min_drive_a, -30.0);
        assert_eq!(limits.authority_floor_a, 0.05);
    }
}
