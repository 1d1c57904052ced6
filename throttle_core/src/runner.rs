use crate::actuator::ActuatorHandle;
use crate::config::{ControlCfg, CurrentCfg, LoopCfg, SafetyCfg};
use crate::control::Throttle;
use crate::error::{BuildError, Result as CoreResult};
use crate::latch::latch;
use crate::sampler::CommandSampler;
use crate::status::TickStatus;
use crate::ticker::Ticker;
use eyre::WrapErr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use throttle_traits::clock::Clock;
use throttle_traits::{Actuator, CommandSource};

/// Everything `run` needs besides the hardware.
#[derive(Debug, Clone, Default)]
pub struct RunParams {
    pub control: ControlCfg,
    pub current: CurrentCfg,
    pub safety: SafetyCfg,
    pub loop_cfg: LoopCfg,
    /// Stop after this many ticks; `None` runs until `shutdown` is raised.
    pub max_ticks: Option<u64>,
}

impl RunParams {
    /// Runtime parameters from a validated TOML config.
    pub fn from_config(cfg: &throttle_config::Config) -> Self {
        Self {
            control: (&cfg.control).into(),
            current: (&cfg.current).into(),
            safety: (&cfg.safety).into(),
            loop_cfg: cfg.into(),
            max_ticks: None,
        }
    }
}

/// Counters collected over one run of the control loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub ticks: u64,
    pub drive_ticks: u64,
    pub brake_ticks: u64,
    pub failsafe_ticks: u64,
    pub overruns: u64,
    pub worst_lateness: Duration,
    pub samples_received: u64,
}

impl LoopStats {
    fn record(&mut self, status: &TickStatus) {
        self.ticks = self.ticks.saturating_add(1);
        let slot = match status {
            TickStatus::Driving { .. } => &mut self.drive_ticks,
            TickStatus::Braking { .. } => &mut self.brake_ticks,
            TickStatus::Failsafe { .. } => &mut self.failsafe_ticks,
        };
        *slot = slot.saturating_add(1);
    }
}

/// Run the fixed-rate control loop until `shutdown` is raised or
/// `params.max_ticks` is reached.
///
/// The command source is sampled on a background thread; the loop itself
/// never blocks on it. On exit the actuator is left braking with the safe
/// value.
pub fn run<S, A, C>(
    source: S,
    actuator: ActuatorHandle<A>,
    clock: C,
    params: RunParams,
    shutdown: Arc<AtomicBool>,
) -> CoreResult<LoopStats>
where
    S: CommandSource + Send + 'static,
    A: Actuator,
    C: Clock + Clone + Send + Sync + 'static,
{
    if params.loop_cfg.tick_hz == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "tick_hz must be > 0",
        )));
    }
    let safe_brake_a = params.safety.safe_brake_a;
    let mut throttle = Throttle::builder()
        .with_control(params.control)
        .with_current(params.current)
        .with_safety(params.safety)
        .build()
        .wrap_err("build control loop")?;

    let (writer, mut reader) = latch();
    let source_timeout = Duration::from_millis(params.loop_cfg.source_timeout_ms.max(1));
    let sampler = CommandSampler::spawn(source, writer, source_timeout, clock.clone());
    let mut ticker = Ticker::from_hz(clock, params.loop_cfg.tick_hz);

    tracing::info!(
        tick_hz = params.loop_cfg.tick_hz,
        max_ticks = ?params.max_ticks,
        "control loop started"
    );

    let mut stats = LoopStats::default();
    loop {
        if shutdown.load(Ordering::Relaxed) {
            tracing::info!("shutdown requested");
            break;
        }
        if params.max_ticks.is_some_and(|max| stats.ticks >= max) {
            break;
        }

        let now = ticker.now();
        let sample = reader.latest();
        let status = throttle.tick(now, sample, &actuator);
        stats.record(&status);
        ticker.wait();
    }

    if let Err(e) = actuator.brake(safe_brake_a) {
        tracing::warn!(error = %e, "failed to apply safe brake on exit");
    }

    stats.overruns = ticker.overruns();
    stats.worst_lateness = ticker.worst_lateness();
    stats.samples_received = sampler.received();
    // Joins the sampler thread; bounded by one source read timeout.
    drop(sampler);
    drop(reader);

    if stats.overruns > 0 {
        tracing::warn!(
            overruns = stats.overruns,
            worst_lateness_us = stats.worst_lateness.as_micros() as u64,
            "control loop missed deadlines"
        );
    }
    tracing::info!(
        ticks = stats.ticks,
        drive = stats.drive_ticks,
        brake = stats.brake_ticks,
        failsafe = stats.failsafe_ticks,
        samples = stats.samples_received,
        "control loop stopped"
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_bucket_each_status() {
        let mut s = LoopStats::default();
        s.record(&TickStatus::Driving { current_a: 1.0 });
        s.record(&TickStatus::Braking { current_a: 0.0 });
        s.record(&TickStatus::Failsafe {
            current_a: -10.0,
            cause: crate::status::FailsafeCause::StaleCommand,
        });
        s.record(&TickStatus::Braking { current_a: 2.0 });
        assert_eq!(s.ticks, 4);
        assert_eq!(s.drive_ticks, 1);
        assert_eq!(s.brake_ticks, 2);
        assert_eq!(s.failsafe_ticks, 1);
    }

    #[test]
    fn params_follow_config_preset() {
        let cfg = throttle_config::load_toml("[current]\npreset = \"sten\"\n").unwrap();
        let p = RunParams::from_config(&cfg);
        assert_eq!(p.current.max_drive_a, 45.0);
        assert_eq!(p.loop_cfg.tick_hz, 1000);
        assert_eq!(p.max_ticks, None);
    }
}
