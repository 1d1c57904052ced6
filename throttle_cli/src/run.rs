//! Control loop execution: config mapping, hardware assembly, and the debug console.

use crate::rt::{RtOptions, setup_rt_once};
use eyre::WrapErr;
use std::io::BufRead;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;
use throttle_core::error::Result as CoreResult;
use throttle_core::{ActuatorHandle, Console, LoopStats, RunParams};
use throttle_hardware::{SimulatedActuator, SimulatedSource};
use throttle_traits::clock::MonotonicClock;
use throttle_traits::{Actuator, CommandSource};

/// Byte period of the simulated command link.
const SIM_BYTE_INTERVAL: Duration = Duration::from_millis(5);

#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub ticks: Option<u64>,
    pub sim_byte: Option<u8>,
    pub console: bool,
    /// Stdout is reserved for the stats object; console replies move to stderr.
    pub json: bool,
    pub rt: RtOptions,
}

/// Simulated actuator; `THROTTLE_TEST_SIM_RPM` pins its speed for tests.
fn sim_actuator() -> SimulatedActuator {
    match std::env::var("THROTTLE_TEST_SIM_RPM")
        .ok()
        .and_then(|v| v.parse::<f32>().ok())
    {
        Some(rpm) => SimulatedActuator::fixed_rpm(rpm),
        None => SimulatedActuator::new(),
    }
}

pub fn run_loop(
    cfg: &throttle_config::Config,
    opts: RunOptions,
    shutdown: Arc<AtomicBool>,
) -> CoreResult<LoopStats> {
    setup_rt_once(opts.rt);

    let mut params = RunParams::from_config(cfg);
    params.max_ticks = opts.ticks;

    let actuator = ActuatorHandle::new(sim_actuator());
    if opts.console {
        spawn_console(actuator.clone(), opts.json);
    }

    #[cfg(all(feature = "hardware", target_os = "linux"))]
    {
        if let Some(device) = cfg.source.device.as_deref() {
            let timeout = Duration::from_millis(cfg.source.read_timeout_ms);
            let source = throttle_hardware::UartSource::open(device, cfg.source.baud, timeout)
                .wrap_err_with(|| format!("open uart {device}"))?;
            tracing::info!(device, baud = cfg.source.baud, "command source: uart");
            return execute(source, actuator, params, shutdown);
        }
    }

    let source = match opts.sim_byte {
        Some(byte) => SimulatedSource::constant(byte, SIM_BYTE_INTERVAL),
        None => SimulatedSource::silent(),
    };
    tracing::info!(sim_byte = ?opts.sim_byte, "command source: simulated");
    execute(source, actuator, params, shutdown)
}

fn execute<S, A>(
    source: S,
    actuator: ActuatorHandle<A>,
    params: RunParams,
    shutdown: Arc<AtomicBool>,
) -> CoreResult<LoopStats>
where
    S: CommandSource + Send + 'static,
    A: Actuator,
{
    throttle_core::run(source, actuator, MonotonicClock::new(), params, shutdown)
        .wrap_err("control loop")
}

/// Serve debug commands from stdin on a detached thread until EOF.
fn spawn_console<A: Actuator + Send + 'static>(actuator: ActuatorHandle<A>, json: bool) {
    let console = Console::new(actuator);
    let spawned = std::thread::Builder::new()
        .name("console".into())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                let reply = console.execute(&line);
                if json {
                    eprintln!("{reply}");
                } else {
                    println!("{reply}");
                }
            }
            tracing::debug!("console input closed");
        });
    if let Err(e) = spawned {
        tracing::warn!(error = %e, "failed to start debug console");
    }
}

/// Print loop and scheduling stats to stderr.
pub fn print_stats(stats: &LoopStats, tick_hz: u32) {
    let period_us = throttle_core::util::tick_period(tick_hz).as_secs_f64() * 1e6;
    let pct = |n: u64| {
        if stats.ticks == 0 {
            0.0
        } else {
            n as f64 * 100.0 / stats.ticks as f64
        }
    };
    eprintln!("\n--- Throttle Stats ---");
    eprintln!("Ticks: {} (period {period_us:.3} us)", stats.ticks);
    eprintln!("Drive: {} ({:.1}%)", stats.drive_ticks, pct(stats.drive_ticks));
    eprintln!("Brake: {} ({:.1}%)", stats.brake_ticks, pct(stats.brake_ticks));
    eprintln!(
        "Failsafe: {} ({:.1}%)",
        stats.failsafe_ticks,
        pct(stats.failsafe_ticks)
    );
    eprintln!("Samples received: {}", stats.samples_received);
    eprintln!(
        "Missed deadlines: {} (worst {} us late)",
        stats.overruns,
        stats.worst_lateness.as_micros()
    );
    eprintln!("----------------------\n");
}

pub fn stats_json(stats: &LoopStats) -> serde_json::Value {
    serde_json::json!({
        "ticks": stats.ticks,
        "drive_ticks": stats.drive_ticks,
        "brake_ticks": stats.brake_ticks,
        "failsafe_ticks": stats.failsafe_ticks,
        "samples_received": stats.samples_received,
        "overruns": stats.overruns,
        "worst_lateness_us": stats.worst_lateness.as_micros() as u64,
    })
}
