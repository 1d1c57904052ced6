//! Runner against simulated hardware on the real clock.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;
use throttle_core::mocks::NoopSource;
use throttle_core::{ActuatorHandle, BuildError, LoopCfg, RunParams, run};
use throttle_hardware::{SimCommand, SimulatedActuator, SimulatedSource};
use throttle_traits::clock::MonotonicClock;

fn params(ticks: u64) -> RunParams {
    RunParams {
        loop_cfg: LoopCfg {
            tick_hz: 1000,
            source_timeout_ms: 10,
        },
        max_ticks: Some(ticks),
        ..RunParams::default()
    }
}

#[test]
fn runs_requested_ticks_and_brakes_on_exit() {
    let actuator = ActuatorHandle::new(SimulatedActuator::fixed_rpm(1_000.0));
    let source = SimulatedSource::constant(200, Duration::from_millis(1));
    let stats = run(
        source,
        actuator.clone(),
        MonotonicClock::new(),
        params(200),
        Arc::new(AtomicBool::new(false)),
    )
    .unwrap();

    assert_eq!(stats.ticks, 200);
    assert_eq!(
        stats.drive_ticks + stats.brake_ticks + stats.failsafe_ticks,
        200
    );
    assert!(stats.drive_ticks > 0, "{stats:?}");
    assert!(stats.samples_received > 0);
    assert_eq!(
        actuator.with(|a| a.last_command()),
        Some(SimCommand::Brake(-10.0))
    );
}

#[test]
fn silent_source_is_failsafe_every_tick() {
    let actuator = ActuatorHandle::new(SimulatedActuator::new());
    let stats = run(
        NoopSource,
        actuator,
        MonotonicClock::new(),
        params(50),
        Arc::new(AtomicBool::new(false)),
    )
    .unwrap();
    assert_eq!(stats.failsafe_ticks, 50);
    assert_eq!(stats.samples_received, 0);
}

#[test]
fn raised_shutdown_flag_stops_before_first_tick() {
    let actuator = ActuatorHandle::new(SimulatedActuator::new());
    let stats = run(
        SimulatedSource::silent(),
        actuator.clone(),
        MonotonicClock::new(),
        RunParams {
            max_ticks: None,
            ..params(0)
        },
        Arc::new(AtomicBool::new(true)),
    )
    .unwrap();
    assert_eq!(stats.ticks, 0);
    assert_eq!(
        actuator.with(|a| a.last_command()),
        Some(SimCommand::Brake(-10.0))
    );
}

#[test]
fn zero_tick_rate_is_rejected() {
    let mut p = params(1);
    p.loop_cfg.tick_hz = 0;
    let err = run(
        SimulatedSource::silent(),
        ActuatorHandle::new(SimulatedActuator::new()),
        MonotonicClock::new(),
        p,
        Arc::new(AtomicBool::new(false)),
    )
    .unwrap_err();
    assert!(err.downcast_ref::<BuildError>().is_some(), "{err:?}");
}
