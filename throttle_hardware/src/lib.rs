pub mod error;
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod uart;

use crate::error::HwError;
use std::collections::VecDeque;
use std::time::Duration;
use throttle_traits::{Actuator, CommandSource, FaultCode};

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub use uart::UartSource;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Last write observed by a `SimulatedActuator`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimCommand {
    Drive(f32),
    Brake(f32),
    Duty(f32),
}

/// Commutation steps per electrical revolution of a three-phase motor.
const STEPS_PER_REV: f64 = 6.0;

/// First-order motor model advanced by a fixed step on every write.
///
/// rpm' = drive_gain * amps - drag * rpm while driving; braking pulls rpm
/// toward zero proportionally to the brake current magnitude. The tachometer
/// integrates six steps per electrical revolution.
#[derive(Debug, Clone)]
pub struct SimulatedActuator {
    rpm: f32,
    hold_rpm: bool,
    step_s: f32,
    drive_gain: f32,
    brake_gain: f32,
    drag: f32,
    last: Option<SimCommand>,
    writes: u64,
    tacho: f64,
    fault: FaultCode,
}

impl Default for SimulatedActuator {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedActuator {
    pub fn new() -> Self {
        Self {
            rpm: 0.0,
            hold_rpm: false,
            step_s: 0.001,
            drive_gain: 2_000.0,
            brake_gain: 1_500.0,
            drag: 0.5,
            last: None,
            writes: 0,
            tacho: 0.0,
            fault: FaultCode::None,
        }
    }

    /// Actuator whose speed never changes, for exercising the derating band.
    pub fn fixed_rpm(rpm: f32) -> Self {
        Self {
            rpm,
            hold_rpm: true,
            ..Self::new()
        }
    }

    /// Latched gate-driver fault: every write fails, queries keep working.
    pub fn failing() -> Self {
        Self::new().with_fault(FaultCode::GateDriver)
    }

    /// Latch `fault`; any code other than `None` rejects writes.
    pub fn with_fault(mut self, fault: FaultCode) -> Self {
        self.fault = fault;
        self
    }

    pub fn last_command(&self) -> Option<SimCommand> {
        self.last
    }

    pub fn writes(&self) -> u64 {
        self.writes
    }

    pub fn current_rpm(&self) -> f32 {
        self.rpm
    }

    fn record(&mut self, cmd: SimCommand) -> Result<(), BoxError> {
        if self.fault != FaultCode::None {
            return Err(Box::new(HwError::Actuator(self.fault.to_string())));
        }
        self.last = Some(cmd);
        self.writes = self.writes.saturating_add(1);
        if !self.hold_rpm {
            self.integrate(cmd);
        }
        self.tacho += f64::from(self.rpm) / 60.0 * STEPS_PER_REV * f64::from(self.step_s);
        Ok(())
    }

    fn integrate(&mut self, cmd: SimCommand) {
        let dt = self.step_s;
        let accel = match cmd {
            SimCommand::Drive(amps) => self.drive_gain * amps - self.drag * self.rpm,
            SimCommand::Brake(amps) => {
                let pull = self.brake_gain * amps.abs();
                -self.rpm.signum() * pull.min(self.rpm.abs() / dt)
            }
            SimCommand::Duty(_) => -self.drag * self.rpm,
        };
        self.rpm += accel * dt;
    }
}

impl Actuator for SimulatedActuator {
    fn set_drive_current(&mut self, amps: f32) -> Result<(), BoxError> {
        tracing::trace!(amps, "sim drive");
        self.record(SimCommand::Drive(amps))
    }

    fn set_brake_current(&mut self, amps: f32) -> Result<(), BoxError> {
        tracing::trace!(amps, "sim brake");
        self.record(SimCommand::Brake(amps))
    }

    fn set_duty(&mut self, duty: f32) -> Result<(), BoxError> {
        tracing::debug!(duty, "sim duty");
        self.record(SimCommand::Duty(duty))
    }

    fn rpm(&mut self) -> Result<f32, BoxError> {
        Ok(self.rpm)
    }

    fn fault_code(&mut self) -> Result<FaultCode, BoxError> {
        Ok(self.fault)
    }

    fn tachometer(&mut self) -> Result<i32, BoxError> {
        // Saturating float-to-int cast.
        Ok(self.tacho as i32)
    }
}

/// Command source that plays back bytes at a fixed interval.
///
/// Once the script is exhausted it either repeats the last byte (`constant`)
/// or goes silent, blocking for the full read timeout like an idle UART.
#[derive(Debug, Clone)]
pub struct SimulatedSource {
    script: VecDeque<u8>,
    repeat_last: Option<u8>,
    interval: Duration,
}

impl SimulatedSource {
    /// Emit `byte` every `interval` forever.
    pub fn constant(byte: u8, interval: Duration) -> Self {
        Self {
            script: VecDeque::new(),
            repeat_last: Some(byte),
            interval,
        }
    }

    /// Emit `bytes` once, then fall silent.
    pub fn scripted(bytes: impl IntoIterator<Item = u8>, interval: Duration) -> Self {
        Self {
            script: bytes.into_iter().collect(),
            repeat_last: None,
            interval,
        }
    }

    /// Never delivers anything.
    pub fn silent() -> Self {
        Self::scripted(std::iter::empty(), Duration::ZERO)
    }
}

impl CommandSource for SimulatedSource {
    fn read(&mut self, timeout: Duration) -> Result<u8, BoxError> {
        let next = self.script.front().copied().or(self.repeat_last);
        match next {
            Some(byte) if self.interval <= timeout => {
                std::thread::sleep(self.interval);
                self.script.pop_front();
                tracing::trace!(byte, "sim command byte");
                Ok(byte)
            }
            _ => {
                std::thread::sleep(timeout);
                Err(Box::new(HwError::Timeout))
            }
        }
    }
}
