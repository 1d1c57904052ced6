pub mod clock;

use std::fmt;

pub use clock::{Clock, MonotonicClock};

/// Latched power-stage fault reported by an actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FaultCode {
    #[default]
    None,
    OverVoltage,
    UnderVoltage,
    GateDriver,
}

impl fmt::Display for FaultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FaultCode::None => "FAULT_CODE_NONE",
            FaultCode::OverVoltage => "FAULT_CODE_OVER_VOLTAGE",
            FaultCode::UnderVoltage => "FAULT_CODE_UNDER_VOLTAGE",
            FaultCode::GateDriver => "FAULT_CODE_GATE_DRIVER",
        })
    }
}

/// Power-stage engine driven by the control loop.
///
/// Commutation, state estimation and the current loop live behind this trait.
pub trait Actuator {
    /// Request motoring current; the sign selects direction.
    fn set_drive_current(
        &mut self,
        amps: f32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    /// Request regenerative/resistive braking current.
    fn set_brake_current(
        &mut self,
        amps: f32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    /// Set the PWM duty cycle directly, bypassing current control.
    fn set_duty(
        &mut self,
        duty: f32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    /// Instantaneous signed electrical RPM.
    fn rpm(&mut self) -> Result<f32, Box<dyn std::error::Error + Send + Sync>>;
    /// Currently latched fault, `FaultCode::None` when healthy.
    fn fault_code(&mut self) -> Result<FaultCode, Box<dyn std::error::Error + Send + Sync>>;
    /// Signed commutation step count since power-up.
    fn tachometer(&mut self) -> Result<i32, Box<dyn std::error::Error + Send + Sync>>;
}

/// Transport delivering one raw command byte per update.
pub trait CommandSource {
    fn read(
        &mut self,
        timeout: std::time::Duration,
    ) -> Result<u8, Box<dyn std::error::Error + Send + Sync>>;
}
