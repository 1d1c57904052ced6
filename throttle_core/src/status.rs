//! Outcome of a single control tick.

/// Write issued to the actuator on a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActuatorCommand {
    Drive(f32),
    Brake(f32),
}

/// Why the tick fell back to the fixed safe brake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailsafeCause {
    /// No command within the staleness timeout (or none ever received).
    StaleCommand,
    /// The actuator could not report its speed.
    RpmUnavailable,
}

/// Public status of one tick of the control loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickStatus {
    /// Derated, smoothed motoring current.
    Driving { current_a: f32 },
    /// `clean * min_drive_a`: taken for a non-positive command, and also for a
    /// positive one while the rotor is at or below the reverse guard.
    Braking { current_a: f32 },
    /// Fixed safe brake.
    Failsafe { current_a: f32, cause: FailsafeCause },
}

impl TickStatus {
    pub fn command(&self) -> ActuatorCommand {
        match *self {
            TickStatus::Driving { current_a } => ActuatorCommand::Drive(current_a),
            TickStatus::Braking { current_a } | TickStatus::Failsafe { current_a, .. } => {
                ActuatorCommand::Brake(current_a)
            }
        }
    }

    pub fn is_failsafe(&self) -> bool {
        matches!(self, TickStatus::Failsafe { .. })
    }
}
