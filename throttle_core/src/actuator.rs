//! Serialized access to the actuator.
//!
//! The control loop and the debug console both write through an
//! `ActuatorHandle`; each write holds the lock for exactly one call, so a
//! console `stop` lands either before or after a tick's write, never inside it.
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use throttle_traits::{Actuator, FaultCode};

use crate::error::ThrottleError;
use crate::hw_error::map_hw_error;
use crate::status::ActuatorCommand;

pub struct ActuatorHandle<A> {
    inner: Arc<Mutex<A>>,
}

impl<A> Clone for ActuatorHandle<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A: Actuator> ActuatorHandle<A> {
    pub fn new(actuator: A) -> Self {
        Self {
            inner: Arc::new(Mutex::new(actuator)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, A> {
        // A panicked writer must not prevent later brake commands.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn drive(&self, amps: f32) -> Result<(), ThrottleError> {
        self.lock()
            .set_drive_current(amps)
            .map_err(|e| map_hw_error(&*e))
    }

    pub fn brake(&self, amps: f32) -> Result<(), ThrottleError> {
        self.lock()
            .set_brake_current(amps)
            .map_err(|e| map_hw_error(&*e))
    }

    /// Direct duty write, outside the control loop's output stages.
    pub fn duty(&self, duty: f32) -> Result<(), ThrottleError> {
        self.lock()
            .set_duty(duty)
            .map_err(|e| map_hw_error(&*e))
    }

    pub fn rpm(&self) -> Result<f32, ThrottleError> {
        self.lock().rpm().map_err(|e| map_hw_error(&*e))
    }

    pub fn fault(&self) -> Result<FaultCode, ThrottleError> {
        self.lock().fault_code().map_err(|e| map_hw_error(&*e))
    }

    pub fn tacho(&self) -> Result<i32, ThrottleError> {
        self.lock().tachometer().map_err(|e| map_hw_error(&*e))
    }

    pub fn apply(&self, cmd: ActuatorCommand) -> Result<(), ThrottleError> {
        match cmd {
            ActuatorCommand::Drive(amps) => self.drive(amps),
            ActuatorCommand::Brake(amps) => self.brake(amps),
        }
    }

    /// Run `f` with exclusive access to the actuator.
    pub fn with<R>(&self, f: impl FnOnce(&mut A) -> R) -> R {
        f(&mut self.lock())
    }
}
