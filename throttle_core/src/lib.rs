#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core throttle control logic (hardware-agnostic).
//!
//! Hardware access goes through `throttle_traits::Actuator` and
//! `throttle_traits::CommandSource`.
//!
//! ## Architecture
//!
//! - **Latch**: single-slot, last-writer-wins command hand-off (`latch`)
//! - **Sampling**: background thread feeding the latch (`sampler`)
//! - **Watchdog**: FRESH/STALE classification, recomputed every tick (`watchdog`)
//! - **Shaping**: deadband, RPM derating, two-history smoothing
//!   (`deadband`, `derating`, `smoother`)
//! - **Control**: per-tick decision and actuator write (`control`)
//! - **Scheduling**: absolute-deadline ticker and loop runner (`ticker`, `runner`)
//! - **Debug**: console commands over the shared actuator handle (`console`)
//!
//! ## Units
//!
//! Commands are normalized to [-1.0, 1.0], currents are amperes (positive
//! drives, negative brakes), speeds are electrical RPM.

pub mod actuator;
pub mod builder;
pub mod config;
pub mod console;
pub mod control;
pub mod conversions;
pub mod deadband;
pub mod derating;
pub mod error;
pub mod hw_error;
pub mod latch;
pub mod mocks;
pub mod runner;
pub mod sampler;
pub mod smoother;
pub mod status;
pub mod ticker;
pub mod util;
pub mod watchdog;

pub use actuator::ActuatorHandle;
pub use builder::ThrottleBuilder;
pub use config::{ControlCfg, CurrentCfg, LoopCfg, SafetyCfg};
pub use console::Console;
pub use control::Throttle;
pub use error::{BuildError, Result, ThrottleError};
pub use latch::{CommandSample, LatchReader, LatchWriter, latch};
pub use runner::{LoopStats, RunParams, run};
pub use sampler::CommandSampler;
pub use smoother::FilterState;
pub use status::{ActuatorCommand, FailsafeCause, TickStatus};
pub use ticker::Ticker;
pub use watchdog::{Freshness, Watchdog};
