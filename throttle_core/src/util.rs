//! Common time/period and interpolation helpers.

use std::time::Duration;

/// Number of nanoseconds in one second.
pub const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Tick period for a rate in Hz, kept at nanosecond resolution so rates that
/// do not divide 1 MHz still hold their frequency.
/// - Clamps `hz` to at least 1 to avoid division by zero.
#[inline]
pub fn tick_period(hz: u32) -> Duration {
    debug_assert!(hz > 0, "tick_hz must be > 0");
    Duration::from_nanos(NANOS_PER_SEC / u64::from(hz.max(1)))
}

/// Linearly map `x` from `[in_min, in_max]` onto `[out_min, out_max]`.
///
/// No clamping; callers bound `x` themselves. `in_min == in_max` yields `out_min`.
#[inline]
pub fn map_range(x: f32, in_min: f32, in_max: f32, out_min: f32, out_max: f32) -> f32 {
    let span = in_max - in_min;
    if span == 0.0 {
        return out_min;
    }
    (x - in_min) * (out_max - out_min) / span + out_min
}
