//! Maps `Box<dyn Error>` from trait boundaries to typed `ThrottleError`.
//!
//! The traits in `throttle_traits` use `Box<dyn Error + Send + Sync>`; this
//! module converts those to our typed error enum, with an optional
//! feature-gated path for `throttle_hardware::HwError` downcasting.

use crate::error::ThrottleError;

/// Map a trait-boundary error to a typed `ThrottleError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> ThrottleError {
    #[cfg(feature = "hardware-errors")]
    {
        use throttle_hardware::error::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            return match hw {
                HwError::Timeout => ThrottleError::Timeout,
                other => ThrottleError::HardwareFault(other.to_string()),
            };
        }
    }

    let s = e.to_string();
    if s.to_lowercase().contains("timeout") {
        ThrottleError::Timeout
    } else {
        ThrottleError::Hardware(s)
    }
}
