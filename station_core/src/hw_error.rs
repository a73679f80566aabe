//! Maps `Box<dyn Error>` from trait boundaries to typed `StationError`.
//!
//! The traits in `station_traits` return `Box<dyn Error + Send + Sync>`; this
//! module converts those to our typed error enum, with an optional
//! feature-gated path for `station_hardware::HwError` downcasting.

use crate::error::StationError;

/// Map a trait-boundary error to a typed `StationError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> StationError {
    #[cfg(feature = "hardware-errors")]
    {
        use station_hardware::error::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            return match hw {
                HwError::Timeout | HwError::DataReadyTimeout => StationError::Timeout,
                HwError::Io(io) => StationError::Io(io.to_string()),
                other => StationError::HardwareFault(other.to_string()),
            };
        }
    }

    // Fallback: string-based detection
    let s = e.to_string();
    if s.to_lowercase().contains("timeout") {
        StationError::Timeout
    } else {
        StationError::Hardware(s)
    }
}
