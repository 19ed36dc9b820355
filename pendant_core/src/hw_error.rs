//! Maps `Box<dyn Error>` from trait boundaries to typed `PendantError`.
//!
//! The traits in `pendant_traits` use `Box<dyn Error + Send + Sync>` so any
//! backend can plug in; this module converts those to our typed error enum,
//! with an optional feature-gated path for `pendant_hardware::HwError`.

use crate::error::PendantError;

/// Map a trait-boundary error to a typed `PendantError`.
///
/// Known hardware and I/O errors are downcast; anything else becomes
/// `PendantError::Hardware` with its message.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> PendantError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<pendant_hardware::error::HwError>() {
            return match hw {
                pendant_hardware::error::HwError::Io(io) => PendantError::Io(io.to_string()),
                other => PendantError::HardwareFault(other.to_string()),
            };
        }
    }

    if let Some(io) = e.downcast_ref::<std::io::Error>() {
        return PendantError::Io(io.to_string());
    }
    PendantError::Hardware(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_keep_their_kind() {
        let e = std::io::Error::other("spidev gone");
        assert!(matches!(map_hw_error(&e), PendantError::Io(m) if m.contains("spidev")));
    }

    #[cfg(feature = "hardware-errors")]
    #[test]
    fn hw_errors_become_faults() {
        let e = pendant_hardware::error::HwError::Bus("shift failed".into());
        assert!(matches!(map_hw_error(&e), PendantError::HardwareFault(m) if m.contains("shift")));
    }

    #[test]
    fn unknown_errors_fall_back_to_hardware() {
        let e: Box<dyn std::error::Error + Send + Sync> = "panel unplugged".into();
        assert!(matches!(map_hw_error(&*e), PendantError::Hardware(m) if m == "panel unplugged"));
    }
}
