//! Maps `Box<dyn Error>` from trait boundaries to typed `OdoError`.
//!
//! The traits in `scoot_traits` use `Box<dyn Error + Send + Sync>` for maximum
//! flexibility; this module converts those to our typed error enum, with an
//! optional feature-gated path for `scoot_hardware::HwError` downcasting.

use crate::error::OdoError;

/// Map a trait-boundary error to a typed `OdoError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> OdoError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<scoot_hardware::error::HwError>() {
            return match hw {
                scoot_hardware::error::HwError::Unsupported => OdoError::HardwareUnsupported,
                scoot_hardware::error::HwError::Io(io) => OdoError::Io(io.to_string()),
                other => OdoError::Hardware(other.to_string()),
            };
        }
    }

    let s = e.to_string();
    if s.to_lowercase().contains("not supported") {
        OdoError::HardwareUnsupported
    } else {
        OdoError::Hardware(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "hardware-errors")]
    #[test]
    fn downcasts_hw_error() {
        let e: Box<dyn std::error::Error + Send + Sync> =
            Box::new(scoot_hardware::error::HwError::Gpio("pin 12 busy".into()));
        match map_hw_error(e.as_ref()) {
            OdoError::Hardware(msg) => assert!(msg.contains("pin 12 busy")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn falls_back_to_message() {
        let e: Box<dyn std::error::Error + Send + Sync> =
            Box::new(std::io::Error::other("edge detect failed"));
        match map_hw_error(e.as_ref()) {
            OdoError::Hardware(msg) => assert_eq!(msg, "edge detect failed"),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
