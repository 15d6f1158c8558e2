//! Maps `Box<dyn Error>` from the transmitter boundary to typed `CoverError`.
//!
//! `covertrack_traits::Transmitter::send` returns `Box<dyn Error + Send + Sync>`;
//! this module converts those to our typed error enum, with an optional
//! feature-gated path for `covertrack_sim::error::SimError` downcasting.

use crate::error::CoverError;

/// Map a trait-boundary error to a typed `CoverError`.
///
/// Attempts to downcast known transmitter error types first, then falls back
/// to string-based heuristics.
pub fn map_transmit_error(e: &(dyn std::error::Error + 'static)) -> CoverError {
    #[cfg(feature = "sim-errors")]
    {
        use covertrack_sim::error::SimError;
        if let Some(sim) = e.downcast_ref::<SimError>() {
            return match sim {
                SimError::Disconnected => CoverError::Disconnected,
                other => CoverError::TransmitterFault(other.to_string()),
            };
        }
    }

    let s = e.to_string();
    if s.to_lowercase().contains("disconnected") {
        CoverError::Disconnected
    } else {
        CoverError::Transmitter(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_message() {
        let e = std::io::Error::other("serial port busy");
        assert_eq!(
            map_transmit_error(&e),
            CoverError::Transmitter("serial port busy".into())
        );
        let e = std::io::Error::other("stick Disconnected");
        assert_eq!(map_transmit_error(&e), CoverError::Disconnected);
    }

    #[cfg(feature = "sim-errors")]
    #[test]
    fn downcasts_sim_errors() {
        use covertrack_sim::error::SimError;
        assert_eq!(
            map_transmit_error(&SimError::Disconnected),
            CoverError::Disconnected
        );
        assert!(matches!(
            map_transmit_error(&SimError::UnknownChannel(4)),
            CoverError::TransmitterFault(_)
        ));
    }
}
