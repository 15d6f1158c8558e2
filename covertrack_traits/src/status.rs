//! Device status vocabulary reported by the radio receiver of a cover.

use std::fmt;

/// Status code sent back by a cover after a command or a local movement.
///
/// The byte values follow the radio stick's info-response encoding. Anything
/// outside the known set is carried as `Unrecognized` so it can be reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    NoInformation,
    TopPositionStop,
    BottomPositionStop,
    IntermediatePositionStop,
    TiltVentilationPositionStop,
    Blocking,
    Overheated,
    Timeout,
    StartToMoveUp,
    StartToMoveDown,
    MovingUp,
    MovingDown,
    StoppedInUndefinedPosition,
    TopPositionStopWithTiltPosition,
    BottomPositionStopWithIntermediatePosition,
    SwitchingDeviceSwitchedOff,
    SwitchingDeviceSwitchedOn,
    Unrecognized(u8),
}

impl StatusCode {
    /// Every named code, in byte order.
    pub const ALL: [StatusCode; 17] = [
        StatusCode::NoInformation,
        StatusCode::TopPositionStop,
        StatusCode::BottomPositionStop,
        StatusCode::IntermediatePositionStop,
        StatusCode::TiltVentilationPositionStop,
        StatusCode::Blocking,
        StatusCode::Overheated,
        StatusCode::Timeout,
        StatusCode::StartToMoveUp,
        StatusCode::StartToMoveDown,
        StatusCode::MovingUp,
        StatusCode::MovingDown,
        StatusCode::StoppedInUndefinedPosition,
        StatusCode::TopPositionStopWithTiltPosition,
        StatusCode::BottomPositionStopWithIntermediatePosition,
        StatusCode::SwitchingDeviceSwitchedOff,
        StatusCode::SwitchingDeviceSwitchedOn,
    ];

    pub const fn from_byte(b: u8) -> Self {
        match b {
            0x00 => StatusCode::NoInformation,
            0x01 => StatusCode::TopPositionStop,
            0x02 => StatusCode::BottomPositionStop,
            0x03 => StatusCode::IntermediatePositionStop,
            0x04 => StatusCode::TiltVentilationPositionStop,
            0x05 => StatusCode::Blocking,
            0x06 => StatusCode::Overheated,
            0x07 => StatusCode::Timeout,
            0x08 => StatusCode::StartToMoveUp,
            0x09 => StatusCode::StartToMoveDown,
            0x0A => StatusCode::MovingUp,
            0x0B => StatusCode::MovingDown,
            0x0D => StatusCode::StoppedInUndefinedPosition,
            0x0E => StatusCode::TopPositionStopWithTiltPosition,
            0x0F => StatusCode::BottomPositionStopWithIntermediatePosition,
            0x10 => StatusCode::SwitchingDeviceSwitchedOff,
            0x11 => StatusCode::SwitchingDeviceSwitchedOn,
            other => StatusCode::Unrecognized(other),
        }
    }

    pub const fn as_byte(self) -> u8 {
        match self {
            StatusCode::NoInformation => 0x00,
            StatusCode::TopPositionStop => 0x01,
            StatusCode::BottomPositionStop => 0x02,
            StatusCode::IntermediatePositionStop => 0x03,
            StatusCode::TiltVentilationPositionStop => 0x04,
            StatusCode::Blocking => 0x05,
            StatusCode::Overheated => 0x06,
            StatusCode::Timeout => 0x07,
            StatusCode::StartToMoveUp => 0x08,
            StatusCode::StartToMoveDown => 0x09,
            StatusCode::MovingUp => 0x0A,
            StatusCode::MovingDown => 0x0B,
            StatusCode::StoppedInUndefinedPosition => 0x0D,
            StatusCode::TopPositionStopWithTiltPosition => 0x0E,
            StatusCode::BottomPositionStopWithIntermediatePosition => 0x0F,
            StatusCode::SwitchingDeviceSwitchedOff => 0x10,
            StatusCode::SwitchingDeviceSwitchedOn => 0x11,
            StatusCode::Unrecognized(b) => b,
        }
    }

    /// Blocking, overheated and timeout responses.
    pub const fn is_fault(self) -> bool {
        matches!(
            self,
            StatusCode::Blocking | StatusCode::Overheated | StatusCode::Timeout
        )
    }

    pub const fn name(self) -> &'static str {
        match self {
            StatusCode::NoInformation => "no_information",
            StatusCode::TopPositionStop => "top_position_stop",
            StatusCode::BottomPositionStop => "bottom_position_stop",
            StatusCode::IntermediatePositionStop => "intermediate_position_stop",
            StatusCode::TiltVentilationPositionStop => "tilt_ventilation_position_stop",
            StatusCode::Blocking => "blocking",
            StatusCode::Overheated => "overheated",
            StatusCode::Timeout => "timeout",
            StatusCode::StartToMoveUp => "start_to_move_up",
            StatusCode::StartToMoveDown => "start_to_move_down",
            StatusCode::MovingUp => "moving_up",
            StatusCode::MovingDown => "moving_down",
            StatusCode::StoppedInUndefinedPosition => "stopped_in_undefined_position",
            StatusCode::TopPositionStopWithTiltPosition => "top_position_stop_with_tilt_position",
            StatusCode::BottomPositionStopWithIntermediatePosition => {
                "bottom_position_stop_with_intermediate_position"
            }
            StatusCode::SwitchingDeviceSwitchedOff => "switching_device_switched_off",
            StatusCode::SwitchingDeviceSwitchedOn => "switching_device_switched_on",
            StatusCode::Unrecognized(_) => "unrecognized",
        }
    }
}

impl From<u8> for StatusCode {
    fn from(b: u8) -> Self {
        Self::from_byte(b)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusCode::Unrecognized(b) => write!(f, "unrecognized(0x{b:02x})"),
            other => f.write_str(other.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_codes_keep_their_byte() {
        for code in StatusCode::ALL {
            assert_eq!(StatusCode::from_byte(code.as_byte()), code);
        }
    }

    #[test]
    fn gap_byte_is_unrecognized() {
        // 0x0C is not assigned by the receiver
        assert_eq!(StatusCode::from_byte(0x0C), StatusCode::Unrecognized(0x0C));
        assert_eq!(StatusCode::from(0xFF).to_string(), "unrecognized(0xff)");
    }

    #[test]
    fn only_three_faults() {
        let faults: Vec<_> = StatusCode::ALL.iter().filter(|c| c.is_fault()).collect();
        assert_eq!(faults.len(), 3);
    }
}
