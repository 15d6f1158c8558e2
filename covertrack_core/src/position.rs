//! Cover position on the closure axis.
//!
//! 0 is fully open, 100 is fully closed. Travelling up (opening) lowers the
//! value, travelling down (closing) raises it. Hosts that show "percent open"
//! convert at the edge with [`Position::open_percent`].

use std::fmt;

/// Closure percentage, always within `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position(u8);

impl Position {
    pub const MAX: u8 = 100;

    pub const OPEN: Position = Position(0);
    pub const CLOSED: Position = Position(100);
    /// Programmed intermediate stop (75 % open).
    pub const INTERMEDIATE: Position = Position(25);
    /// Programmed tilt/ventilation stop (25 % open).
    pub const TILT_VENTILATION: Position = Position(75);
    /// Placeholder for "moving, exact value unknown". Not a measurement.
    pub const UNDEFINED: Position = Position(50);

    /// Clamp `v` into range.
    #[inline]
    pub const fn new(v: u8) -> Self {
        if v > Self::MAX {
            Position(Self::MAX)
        } else {
            Position(v)
        }
    }

    /// Clamp a wide signed value into range.
    #[inline]
    pub fn saturating_from(v: i128) -> Self {
        Position(v.clamp(0, i128::from(Self::MAX)) as u8)
    }

    #[inline]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Host display convention: 100 = open, 0 = closed.
    #[inline]
    pub const fn open_percent(self) -> u8 {
        Self::MAX - self.0
    }

    #[inline]
    pub const fn from_open_percent(p: u8) -> Self {
        let p = if p > Self::MAX { Self::MAX } else { p };
        Position(Self::MAX - p)
    }

    /// Absolute distance in percentage points.
    #[inline]
    pub const fn distance(self, other: Position) -> u8 {
        self.0.abs_diff(other.0)
    }
}

impl From<Position> for u8 {
    fn from(p: Position) -> Self {
        p.0
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Direction of the travel currently being estimated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TravelDirection {
    /// Toward `Position::OPEN`.
    Up,
    /// Toward `Position::CLOSED`.
    Down,
    #[default]
    Stopped,
}

impl TravelDirection {
    pub const fn as_str(self) -> &'static str {
        match self {
            TravelDirection::Up => "up",
            TravelDirection::Down => "down",
            TravelDirection::Stopped => "stopped",
        }
    }
}
