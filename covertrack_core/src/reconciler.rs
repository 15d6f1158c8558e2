//! Status code → normalized cover state.
//!
//! Each `StatusCode` resolves to one `StatusEntry` via an exhaustive match;
//! applying it overwrites the reconciled `CoverState` and tells the estimator
//! what the device just reported.

use crate::estimator::TravelEstimator;
use crate::position::{Position, TravelDirection};
use covertrack_traits::StatusCode;

/// Host-facing cover state derived from status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NormalizedState {
    #[default]
    Unknown,
    Open,
    Closed,
    Opening,
    Closing,
    Intermediate,
    TiltVentilation,
    Undefined,
}

impl NormalizedState {
    pub const fn as_str(self) -> &'static str {
        match self {
            NormalizedState::Unknown => "unknown",
            NormalizedState::Open => "open",
            NormalizedState::Closed => "closed",
            NormalizedState::Opening => "opening",
            NormalizedState::Closing => "closing",
            NormalizedState::Intermediate => "intermediate",
            NormalizedState::TiltVentilation => "tilt_ventilation",
            NormalizedState::Undefined => "undefined",
        }
    }
}

impl core::fmt::Display for NormalizedState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a status code does to the estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EstimatorEffect {
    None,
    Pin(Position),
    Travel(TravelDirection),
    Stop,
}

/// One row of the status table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusEntry {
    pub state: NormalizedState,
    pub position: Option<Position>,
    pub tilt_position: Option<Position>,
    pub is_opening: Option<bool>,
    pub is_closing: Option<bool>,
    pub is_closed: Option<bool>,
    pub effect: EstimatorEffect,
}

impl StatusEntry {
    const UNKNOWN: StatusEntry = StatusEntry {
        state: NormalizedState::Unknown,
        position: None,
        tilt_position: None,
        is_opening: None,
        is_closing: None,
        is_closed: None,
        effect: EstimatorEffect::None,
    };

    const fn stopped_at(
        state: NormalizedState,
        position: Position,
        tilt: Position,
        closed: bool,
    ) -> StatusEntry {
        StatusEntry {
            state,
            position: Some(position),
            tilt_position: Some(tilt),
            is_opening: Some(false),
            is_closing: Some(false),
            is_closed: Some(closed),
            effect: EstimatorEffect::Pin(position),
        }
    }

    const fn moving(direction: TravelDirection) -> StatusEntry {
        let up = matches!(direction, TravelDirection::Up);
        StatusEntry {
            state: if up {
                NormalizedState::Opening
            } else {
                NormalizedState::Closing
            },
            position: Some(Position::UNDEFINED),
            tilt_position: Some(Position::UNDEFINED),
            is_opening: Some(up),
            is_closing: Some(!up),
            is_closed: Some(false),
            effect: EstimatorEffect::Travel(direction),
        }
    }
}

/// Table lookup for a status code.
pub const fn status_entry(code: StatusCode) -> StatusEntry {
    use StatusCode as S;
    match code {
        S::TopPositionStop => StatusEntry::stopped_at(
            NormalizedState::Open,
            Position::OPEN,
            Position::UNDEFINED,
            false,
        ),
        S::BottomPositionStop => StatusEntry::stopped_at(
            NormalizedState::Closed,
            Position::CLOSED,
            Position::UNDEFINED,
            true,
        ),
        S::IntermediatePositionStop => StatusEntry::stopped_at(
            NormalizedState::Intermediate,
            Position::INTERMEDIATE,
            Position::INTERMEDIATE,
            false,
        ),
        S::TiltVentilationPositionStop | S::TopPositionStopWithTiltPosition => {
            StatusEntry::stopped_at(
                NormalizedState::TiltVentilation,
                Position::TILT_VENTILATION,
                Position::TILT_VENTILATION,
                false,
            )
        }
        S::BottomPositionStopWithIntermediatePosition => StatusEntry::stopped_at(
            NormalizedState::Intermediate,
            Position::INTERMEDIATE,
            Position::INTERMEDIATE,
            true,
        ),
        S::StartToMoveUp | S::MovingUp => StatusEntry::moving(TravelDirection::Up),
        S::StartToMoveDown | S::MovingDown => StatusEntry::moving(TravelDirection::Down),
        S::StoppedInUndefinedPosition => StatusEntry {
            state: NormalizedState::Undefined,
            position: Some(Position::UNDEFINED),
            tilt_position: Some(Position::UNDEFINED),
            is_opening: Some(false),
            is_closing: Some(false),
            is_closed: Some(false),
            effect: EstimatorEffect::Stop,
        },
        S::Blocking | S::Overheated | S::Timeout => StatusEntry {
            effect: EstimatorEffect::Stop,
            ..StatusEntry::UNKNOWN
        },
        S::NoInformation
        | S::SwitchingDeviceSwitchedOff
        | S::SwitchingDeviceSwitchedOn
        | S::Unrecognized(_) => StatusEntry::UNKNOWN,
    }
}

/// Reconciled state of one cover. All fields start unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CoverState {
    pub status: Option<StatusCode>,
    pub normalized_state: NormalizedState,
    pub position: Option<Position>,
    pub tilt_position: Option<Position>,
    pub is_opening: Option<bool>,
    pub is_closing: Option<bool>,
    pub is_closed: Option<bool>,
}

/// What `on_status` did to the estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    Pinned(Position),
    Started(TravelDirection),
    Stopped,
    Untouched,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusOutcome {
    pub reconciliation: Reconciliation,
    /// Blocking, overheated or timeout.
    pub fault: bool,
    pub unrecognized: bool,
}

#[derive(Debug, Default, Clone)]
pub struct StatusReconciler {
    state: CoverState,
}

impl StatusReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &CoverState {
        &self.state
    }

    /// Apply a status event. The whole state is overwritten from the table
    /// row, so fields a code leaves undefined become unknown.
    pub fn on_status(&mut self, code: StatusCode, estimator: &mut TravelEstimator) -> StatusOutcome {
        let entry = status_entry(code);
        self.state = CoverState {
            status: Some(code),
            normalized_state: entry.state,
            position: entry.position,
            tilt_position: entry.tilt_position,
            is_opening: entry.is_opening,
            is_closing: entry.is_closing,
            is_closed: entry.is_closed,
        };

        let reconciliation = match entry.effect {
            EstimatorEffect::None => Reconciliation::Untouched,
            EstimatorEffect::Pin(p) => {
                estimator.set_position(p);
                Reconciliation::Pinned(p)
            }
            EstimatorEffect::Stop => {
                estimator.stop();
                Reconciliation::Stopped
            }
            EstimatorEffect::Travel(direction) => {
                // A run in this direction, even one whose estimate has arrived,
                // keeps its timing.
                if estimator.travel_direction() == direction {
                    Reconciliation::Untouched
                } else {
                    match direction {
                        TravelDirection::Up => estimator.start_travel_up(),
                        TravelDirection::Down => estimator.start_travel_down(),
                        TravelDirection::Stopped => estimator.stop(),
                    }
                    Reconciliation::Started(direction)
                }
            }
        };

        StatusOutcome {
            reconciliation,
            fault: code.is_fault(),
            unrecognized: matches!(code, StatusCode::Unrecognized(_)),
        }
    }

    /// Optimistic flags after the cover issued a command itself.
    ///
    /// `is_closed` is cleared: until the device reports again the cover
    /// derives it from the estimate.
    pub fn note_command(&mut self, direction: TravelDirection) {
        let (opening, closing) = match direction {
            TravelDirection::Up => (true, false),
            TravelDirection::Down => (false, true),
            TravelDirection::Stopped => (false, false),
        };
        self.state.is_opening = Some(opening);
        self.state.is_closing = Some(closing);
        self.state.is_closed = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use covertrack_traits::clock::test_clock::TestClock;
    use std::sync::Arc;
    use std::time::Duration;

    fn estimator(clock: &TestClock) -> TravelEstimator {
        TravelEstimator::with_clock(
            Duration::from_secs(40),
            Duration::from_secs(30),
            Arc::new(clock.clone()),
        )
    }

    #[test]
    fn bottom_stop_pins_closed() {
        let clock = TestClock::new();
        let mut est = estimator(&clock);
        est.set_position(Position::OPEN);
        let mut rec = StatusReconciler::new();
        let out = rec.on_status(StatusCode::BottomPositionStop, &mut est);
        assert_eq!(out.reconciliation, Reconciliation::Pinned(Position::CLOSED));
        assert!(!out.fault);
        let s = rec.state();
        assert_eq!(s.normalized_state, NormalizedState::Closed);
        assert_eq!(s.is_closed, Some(true));
        assert_eq!(s.is_opening, Some(false));
        assert_eq!(s.is_closing, Some(false));
        assert!(est.is_position_confirmed());
        assert_eq!(est.current_position(), Some(Position::CLOSED));
    }

    #[test]
    fn external_movement_starts_estimate_once() {
        let clock = TestClock::new();
        let mut est = estimator(&clock);
        est.set_position(Position::CLOSED);
        let mut rec = StatusReconciler::new();
        let first = rec.on_status(StatusCode::StartToMoveUp, &mut est);
        assert_eq!(first.reconciliation, Reconciliation::Started(TravelDirection::Up));
        clock.advance_secs(3);
        let second = rec.on_status(StatusCode::MovingUp, &mut est);
        assert_eq!(second.reconciliation, Reconciliation::Untouched);
        // 3 s of a 30 s full travel, not restarted by the second report
        assert_eq!(est.current_position(), Some(Position::new(90)));
    }

    #[test]
    fn fault_clears_state_and_stops() {
        let clock = TestClock::new();
        let mut est = estimator(&clock);
        est.set_position(Position::OPEN);
        est.start_travel_down();
        clock.advance_secs(4);
        let mut rec = StatusReconciler::new();
        let out = rec.on_status(StatusCode::Overheated, &mut est);
        assert!(out.fault);
        assert_eq!(out.reconciliation, Reconciliation::Stopped);
        assert_eq!(rec.state().normalized_state, NormalizedState::Unknown);
        assert_eq!(rec.state().position, None);
        assert_eq!(est.travel_direction(), TravelDirection::Stopped);
        assert_eq!(est.current_position(), Some(Position::new(10)));
    }

    #[test]
    fn unrecognized_leaves_estimator_alone() {
        let clock = TestClock::new();
        let mut est = estimator(&clock);
        est.set_position(Position::new(40));
        let mut rec = StatusReconciler::new();
        let out = rec.on_status(StatusCode::from_byte(0x0C), &mut est);
        assert!(out.unrecognized);
        assert_eq!(out.reconciliation, Reconciliation::Untouched);
        assert_eq!(est.current_position(), Some(Position::new(40)));
    }

    #[test]
    fn note_command_sets_optimistic_flags() {
        let mut rec = StatusReconciler::new();
        rec.note_command(TravelDirection::Down);
        assert_eq!(rec.state().is_closing, Some(true));
        assert_eq!(rec.state().is_opening, Some(false));
        assert_eq!(rec.state().is_closed, None);
        rec.note_command(TravelDirection::Stopped);
        assert_eq!(rec.state().is_closing, Some(false));
        assert_eq!(rec.state().normalized_state, NormalizedState::Unknown);
    }
}
