use std::sync::Arc;
use std::time::Duration;

use covertrack_core::{
    NormalizedState, Position, Reconciliation, StatusCode, StatusReconciler, TravelDirection,
    TravelEstimator, status_entry,
};
use covertrack_core::reconciler::EstimatorEffect;
use covertrack_traits::clock::test_clock::TestClock;
use rstest::rstest;

fn estimator(clock: &TestClock) -> TravelEstimator {
    let mut est = TravelEstimator::with_clock(
        Duration::from_secs(40),
        Duration::from_secs(30),
        Arc::new(clock.clone()),
    );
    est.set_position(Position::new(40));
    est
}

#[rstest]
#[case(StatusCode::TopPositionStop, NormalizedState::Open, Some(0), Some(false))]
#[case(StatusCode::BottomPositionStop, NormalizedState::Closed, Some(100), Some(true))]
#[case(StatusCode::IntermediatePositionStop, NormalizedState::Intermediate, Some(25), Some(false))]
#[case(StatusCode::TiltVentilationPositionStop, NormalizedState::TiltVentilation, Some(75), Some(false))]
#[case(StatusCode::StartToMoveUp, NormalizedState::Opening, Some(50), Some(false))]
#[case(StatusCode::MovingDown, NormalizedState::Closing, Some(50), Some(false))]
#[case(StatusCode::StoppedInUndefinedPosition, NormalizedState::Undefined, Some(50), Some(false))]
#[case(StatusCode::TopPositionStopWithTiltPosition, NormalizedState::TiltVentilation, Some(75), Some(false))]
#[case(StatusCode::BottomPositionStopWithIntermediatePosition, NormalizedState::Intermediate, Some(25), Some(true))]
#[case(StatusCode::NoInformation, NormalizedState::Unknown, None, None)]
#[case(StatusCode::SwitchingDeviceSwitchedOn, NormalizedState::Unknown, None, None)]
#[case(StatusCode::Unrecognized(0x42), NormalizedState::Unknown, None, None)]
fn table_rows(
    #[case] code: StatusCode,
    #[case] state: NormalizedState,
    #[case] position: Option<u8>,
    #[case] closed: Option<bool>,
) {
    let entry = status_entry(code);
    assert_eq!(entry.state, state);
    assert_eq!(entry.position.map(Position::get), position);
    assert_eq!(entry.is_closed, closed);
}

#[rstest]
#[case(StatusCode::Blocking)]
#[case(StatusCode::Overheated)]
#[case(StatusCode::Timeout)]
fn faults_degrade_to_unknown_from_any_state(#[case] fault: StatusCode) {
    for prior in StatusCode::ALL {
        let clock = TestClock::new();
        let mut est = estimator(&clock);
        let mut rec = StatusReconciler::new();
        rec.on_status(prior, &mut est);
        clock.advance_secs(2);
        let out = rec.on_status(fault, &mut est);
        assert!(out.fault);
        let s = rec.state();
        assert_eq!(s.normalized_state, NormalizedState::Unknown, "after {prior}");
        assert_eq!(s.position, None);
        assert_eq!(s.tilt_position, None);
        assert_eq!(s.is_closed, None);
        assert_eq!(s.status, Some(fault));
        assert_eq!(est.travel_direction(), TravelDirection::Stopped);
    }
}

#[test]
fn position_stops_pin_estimator() {
    for code in StatusCode::ALL {
        let EstimatorEffect::Pin(p) = status_entry(code).effect else {
            continue;
        };
        let clock = TestClock::new();
        let mut est = estimator(&clock);
        let mut rec = StatusReconciler::new();
        let out = rec.on_status(code, &mut est);
        assert_eq!(out.reconciliation, Reconciliation::Pinned(p), "{code}");
        assert!(est.is_position_confirmed());
        assert_eq!(est.current_position(), Some(p));
    }
}

#[test]
fn bottom_stop_confirms_closed() {
    let clock = TestClock::new();
    let mut est = estimator(&clock);
    let mut rec = StatusReconciler::new();
    rec.on_status(StatusCode::BottomPositionStop, &mut est);
    let s = rec.state();
    assert_eq!(s.normalized_state, NormalizedState::Closed);
    assert_eq!(s.is_closed, Some(true));
    assert_eq!(s.is_opening, Some(false));
    assert_eq!(s.is_closing, Some(false));
    assert!(est.is_position_confirmed());
    assert_eq!(est.current_position(), Some(Position::CLOSED));
}

#[test]
fn external_down_movement_starts_estimate() {
    let clock = TestClock::new();
    let mut est = estimator(&clock);
    let mut rec = StatusReconciler::new();
    let out = rec.on_status(StatusCode::StartToMoveDown, &mut est);
    assert_eq!(out.reconciliation, Reconciliation::Started(TravelDirection::Down));
    // 40 -> 100 at 40 s per full run: 60 points in 24 s
    clock.advance_secs(12);
    assert_eq!(est.current_position(), Some(Position::new(70)));
}
