#![no_main]
use std::sync::Arc;
use std::time::Duration;

use covertrack_core::{Position, StatusCode, StatusReconciler, TravelEstimator};
use covertrack_traits::clock::test_clock::TestClock;
use libfuzzer_sys::fuzz_target;

// Pairs of (status byte, milliseconds to advance) drive the reconciler; the
// estimate must stay in range whatever the device reports.
fuzz_target!(|data: &[u8]| {
    let clock = TestClock::new();
    let mut est = TravelEstimator::with_clock(
        Duration::from_secs(40),
        Duration::from_secs(30),
        Arc::new(clock.clone()),
    );
    est.set_position(Position::CLOSED);
    let mut rec = StatusReconciler::new();
    for pair in data.chunks(2) {
        rec.on_status(StatusCode::from_byte(pair[0]), &mut est);
        if let Some(ms) = pair.get(1) {
            clock.advance(Duration::from_millis(u64::from(*ms) * 100));
        }
        if let Some(p) = est.current_position() {
            assert!(p.get() <= 100);
        }
    }
});
