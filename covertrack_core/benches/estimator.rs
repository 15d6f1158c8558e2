use std::sync::Arc;
use std::time::Duration;

use covertrack_core::{Position, TravelEstimator, status_entry};
use covertrack_traits::StatusCode;
use covertrack_traits::clock::test_clock::TestClock;
use criterion::{Criterion, black_box, criterion_group, criterion_main};

fn bench_current_position(c: &mut Criterion) {
    let clock = TestClock::new();
    let mut est = TravelEstimator::with_clock(
        Duration::from_secs(40),
        Duration::from_secs(30),
        Arc::new(clock.clone()),
    );
    est.set_position(Position::OPEN);
    est.start_travel(Position::CLOSED);
    clock.advance(Duration::from_millis(12_345));

    c.bench_function("current_position_mid_travel", |b| {
        b.iter(|| black_box(est.current_position()))
    });

    c.bench_function("travel_time", |b| {
        b.iter(|| black_box(est.travel_time(black_box(Position::new(13)), black_box(Position::new(87)))))
    });
}

fn bench_status_lookup(c: &mut Criterion) {
    c.bench_function("status_entry_all_bytes", |b| {
        b.iter(|| {
            for byte in 0u8..=0x20 {
                black_box(status_entry(StatusCode::from_byte(black_box(byte))));
            }
        })
    });
}

criterion_group!(benches, bench_current_position, bench_status_lookup);
criterion_main!(benches);
