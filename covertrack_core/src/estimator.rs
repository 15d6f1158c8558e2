//! Time-based position estimate for covers without position feedback.
//!
//! The estimator keeps a baseline (`last_known_position` at a timestamp) and a
//! commanded target. While travel is unconfirmed the position is interpolated
//! linearly over the configured travel time for the direction of motion.

use crate::position::{Position, TravelDirection};
use covertrack_traits::clock::{Clock, MonotonicClock};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub struct TravelEstimator {
    travel_time_down: Duration,
    travel_time_up: Duration,
    last_known_position: Option<Position>,
    last_known_position_timestamp: Instant,
    travel_to_position: Option<Position>,
    position_confirmed: bool,
    travel_direction: TravelDirection,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl core::fmt::Debug for TravelEstimator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TravelEstimator")
            .field("travel_time_down", &self.travel_time_down)
            .field("travel_time_up", &self.travel_time_up)
            .field("last_known_position", &self.last_known_position)
            .field("travel_to_position", &self.travel_to_position)
            .field("position_confirmed", &self.position_confirmed)
            .field("travel_direction", &self.travel_direction)
            .finish()
    }
}

impl TravelEstimator {
    /// Estimator on the real monotonic clock.
    pub fn new(travel_time_down: Duration, travel_time_up: Duration) -> Self {
        Self::with_clock(travel_time_down, travel_time_up, Arc::new(MonotonicClock::new()))
    }

    pub fn with_clock(
        travel_time_down: Duration,
        travel_time_up: Duration,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        let now = clock.now();
        Self {
            travel_time_down,
            travel_time_up,
            last_known_position: None,
            last_known_position_timestamp: now,
            travel_to_position: None,
            position_confirmed: false,
            travel_direction: TravelDirection::Stopped,
            clock,
        }
    }

    /// Take `position` as ground truth with nothing in flight.
    pub fn set_position(&mut self, position: Position) {
        self.travel_to_position = Some(position);
        self.update_position(position);
        self.travel_direction = TravelDirection::Stopped;
    }

    /// Record an externally confirmed position. Travel stays unconfirmed
    /// unless it matches the in-flight target.
    pub fn update_position(&mut self, position: Position) {
        self.last_known_position = Some(position);
        self.last_known_position_timestamp = self.clock.now();
        self.position_confirmed = self.travel_to_position == Some(position);
    }

    /// Freeze the estimate at this instant. No-op without a known position.
    pub fn stop(&mut self) {
        let Some(stop_position) = self.current_position() else {
            return;
        };
        self.last_known_position = Some(stop_position);
        self.travel_to_position = Some(stop_position);
        self.position_confirmed = false;
        self.travel_direction = TravelDirection::Stopped;
    }

    /// Begin estimating travel toward `target`.
    ///
    /// From an unknown origin there is nothing to interpolate, so `target`
    /// becomes the known position immediately.
    pub fn start_travel(&mut self, target: Position) {
        let Some(_) = self.last_known_position else {
            self.set_position(target);
            return;
        };
        self.stop();
        self.last_known_position_timestamp = self.clock.now();
        self.travel_to_position = Some(target);
        self.position_confirmed = false;
        self.travel_direction = match self.last_known_position {
            Some(origin) if target > origin => TravelDirection::Down,
            _ => TravelDirection::Up,
        };
    }

    pub fn start_travel_up(&mut self) {
        self.start_travel(Position::OPEN);
    }

    pub fn start_travel_down(&mut self) {
        self.start_travel(Position::CLOSED);
    }

    /// Current position: exact when confirmed, interpolated otherwise.
    pub fn current_position(&self) -> Option<Position> {
        if self.position_confirmed {
            return self.last_known_position;
        }
        self.calculate_position()
    }

    fn calculate_position(&self) -> Option<Position> {
        let (Some(origin), Some(target)) = (self.last_known_position, self.travel_to_position)
        else {
            return self.last_known_position;
        };
        let remaining = self.travel_time(origin, target).as_nanos();
        if remaining == 0 {
            return Some(origin);
        }
        // Progress is clamped to [0, 1]: the estimate never passes its target.
        let elapsed = self
            .clock
            .elapsed_since(self.last_known_position_timestamp)
            .as_nanos()
            .min(remaining);
        // Both fit comfortably: remaining <= 100 * max travel time in ns.
        let remaining = i128::try_from(remaining).unwrap_or(i128::MAX);
        let elapsed = i128::try_from(elapsed).unwrap_or(i128::MAX);
        let origin_i = i128::from(origin.get());
        let relative = i128::from(target.get()) - origin_i;
        // origin + relative * progress, truncated; the numerator stays >= 0
        let numerator = origin_i
            .saturating_mul(remaining)
            .saturating_add(relative.saturating_mul(elapsed));
        Some(Position::saturating_from(numerator / remaining))
    }

    /// Duration of a travel between two positions at the configured speeds.
    pub fn travel_time(&self, from: Position, to: Position) -> Duration {
        let full = if to > from {
            self.travel_time_down
        } else {
            self.travel_time_up
        };
        crate::util::scale_duration(full, u32::from(from.distance(to)), u32::from(Position::MAX))
    }

    /// Remaining time until the current estimate reaches the target.
    pub fn time_to_target(&self) -> Option<Duration> {
        let current = self.current_position()?;
        let target = self.travel_to_position?;
        Some(self.travel_time(current, target))
    }

    pub fn travel_direction(&self) -> TravelDirection {
        self.travel_direction
    }

    pub fn target(&self) -> Option<Position> {
        self.travel_to_position
    }

    pub fn last_known_position(&self) -> Option<Position> {
        self.last_known_position
    }

    pub fn is_position_confirmed(&self) -> bool {
        self.position_confirmed
    }

    /// The estimate has arrived at the commanded target.
    pub fn position_reached(&self) -> bool {
        match (self.current_position(), self.travel_to_position) {
            (Some(current), Some(target)) => current == target,
            _ => false,
        }
    }

    /// Travel is in flight and the estimate has not yet arrived.
    pub fn is_traveling(&self) -> bool {
        !self.position_confirmed && self.travel_to_position.is_some() && !self.position_reached()
    }

    pub fn travel_time_down(&self) -> Duration {
        self.travel_time_down
    }

    pub fn travel_time_up(&self) -> Duration {
        self.travel_time_up
    }
}
