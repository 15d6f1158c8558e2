//! Host-facing cover: estimator + reconciler behind one lock, plus a
//! transmitter handle for sending commands.
//!
//! The status callback registered on the transmitter holds only a `Weak`
//! reference to the shared state, so dropping the `Cover` is enough to stop
//! status events from touching it.

use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use covertrack_traits::clock::{Clock, MonotonicClock};
use covertrack_traits::{Channel, Command, StatusCode, Transmitter};
use eyre::WrapErr;

use crate::config::{DeviceClass, Feature, FeatureSet, TravelCfg};
use crate::error::{BuildError, CoverError, Result};
use crate::estimator::TravelEstimator;
use crate::position::{Position, TravelDirection};
use crate::reconciler::{
    CoverState, NormalizedState, Reconciliation, StatusOutcome, StatusReconciler,
};
use crate::transmit_error::map_transmit_error;

/// Everything guarded by the per-cover lock.
#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) estimator: TravelEstimator,
    pub(crate) reconciler: StatusReconciler,
    /// Target of a positioning run that needs an explicit `Stop`.
    pub(crate) pending_stop: Option<Position>,
}

/// One consistent view of a cover, taken under its lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverSnapshot {
    pub position: Option<Position>,
    pub tilt_position: Option<Position>,
    pub target: Option<Position>,
    pub travel_direction: TravelDirection,
    pub position_confirmed: bool,
    pub normalized_state: NormalizedState,
    pub status: Option<StatusCode>,
    pub is_opening: Option<bool>,
    pub is_closing: Option<bool>,
    pub is_closed: Option<bool>,
}

fn closed_fallback(shared: &Shared) -> Option<bool> {
    if let Some(closed) = shared.reconciler.state().is_closed {
        return Some(closed);
    }
    if shared.estimator.is_traveling() {
        return Some(false);
    }
    shared
        .estimator
        .current_position()
        .map(|p| p == Position::CLOSED)
}

fn snapshot(shared: &Shared) -> CoverSnapshot {
    let state: &CoverState = shared.reconciler.state();
    CoverSnapshot {
        position: shared.estimator.current_position(),
        tilt_position: state.tilt_position,
        target: shared.estimator.target(),
        travel_direction: shared.estimator.travel_direction(),
        position_confirmed: shared.estimator.is_position_confirmed(),
        normalized_state: state.normalized_state,
        status: state.status,
        is_opening: state.is_opening,
        is_closing: state.is_closing,
        is_closed: closed_fallback(shared),
    }
}

/// Apply one status event to a cover's shared state and log what happened.
pub(crate) fn apply_status(
    shared: &mut Shared,
    serial: &str,
    channel: Channel,
    code: StatusCode,
) -> StatusOutcome {
    let outcome = shared.reconciler.on_status(code, &mut shared.estimator);
    if matches!(
        outcome.reconciliation,
        Reconciliation::Pinned(_) | Reconciliation::Stopped | Reconciliation::Started(_)
    ) {
        shared.pending_stop = None;
    }
    if outcome.fault {
        tracing::error!(serial, channel = channel.get(), status = %code, "transmitter error response");
    } else if outcome.unrecognized {
        tracing::error!(serial, channel = channel.get(), status = %code, "unhandled response");
    } else {
        tracing::debug!(
            serial,
            channel = channel.get(),
            status = %code,
            reconciliation = ?outcome.reconciliation,
            "status"
        );
    }
    outcome
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct Cover {
    slug: String,
    name: String,
    channel: Channel,
    device_class: DeviceClass,
    features: FeatureSet,
    transmitter: Arc<dyn Transmitter>,
    shared: Arc<Mutex<Shared>>,
    available: bool,
}

impl core::fmt::Debug for Cover {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Cover")
            .field("slug", &self.slug)
            .field("name", &self.name)
            .field("serial", &self.transmitter.serial_number())
            .field("channel", &self.channel)
            .field("device_class", &self.device_class)
            .field("available", &self.available)
            .finish()
    }
}

impl Cover {
    /// Start building a Cover.
    pub fn builder() -> CoverBuilder<Missing, Missing> {
        CoverBuilder::default()
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn serial_number(&self) -> &str {
        self.transmitter.serial_number()
    }

    pub fn device_class(&self) -> DeviceClass {
        self.device_class
    }

    pub fn supported_features(&self) -> FeatureSet {
        self.features
    }

    /// Whether the transmitter accepted the status callback for this channel.
    pub fn available(&self) -> bool {
        self.available
    }

    // ── Reads ────────────────────────────────────────────────────────────────

    pub fn state(&self) -> CoverSnapshot {
        snapshot(&lock(&self.shared))
    }

    pub fn current_position(&self) -> Option<Position> {
        lock(&self.shared).estimator.current_position()
    }

    pub fn current_tilt_position(&self) -> Option<Position> {
        lock(&self.shared).reconciler.state().tilt_position
    }

    pub fn normalized_state(&self) -> NormalizedState {
        lock(&self.shared).reconciler.state().normalized_state
    }

    pub fn status(&self) -> Option<StatusCode> {
        lock(&self.shared).reconciler.state().status
    }

    pub fn is_opening(&self) -> Option<bool> {
        lock(&self.shared).reconciler.state().is_opening
    }

    pub fn is_closing(&self) -> Option<bool> {
        lock(&self.shared).reconciler.state().is_closing
    }

    /// Status-derived when known, otherwise from the estimate at rest.
    pub fn is_closed(&self) -> Option<bool> {
        closed_fallback(&lock(&self.shared))
    }

    pub fn is_traveling(&self) -> bool {
        lock(&self.shared).estimator.is_traveling()
    }

    // ── Status input ─────────────────────────────────────────────────────────

    /// Feed a status code directly, as the registered callback does.
    pub fn handle_status(&self, code: StatusCode) -> StatusOutcome {
        let mut guard = lock(&self.shared);
        apply_status(&mut guard, self.transmitter.serial_number(), self.channel, code)
    }

    // ── Commands ─────────────────────────────────────────────────────────────

    fn require(&self, feature: Feature) -> Result<()> {
        if self.features.contains(feature) {
            Ok(())
        } else {
            Err(eyre::Report::new(CoverError::Unsupported(feature.as_str())))
        }
    }

    fn transmit(&self, command: Command) -> Result<()> {
        tracing::debug!(
            serial = self.transmitter.serial_number(),
            channel = self.channel.get(),
            ?command,
            "send"
        );
        self.transmitter
            .send(self.channel, command)
            .map_err(|e| {
                let err = map_transmit_error(&*e);
                tracing::warn!(
                    serial = self.transmitter.serial_number(),
                    channel = self.channel.get(),
                    error = %err,
                    "send failed"
                );
                eyre::Report::new(err)
            })
            .wrap_err_with(|| format!("{}: sending {command:?}", self.name))
    }

    pub fn open(&self) -> Result<()> {
        self.require(Feature::Up)?;
        self.run_up()
    }

    pub fn close(&self) -> Result<()> {
        self.require(Feature::Down)?;
        self.run_down()
    }

    pub fn stop(&self) -> Result<()> {
        self.require(Feature::Stop)?;
        self.halt()
    }

    fn halt(&self) -> Result<()> {
        {
            let mut s = lock(&self.shared);
            s.pending_stop = None;
            s.estimator.stop();
            s.reconciler.note_command(TravelDirection::Stopped);
        }
        self.transmit(Command::Stop)
    }

    /// Move to `target`. Endpoints are plain up/down runs; anything in between
    /// is stopped by `update()` once the estimate arrives.
    pub fn set_position(&self, target: Position) -> Result<()> {
        self.require(Feature::SetPosition)?;
        if target == Position::OPEN {
            return self.run_up();
        }
        if target == Position::CLOSED {
            return self.run_down();
        }
        let command = {
            let mut s = lock(&self.shared);
            let Some(current) = s.estimator.current_position() else {
                // Direction unknown: adopt the target without moving.
                s.estimator.start_travel(target);
                tracing::warn!(name = %self.name, %target, "position unknown, target adopted without moving");
                return Ok(());
            };
            if current == target {
                if !s.estimator.is_traveling() {
                    return Ok(());
                }
                // Already passing the target: stop here.
                s.pending_stop = None;
                s.estimator.set_position(target);
                s.reconciler.note_command(TravelDirection::Stopped);
                Command::Stop
            } else {
                s.estimator.start_travel(target);
                let direction = s.estimator.travel_direction();
                s.reconciler.note_command(direction);
                s.pending_stop = Some(target);
                if direction == TravelDirection::Down {
                    Command::Down
                } else {
                    Command::Up
                }
            }
        };
        self.transmit(command)
    }

    fn run_up(&self) -> Result<()> {
        {
            let mut s = lock(&self.shared);
            s.pending_stop = None;
            s.estimator.start_travel_up();
            s.reconciler.note_command(TravelDirection::Up);
        }
        self.transmit(Command::Up)
    }

    fn run_down(&self) -> Result<()> {
        {
            let mut s = lock(&self.shared);
            s.pending_stop = None;
            s.estimator.start_travel_down();
            s.reconciler.note_command(TravelDirection::Down);
        }
        self.transmit(Command::Down)
    }

    /// Run to one of the receiver's programmed stops.
    fn run_to_stop(&self, target: Position, command: Command) -> Result<()> {
        {
            let mut s = lock(&self.shared);
            s.pending_stop = None;
            s.estimator.start_travel(target);
            let direction = s.estimator.travel_direction();
            s.reconciler.note_command(direction);
        }
        self.transmit(command)
    }

    /// Tilt open: the intermediate stop.
    pub fn open_tilt(&self) -> Result<()> {
        self.require(Feature::OpenTilt)?;
        self.run_to_stop(Position::INTERMEDIATE, Command::Intermediate)
    }

    /// Tilt closed: the ventilation stop.
    pub fn close_tilt(&self) -> Result<()> {
        self.require(Feature::CloseTilt)?;
        self.run_to_stop(Position::TILT_VENTILATION, Command::Ventilation)
    }

    pub fn stop_tilt(&self) -> Result<()> {
        self.require(Feature::StopTilt)?;
        self.halt()
    }

    /// Receivers only know two tilt stops: closure >= 50 picks ventilation,
    /// anything more open picks the intermediate stop.
    pub fn set_tilt_position(&self, tilt: Position) -> Result<()> {
        self.require(Feature::SetTiltPosition)?;
        if tilt >= Position::UNDEFINED {
            self.run_to_stop(Position::TILT_VENTILATION, Command::Ventilation)
        } else {
            self.run_to_stop(Position::INTERMEDIATE, Command::Intermediate)
        }
    }

    /// Host poll. Returns the current estimate, sending `Stop` first when a
    /// positioning run has reached its target.
    pub fn update(&self) -> Result<Option<Position>> {
        let (position, stop_at) = {
            let mut s = lock(&self.shared);
            let position = s.estimator.current_position();
            tracing::trace!(name = %self.name, position = ?position, "estimate");
            match s.pending_stop {
                Some(target)
                    if s.estimator.target() == Some(target) && s.estimator.position_reached() =>
                {
                    s.pending_stop = None;
                    s.estimator.set_position(target);
                    s.reconciler.note_command(TravelDirection::Stopped);
                    (Some(target), Some(target))
                }
                _ => (position, None),
            }
        };
        if let Some(target) = stop_at {
            tracing::debug!(name = %self.name, %target, "target reached, stopping");
            self.transmit(Command::Stop)?;
        }
        Ok(position)
    }

    pub fn pending_stop(&self) -> Option<Position> {
        lock(&self.shared).pending_stop
    }
}

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

/// Builder for `Cover`. The transmitter and channel are mandatory; `build()`
/// only exists once both are provided. `try_build()` is always available.
pub struct CoverBuilder<T, C> {
    slug: Option<String>,
    name: Option<String>,
    transmitter: Option<Arc<dyn Transmitter>>,
    channel: Option<u8>,
    device_class: DeviceClass,
    features: FeatureSet,
    travel: TravelCfg,
    clock: Option<Arc<dyn Clock + Send + Sync>>,
    initial: Option<Position>,
    _t: PhantomData<T>,
    _c: PhantomData<C>,
}

impl Default for CoverBuilder<Missing, Missing> {
    fn default() -> Self {
        Self {
            slug: None,
            name: None,
            transmitter: None,
            channel: None,
            device_class: DeviceClass::RollerShutter,
            features: FeatureSet::all(),
            travel: TravelCfg::default(),
            clock: None,
            initial: Some(Position::CLOSED),
            _t: PhantomData,
            _c: PhantomData,
        }
    }
}

impl<T, C> CoverBuilder<T, C> {
    fn retype<T2, C2>(self) -> CoverBuilder<T2, C2> {
        CoverBuilder {
            slug: self.slug,
            name: self.name,
            transmitter: self.transmitter,
            channel: self.channel,
            device_class: self.device_class,
            features: self.features,
            travel: self.travel,
            clock: self.clock,
            initial: self.initial,
            _t: PhantomData,
            _c: PhantomData,
        }
    }

    pub fn transmitter(mut self, transmitter: Arc<dyn Transmitter>) -> CoverBuilder<Set, C> {
        self.transmitter = Some(transmitter);
        self.retype()
    }

    /// Radio channel, validated against 1..=15 at build time.
    pub fn channel(mut self, channel: u8) -> CoverBuilder<T, Set> {
        self.channel = Some(channel);
        self.retype()
    }

    pub fn slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn device_class(mut self, class: DeviceClass) -> Self {
        self.device_class = class;
        self
    }

    pub fn features(mut self, features: FeatureSet) -> Self {
        self.features = features;
        self
    }

    pub fn travel(mut self, travel: TravelCfg) -> Self {
        self.travel = travel;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Start with no known position instead of assuming closed.
    pub fn unknown_start(mut self) -> Self {
        self.initial = None;
        self
    }

    pub fn initial_position(mut self, position: Position) -> Self {
        self.initial = Some(position);
        self
    }

    /// Validate and build, reporting missing parts as `BuildError`.
    pub fn try_build(self) -> Result<Cover> {
        let transmitter = self
            .transmitter
            .ok_or_else(|| eyre::Report::new(BuildError::MissingTransmitter))?;
        let raw = self
            .channel
            .ok_or_else(|| eyre::Report::new(BuildError::MissingChannel))?;
        let channel =
            Channel::new(raw).ok_or_else(|| eyre::Report::new(BuildError::InvalidChannel(raw)))?;
        if self.travel.up.is_zero() || self.travel.down.is_zero() {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "travel times must be > 0",
            )));
        }

        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(MonotonicClock::new()));
        let mut estimator = TravelEstimator::with_clock(self.travel.down, self.travel.up, clock);
        if let Some(p) = self.initial {
            estimator.set_position(p);
        }
        let shared = Arc::new(Mutex::new(Shared {
            estimator,
            reconciler: StatusReconciler::new(),
            pending_stop: None,
        }));

        let weak: Weak<Mutex<Shared>> = Arc::downgrade(&shared);
        let serial = transmitter.serial_number().to_string();
        let available = transmitter.register_status_callback(
            channel,
            Box::new(move |code, _raw| {
                if let Some(shared) = weak.upgrade() {
                    apply_status(&mut lock(&shared), &serial, channel, code);
                }
            }),
        );

        let slug = self.slug.unwrap_or_else(|| format!("channel_{channel}"));
        let name = self.name.unwrap_or_else(|| slug.clone());
        if available {
            tracing::debug!(%name, serial = transmitter.serial_number(), channel = channel.get(), "cover registered");
        } else {
            tracing::warn!(%name, serial = transmitter.serial_number(), channel = channel.get(), "transmitter rejected channel; cover unavailable");
        }

        Ok(Cover {
            slug,
            name,
            channel,
            device_class: self.device_class,
            features: self.features,
            transmitter,
            shared,
            available,
        })
    }
}

impl CoverBuilder<Set, Set> {
    pub fn build(self) -> Result<Cover> {
        self.try_build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::RecordingTransmitter;
    use covertrack_traits::clock::test_clock::TestClock;
    use std::time::Duration;

    fn cover(clock: &TestClock, tx: &Arc<RecordingTransmitter>) -> Cover {
        Cover::builder()
            .name("Test")
            .transmitter(tx.clone())
            .channel(2)
            .clock(Arc::new(clock.clone()))
            .build()
            .expect("build")
    }

    #[test]
    fn starts_closed_and_available() {
        let clock = TestClock::new();
        let tx = Arc::new(RecordingTransmitter::new("A1"));
        let c = cover(&clock, &tx);
        assert!(c.available());
        assert_eq!(c.current_position(), Some(Position::CLOSED));
        assert_eq!(c.is_closed(), Some(true));
        assert_eq!(c.slug(), "channel_2");
    }

    #[test]
    fn open_sends_up_and_tracks_estimate() {
        let clock = TestClock::new();
        let tx = Arc::new(RecordingTransmitter::new("A1"));
        let c = cover(&clock, &tx);
        c.open().expect("open");
        assert_eq!(tx.sent(), vec![(c.channel(), Command::Up)]);
        assert_eq!(c.is_opening(), Some(true));
        clock.advance(Duration::from_secs(15));
        assert_eq!(c.current_position(), Some(Position::UNDEFINED));
        assert_eq!(c.is_closed(), Some(false));
    }

    #[test]
    fn callback_drives_state_through_weak_ref() {
        let clock = TestClock::new();
        let tx = Arc::new(RecordingTransmitter::new("A1"));
        let c = cover(&clock, &tx);
        let ch = c.channel();
        assert!(tx.emit(ch, StatusCode::TopPositionStop));
        assert_eq!(c.normalized_state(), NormalizedState::Open);
        assert_eq!(c.current_position(), Some(Position::OPEN));
        drop(c);
        // callback still registered but the cover is gone
        assert!(tx.emit(ch, StatusCode::BottomPositionStop));
    }

    #[test]
    fn unsupported_feature_is_rejected_before_sending() {
        let clock = TestClock::new();
        let tx = Arc::new(RecordingTransmitter::new("A1"));
        let c = Cover::builder()
            .transmitter(tx.clone())
            .channel(1)
            .features(FeatureSet::empty().with(Feature::Up))
            .clock(Arc::new(clock.clone()))
            .build()
            .expect("build");
        let err = c.close().expect_err("close must fail");
        assert_eq!(
            err.downcast_ref::<CoverError>(),
            Some(&CoverError::Unsupported("down"))
        );
        assert!(tx.sent().is_empty());
        assert_eq!(c.current_position(), Some(Position::CLOSED));
    }

    #[test]
    fn send_failure_is_typed() {
        let clock = TestClock::new();
        let tx = Arc::new(RecordingTransmitter::new("A1"));
        let c = cover(&clock, &tx);
        tx.set_failing(true);
        let err = c.open().expect_err("send fails");
        assert!(matches!(
            err.downcast_ref::<CoverError>(),
            Some(CoverError::Transmitter(_))
        ));
    }
}
