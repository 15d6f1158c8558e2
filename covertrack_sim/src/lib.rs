//! Simulated radio transmitter with modelled cover motors.
//!
//! `SimTransmitter` owns one worker thread. Commands and injected status
//! codes are queued on a channel; the worker moves each simulated motor at its
//! configured speed and reports status codes the way a real receiver would.
//! Callbacks run serially on the worker thread.
//!
//! The worker is shut down and joined when the transmitter is dropped.
pub mod error;
pub mod util;

use crossbeam_channel as xch;
use covertrack_traits::clock::Clock;
use covertrack_traits::{Channel, Command, StatusCallback, StatusCode, Transmitter};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::error::SimError;

/// Motor position resolution: thousandths of a closure percent.
const SCALE: u32 = 100_000;
const PER_PERCENT: u32 = SCALE / 100;

/// One receiver learned on the simulated transmitter.
#[derive(Debug, Clone, Copy)]
pub struct SimReceiver {
    pub channel: Channel,
    pub travel_up: Duration,
    pub travel_down: Duration,
    /// Closure percent at start (0 open, 100 closed).
    pub start: u8,
}

impl SimReceiver {
    /// Receiver starting fully closed.
    pub fn new(channel: Channel, travel_up: Duration, travel_down: Duration) -> Self {
        Self {
            channel,
            travel_up,
            travel_down,
            start: 100,
        }
    }

    #[must_use]
    pub fn starting_at(mut self, closure_percent: u8) -> Self {
        self.start = closure_percent.min(100);
        self
    }
}

enum Msg {
    Command(Channel, Command),
    Inject(Channel, StatusCode),
}

#[derive(Debug, Clone, Copy)]
struct Motion {
    target: u32,
    arrival: StatusCode,
}

#[derive(Debug)]
struct Motor {
    up: Duration,
    down: Duration,
    pos: u32,
    motion: Option<Motion>,
}

impl Motor {
    fn new(rx: &SimReceiver) -> Self {
        Self {
            up: rx.travel_up,
            down: rx.travel_down,
            pos: u32::from(rx.start.min(100)) * PER_PERCENT,
            motion: None,
        }
    }

    fn percent(&self) -> u8 {
        u8::try_from(self.pos / PER_PERCENT).unwrap_or(100)
    }

    fn at_rest_status(&self) -> StatusCode {
        match self.pos {
            0 => StatusCode::TopPositionStop,
            SCALE => StatusCode::BottomPositionStop,
            p if p == 25 * PER_PERCENT => StatusCode::IntermediatePositionStop,
            p if p == 75 * PER_PERCENT => StatusCode::TiltVentilationPositionStop,
            _ => StatusCode::StoppedInUndefinedPosition,
        }
    }

    /// Move for `dt`; returns the arrival code when the target is reached.
    fn advance(&mut self, dt: Duration) -> Option<StatusCode> {
        let m = self.motion?;
        let full = if m.target > self.pos { self.down } else { self.up };
        let step = dt.as_nanos().saturating_mul(u128::from(SCALE)) / full.as_nanos().max(1);
        let step = u32::try_from(step).unwrap_or(SCALE);
        self.pos = if m.target > self.pos {
            self.pos.saturating_add(step).min(m.target)
        } else {
            self.pos.saturating_sub(step).max(m.target)
        };
        if self.pos == m.target {
            self.motion = None;
            return Some(m.arrival);
        }
        None
    }

    fn move_to(&mut self, target: u32, arrival: StatusCode) -> StatusCode {
        if self.pos == target {
            self.motion = None;
            return arrival;
        }
        let code = if target > self.pos {
            StatusCode::StartToMoveDown
        } else {
            StatusCode::StartToMoveUp
        };
        self.motion = Some(Motion { target, arrival });
        code
    }

    fn command(&mut self, cmd: Command) -> StatusCode {
        match cmd {
            Command::Up => self.move_to(0, StatusCode::TopPositionStop),
            Command::Down => self.move_to(SCALE, StatusCode::BottomPositionStop),
            Command::Intermediate => {
                self.move_to(25 * PER_PERCENT, StatusCode::IntermediatePositionStop)
            }
            Command::Ventilation => {
                self.move_to(75 * PER_PERCENT, StatusCode::TiltVentilationPositionStop)
            }
            Command::Stop => {
                self.motion = None;
                self.at_rest_status()
            }
            Command::Check => match self.motion {
                Some(m) if m.target > self.pos => StatusCode::MovingDown,
                Some(_) => StatusCode::MovingUp,
                None => self.at_rest_status(),
            },
        }
    }
}

type Callbacks = Arc<Mutex<HashMap<Channel, StatusCallback>>>;

fn emit(callbacks: &Callbacks, channel: Channel, code: StatusCode) {
    let guard = callbacks.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(cb) = guard.get(&channel) {
        tracing::trace!(channel = channel.get(), status = %code, "sim status");
        cb(code, &[channel.get(), code.as_byte()]);
    }
}

pub struct SimTransmitter {
    serial: String,
    tx: xch::Sender<Msg>,
    callbacks: Callbacks,
    positions: Arc<[AtomicU8; 16]>,
    learned: Vec<Channel>,
    /// Shutdown flag for immediate response (atomic for lock-free check)
    shutdown: Arc<AtomicBool>,
    /// Join handle for graceful thread cleanup
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl SimTransmitter {
    /// Spawn the worker. `tick` bounds how often motors advance.
    pub fn spawn<C: Clock + Send + Sync + 'static>(
        serial: impl Into<String>,
        receivers: &[SimReceiver],
        tick: Duration,
        clock: C,
    ) -> Self {
        let (tx, rx) = xch::unbounded::<Msg>();
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let callbacks: Callbacks = Arc::new(Mutex::new(HashMap::new()));
        let callbacks_clone = callbacks.clone();
        let positions: Arc<[AtomicU8; 16]> =
            Arc::new(std::array::from_fn(|_| AtomicU8::new(0)));
        let positions_clone = positions.clone();

        let mut motors: HashMap<Channel, Motor> = receivers
            .iter()
            .map(|r| (r.channel, Motor::new(r)))
            .collect();
        for (ch, m) in &motors {
            positions[usize::from(ch.get())].store(m.percent(), Ordering::Relaxed);
        }
        let learned = motors.keys().copied().collect();

        let join_handle = std::thread::spawn(move || {
            let mut last = clock.now();
            loop {
                if shutdown_clone.load(Ordering::Relaxed) {
                    tracing::debug!("sim transmitter received shutdown signal");
                    break;
                }
                let msg = match rx.recv_timeout(tick) {
                    Ok(m) => Some(m),
                    Err(xch::RecvTimeoutError::Timeout) => None,
                    Err(xch::RecvTimeoutError::Disconnected) => break,
                };

                let now = clock.now();
                let dt = now.saturating_duration_since(last);
                last = now;
                for (ch, motor) in &mut motors {
                    let arrived = motor.advance(dt);
                    positions_clone[usize::from(ch.get())].store(motor.percent(), Ordering::Relaxed);
                    if let Some(code) = arrived {
                        emit(&callbacks_clone, *ch, code);
                    }
                }

                match msg {
                    Some(Msg::Command(ch, cmd)) => {
                        if let Some(motor) = motors.get_mut(&ch) {
                            let code = motor.command(cmd);
                            tracing::debug!(channel = ch.get(), command = ?cmd, status = %code, "sim command");
                            emit(&callbacks_clone, ch, code);
                        }
                    }
                    Some(Msg::Inject(ch, code)) => {
                        if code.is_fault()
                            && let Some(motor) = motors.get_mut(&ch)
                        {
                            motor.motion = None;
                        }
                        emit(&callbacks_clone, ch, code);
                    }
                    None => {}
                }
            }
            tracing::trace!("sim transmitter thread exiting cleanly");
        });

        Self {
            serial: serial.into(),
            tx,
            callbacks,
            positions,
            learned,
            shutdown,
            join_handle: Some(join_handle),
        }
    }

    fn check_channel(&self, channel: Channel) -> error::Result<()> {
        if self.learned.contains(&channel) {
            Ok(())
        } else {
            Err(SimError::UnknownChannel(channel.get()))
        }
    }

    /// Deliver `code` on `channel` as if the receiver had sent it.
    /// Fault codes also halt the simulated motor.
    pub fn inject(&self, channel: Channel, code: StatusCode) -> error::Result<()> {
        self.check_channel(channel)?;
        self.tx
            .send(Msg::Inject(channel, code))
            .map_err(|_| SimError::Disconnected)
    }

    /// Simulated motor position (closure percent), as of the last tick.
    pub fn motor_position(&self, channel: Channel) -> Option<u8> {
        self.check_channel(channel).ok()?;
        Some(self.positions[usize::from(channel.get())].load(Ordering::Relaxed))
    }

    pub fn channels(&self) -> &[Channel] {
        &self.learned
    }
}

impl Transmitter for SimTransmitter {
    fn serial_number(&self) -> &str {
        &self.serial
    }

    fn send(
        &self,
        channel: Channel,
        command: Command,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.check_channel(channel)?;
        self.tx
            .send(Msg::Command(channel, command))
            .map_err(|_| SimError::Disconnected)?;
        Ok(())
    }

    fn register_status_callback(&self, channel: Channel, callback: StatusCallback) -> bool {
        if self.check_channel(channel).is_err() {
            return false;
        }
        self.callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(channel, callback);
        true
    }
}

impl core::fmt::Debug for SimTransmitter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SimTransmitter")
            .field("serial", &self.serial)
            .field("channels", &self.learned)
            .finish()
    }
}

impl Drop for SimTransmitter {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.join_handle.take() {
            if let Err(e) = handle.join() {
                tracing::warn!("sim transmitter thread panicked during shutdown: {:?}", e);
            } else {
                tracing::trace!("sim transmitter thread joined successfully");
            }
        }
    }
}
