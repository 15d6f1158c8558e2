pub mod clock;
pub mod status;

pub use clock::{Clock, MonotonicClock};
pub use status::StatusCode;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Radio channel a cover's receiver is learned on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Channel(u8);

impl Channel {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 15;

    /// Returns `None` outside `1..=15`.
    pub const fn new(n: u8) -> Option<Self> {
        if n >= Self::MIN && n <= Self::MAX {
            Some(Self(n))
        } else {
            None
        }
    }

    pub const fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Command understood by a cover receiver. Sent fire-and-forget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Up,
    Down,
    Stop,
    /// Move to the programmed intermediate stop.
    Intermediate,
    /// Move to the programmed tilt/ventilation stop.
    Ventilation,
    /// Ask the receiver to report its status.
    Check,
}

/// Status callback: `(status_code, raw_payload)`.
///
/// Invoked serially per channel, possibly from a transmitter-owned thread.
pub type StatusCallback = Box<dyn Fn(StatusCode, &[u8]) + Send + Sync>;

pub trait Transmitter: Send + Sync {
    fn serial_number(&self) -> &str;

    fn send(
        &self,
        channel: Channel,
        command: Command,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Register the callback for `channel`; returns false if the transmitter
    /// has no receiver learned on that channel.
    fn register_status_callback(&self, channel: Channel, callback: StatusCallback) -> bool;
}

/// Lookup of transmitters by serial number, injected at setup.
pub trait TransmitterRegistry {
    fn get(&self, serial_number: &str) -> Option<Arc<dyn Transmitter>>;
}

/// Registry backed by a plain map.
#[derive(Default, Clone)]
pub struct StaticRegistry {
    transmitters: HashMap<String, Arc<dyn Transmitter>>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, transmitter: Arc<dyn Transmitter>) {
        self.transmitters
            .insert(transmitter.serial_number().to_string(), transmitter);
    }

    pub fn with(mut self, transmitter: Arc<dyn Transmitter>) -> Self {
        self.insert(transmitter);
        self
    }

    pub fn len(&self) -> usize {
        self.transmitters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transmitters.is_empty()
    }
}

impl TransmitterRegistry for StaticRegistry {
    fn get(&self, serial_number: &str) -> Option<Arc<dyn Transmitter>> {
        self.transmitters.get(serial_number).cloned()
    }
}

impl fmt::Debug for StaticRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticRegistry")
            .field("serials", &self.transmitters.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Dummy(&'static str);
    impl Transmitter for Dummy {
        fn serial_number(&self) -> &str {
            self.0
        }
        fn send(
            &self,
            _channel: Channel,
            _command: Command,
        ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            Ok(())
        }
        fn register_status_callback(&self, _channel: Channel, _callback: StatusCallback) -> bool {
            true
        }
    }

    #[test]
    fn channel_bounds() {
        assert!(Channel::new(0).is_none());
        assert_eq!(Channel::new(1).map(Channel::get), Some(1));
        assert_eq!(Channel::new(15).map(Channel::get), Some(15));
        assert!(Channel::new(16).is_none());
    }

    #[test]
    fn registry_looks_up_by_serial() {
        let reg = StaticRegistry::new().with(Arc::new(Dummy("A1")));
        assert!(reg.get("A1").is_some());
        assert!(reg.get("B2").is_none());
        assert_eq!(reg.len(), 1);
    }
}
