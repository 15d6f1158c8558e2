//! Test and helper mocks for covertrack_core

use covertrack_traits::{Channel, Command, StatusCallback, StatusCode, Transmitter};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

/// A transmitter that records every command and lets the caller play the
/// receiver's side by emitting status codes synchronously.
pub struct RecordingTransmitter {
    serial: String,
    sent: Mutex<Vec<(Channel, Command)>>,
    callbacks: Mutex<HashMap<Channel, StatusCallback>>,
    rejected: Vec<Channel>,
    failing: AtomicBool,
}

impl RecordingTransmitter {
    pub fn new(serial: impl Into<String>) -> Self {
        Self {
            serial: serial.into(),
            sent: Mutex::new(Vec::new()),
            callbacks: Mutex::new(HashMap::new()),
            rejected: Vec::new(),
            failing: AtomicBool::new(false),
        }
    }

    /// Refuse callback registration on `channel`.
    #[must_use]
    pub fn rejecting(mut self, channel: Channel) -> Self {
        self.rejected.push(channel);
        self
    }

    /// Make subsequent `send` calls fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }

    pub fn sent(&self) -> Vec<(Channel, Command)> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn clear_sent(&self) {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Invoke the callback for `channel` on the calling thread.
    /// Returns false when nothing is registered there.
    pub fn emit(&self, channel: Channel, code: StatusCode) -> bool {
        let guard = self
            .callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match guard.get(&channel) {
            Some(cb) => {
                cb(code, &[channel.get(), code.as_byte()]);
                true
            }
            None => false,
        }
    }
}

impl Transmitter for RecordingTransmitter {
    fn serial_number(&self) -> &str {
        &self.serial
    }

    fn send(
        &self,
        channel: Channel,
        command: Command,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.failing.load(Ordering::Relaxed) {
            return Err(Box::new(std::io::Error::other("transmitter write failed")));
        }
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((channel, command));
        Ok(())
    }

    fn register_status_callback(&self, channel: Channel, callback: StatusCallback) -> bool {
        if self.rejected.contains(&channel) {
            return false;
        }
        self.callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(channel, callback);
        true
    }
}
