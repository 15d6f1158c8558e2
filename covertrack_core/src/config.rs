//! Runtime configuration types for covers.
//!
//! These are the types `Cover` works with. They are separate from the
//! TOML-deserialized config in `covertrack_config`; see `conversions`.

use std::time::Duration;

pub use covertrack_config::{DeviceClass, Feature};

/// Full-run travel times per direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TravelCfg {
    /// Closed → open.
    pub up: Duration,
    /// Open → closed.
    pub down: Duration,
}

impl Default for TravelCfg {
    fn default() -> Self {
        Self {
            up: Duration::from_secs(30),
            down: Duration::from_secs(40),
        }
    }
}

/// Set of supported features, one bit per `Feature`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FeatureSet(u16);

impl FeatureSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Every feature, used when a cover is built without an explicit set.
    pub const fn all() -> Self {
        Self((1 << Feature::ALL.len()) - 1)
    }

    const fn bit(f: Feature) -> u16 {
        1 << (f as u16)
    }

    #[must_use]
    pub const fn with(self, f: Feature) -> Self {
        Self(self.0 | Self::bit(f))
    }

    pub fn insert(&mut self, f: Feature) {
        self.0 |= Self::bit(f);
    }

    pub const fn contains(self, f: Feature) -> bool {
        self.0 & Self::bit(f) != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Feature> {
        Feature::ALL.into_iter().filter(move |f| self.contains(*f))
    }
}
