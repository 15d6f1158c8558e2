#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for time-tracked covers.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Device class and feature names are matched case-insensitively, the way
//!   users tend to type them ("Roller Shutter", "set_position").
use serde::Deserialize;
use serde::de::{self, Deserializer};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::str::FromStr;

/// Default travel time for a full upward run, in seconds.
pub const DEFAULT_TRAVEL_TIME_UP_S: f64 = 30.0;
/// Default travel time for a full downward run, in seconds.
pub const DEFAULT_TRAVEL_TIME_DOWN_S: f64 = 40.0;
/// Upper bound accepted for a single travel time.
pub const MAX_TRAVEL_TIME_S: f64 = 600.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceClass {
    Awning,
    InteriorShading,
    RollerShutter,
    RollingDoor,
    VenetianBlind,
}

impl FromStr for DeviceClass {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "awning" => Ok(Self::Awning),
            "interior shading" => Ok(Self::InteriorShading),
            "roller shutter" => Ok(Self::RollerShutter),
            "rolling door" => Ok(Self::RollingDoor),
            "venetian blind" => Ok(Self::VenetianBlind),
            other => Err(format!("unknown device class '{other}'")),
        }
    }
}

impl DeviceClass {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Awning => "awning",
            Self::InteriorShading => "interior shading",
            Self::RollerShutter => "roller shutter",
            Self::RollingDoor => "rolling door",
            Self::VenetianBlind => "venetian blind",
        }
    }

    /// Host entity class: rolling doors are garages, the rest are windows.
    pub const fn host_class(self) -> &'static str {
        match self {
            Self::RollingDoor => "garage",
            _ => "window",
        }
    }
}

impl<'de> Deserialize<'de> for DeviceClass {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Up,
    Down,
    Stop,
    SetPosition,
    OpenTilt,
    CloseTilt,
    StopTilt,
    SetTiltPosition,
}

impl FromStr for Feature {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            "stop" => Ok(Self::Stop),
            "set_position" => Ok(Self::SetPosition),
            "open_tilt" => Ok(Self::OpenTilt),
            "close_tilt" => Ok(Self::CloseTilt),
            "stop_tilt" => Ok(Self::StopTilt),
            "set_tilt_position" => Ok(Self::SetTiltPosition),
            other => Err(format!("unsupported feature '{other}'")),
        }
    }
}

impl Feature {
    pub const ALL: [Feature; 8] = [
        Self::Up,
        Self::Down,
        Self::Stop,
        Self::SetPosition,
        Self::OpenTilt,
        Self::CloseTilt,
        Self::StopTilt,
        Self::SetTiltPosition,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Stop => "stop",
            Self::SetPosition => "set_position",
            Self::OpenTilt => "open_tilt",
            Self::CloseTilt => "close_tilt",
            Self::StopTilt => "stop_tilt",
            Self::SetTiltPosition => "set_tilt_position",
        }
    }
}

impl<'de> Deserialize<'de> for Feature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TransmitterCfg {
    pub serial_number: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CoverCfg {
    pub name: String,
    pub channel: u8,
    pub device_class: DeviceClass,
    pub supported_features: Vec<Feature>,
    pub transmitter_serial_number: String,
    /// Seconds for a full run from closed to open.
    #[serde(default = "default_travel_time_up")]
    pub travel_time_up: f64,
    /// Seconds for a full run from open to closed.
    #[serde(default = "default_travel_time_down")]
    pub travel_time_down: f64,
}

fn default_travel_time_up() -> f64 {
    DEFAULT_TRAVEL_TIME_UP_S
}

fn default_travel_time_down() -> f64 {
    DEFAULT_TRAVEL_TIME_DOWN_S
}

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub logging: Logging,
    /// Transmitters available to this process, keyed by serial number.
    #[serde(default)]
    pub transmitters: Vec<TransmitterCfg>,
    /// Covers keyed by slug.
    #[serde(default)]
    pub covers: BTreeMap<String, CoverCfg>,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read, parse and validate a config file.
pub fn load_file(path: &Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read config {:?}: {}", path, e))?;
    let cfg = load_toml(&text).map_err(|e| eyre::eyre!("parse config {:?}: {}", path, e))?;
    cfg.validate()?;
    Ok(cfg)
}

fn is_slug(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

fn check_travel_time(slug: &str, field: &str, secs: f64) -> eyre::Result<()> {
    if !secs.is_finite() || secs <= 0.0 {
        eyre::bail!("covers.{slug}.{field} must be > 0 seconds");
    }
    if secs > MAX_TRAVEL_TIME_S {
        eyre::bail!("covers.{slug}.{field} is unreasonably large (>{MAX_TRAVEL_TIME_S}s)");
    }
    Ok(())
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly, got '{rot}'");
        }

        // Transmitters
        let mut serials = HashSet::new();
        for t in &self.transmitters {
            if t.serial_number.trim().is_empty() {
                eyre::bail!("transmitters.serial_number must not be empty");
            }
            if !serials.insert(t.serial_number.as_str()) {
                eyre::bail!("transmitter '{}' is listed twice", t.serial_number);
            }
        }

        // Covers
        let mut bindings = HashSet::new();
        for (slug, c) in &self.covers {
            if !is_slug(slug) {
                eyre::bail!("cover key '{slug}' must be a slug ([a-z0-9_]+)");
            }
            if c.name.trim().is_empty() {
                eyre::bail!("covers.{slug}.name must not be empty");
            }
            if !(1..=15).contains(&c.channel) {
                eyre::bail!("covers.{slug}.channel must be in 1..=15");
            }
            if c.transmitter_serial_number.trim().is_empty() {
                eyre::bail!("covers.{slug}.transmitter_serial_number must not be empty");
            }
            check_travel_time(slug, "travel_time_up", c.travel_time_up)?;
            check_travel_time(slug, "travel_time_down", c.travel_time_down)?;
            if !bindings.insert((c.transmitter_serial_number.as_str(), c.channel)) {
                eyre::bail!(
                    "covers.{slug}: channel {} of transmitter '{}' is already used by another cover",
                    c.channel,
                    c.transmitter_serial_number
                );
            }
        }

        Ok(())
    }
}
