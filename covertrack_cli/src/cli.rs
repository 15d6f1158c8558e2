//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "covertrack", version, about = "Time-tracked radio cover CLI")]
pub struct Cli {
    /// Path to config TOML
    #[arg(long, value_name = "FILE", default_value = "etc/covertrack.toml")]
    pub config: PathBuf,

    /// Print results and logs as JSON lines instead of text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); RUST_LOG wins if set
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate the config and list the covers it defines
    Check,
    /// Drive one simulated cover and print position samples until it settles
    Run {
        /// Cover slug from the config
        #[arg(long)]
        cover: String,
        /// Poll interval in ms
        #[arg(long, value_name = "MS", default_value_t = 200)]
        interval_ms: u64,
        /// Give up if the cover has not settled after this many ms
        #[arg(long, value_name = "MS", default_value_t = 120_000)]
        timeout_ms: u64,
        #[command(subcommand)]
        action: Action,
    },
    /// Feed a raw status byte to one cover and print the reconciled state
    Inject {
        /// Cover slug from the config
        #[arg(long)]
        cover: String,
        /// Status byte, decimal or 0x-prefixed hex (e.g. 0x02)
        #[arg(long, value_parser = parse_status_byte)]
        status: u8,
    },
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Open,
    Close,
    Stop,
    /// Move to a closure percent (0 open, 100 closed)
    Position {
        #[arg(value_parser = clap::value_parser!(u8).range(0..=100))]
        value: u8,
    },
}

pub fn parse_status_byte(s: &str) -> Result<u8, String> {
    let t = s.trim();
    let parsed = match t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => t.parse::<u8>(),
    };
    parsed.map_err(|_| format!("'{s}' is not a status byte (0..=255 or 0x00..=0xff)"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_byte_accepts_hex_and_decimal() {
        assert_eq!(parse_status_byte("0x0d"), Ok(0x0D));
        assert_eq!(parse_status_byte("0X11"), Ok(0x11));
        assert_eq!(parse_status_byte("2"), Ok(2));
        assert!(parse_status_byte("0x100").is_err());
        assert!(parse_status_byte("up").is_err());
    }
}
