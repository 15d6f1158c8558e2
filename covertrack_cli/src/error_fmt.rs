//! Human-readable error descriptions, exit codes and structured JSON errors.

use thiserror::Error;

/// Errors raised by the CLI itself.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CliError {
    #[error("invalid configuration")]
    InvalidConfig,
    #[error("unknown cover '{0}'")]
    UnknownCover(String),
    #[error("cover did not settle within {0} ms")]
    NotSettled(u64),
    #[error("interrupted")]
    Interrupted,
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    use covertrack_core::error::{BuildError, CoverError};

    // Typed matches first
    if let Some(ce) = err.downcast_ref::<CliError>() {
        return match ce {
            CliError::InvalidConfig => format!(
                "What happened: Invalid configuration ({}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun `covertrack check`.",
                err.root_cause()
            ),
            CliError::UnknownCover(slug) => format!(
                "What happened: No cover named '{slug}' is available.\nLikely causes: Typo in --cover, or its transmitter is not listed under [[transmitters]].\nHow to fix: Run `covertrack check` to list configured covers."
            ),
            CliError::NotSettled(ms) => format!(
                "What happened: The cover was still moving after {ms} ms.\nLikely causes: travel_time_up/down larger than the timeout.\nHow to fix: Raise --timeout-ms or check the travel times in the config."
            ),
            CliError::Interrupted => {
                "What happened: Interrupted by ctrl-c; a stop command was sent.".to_string()
            }
        };
    }

    if let Some(be) = err.downcast_ref::<BuildError>() {
        return format!(
            "What happened: A cover could not be built ({be}).\nLikely causes: Channel outside 1..=15 or zero travel time.\nHow to fix: Edit the cover in the config, then rerun."
        );
    }

    if let Some(ce) = err.downcast_ref::<CoverError>() {
        return match ce {
            CoverError::Unsupported(feature) => format!(
                "What happened: This cover does not support '{feature}'.\nLikely causes: The feature is missing from supported_features.\nHow to fix: Add it to the cover's supported_features if the receiver supports it."
            ),
            CoverError::Disconnected => "What happened: The transmitter is disconnected.\nLikely causes: Radio stick unplugged or its worker stopped.\nHow to fix: Reconnect the transmitter and retry.".to_string(),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // Generic fallback
    let msg = err.to_string();
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes; anything untyped returns 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    use covertrack_core::error::{BuildError, CoverError};
    if let Some(ce) = err.downcast_ref::<CliError>() {
        return match ce {
            CliError::InvalidConfig => 3,
            CliError::UnknownCover(_) => 4,
            CliError::NotSettled(_) => 6,
            CliError::Interrupted => 130,
        };
    }
    if err.downcast_ref::<BuildError>().is_some() {
        return 3;
    }
    if err.downcast_ref::<CoverError>().is_some() {
        return 5;
    }
    1
}

fn reason_name(err: &eyre::Report) -> &'static str {
    use covertrack_core::error::{BuildError, CoverError};
    if let Some(ce) = err.downcast_ref::<CliError>() {
        return match ce {
            CliError::InvalidConfig => "InvalidConfig",
            CliError::UnknownCover(_) => "UnknownCover",
            CliError::NotSettled(_) => "NotSettled",
            CliError::Interrupted => "Interrupted",
        };
    }
    if err.downcast_ref::<BuildError>().is_some() {
        return "Build";
    }
    if let Some(ce) = err.downcast_ref::<CoverError>() {
        return match ce {
            CoverError::Unsupported(_) => "Unsupported",
            CoverError::Disconnected => "Disconnected",
            CoverError::Transmitter(_) | CoverError::TransmitterFault(_) => "Transmitter",
        };
    }
    "Error"
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({
        "reason": reason_name(err),
        "code": exit_code_for_error(err),
        "message": humanize(err),
    })
    .to_string()
}
