mod cli;
mod error_fmt;
mod run;

use std::path::Path;
use std::time::Duration;

use clap::Parser;
use eyre::WrapErr;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use crate::error_fmt::{CliError, exit_code_for_error, format_error_json, humanize};

fn load_config(path: &Path) -> eyre::Result<covertrack_config::Config> {
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("read config {}", path.display()))
        .wrap_err(CliError::InvalidConfig)?;
    let cfg: covertrack_config::Config = toml::from_str(&text)
        .wrap_err_with(|| format!("parse config {}", path.display()))
        .wrap_err(CliError::InvalidConfig)?;
    cfg.validate().wrap_err(CliError::InvalidConfig)?;
    Ok(cfg)
}

/// Console layer on stderr, plus an optional JSON-lines file sink from `[logging]`.
fn init_tracing(cli: &Cli, logging: Option<&covertrack_config::Logging>) {
    let level = cli
        .log_level
        .as_deref()
        .or_else(|| logging.and_then(|l| l.level.as_deref()))
        .unwrap_or("info");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
    if cli.json {
        layers.push(fmt::layer().json().with_writer(std::io::stderr).boxed());
    } else {
        layers.push(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .boxed(),
        );
    }

    if let Some(file) = logging.and_then(|l| l.file.as_deref()) {
        let path = Path::new(file);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let name = path
            .file_name()
            .map_or_else(|| "covertrack.log".into(), |n| n.to_string_lossy().into_owned());
        let appender = match logging.and_then(|l| l.rotation.as_deref()) {
            Some("daily") => tracing_appender::rolling::daily(dir, name),
            Some("hourly") => tracing_appender::rolling::hourly(dir, name),
            _ => tracing_appender::rolling::never(dir, name),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        layers.push(fmt::layer().json().with_writer(writer).boxed());
    }

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init();
}

fn real_main(cli: &Cli) -> eyre::Result<()> {
    let loaded = load_config(&cli.config);
    init_tracing(cli, loaded.as_ref().ok().map(|c| &c.logging));
    let cfg = loaded?;
    let json_mode = cli.json;

    match &cli.cmd {
        Commands::Check => {
            run::check(&cfg, json_mode);
            Ok(())
        }
        Commands::Run {
            cover,
            interval_ms,
            timeout_ms,
            action,
        } => {
            let rig = run::Rig::from_config(&cfg);
            let target = rig.cover(cover)?;
            let shutdown = run::shutdown_flag();
            run::run_action(
                target,
                *action,
                Duration::from_millis((*interval_ms).max(1)),
                Duration::from_millis(*timeout_ms),
                &shutdown,
                json_mode,
            )?;
            Ok(())
        }
        Commands::Inject { cover, status } => {
            let rig = run::Rig::from_config(&cfg);
            run::inject_status(&rig, cover, *status, json_mode)?;
            Ok(())
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(err) = real_main(&cli) {
        tracing::error!(error = %err, "command failed");
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", format_error_json(&err));
        } else {
            eprintln!("{}", humanize(&err));
        }
        std::process::exit(exit_code_for_error(&err));
    }
}
