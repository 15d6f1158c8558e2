//! Simulated rig assembly and the `run` / `inject` commands.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use covertrack_config::Config;
use covertrack_core::{
    Cover, CoverSnapshot, NormalizedState, Position, StatusCode, TravelCfg, setup_covers,
};
use covertrack_sim::util::wait_until;
use covertrack_sim::{SimReceiver, SimTransmitter};
use covertrack_traits::clock::MonotonicClock;
use covertrack_traits::{Channel, StaticRegistry};
use serde_json::json;

use crate::cli::Action;
use crate::error_fmt::CliError;

/// Simulator tick: how often motors advance between commands.
const SIM_TICK: Duration = Duration::from_millis(10);

/// Simulated transmitters plus the covers built on them.
pub struct Rig {
    pub transmitters: HashMap<String, Arc<SimTransmitter>>,
    pub covers: Vec<Cover>,
}

impl Rig {
    /// One `SimTransmitter` per configured serial, with a receiver for every
    /// cover that references it. Covers pointing at unlisted serials are
    /// skipped by setup.
    pub fn from_config(cfg: &Config) -> Self {
        let mut transmitters = HashMap::new();
        let mut registry = StaticRegistry::new();
        for t in &cfg.transmitters {
            let receivers: Vec<SimReceiver> = cfg
                .covers
                .values()
                .filter(|c| c.transmitter_serial_number == t.serial_number)
                .filter_map(|c| {
                    let ch = Channel::new(c.channel)?;
                    let travel = TravelCfg::from(c);
                    Some(SimReceiver::new(ch, travel.up, travel.down))
                })
                .collect();
            let sim = Arc::new(SimTransmitter::spawn(
                t.serial_number.clone(),
                &receivers,
                SIM_TICK,
                MonotonicClock::new(),
            ));
            registry.insert(sim.clone());
            transmitters.insert(t.serial_number.clone(), sim);
        }
        let covers = setup_covers(cfg, &registry);
        Self {
            transmitters,
            covers,
        }
    }

    pub fn cover(&self, slug: &str) -> eyre::Result<&Cover> {
        self.covers
            .iter()
            .find(|c| c.slug() == slug)
            .ok_or_else(|| eyre::Report::new(CliError::UnknownCover(slug.to_string())))
    }
}

fn opt_u8(p: Option<Position>) -> Option<u8> {
    p.map(Position::get)
}

pub fn snapshot_json(cover: &Cover, s: &CoverSnapshot) -> serde_json::Value {
    json!({
        "cover": cover.slug(),
        "position": opt_u8(s.position),
        "open_percent": s.position.map(Position::open_percent),
        "tilt_position": opt_u8(s.tilt_position),
        "target": opt_u8(s.target),
        "direction": s.travel_direction.as_str(),
        "confirmed": s.position_confirmed,
        "state": s.normalized_state.as_str(),
        "status": s.status.map(|c| c.to_string()),
        "is_opening": s.is_opening,
        "is_closing": s.is_closing,
        "is_closed": s.is_closed,
    })
}

fn fmt_opt<T: std::fmt::Display>(v: Option<T>) -> String {
    v.map_or_else(|| "unknown".to_string(), |x| x.to_string())
}

fn snapshot_text(cover: &Cover, s: &CoverSnapshot) -> String {
    format!(
        "{}: position={} state={} status={} closed={}",
        cover.slug(),
        fmt_opt(s.position),
        s.normalized_state,
        fmt_opt(s.status),
        fmt_opt(s.is_closed),
    )
}

fn print_snapshot(cover: &Cover, s: &CoverSnapshot, json_mode: bool, elapsed: Option<Duration>) {
    if json_mode {
        let mut v = snapshot_json(cover, s);
        if let Some(e) = elapsed
            && let Some(obj) = v.as_object_mut()
        {
            obj.insert("t_ms".into(), json!(e.as_millis() as u64));
        }
        println!("{v}");
    } else {
        match elapsed {
            Some(e) => println!("t={:.2}s {}", e.as_secs_f64(), snapshot_text(cover, s)),
            None => println!("{}", snapshot_text(cover, s)),
        }
    }
}

fn is_moving(state: NormalizedState) -> bool {
    matches!(state, NormalizedState::Opening | NormalizedState::Closing)
}

pub fn run_action(
    cover: &Cover,
    action: Action,
    interval: Duration,
    timeout: Duration,
    shutdown: &AtomicBool,
    json_mode: bool,
) -> eyre::Result<CoverSnapshot> {
    tracing::info!(cover = cover.slug(), ?action, "run");
    match action {
        Action::Open => cover.open()?,
        Action::Close => cover.close()?,
        Action::Stop => cover.stop()?,
        Action::Position { value } => cover.set_position(Position::new(value))?,
    }

    let start = Instant::now();
    loop {
        if shutdown.load(Ordering::Relaxed) {
            tracing::warn!(cover = cover.slug(), "interrupted; stopping cover");
            cover.stop()?;
            return Err(eyre::Report::new(CliError::Interrupted));
        }
        cover.update()?;
        let snap = cover.state();
        print_snapshot(cover, &snap, json_mode, Some(start.elapsed()));
        if !cover.is_traveling() && cover.pending_stop().is_none() {
            break;
        }
        if start.elapsed() >= timeout {
            return Err(eyre::Report::new(CliError::NotSettled(
                u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            )));
        }
        std::thread::sleep(interval);
    }

    // Give the receiver a moment to report where it stopped.
    if let Err(e) = wait_until(
        || !is_moving(cover.normalized_state()),
        Duration::from_secs(1),
        Duration::from_millis(5),
    ) {
        tracing::debug!(cover = cover.slug(), error = %e, state = %cover.normalized_state(), "no settle report from receiver");
    }
    let last = cover.state();
    print_snapshot(cover, &last, json_mode, None);
    Ok(last)
}

pub fn inject_status(rig: &Rig, slug: &str, byte: u8, json_mode: bool) -> eyre::Result<CoverSnapshot> {
    let cover = rig.cover(slug)?;
    let code = StatusCode::from_byte(byte);
    let sim = rig
        .transmitters
        .get(cover.serial_number())
        .ok_or_else(|| eyre::Report::new(CliError::UnknownCover(slug.to_string())))?;
    sim.inject(cover.channel(), code)?;
    wait_until(
        || cover.status() == Some(code),
        Duration::from_secs(2),
        Duration::from_millis(2),
    )?;
    let snap = cover.state();
    print_snapshot(cover, &snap, json_mode, None);
    Ok(snap)
}

pub fn check(cfg: &Config, json_mode: bool) {
    let serials: Vec<&str> = cfg
        .transmitters
        .iter()
        .map(|t| t.serial_number.as_str())
        .collect();
    for (slug, c) in &cfg.covers {
        let present = serials.contains(&c.transmitter_serial_number.as_str());
        if !present {
            tracing::warn!(cover = %slug, serial = %c.transmitter_serial_number, "transmitter not listed; cover would be skipped");
        }
        let features: Vec<&str> = c.supported_features.iter().map(|f| f.as_str()).collect();
        if json_mode {
            println!(
                "{}",
                json!({
                    "cover": slug,
                    "name": c.name,
                    "channel": c.channel,
                    "transmitter": c.transmitter_serial_number,
                    "transmitter_present": present,
                    "device_class": c.device_class.as_str(),
                    "host_class": c.device_class.host_class(),
                    "features": features,
                    "travel_time_up": c.travel_time_up,
                    "travel_time_down": c.travel_time_down,
                })
            );
        } else {
            println!(
                "{slug}: '{}' ch {} on {}{} [{} / {}] up {}s down {}s features: {}",
                c.name,
                c.channel,
                c.transmitter_serial_number,
                if present { "" } else { " (missing)" },
                c.device_class.as_str(),
                c.device_class.host_class(),
                c.travel_time_up,
                c.travel_time_down,
                features.join(","),
            );
        }
    }
    if !json_mode {
        println!(
            "config ok: {} transmitter(s), {} cover(s)",
            cfg.transmitters.len(),
            cfg.covers.len()
        );
    }
}

/// Flag set by ctrl-c. Only one handler per process; a failed install is logged.
pub fn shutdown_flag() -> Arc<AtomicBool> {
    let flag = Arc::new(AtomicBool::new(false));
    let handler_flag = flag.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_flag.store(true, Ordering::Relaxed)) {
        tracing::warn!(error = %e, "could not install ctrl-c handler");
    }
    flag
}
