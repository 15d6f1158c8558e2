use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

// Short travel times keep simulated runs well under a second.
fn write_valid_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[logging]
level = "warn"

[[transmitters]]
serial_number = "00001234"

[covers.living_room]
name = "Living room"
channel = 1
device_class = "roller shutter"
supported_features = ["up", "down", "stop", "set_position"]
transmitter_serial_number = "00001234"
travel_time_up = 0.3
travel_time_down = 0.4

[covers.porch]
name = "Porch awning"
channel = 2
device_class = "awning"
supported_features = ["up", "down"]
transmitter_serial_number = "00001234"
travel_time_up = 0.3
travel_time_down = 0.3

[covers.shed]
name = "Shed door"
channel = 3
device_class = "rolling door"
supported_features = ["up", "down", "stop"]
transmitter_serial_number = "99999999"
"#;
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["check"], 0, "config ok: 1 transmitter(s), 3 cover(s)", "stdout")]
#[case(&["check"], 0, "(missing)", "stdout")]
#[case(&["run", "--cover", "living_room", "--interval-ms", "20", "open"], 0, "state=open", "stdout")]
#[case(&["run", "--cover", "living_room", "--interval-ms", "20", "stop"], 0, "living_room:", "stdout")]
#[case(&["run", "--cover", "nowhere", "open"], 4, "No cover named 'nowhere'", "stderr")]
#[case(&["run", "--cover", "shed", "open"], 4, "No cover named 'shed'", "stderr")]
#[case(&["run", "--cover", "porch", "stop"], 5, "does not support 'stop'", "stderr")]
#[case(&["run", "--cover", "living_room", "position", "101"], 2, "101", "stderr")]
#[case(&["inject", "--cover", "living_room", "--status", "0x02"], 0, "state=closed", "stdout")]
#[case(&["inject", "--cover", "living_room", "--status", "0x06"], 0, "state=unknown", "stdout")]
#[case(&["inject", "--cover", "living_room", "--status", "zz"], 2, "not a status byte", "stderr")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let mut cmd = Command::cargo_bin("covertrack").unwrap();

    // Always include a valid config to avoid relying on default path
    cmd.arg("--config").arg(&cfg);
    for a in args {
        cmd.arg(a);
    }

    let assert = cmd.assert().code(exit_code);
    match stream {
        "stdout" => {
            assert.stdout(predicate::str::contains(needle));
        }
        "stderr" => {
            assert.stderr(predicate::str::contains(needle));
        }
        other => panic!("unknown stream: {other}"),
    }
}

#[rstest]
fn cli_reports_invalid_channel() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(
        &path,
        r#"
[[transmitters]]
serial_number = "A1"

[covers.den]
name = "Den"
channel = 16
device_class = "awning"
supported_features = ["up"]
transmitter_serial_number = "A1"
"#,
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("covertrack").unwrap();
    cmd.arg("--config").arg(&path).arg("check");
    cmd.assert()
        .code(3)
        .stderr(predicate::str::contains("covers.den.channel must be in 1..=15"));
}

#[rstest]
fn cli_reports_missing_config_file() {
    let dir = tempdir().unwrap();
    let mut cmd = Command::cargo_bin("covertrack").unwrap();
    cmd.arg("--config")
        .arg(dir.path().join("absent.toml"))
        .arg("check");
    cmd.assert()
        .code(3)
        .stderr(predicate::str::contains("Invalid configuration"));
}

#[rstest]
fn cli_position_run_stops_near_target() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let mut cmd = Command::cargo_bin("covertrack").unwrap();
    cmd.arg("--config")
        .arg(&cfg)
        .args(["run", "--cover", "living_room", "--interval-ms", "10", "position", "50"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("position=50"));
}

#[rstest]
fn cli_debug_run_logs_stop_and_settles() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let mut cmd = Command::cargo_bin("covertrack").unwrap();
    cmd.arg("--config").arg(&cfg).args([
        "--log-level",
        "debug",
        "run",
        "--cover",
        "living_room",
        "--interval-ms",
        "10",
        "position",
        "50",
    ]);
    cmd.env_remove("RUST_LOG")
        .assert()
        .success()
        .stderr(predicate::str::contains("target reached, stopping"))
        .stdout(predicate::str::contains("position=50"));
}
