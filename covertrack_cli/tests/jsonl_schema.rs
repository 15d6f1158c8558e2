use assert_cmd::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

fn write_valid_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[[transmitters]]
serial_number = "00001234"

[covers.bath]
name = "Bathroom"
channel = 5
device_class = "venetian blind"
supported_features = ["up", "down", "stop", "open_tilt", "close_tilt"]
transmitter_serial_number = "00001234"
travel_time_up = 0.2
travel_time_down = 0.2
"#;
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn stdout_lines(out: &std::process::Output) -> Vec<serde_json::Value> {
    String::from_utf8_lossy(&out.stdout)
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).unwrap_or_else(|e| panic!("not JSON ({e}): {l}")))
        .collect()
}

#[rstest]
fn run_emits_json_samples_then_final_state() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let out = Command::cargo_bin("covertrack")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .arg("--json")
        .args(["run", "--cover", "bath", "--interval-ms", "20", "open"])
        .output()
        .unwrap();
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let lines = stdout_lines(&out);
    assert!(lines.len() >= 2, "expected samples + final line");
    for v in &lines {
        assert_eq!(v["cover"], "bath");
        for key in ["position", "state", "direction", "is_closed", "confirmed"] {
            assert!(v.get(key).is_some(), "missing key {key} in {v}");
        }
        if let Some(p) = v["position"].as_u64() {
            assert!(p <= 100);
        }
    }
    assert!(lines[0].get("t_ms").is_some());
    let last = lines.last().unwrap();
    assert_eq!(last["position"], 0);
    assert_eq!(last["open_percent"], 100);
}

#[rstest]
#[case("0x04", "tilt_ventilation", 75)]
#[case("0x0f", "intermediate", 25)]
fn inject_reports_reconciled_state(#[case] status: &str, #[case] state: &str, #[case] position: u64) {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let out = Command::cargo_bin("covertrack")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .arg("--json")
        .args(["inject", "--cover", "bath", "--status", status])
        .output()
        .unwrap();
    assert!(out.status.success());
    let lines = stdout_lines(&out);
    let v = lines.last().unwrap();
    assert_eq!(v["state"], state);
    assert_eq!(v["position"], position);
    assert_eq!(v["tilt_position"], position);
}

#[rstest]
fn json_errors_are_structured() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let out = Command::cargo_bin("covertrack")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .arg("--json")
        .args(["run", "--cover", "attic", "open"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(4));
    let stderr = String::from_utf8_lossy(&out.stderr);
    let err_line = stderr
        .lines()
        .filter_map(|l| serde_json::from_str::<serde_json::Value>(l).ok())
        .find(|v| v.get("reason").is_some())
        .expect("structured error line");
    assert_eq!(err_line["reason"], "UnknownCover");
    assert_eq!(err_line["code"], 4);
}
