use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use assert_cmd::Command;
use tempfile::tempdir;

// Stock sensor layout, spelled out so the tests don't depend on defaults
fn write_valid_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[[sensors]]
mount_angle_deg = 30
calibrated_max = 2000

[[sensors]]
mount_angle_deg = 70
calibrated_max = 3000

[[sensors]]
mount_angle_deg = 110
calibrated_max = 2700

[[sensors]]
mount_angle_deg = 150
calibrated_max = 1000

[control]
# fast ticks keep `run` tests short
tick_hz = 200
initial_angle_deg = 90

[status]
history_order = "chronological"
"#;
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn tracker() -> Command {
    let mut cmd = Command::cargo_bin("tracker").unwrap();
    cmd.env_remove("RUST_LOG")
        .env_remove("TRACKER_SIM_SUN_DEG")
        .env_remove("TRACKER_SIM_SWEEP_MDEG")
        .env_remove("TRACKER_SIM_FAIL_LDR");
    cmd
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["simulate", "--ticks", "10"], 0, "\"mode\":\"auto\"", "stdout")]
#[case(&["simulate", "--ticks", "60", "--control", "mode=manual&angle=45"], 0, "\"angle\":45,\"mode\":\"manual\"", "stdout")]
#[case(&["simulate", "--ticks", "200", "--control", "mode=manual&angle=999"], 0, "\"angle\":180,\"mode\":\"manual\"", "stdout")]
#[case(&["simulate", "--ticks", "5", "--gauge"], 0, "°", "stdout")]
#[case(&["self-check"], 0, "self-check OK", "stdout")]
#[case(&["simulate", "--ticks", "nope"], 2, "invalid value", "stderr")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let mut cmd = tracker();
    cmd.arg("--config").arg(&cfg);
    for a in args {
        cmd.arg(a);
    }

    let assert = cmd.assert().code(exit_code);
    match stream {
        "stdout" => assert.stdout(predicate::str::contains(needle)),
        _ => assert.stderr(predicate::str::contains(needle)),
    };
}

#[test]
fn manual_then_auto_resumes_tracking() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let out = tracker()
        .arg("--config")
        .arg(&cfg)
        .args(["simulate", "--ticks", "120", "--sun", "120"])
        .args(["--control", "mode=manual&angle=10", "--control", "mode=auto"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert!(stdout.contains("\"mode\":\"auto\""), "{stdout}");
    assert!(!stdout.contains("\"angle\":10,"), "{stdout}");
}

#[test]
fn unknown_mode_value_is_ignored() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    tracker()
        .arg("--config")
        .arg(&cfg)
        .args(["simulate", "--ticks", "3", "--control", "mode=sideways&angle=20"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"mode\":\"auto\""));
}

#[test]
fn every_prints_periodic_status_lines() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let out = tracker()
        .arg("--config")
        .arg(&cfg)
        .args(["simulate", "--ticks", "10", "--every", "5"])
        .output()
        .unwrap();
    assert!(out.status.success());
    // two periodic lines plus the final one
    assert_eq!(String::from_utf8(out.stdout).unwrap().lines().count(), 3);
}

#[rstest]
#[case("[control]\ntick_hz = 0\n", "Invalid configuration")]
#[case("[control]\ninitial_angle_deg = 200\n", "initial_angle_deg")]
#[case("[[sensors]]\nmount_angle_deg = 30\ncalibrated_max = 2000\n", "exactly 4")]
#[case("[status]\nhistory_order = \"sideways\"\n", "not valid TOML")]
#[case("[control\n", "not valid TOML")]
fn invalid_config_exits_two(#[case] toml: &str, #[case] needle: &str) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, toml).unwrap();

    tracker()
        .arg("--config")
        .arg(&path)
        .args(["simulate", "--ticks", "1"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains(needle));
}

#[test]
fn missing_config_file_exits_two() {
    let dir = tempdir().unwrap();
    tracker()
        .arg("--config")
        .arg(dir.path().join("absent.toml"))
        .arg("self-check")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("read"));
}

#[test]
fn calibration_csv_with_wrong_headers_is_explained() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let csv = dir.path().join("cal.csv");
    fs::write(&csv, "angle,max\n30,2000\n70,3000\n110,2700\n150,1000\n").unwrap();

    tracker()
        .arg("--config")
        .arg(&cfg)
        .arg("--calibration")
        .arg(&csv)
        .args(["simulate", "--ticks", "1"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid headers in calibration CSV"));
}

#[test]
fn calibration_csv_replaces_sensor_table() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let csv = dir.path().join("cal.csv");
    fs::write(
        &csv,
        "mount_angle_deg,calibrated_max\n20,1500\n60,1500\n120,1500\n160,1500\n",
    )
    .unwrap();

    tracker()
        .arg("--config")
        .arg(&cfg)
        .arg("--calibration")
        .arg(&csv)
        .args(["simulate", "--ticks", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"ldr\":["));
}

#[test]
fn self_check_reports_failing_sensors() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    tracker()
        .arg("--config")
        .arg(&cfg)
        .env("TRACKER_SIM_FAIL_LDR", "1")
        .arg("self-check")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Hardware could not be initialized"));
}

#[test]
fn run_serves_stdin_requests_until_eof() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let out = tracker()
        .arg("--config")
        .arg(&cfg)
        .args(["run", "--exit-on-eof"])
        .write_stdin("GET /control?mode=manual&angle=45 HTTP/1.1\n/data\n\n/history\n/nope\n")
        .output()
        .unwrap();
    assert!(out.status.success(), "{out:?}");

    let stdout = String::from_utf8(out.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 4, "{stdout}");
    assert_eq!(lines[0], "OK");
    assert!(lines[1].starts_with("{\"voltage\":"), "{}", lines[1]);
    assert!(lines[2].starts_with('['), "{}", lines[2]);
    assert_eq!(lines[3], "Not found");
}

#[test]
fn run_serves_dashboard_on_root() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    tracker()
        .arg("--config")
        .arg(&cfg)
        .args(["run", "--exit-on-eof"])
        .write_stdin("GET / HTTP/1.1\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("<title>Solar Tracker</title>"));
}
