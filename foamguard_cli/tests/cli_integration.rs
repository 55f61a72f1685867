use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::{Path, PathBuf};
use assert_cmd::Command;
use tempfile::tempdir;

// Fast sampler so short runs still see several samples.
fn write_valid_config(dir: &Path, channels_extra: &str) -> PathBuf {
    let toml = format!(
        r#"
[sampler]
interval_ms = 100
window = 1
min_delta_pct = 0

[control]
threshold_pct = 60
hysteresis_pct = 20

[channels]
log_interval_s = 10
report_interval_min = 0
{channels_extra}

[runner]
loop_ms = 10
"#
    );
    let path = dir.join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn foamguard() -> Command {
    let mut cmd = Command::cargo_bin("foamguard").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_lists_subcommands() {
    foamguard()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("self-check"))
        .stdout(predicate::str::contains("normalize"));
}

#[rstest]
#[case("web", r#"{"action":"threshold","value":70}"#, "threshold.set 70")]
#[case("web", r#"{"action":"on"}"#, "pump.on")]
#[case("push", r#"{"type":"control","pump":false}"#, "pump.off")]
#[case("bot", "/setinterval 15", "report.interval.set 15")]
#[case("bot", "/datasensores", "status.query")]
#[case("console", "mode.auto", "mode.auto")]
fn normalize_prints_canonical_command(
    #[case] channel: &str,
    #[case] payload: &str,
    #[case] expected: &str,
) {
    foamguard()
        .args(["normalize", "--channel", channel, payload])
        .assert()
        .success()
        .stdout(predicate::str::diff(format!("{expected}\n")));
}

#[rstest]
#[case("web", r#"{"action":"threshold","value":101}"#, "out of range")]
#[case("bot", "/threshold", "needs a `threshold` value")]
#[case("web", "{not json", "could not be parsed")]
#[case("bot", "/foo", "Unknown command")]
fn normalize_rejections_exit_1(#[case] channel: &str, #[case] payload: &str, #[case] needle: &str) {
    foamguard()
        .args(["normalize", "--channel", channel, payload])
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains(needle));
}

#[test]
fn normalize_json_error_has_reason() {
    let out = foamguard()
        .args(["--json", "normalize", "--channel", "bot", "/nope"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    let line = stderr
        .lines()
        .rev()
        .find(|l| l.trim_start().starts_with('{'))
        .expect("json error line");
    let v: serde_json::Value = serde_json::from_str(line).unwrap();
    assert_eq!(v["reason"], "UnknownCommand");
    assert!(v["message"].as_str().unwrap().contains("/setinterval"));
}

#[test]
fn self_check_reports_simulated_level() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(dir.path(), "");
    let out = foamguard()
        .arg("--config")
        .arg(&cfg)
        .arg("--json")
        .arg("self-check")
        .env("FOAMGUARD_SIM_LEVEL", "25")
        .output()
        .unwrap();
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(v["level"], 25);
    assert_eq!(v["sensors"], serde_json::json!([true, false, false]));
    assert_eq!(v["threshold"], 60);
    assert_eq!(v["pump"], false);
}

#[rstest]
#[case("[control]\nthreshold_pct = 150\n", "control.threshold_pct")]
#[case("[sampler]\ninterval_ms = 5\n", "sampler.interval_ms")]
#[case("this is = = not toml", "cfg.toml")]
fn bad_config_exits_3(#[case] body: &str, #[case] needle: &str) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cfg.toml");
    fs::write(&path, body).unwrap();
    foamguard()
        .arg("--config")
        .arg(&path)
        .arg("self-check")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Invalid configuration"))
        .stderr(predicate::str::contains(needle));
}

#[test]
fn missing_explicit_config_is_an_error() {
    let dir = tempdir().unwrap();
    foamguard()
        .arg("--config")
        .arg(dir.path().join("absent.toml"))
        .arg("self-check")
        .assert()
        .code(3);
}

#[test]
fn run_streams_push_snapshots_and_answers_console() {
    let dir = tempdir().unwrap();
    let csv = dir.path().join("log.csv");
    let cfg = write_valid_config(
        dir.path(),
        &format!("log_csv = \"{}\"", csv.display().to_string().replace('\\', "/")),
    );

    let out = foamguard()
        .arg("--config")
        .arg(&cfg)
        .args(["run", "--duration-ms", "1500"])
        .write_stdin("pump.on\nthreshold.set 101\nstatus.query\n")
        .output()
        .unwrap();
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let stdout = String::from_utf8(out.stdout).unwrap();
    let snaps: Vec<serde_json::Value> = stdout
        .lines()
        .map(|l| serde_json::from_str(l).expect("each stdout line is a snapshot"))
        .collect();
    assert!(snaps.len() >= 2, "got {} snapshots", snaps.len());
    assert_eq!(snaps[0]["level"], 50);
    assert!(snaps.iter().any(|s| s["pump"] == true && s["mode"] == "manual"));

    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("ok: pump.on"));
    assert!(stderr.contains("error: invalid parameter threshold"));
    assert!(stderr.contains("pump: on"));

    assert!(csv.exists(), "log sink opens its file up front");
}

fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

fn http(port: u16, request: &str) -> String {
    use std::io::{Read, Write};
    let mut stream = std::net::TcpStream::connect(("127.0.0.1", port)).unwrap();
    stream
        .set_read_timeout(Some(std::time::Duration::from_secs(5)))
        .unwrap();
    stream.write_all(request.as_bytes()).unwrap();
    let mut out = String::new();
    stream.read_to_string(&mut out).unwrap();
    out
}

fn post_control(port: u16, body: &str) -> String {
    http(
        port,
        &format!(
            "POST /control HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        ),
    )
}

#[test]
fn web_api_feeds_the_run_loop() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(dir.path(), "");
    let port = free_port();

    let mut child = std::process::Command::new(assert_cmd::cargo::cargo_bin("foamguard"))
        .arg("--config")
        .arg(&cfg)
        .args(["run", "--duration-ms", "4000", "--listen"])
        .arg(format!("127.0.0.1:{port}"))
        .env_remove("RUST_LOG")
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
        .unwrap();

    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(3);
    while std::net::TcpStream::connect(("127.0.0.1", port)).is_err() {
        assert!(std::time::Instant::now() < deadline, "web API never came up");
        std::thread::sleep(std::time::Duration::from_millis(20));
    }

    let ack = post_control(port, r#"{"action":"threshold","value":70}"#);
    assert!(ack.starts_with("HTTP/1.1 200"), "{ack}");
    assert!(ack.contains("threshold.set 70"), "{ack}");

    let rejected = post_control(port, r#"{"action":"threshold","value":150}"#);
    assert!(rejected.starts_with("HTTP/1.1 400"), "{rejected}");
    assert!(rejected.contains("invalid parameter threshold"), "{rejected}");

    let status = http(
        port,
        "GET /status HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    );
    assert!(status.starts_with("HTTP/1.1 200"), "{status}");
    assert!(status.contains(r#""threshold":70"#), "{status}");
    assert!(status.contains(r#""level":50"#), "{status}");

    assert!(child.wait().unwrap().success());
}
