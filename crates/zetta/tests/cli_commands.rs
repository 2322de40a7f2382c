#![cfg(all(unix, feature = "cli"))]

use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = PathBuf::from(format!(
        "/tmp/zetta-cli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn zetta(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_zetta"))
        .arg("--log-level")
        .arg("error")
        .args(args)
        .output()
        .expect("zetta should run")
}

fn wait_for_socket(path: &Path, timeout: Duration) {
    let start = Instant::now();
    while !path.exists() {
        if start.elapsed() >= timeout {
            panic!("listener socket never appeared");
        }
        thread::sleep(Duration::from_millis(25));
    }
}

#[test]
fn encode_prints_reference_frame() {
    let output = zetta(&["--format", "pretty", "encode", "--type", "1", "--hex", "0102"]);

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        "AA 01 02 01 02 DB BC"
    );
}

#[test]
fn encode_json_reports_crc_and_wire() {
    let output = zetta(&["--format", "json", "encode", "-t", "publish", "--hex", "01 02"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"event\":\"frame-encoded\""));
    assert!(stdout.contains("\"crc\":\"0xdb\""));
    assert!(stdout.contains("\"wire\":\"aa01020102dbbc\""));
}

#[test]
fn encode_with_preset_ff_crc8() {
    let output = zetta(&[
        "--format",
        "pretty",
        "encode",
        "--type",
        "1",
        "--hex",
        "0102",
        "--integrity",
        "crc8-ff",
    ]);

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        "AA 01 02 01 02 0A BC"
    );
}

#[test]
fn decode_rejects_frame_sealed_with_other_crc8_preset() {
    let output = zetta(&["decode", "--hex", "AA 01 02 01 02 0A BC"]);
    assert_eq!(output.status.code(), Some(60));

    let output = zetta(&[
        "decode",
        "--integrity",
        "crc8-ff",
        "--hex",
        "AA 01 02 01 02 0A BC",
    ]);
    assert!(output.status.success());
}

#[test]
fn encode_over_limit_returns_60() {
    let payload = "ab".repeat(26);
    let output = zetta(&["encode", "--hex", &payload]);

    assert_eq!(output.status.code(), Some(60));
}

#[test]
fn encode_honors_raised_limit() {
    let payload = "ab".repeat(26);
    let output = zetta(&[
        "--format",
        "json",
        "encode",
        "--max-payload",
        "40",
        "--hex",
        &payload,
    ]);

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("\"len\":26"));
}

#[test]
fn decode_skips_noise_between_frames() {
    let output = zetta(&[
        "--format",
        "json",
        "decode",
        "--hex",
        "00 AA 01 02 01 02 DB BC 55 AA 00 00 00 BC",
    ]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.matches("frame-received").count(), 2);
    assert!(stdout.contains("\"payload_hex\":\"0102\""));
}

#[test]
fn decode_strict_rejects_noise() {
    let output = zetta(&["decode", "--strict", "--hex", "00 AA 00 00 00 BC"]);

    assert_eq!(output.status.code(), Some(60));
}

#[test]
fn decode_corrupted_frame_returns_60() {
    let output = zetta(&["decode", "--hex", "AA 01 02 01 03 DB BC"]);

    assert_eq!(output.status.code(), Some(60));
}

#[test]
fn send_over_limit_fails_before_connecting() {
    let dir = unique_temp_dir("oversize");
    let sock_path = dir.join("nobody.sock");
    let payload = "x".repeat(26);

    let output = zetta(&["send", sock_path.to_str().unwrap(), "--data", &payload]);

    assert_eq!(output.status.code(), Some(60));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn send_to_missing_socket_returns_3() {
    let dir = unique_temp_dir("missing");
    let sock_path = dir.join("nobody.sock");

    let output = zetta(&["send", sock_path.to_str().unwrap(), "--data", "hi"]);

    assert_eq!(output.status.code(), Some(3));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn send_and_listen_exchange_frames() {
    let dir = unique_temp_dir("exchange");
    let sock_path = dir.join("link.sock");

    let listener = Command::new(env!("CARGO_BIN_EXE_zetta"))
        .arg("--log-level")
        .arg("error")
        .arg("--format")
        .arg("json")
        .arg("listen")
        .arg(&sock_path)
        .arg("--count")
        .arg("1")
        .arg("--ack")
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("listen should start");

    wait_for_socket(&sock_path, Duration::from_secs(3));

    let output = zetta(&[
        "--format",
        "json",
        "send",
        sock_path.to_str().unwrap(),
        "--data",
        "hello",
        "--wait",
        "--wait-timeout",
        "3s",
    ]);
    assert!(output.status.success());
    let reply = String::from_utf8_lossy(&output.stdout);
    assert!(reply.contains("\"type_name\":\"ACK\""));
    assert!(reply.contains("\"len\":0"));

    let listened = listener
        .wait_with_output()
        .expect("listener should exit after one frame");
    assert!(listened.status.success());
    let stdout = String::from_utf8_lossy(&listened.stdout);
    assert!(stdout.contains("\"payload\":\"hello\""));
    assert!(stdout.contains("\"type_name\":\"PUBLISH\""));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn version_extended_lists_wire_defaults() {
    let output = zetta(&["version", "--extended"]);

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("max_payload=25"));
}
