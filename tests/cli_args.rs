//! Binary smoke tests: argument handling and a single --once frame.

use assert_cmd::Command;
use std::fs;

#[test]
fn help_prints_usage_and_exits_cleanly() {
    let output = Command::cargo_bin("traymon")
        .unwrap()
        .arg("--help")
        .output()
        .unwrap();
    assert!(output.status.success());
    let text = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(text.contains("Usage:"), "missing usage text: {text}");
}

#[test]
fn unexpected_argument_is_reported() {
    let output = Command::cargo_bin("traymon")
        .unwrap()
        .arg("--bogus")
        .output()
        .unwrap();
    let text = String::from_utf8_lossy(&output.stderr);
    assert!(text.contains("Unexpected argument"), "got: {text}");
}

#[test]
fn once_renders_a_single_frame_from_config() {
    let td = tempfile::tempdir().unwrap();
    let config_path = td.path().join("config.json");
    // unknown key -> sentinel; malformed specifier -> literal passthrough
    fs::write(
        &config_path,
        r#"{ "info_label": "ok {flux_capacitor} {cpu_percent:9.9x}" }"#,
    )
    .unwrap();

    let output = Command::cargo_bin("traymon")
        .unwrap()
        .arg("--config")
        .arg(&config_path)
        .arg("--once")
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("ok N/A {cpu_percent:9.9x}"),
        "unexpected frame: {stdout}"
    );
}
