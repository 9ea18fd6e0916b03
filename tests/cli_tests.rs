//! Integration tests for the stackprobe binary
#![allow(deprecated)] // suppress assert_cmd::Command::cargo_bin deprecation in tests

use predicates::prelude::*;
use stackprobe::probe::StackPointer;

fn stdout_of(args: &[&str]) -> String {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("stackprobe");
    cmd.args(args);
    let output = cmd.output().unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    String::from_utf8(output.stdout).unwrap()
}

#[test]
fn test_default_prints_single_hex_line() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("stackprobe");
    cmd.assert()
        .success()
        .stdout(predicate::str::is_match(r"\A0x[0-9a-f]+\n\z").unwrap())
        .stderr(predicate::str::is_empty());
}

#[test]
fn test_default_value_is_nonzero() {
    let stdout = stdout_of(&[]);
    let sp = StackPointer::parse(stdout.trim_end()).unwrap();
    assert!(!sp.is_null());
}

#[test]
fn test_samples_print_one_line_each() {
    let stdout = stdout_of(&["--samples", "5"]);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 5);
    for line in lines {
        assert!(StackPointer::parse(line).is_ok(), "bad line {:?}", line);
    }
}

#[test]
fn test_zero_samples_rejected() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("stackprobe");
    cmd.arg("-n").arg("0");
    cmd.assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("--samples"));
}

#[test]
fn test_json_output_parses() {
    let stdout = stdout_of(&["--format", "json", "-n", "2"]);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();

    assert_eq!(parsed["format"], "stackprobe-json-v1");
    assert_eq!(parsed["arch"], std::env::consts::ARCH);
    let samples = parsed["samples"].as_array().unwrap();
    assert_eq!(samples.len(), 2);
    for sample in samples {
        assert!(StackPointer::parse(sample.as_str().unwrap()).is_ok());
    }
    assert!(parsed.get("region").is_none());
}

#[cfg(any(target_os = "linux", target_os = "android"))]
#[test]
fn test_check_passes_and_keeps_text_output() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("stackprobe");
    cmd.arg("--check");
    cmd.assert()
        .success()
        .stdout(predicate::str::is_match(r"\A0x[0-9a-f]+\n\z").unwrap());
}

#[cfg(any(target_os = "linux", target_os = "android"))]
#[test]
fn test_check_json_reports_region() {
    let stdout = stdout_of(&["--check", "--format", "json"]);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();

    assert_eq!(parsed["within_region"], true);
    let low = StackPointer::parse(parsed["region"]["low"].as_str().unwrap()).unwrap();
    let high = StackPointer::parse(parsed["region"]["high"].as_str().unwrap()).unwrap();
    let sp = StackPointer::parse(parsed["samples"][0].as_str().unwrap()).unwrap();
    assert!(low <= sp && sp < high);
    assert_eq!(
        parsed["region"]["size"].as_u64().unwrap() as usize,
        high.as_usize() - low.as_usize()
    );
}

#[test]
fn test_debug_logs_go_to_stderr() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("stackprobe");
    cmd.arg("--debug");
    cmd.assert()
        .success()
        .stdout(predicate::str::is_match(r"\A0x[0-9a-f]+\n\z").unwrap())
        .stderr(predicate::str::contains("probed stack pointer"));
}

#[test]
fn test_version_flag() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("stackprobe");
    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}
