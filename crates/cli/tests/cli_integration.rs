//! CLI integration tests for the `netkat` binary.
//!
//! All tests set `current_dir` to the workspace root so that relative
//! paths to conformance fixtures resolve.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn workspace_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    // crates/cli -> workspace root is two levels up
    manifest_dir
        .parent()
        .and_then(|p| p.parent())
        .expect("workspace root")
        .to_path_buf()
}

fn netkat() -> Command {
    let mut cmd = cargo_bin_cmd!("netkat");
    cmd.current_dir(workspace_root());
    cmd
}

fn read_json(rel: &str) -> serde_json::Value {
    let text = fs::read_to_string(workspace_root().join(rel)).expect("fixture readable");
    serde_json::from_str(&text).expect("fixture is JSON")
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    let text = String::from_utf8(output.stdout.clone()).expect("utf-8 stdout");
    serde_json::from_str(&text).unwrap_or_else(|e| panic!("stdout is not JSON ({}): {}", e, text))
}

// ──────────────────────────────────────────────
// Help and version
// ──────────────────────────────────────────────

#[test]
fn help_lists_subcommands() {
    netkat()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("compile"))
        .stdout(predicate::str::contains("classify"))
        .stdout(predicate::str::contains("headers"));
}

#[test]
fn version_exits_0() {
    netkat()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("netkat"));
}

#[test]
fn unknown_subcommand_fails() {
    netkat().arg("simulate").assert().failure();
}

// ──────────────────────────────────────────────
// compile
// ──────────────────────────────────────────────

#[test]
fn compile_matches_conformance_fixtures() {
    for name in ["forward_by_ip", "rewrite_chain", "union_as_filter"] {
        let policy = format!("conformance/compile/{}.policy.json", name);
        let output = netkat()
            .args(["compile", &policy])
            .output()
            .expect("spawn netkat");
        assert!(output.status.success(), "compile {} failed: {:?}", name, output);
        let expected = read_json(&format!("conformance/compile/{}.expected.json", name));
        assert_eq!(stdout_json(&output), expected, "fixture {}", name);
    }
}

#[test]
fn compile_compact_output_is_single_line() {
    let output = netkat()
        .args(["compile", "conformance/compile/forward_by_ip.policy.json"])
        .output()
        .expect("spawn netkat");
    assert!(output.status.success());
    let text = String::from_utf8(output.stdout).unwrap();
    assert_eq!(text.trim_end().lines().count(), 1, "got: {}", text);
}

#[test]
fn compile_pretty_is_same_document() {
    let compact = netkat()
        .args(["compile", "conformance/compile/rewrite_chain.policy.json"])
        .output()
        .expect("spawn netkat");
    let pretty = netkat()
        .args(["compile", "--pretty", "conformance/compile/rewrite_chain.policy.json"])
        .output()
        .expect("spawn netkat");
    assert!(pretty.status.success());
    assert!(String::from_utf8_lossy(&pretty.stdout).lines().count() > 1);
    assert_eq!(stdout_json(&compact), stdout_json(&pretty));
}

#[test]
fn compile_forward_in_predicate_fails() {
    netkat()
        .args(["compile", "conformance/negative/forward_in_predicate.policy.json"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("cannot be compiled as a predicate"));
}

#[test]
fn compile_error_json_output() {
    let output = netkat()
        .args([
            "--output",
            "json",
            "compile",
            "conformance/negative/forward_in_predicate.policy.json",
        ])
        .output()
        .expect("spawn netkat");
    assert_eq!(output.status.code(), Some(1));
    let err: serde_json::Value =
        serde_json::from_slice(&output.stderr).expect("stderr is JSON");
    assert_eq!(err["error"], "unsupported_predicate");
    assert!(err["message"].is_string());
}

#[test]
fn compile_missing_file_fails() {
    netkat()
        .args(["compile", "does/not/exist.json"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("error reading file"));
}

#[test]
fn compile_quiet_suppresses_text_errors() {
    netkat()
        .args(["--quiet", "compile", "does/not/exist.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error reading file").not());
}

#[test]
fn compile_rejects_unknown_kind() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("bad.policy.json");
    fs::write(&path, r#"{"kind": "query"}"#).unwrap();

    let output = netkat()
        .args(["--output", "json", "compile"])
        .arg(&path)
        .output()
        .expect("spawn netkat");
    assert_eq!(output.status.code(), Some(1));
    let err: serde_json::Value =
        serde_json::from_slice(&output.stderr).expect("stderr is JSON");
    assert_eq!(err["error"], "invalid_document");
}

#[test]
fn compile_rejects_unknown_header() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("tos.policy.json");
    fs::write(&path, r#"{"kind": "match", "fields": {"tos": 4}}"#).unwrap();

    netkat()
        .arg("compile")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("tos"));
}

#[test]
fn compile_bucket_becomes_pipe() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("bucket.policy.json");
    fs::write(&path, r#"{"kind": "bucket", "name": "q"}"#).unwrap();

    let output = netkat()
        .arg("compile")
        .arg(&path)
        .output()
        .expect("spawn netkat");
    assert!(output.status.success());
    let doc = stdout_json(&output);
    assert_eq!(doc["type"], "mod");
    assert_eq!(doc["header"], "location");
    assert_eq!(doc["value"]["type"], "pipe");
    assert!(doc["value"]["name"].is_string());
}

#[test]
fn verbose_logs_go_to_stderr() {
    let output = netkat()
        .args(["--verbose", "compile", "conformance/compile/forward_by_ip.policy.json"])
        .output()
        .expect("spawn netkat");
    assert!(output.status.success());
    // stdout stays parseable with logging enabled
    stdout_json(&output);
    assert!(!output.stderr.is_empty());
}

// ──────────────────────────────────────────────
// classify
// ──────────────────────────────────────────────

#[test]
fn classify_json_matches_fixture() {
    let output = netkat()
        .args([
            "--output",
            "json",
            "classify",
            "conformance/classify/two_switches.flowtable.json",
        ])
        .output()
        .expect("spawn netkat");
    assert!(output.status.success(), "{:?}", output);
    assert_eq!(
        stdout_json(&output),
        read_json("conformance/classify/two_switches.expected.json")
    );
}

#[test]
fn classify_text_prints_one_line_per_rule() {
    let output = netkat()
        .args(["classify", "conformance/classify/two_switches.flowtable.json"])
        .output()
        .expect("spawn netkat");
    assert!(output.status.success());
    let text = String::from_utf8(output.stdout).unwrap();
    assert_eq!(text.lines().count(), 4, "got:\n{}", text);
    assert!(text.contains("-> drop"));
    assert!(text.contains("controller"));
    assert!(String::from_utf8_lossy(&output.stderr).contains("4 rules"));
}

#[test]
fn classify_unknown_field_fails() {
    let output = netkat()
        .args([
            "--output",
            "json",
            "classify",
            "conformance/negative/unknown_field.flowtable.json",
        ])
        .output()
        .expect("spawn netkat");
    assert_eq!(output.status.code(), Some(1));
    let err: serde_json::Value =
        serde_json::from_slice(&output.stderr).expect("stderr is JSON");
    assert_eq!(err["error"], "unknown_field");
    assert!(err["message"].as_str().unwrap().contains("nwTos"));
}

#[test]
fn classify_rejects_non_array() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("table.json");
    fs::write(&path, r#"{"switch_id": 1}"#).unwrap();

    netkat()
        .arg("classify")
        .arg(&path)
        .assert()
        .failure()
        .code(1);
}

#[test]
fn classify_empty_table_has_no_rules() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("empty.json");
    fs::write(&path, "[]").unwrap();

    let output = netkat()
        .args(["--output", "json", "classify"])
        .arg(&path)
        .output()
        .expect("spawn netkat");
    assert!(output.status.success());
    assert_eq!(stdout_json(&output), serde_json::json!({ "rules": [] }));
}

// ──────────────────────────────────────────────
// headers
// ──────────────────────────────────────────────

#[test]
fn headers_text_lists_vendor_names() {
    netkat()
        .arg("headers")
        .assert()
        .success()
        .stdout(predicate::str::contains("srcmac"))
        .stdout(predicate::str::contains("dlSrc"))
        .stdout(predicate::str::contains("tcpdstport"));
}

#[test]
fn headers_json_covers_every_header() {
    let output = netkat()
        .args(["--output", "json", "headers"])
        .output()
        .expect("spawn netkat");
    assert!(output.status.success());
    let doc = stdout_json(&output);
    assert_eq!(doc["version"], "1");
    let rows = doc["headers"].as_array().expect("headers array");
    assert_eq!(rows.len(), 13);
    let switch = rows
        .iter()
        .find(|r| r["header"] == "switch")
        .expect("switch row");
    assert_eq!(switch["vendor"], serde_json::Value::Null);
}
