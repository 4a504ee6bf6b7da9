#![allow(missing_docs)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::Value;
use tempfile::TempDir;

const CONTEXT: &str = r#"{
    "name": 9,
    "groups": [1],
    "ends": [
        { "id": 1, "group": 1 }, { "id": 2, "group": 1 },
        { "id": 3, "group": 1 }, { "id": 4, "group": 1 }
    ],
    "chains": [{ "id": 11, "links": [[1, 2], [3, 4]] }]
}"#;

fn setup() -> (TempDir, PathBuf, PathBuf) {
    let dir = TempDir::new().expect("tempdir");
    let context = dir.path().join("context.json");
    fs::write(&context, CONTEXT).expect("write context");
    let out = dir.path().join("flower.clf");
    (dir, context, out)
}

fn build(context: &Path, out: &Path) {
    cargo_bin_cmd!("cactus-link")
        .env_remove("CACTUS_LINK_CONFIG")
        .args(["--theme", "plain", "build"])
        .arg(context)
        .arg("--out")
        .arg(out)
        .assert()
        .success();
}

#[test]
fn build_then_inspect_as_json() {
    let (_dir, context, out) = setup();
    build(&context, &out);
    assert!(out.exists());

    let output = cargo_bin_cmd!("cactus-link")
        .env_remove("CACTUS_LINK_CONFIG")
        .args(["--format", "json", "inspect"])
        .arg(&out)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: Value = serde_json::from_slice(&output).expect("json");
    assert_eq!(json["header"]["flower"], 9);
    assert_eq!(json["header"]["chain_count"], 1);
    assert_eq!(json["checksum_ok"], true);
    assert_eq!(json["chains"][0]["id"], 11);
    assert_eq!(json["chains"][0]["links"][1]["link_index"], 1);
}

#[test]
fn verify_succeeds_against_matching_context() {
    let (_dir, context, out) = setup();
    build(&context, &out);

    let output = cargo_bin_cmd!("cactus-link")
        .env_remove("CACTUS_LINK_CONFIG")
        .args(["--format", "json", "verify"])
        .arg(&out)
        .arg("--context")
        .arg(&context)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: Value = serde_json::from_slice(&output).expect("json");
    assert_eq!(json["success"], true);
    assert_eq!(json["counts"]["links"], 2);
}

#[test]
fn verify_exits_two_on_unresolved_ends() {
    let (dir, context, out) = setup();
    build(&context, &out);
    let narrow = dir.path().join("narrow.json");
    fs::write(
        &narrow,
        r#"{ "name": 9, "groups": [1], "ends": [{ "id": 1, "group": 1 }] }"#,
    )
    .expect("write narrow context");

    cargo_bin_cmd!("cactus-link")
        .env_remove("CACTUS_LINK_CONFIG")
        .args(["--quiet", "verify"])
        .arg(&out)
        .arg("--context")
        .arg(&narrow)
        .assert()
        .code(2);
}

#[test]
fn config_file_supplies_output_format() {
    let (dir, context, out) = setup();
    build(&context, &out);
    let config = dir.path().join("cli.toml");
    fs::write(&config, "format = \"json\"\nlog_level = \"error\"\n").expect("write config");

    let output = cargo_bin_cmd!("cactus-link")
        .env("CACTUS_LINK_CONFIG", &config)
        .arg("inspect")
        .arg(&out)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: Value = serde_json::from_slice(&output).expect("config selects json output");
    assert_eq!(json["header"]["version"], 1);
}

#[test]
fn inspect_rejects_garbage() {
    let (dir, _context, _out) = setup();
    let bogus = dir.path().join("bogus.clf");
    fs::write(&bogus, b"definitely not a flower").expect("write bogus");

    cargo_bin_cmd!("cactus-link")
        .env_remove("CACTUS_LINK_CONFIG")
        .arg("inspect")
        .arg(&bogus)
        .assert()
        .code(1);
}

#[test]
fn inspect_rejects_an_oversized_chain_count() {
    let (dir, _context, _out) = setup();
    let hostile = dir.path().join("hostile.clf");
    let mut bytes = b"CLNKFLWR".to_vec();
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&0u16.to_le_bytes());
    bytes.extend_from_slice(&7u64.to_le_bytes());
    bytes.extend_from_slice(&u32::MAX.to_le_bytes());
    fs::write(&hostile, &bytes).expect("write hostile header");

    let output = cargo_bin_cmd!("cactus-link")
        .env_remove("CACTUS_LINK_CONFIG")
        .arg("inspect")
        .arg(&hostile)
        .assert()
        .code(1)
        .get_output()
        .stderr
        .clone();
    let stderr = String::from_utf8_lossy(&output);
    assert!(stderr.contains("chain id"), "{stderr}");
}

#[test]
fn inspect_text_lists_link_records() {
    let (_dir, context, out) = setup();
    build(&context, &out);

    let output = cargo_bin_cmd!("cactus-link")
        .env_remove("CACTUS_LINK_CONFIG")
        .args(["--format", "text", "--theme", "plain", "inspect"])
        .arg(&out)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8_lossy(&output);
    assert!(text.contains("Chain 11 (2 links)"), "{text}");
    assert!(text.contains("3' end"), "{text}");
    assert!(text.contains("(ok)"), "{text}");
}
