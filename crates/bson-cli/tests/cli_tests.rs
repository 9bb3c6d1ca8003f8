//! Integration tests for the `bson` CLI binary.
//!
//! Documents are built with `bson build`, written to temp files or piped
//! through stdin/stdout, and read back with the other subcommands.

// `Command::cargo_bin` was deprecated in assert_cmd 2.1.2 in favor of
// `cargo::cargo_bin_cmd!`. Allow it until we migrate.
#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn bson() -> Command {
    Command::cargo_bin("bson").unwrap()
}

/// Helper: build a document from pairs into `dir/name` and return the path.
fn build_file(dir: &TempDir, name: &str, pairs: &[&str]) -> String {
    let path = dir.path().join(name).to_string_lossy().into_owned();
    bson()
        .arg("build")
        .args(pairs)
        .args(["-o", &path])
        .assert()
        .success();
    path
}

// ─────────────────────────────────────────────────────────────────────────────
// build
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn build_to_stdout_writes_exact_bytes() {
    bson()
        .args(["build", "a=i32:1"])
        .assert()
        .success()
        .stdout(vec![0x0c, 0, 0, 0, 0x10, b'a', 0, 1, 0, 0, 0, 0]);
}

#[test]
fn build_to_file_is_readable_by_library() {
    let dir = TempDir::new().unwrap();
    let path = build_file(&dir, "person.bson", &["name=str:Alice", "age=i32:30"]);

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(bytes.len(), 30);
    let doc = bson_core::Document::from_bytes(bytes).unwrap();
    assert_eq!(doc.keys().collect::<Vec<_>>(), ["name", "age"]);
    assert_eq!(doc.get("age"), Some(bson_core::Value::Int32(30)));
}

#[test]
fn build_string_value_may_contain_separators() {
    let dir = TempDir::new().unwrap();
    let path = build_file(&dir, "url.bson", &["url=str:http://x.test/?a=b"]);

    bson()
        .args(["get", "url", "-i", &path])
        .assert()
        .success()
        .stdout("\"http://x.test/?a=b\"\n");
}

#[test]
fn build_i64_and_native_int() {
    let dir = TempDir::new().unwrap();
    let path = build_file(&dir, "ints.bson", &["big=i64:-9000000000", "n=int:7"]);

    bson()
        .args(["inspect", "-i", &path])
        .assert()
        .success()
        .stdout(predicate::str::contains("big (int64): -9000000000"))
        .stdout(predicate::str::contains("n (int"));
}

#[test]
fn build_embeds_document_from_file() {
    let dir = TempDir::new().unwrap();
    let child = build_file(&dir, "child.bson", &["city=str:Paris"]);
    let parent = build_file(
        &dir,
        "parent.bson",
        &[format!("address=doc:{child}").as_str(), "zip=i32:75001"],
    );

    bson()
        .args(["inspect", "-i", &parent])
        .assert()
        .success()
        .stdout("address (document):\n  city (string): \"Paris\"\nzip (int32): 75001\n");
}

#[test]
fn build_rejects_duplicate_keys() {
    bson()
        .args(["build", "a=i32:1", "a=i32:2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("duplicate key"));
}

#[test]
fn build_rejects_unknown_type() {
    bson()
        .args(["build", "a=float:1.5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown type 'float'"));
}

#[test]
fn build_rejects_malformed_pair() {
    bson()
        .args(["build", "novalue"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected KEY=TYPE:VALUE"));
}

#[test]
fn build_rejects_out_of_range_i32() {
    bson()
        .args(["build", "a=i32:3000000000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid i32"));
}

// ─────────────────────────────────────────────────────────────────────────────
// inspect / get
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn inspect_from_stdin() {
    let doc = bson_core::Document::from_pairs([("x", 1i32), ("y", 2i32)]);
    bson()
        .arg("inspect")
        .write_stdin(doc.into_bytes())
        .assert()
        .success()
        .stdout("x (int32): 1\ny (int32): 2\n");
}

#[test]
fn inspect_empty_document_prints_nothing() {
    bson()
        .arg("inspect")
        .write_stdin(vec![5u8, 0, 0, 0, 0])
        .assert()
        .success()
        .stdout("");
}

#[test]
fn get_missing_key_fails() {
    let dir = TempDir::new().unwrap();
    let path = build_file(&dir, "a.bson", &["a=i32:1"]);

    bson()
        .args(["get", "b", "-i", &path])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Key not found: 'b'"));
}

#[test]
fn get_nested_document_prints_inline() {
    let dir = TempDir::new().unwrap();
    let child = build_file(&dir, "child.bson", &["k=i64:5"]);
    let parent = build_file(&dir, "parent.bson", &[format!("c=doc:{child}").as_str()]);

    bson()
        .args(["get", "c", "-i", &parent])
        .assert()
        .success()
        .stdout("{\"k\": 5}\n");
}

// ─────────────────────────────────────────────────────────────────────────────
// validate / hex
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn validate_reports_counts() {
    let dir = TempDir::new().unwrap();
    let path = build_file(&dir, "person.bson", &["name=str:Alice", "age=i32:30"]);

    bson()
        .args(["validate", "-i", &path])
        .assert()
        .success()
        .stdout("valid: 2 keys, 30 bytes\n");
}

#[test]
fn validate_rejects_truncated_input() {
    bson()
        .arg("validate")
        .write_stdin(vec![0x0c, 0, 0, 0, 0x10, b'a', 0, 1])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to decode BSON input"));
}

#[test]
fn validate_rejects_unknown_type() {
    // {"a": <0x01 double>} is well-framed but uses an unsupported tag.
    let mut bytes = vec![0x10, 0, 0, 0, 0x01, b'a', 0];
    bytes.extend_from_slice(&1.0f64.to_le_bytes());
    bytes.push(0);
    bson()
        .arg("validate")
        .write_stdin(bytes)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown"));
}

#[test]
fn validate_honours_max_depth() {
    let dir = TempDir::new().unwrap();
    let inner = build_file(&dir, "inner.bson", &["v=i32:1"]);
    let outer = build_file(&dir, "outer.bson", &[format!("n=doc:{inner}").as_str()]);

    bson()
        .args(["validate", "--max-depth", "1", "-i", &outer])
        .assert()
        .success();
    bson()
        .args(["validate", "--max-depth", "0", "-i", &outer])
        .assert()
        .failure();
}

#[test]
fn hex_dump() {
    bson()
        .arg("hex")
        .write_stdin(vec![0x0c, 0, 0, 0, 0x10, b'a', 0, 1, 0, 0, 0, 0])
        .assert()
        .success()
        .stdout("0c 00 00 00 10 61 00 01 00 00 00 00\n");
}

#[test]
fn hex_honours_max_depth() {
    // {"n": {}}
    let bytes = vec![0x0d, 0, 0, 0, 0x03, b'n', 0, 0x05, 0, 0, 0, 0, 0];

    bson()
        .args(["hex", "--max-depth", "1"])
        .write_stdin(bytes.clone())
        .assert()
        .success()
        .stdout("0d 00 00 00 03 6e 00 05 00 00 00 00 00\n");
    bson()
        .args(["hex", "--max-depth", "0"])
        .write_stdin(bytes)
        .assert()
        .failure()
        .stderr(predicate::str::contains("nesting depth exceeds limit of 0"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Pipelines and logging
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn build_piped_into_inspect() {
    let built = bson()
        .args(["build", "s=str:hi", "n=i32:-1"])
        .output()
        .unwrap();
    assert!(built.status.success());

    bson()
        .arg("inspect")
        .write_stdin(built.stdout)
        .assert()
        .success()
        .stdout("s (string): \"hi\"\nn (int32): -1\n");
}

#[test]
fn verbose_logs_go_to_stderr() {
    bson()
        .args(["-v", "build", "a=i32:1"])
        .assert()
        .success()
        .stderr(predicate::str::contains("built document"));
}

#[test]
fn missing_input_file_fails() {
    bson()
        .args(["inspect", "-i", "/nonexistent/file.bson"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read file"));
}
