use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use threadview::measure::measure_width;

const THREAD_JSON: &str = r#"{
  "posts": [
    {
      "id": "p1",
      "title": "Hello threads",
      "score": 9,
      "comment_count": 2,
      "comments": [
        {
          "id": "c1",
          "author": "alice",
          "score": 3,
          "created_at": "2024-06-01T09:00:00Z",
          "body": "Top level comment with enough words to need wrapping at sixty columns wide.",
          "children": [
            {
              "id": "c2",
              "author": "bob",
              "created_at": "2024-06-01T10:00:00Z",
              "body": "A reply"
            }
          ]
        }
      ]
    }
  ]
}"#;

fn threadview(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("threadview").expect("binary built");
    cmd.arg("--config")
        .arg(dir.path().join("missing.yaml"))
        .env("THREADVIEW_LOGGING__ENABLED", "false")
        .env("THREADVIEW_UI__THEME", "plain");
    cmd
}

#[test]
fn prints_version() {
    Command::cargo_bin("threadview")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn prints_help() {
    Command::cargo_bin("threadview")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("threadview").and(predicate::str::contains("--dump")));
}

#[test]
fn rejects_unknown_arguments() {
    Command::cargo_bin("threadview")
        .unwrap()
        .arg("--frobnicate")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown argument"));
}

#[test]
fn dumps_thread_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("thread.json");
    fs::write(&path, THREAD_JSON).unwrap();

    let output = threadview(&dir)
        .args(["--dump", "--width", "60", "--thread"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(output.status.success(), "{output:?}");

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("Hello threads"));
    assert!(stdout.contains("alice · 3 points"));
    assert!(stdout.contains("bob · 0 points"));
    for line in stdout.lines() {
        assert_eq!(measure_width(line), 60, "{line:?}");
    }
}

#[test]
fn dump_honours_depth_override() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("thread.json");
    fs::write(&path, THREAD_JSON).unwrap();

    threadview(&dir)
        .env("THREADVIEW_THREADS__MAX_COMMENT_DEPTH", "0")
        .args(["--dump", "--thread"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("alice").and(predicate::str::contains("bob").not()));
}

#[test]
fn dumps_builtin_sample_without_thread_file() {
    let dir = TempDir::new().unwrap();
    threadview(&dir)
        .arg("--dump")
        .assert()
        .success()
        .stdout(predicate::str::contains("Welcome to threadview"));
}

#[test]
fn missing_thread_file_fails() {
    let dir = TempDir::new().unwrap();
    threadview(&dir)
        .args(["--dump", "--thread"])
        .arg(dir.path().join("nope.yaml"))
        .assert()
        .code(1)
        .stderr(predicate::str::starts_with("error:"));
}

#[test]
fn writes_effective_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("conf").join("config.yaml");
    Command::cargo_bin("threadview")
        .unwrap()
        .env("THREADVIEW_THREADS__MAX_COMMENT_DEPTH", "3")
        .arg("--config")
        .arg(&path)
        .arg("--write-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote config to"));

    let written = fs::read_to_string(&path).unwrap();
    assert!(written.contains("max_comment_depth: 3"), "{written}");
}
