use assert_cmd::Command;
use predicates::prelude::*;
use std::time::Duration;

fn cargo_bin() -> Command {
    let mut cmd = Command::cargo_bin("bfvm").unwrap();
    cmd.env("BFVM_CONFIG", "/nonexistent/bfvm.toml")
        .env_remove("BFVM_TRACE_MARKER")
        .timeout(Duration::from_secs(2));
    cmd
}

#[test]
fn prints_code_statistics() {
    cargo_bin()
        .args(["check", "++[>[-]<] hi"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Program OK"))
        .stdout(predicate::str::contains("jzf_block"))
        .stdout(predicate::str::contains("code:              9"))
        .stdout(predicate::str::contains("comments:          3"))
        .stdout(predicate::str::contains("max bracket depth: 2"));
}

#[test]
fn lists_bracket_pairs_on_request() {
    cargo_bin()
        .args(["check", "--brackets", "[[]][]"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Bracket pairs (3):"))
        .stdout(predicate::str::contains("     0 [ .. ] 3"))
        .stdout(predicate::str::contains("     1 [ .. ] 2"))
        .stdout(predicate::str::contains("     4 [ .. ] 5"));
}

#[test]
fn lists_trace_markers_with_configured_character() {
    cargo_bin()
        .env("BFVM_TRACE_MARKER", "@")
        .args(["check", "--markers", "+@+#+"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Trace markers (1):"))
        .stdout(predicate::str::contains("before instructions 1"));
}

#[test]
fn rejects_unbalanced_program() {
    cargo_bin()
        .args(["check", "[[]"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Parse error: unmatched bracket '['"))
        .stdout("");
}

#[test]
fn top_level_usage() {
    Command::cargo_bin("bfvm")
        .unwrap()
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Usage:"));

    Command::cargo_bin("bfvm")
        .unwrap()
        .arg("--help")
        .assert()
        .code(0)
        .stderr(predicate::str::contains("check"));
}

#[test]
fn debug_needs_a_terminal() {
    cargo_bin()
        .args(["debug", "+"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("interactive terminal"));
}

#[test]
fn debug_still_validates_first() {
    cargo_bin()
        .args(["debug", "]"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("unmatched bracket ']'"));
}
