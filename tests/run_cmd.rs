use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use std::time::Duration;

fn cargo_bin() -> Command {
    let mut cmd = Command::cargo_bin("bfvm").unwrap();
    cmd.env("BFVM_CONFIG", "/nonexistent/bfvm.toml")
        .env_remove("BFVM_TAPE_LEN")
        .env_remove("BFVM_BOUNDS")
        .env_remove("BFVM_MAX_STEPS")
        .env_remove("BFVM_TIMEOUT_MS")
        .env_remove("BFVM_TRACE_MARKER")
        .env_remove("BFVM_LOG")
        .timeout(Duration::from_secs(5));
    cmd
}

fn write_tempfile(content: &str) -> tempfile::NamedTempFile {
    let mut tf = tempfile::NamedTempFile::new().expect("tempfile");
    write!(tf, "{}", content).unwrap();
    tf
}

const HELLO: &str = "++++++++[>++++[>++>+++>+++>+<<<<-]>+>+>->>+[<]<-]>>.>---.+++++++..+++.>>.<-.<.+++.------.--------.>>+.>++.";

#[test]
fn runs_positional_code() {
    cargo_bin()
        .args(["run", HELLO])
        .assert()
        .success()
        .stdout("Hello World!\n\n");
}

#[test]
fn positional_parts_are_concatenated() {
    // "++++++++" "[>++++++++<-]>+." prints 'A'
    cargo_bin()
        .args(["run", "++++++++", "[>++++++++<-]>+."])
        .assert()
        .success()
        .stdout("A\n");
}

#[test]
fn runs_code_from_file_with_comments() {
    let tf = write_tempfile("add two and five\n++>+++++[<+>-]\nprint the sum as a char: ++++++++[<++++++>-]<.\n");
    cargo_bin()
        .arg("run")
        .arg("--file")
        .arg(tf.path())
        .assert()
        .success()
        .stdout("7\n");
}

#[test]
fn overview_example_prints_capital_o() {
    cargo_bin()
        .args(["run", "++>+++++[<+>-]++++++++[<+++++++++>-]<."])
        .assert()
        .success()
        .stdout("O\n");
}

#[test]
fn exit_with_value_returns_current_cell() {
    cargo_bin()
        .args(["run", "--exit-with-value", "++>+++++[<+>-]<"])
        .assert()
        .code(7)
        .stdout("\n");
}

#[test]
fn echoes_stdin_until_eof() {
    cargo_bin()
        .args(["run", ",[.,]"])
        .write_stdin("hello")
        .assert()
        .success()
        .stdout("hello\n");
}

#[test]
fn eof_stores_zero() {
    // cell starts at 5, ',' at EOF overwrites it with 0
    cargo_bin()
        .args(["run", "--exit-with-value", "+++++,"])
        .write_stdin("")
        .assert()
        .code(0);
}

#[test]
fn empty_and_comment_only_programs_halt_immediately() {
    cargo_bin().args(["run", ""]).assert().success().stdout("\n");
    cargo_bin()
        .args(["run", "nothing to see here"])
        .assert()
        .success()
        .stdout("\n");
}

#[test]
fn unbalanced_open_bracket_is_a_parse_error() {
    cargo_bin()
        .args(["run", "+[+[-]"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Parse error: unmatched bracket '['"))
        .stderr(predicate::str::contains("line 1, column 2"))
        .stdout("");
}

#[test]
fn stray_close_bracket_is_reported_with_caret() {
    cargo_bin()
        .args(["run", "++\n-]"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("unmatched bracket ']' at line 2, column 2"))
        .stderr(predicate::str::contains("  -]\n   ^"));
}

#[test]
fn moving_left_of_cell_zero_fails_by_default() {
    cargo_bin()
        .args(["run", "+.<"])
        .assert()
        .code(1)
        .stdout("\u{1}\n")
        .stderr(predicate::str::contains("Runtime error: pointer out of bounds (dp=0, op=<) at instruction 2"));
}

#[test]
fn wrap_policy_moves_to_last_cell() {
    cargo_bin()
        .args(["run", "--bounds", "wrap", "--tape-len", "4", "--exit-with-value", "<+++"])
        .assert()
        .code(3);
}

#[test]
fn clamp_policy_stays_on_cell_zero() {
    cargo_bin()
        .args(["run", "--bounds", "clamp", "--exit-with-value", "<<++"])
        .assert()
        .code(2);
}

#[test]
fn bounds_policy_from_environment() {
    cargo_bin()
        .env("BFVM_BOUNDS", "wrap")
        .args(["run", "--exit-with-value", "<+"])
        .assert()
        .code(1);
}

#[test]
fn invalid_environment_value_is_reported() {
    cargo_bin()
        .env("BFVM_BOUNDS", "sideways")
        .args(["run", "+"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("BFVM_BOUNDS"));
}

#[test]
fn config_file_sets_defaults() {
    let tf = write_tempfile("[vm]\nbounds = \"clamp\"\ntape_len = 8\n");
    cargo_bin()
        .env("BFVM_CONFIG", tf.path())
        .args(["run", "--exit-with-value", "<+"])
        .assert()
        .code(1);
}

#[test]
fn step_limit_aborts_infinite_loop() {
    cargo_bin()
        .args(["run", "--max-steps", "50", "+[]"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Execution aborted: step limit exceeded (50)"))
        .stdout(predicate::str::contains("Execution aborted").not());
}

#[test]
fn wall_clock_timeout_aborts_infinite_loop() {
    cargo_bin()
        .args(["run", "--timeout", "100", "+[]"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("wall-clock timeout exceeded (100 ms)"));
}

#[test]
fn timeout_from_environment() {
    cargo_bin()
        .env("BFVM_TIMEOUT_MS", "100")
        .args(["run", "+[]"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("timeout"));
}

#[test]
fn trace_goes_to_stderr_and_leaves_stdout_alone() {
    cargo_bin()
        .args(["run", "--trace", "++++++++[>++++++++<-]>+."])
        .assert()
        .success()
        .stdout("A\n")
        .stderr(predicate::str::contains("STEP | IP"))
        .stderr(predicate::str::contains("Increment cell[0] from 0 to 1"))
        .stderr(predicate::str::contains("Output byte 65"));
}

#[test]
fn markers_dump_state_only_when_enabled() {
    cargo_bin()
        .args(["run", "--markers", "++>+#."])
        .assert()
        .success()
        .stdout("\u{1}\n")
        .stderr(predicate::str::contains("Instruction Pointer: 4, Data Pointer: 1"))
        .stderr(predicate::str::contains("Data:   2|  1|  0"));

    cargo_bin()
        .args(["run", "++>+#."])
        .assert()
        .success()
        .stderr(predicate::str::contains("Instruction Pointer").not());
}

#[test]
fn missing_code_is_a_usage_error() {
    cargo_bin()
        .arg("run")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn file_and_positional_code_conflict() {
    let tf = write_tempfile("+");
    cargo_bin()
        .arg("run")
        .arg("--file")
        .arg(tf.path())
        .arg("+")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("cannot use positional code together with --file"));
}

#[test]
fn missing_file_is_reported() {
    cargo_bin()
        .args(["run", "--file", "/nonexistent/program.bf"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to read code file"));
}

#[test]
fn output_before_timeout_is_not_lost() {
    // prints '1' (49) and then spins forever
    let code = format!("{}.[]", "+".repeat(49));
    cargo_bin()
        .args(["run", "--timeout", "300", &code])
        .assert()
        .code(1)
        .stdout("1\n")
        .stderr(predicate::str::contains("wall-clock timeout exceeded (300 ms)"));
}
