//! Black-box integration tests: compile+run a complete Titan program
//! through the actual `titan` binary and assert on captured stdout.
//!
//! Each test writes source to a temp file, spawns the built binary via
//! Cargo's `CARGO_BIN_EXE_<name>` env var, and captures stdout/stderr.

use std::fs;
use std::process::Command;
use std::sync::atomic::{AtomicU64, Ordering};

static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

fn run(source: &str) -> (String, String) {
    let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    let path = std::env::temp_dir().join(format!("titan_integration_{id}.titan"));
    fs::write(&path, source).expect("failed to write test source file");

    let output = Command::new(env!("CARGO_BIN_EXE_titan"))
        .arg(&path)
        .output()
        .expect("failed to run titan binary");

    let _ = fs::remove_file(&path);

    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
    )
}

#[test]
fn arithmetic_and_string_concatenation() {
    let (stdout, _) = run(r#"print 1 + 2; print "a" + "b";"#);
    assert_eq!(stdout, "3\nab\n");
}

#[test]
fn equality_is_reflexive_for_every_literal_kind() {
    let (stdout, _) = run(
        r#"
        print 1 == 1;
        print "x" == "x";
        print true == true;
        print nil == nil;
        "#,
    );
    assert_eq!(stdout, "true\ntrue\ntrue\ntrue\n");
}

#[test]
fn short_circuit_or_does_not_evaluate_rhs() {
    let (stdout, _) = run("print 0 or 1;");
    assert_eq!(stdout, "1\n");
}

#[test]
fn short_circuit_and_stops_at_a_falsy_lhs() {
    let (stdout, _) = run("print false and 1;");
    assert_eq!(stdout, "false\n");
}

#[test]
fn zero_is_truthy() {
    // Falsiness is Nil/false only, not C-style zero-is-false.
    let (stdout, _) = run(r#"if (0) print "t"; else print "f";"#);
    assert_eq!(stdout, "t\n");
}

#[test]
fn nested_scopes_shadow_without_colliding() {
    let (stdout, _) = run("{ var a = 1; { var a = 2; print a; } print a; }");
    assert_eq!(stdout, "2\n1\n");
}

#[test]
fn while_and_for_loops_produce_expected_sequences() {
    let (stdout, _) = run("var i = 0; while (i < 3) { print i; i = i + 1; }");
    assert_eq!(stdout, "0\n1\n2\n");

    let (stdout, _) = run("for (var i = 0; i < 3; i = i + 1) print i;");
    assert_eq!(stdout, "0\n1\n2\n");
}

#[test]
fn globals_cross_the_65536_threshold_and_still_resolve() {
    let mut source = String::new();
    for i in 0..70_000 {
        source.push_str(&format!("var g{i} = {i};\n"));
    }
    source.push_str("print g69999;\nprint g0;\nprint g256;\nprint g65536;\n");
    let (stdout, stderr) = run(&source);
    assert_eq!(stderr, "");
    assert_eq!(stdout, "69999\n0\n256\n65536\n");
}

#[test]
fn self_referential_local_initializer_is_a_compile_error() {
    let (stdout, stderr) = run("{ var a = a; }");
    assert_eq!(stdout, "");
    assert!(stderr.contains("Error"));
}

#[test]
fn undefined_global_is_a_runtime_error_reported_with_a_line_number() {
    let (stdout, stderr) = run("print missing;");
    assert_eq!(stdout, "");
    assert!(stderr.contains("Undefined variable 'missing'."));
    assert!(stderr.contains("[Line 1] in script"));
}

#[test]
fn too_many_cli_args_prints_usage_and_does_not_run_anything() {
    let output = Command::new(env!("CARGO_BIN_EXE_titan"))
        .args(["one", "two"])
        .output()
        .expect("failed to run titan binary");
    assert!(String::from_utf8_lossy(&output.stdout).contains("Usage"));
}

#[test]
fn help_flag_prints_usage_and_exits_zero() {
    let output = Command::new(env!("CARGO_BIN_EXE_titan"))
        .arg("--help")
        .output()
        .expect("failed to run titan binary");
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Usage"));
}
