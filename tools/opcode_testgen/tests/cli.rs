#![cfg(not(target_arch = "wasm32"))]

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_lists_overrides_and_defaults() {
    Command::new(env!("CARGO_BIN_EXE_opcode_testgen"))
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--base-url"))
        .stdout(predicate::str::contains("--testdata-dir"))
        .stdout(predicate::str::contains("--output"))
        .stdout(predicate::str::contains("../opcodes.odin"))
        .stdout(predicate::str::contains("https://github.com/virtualxt/8088/raw/main/v2"));
}

#[test]
fn unexpected_positional_argument_is_rejected() {
    Command::new(env!("CARGO_BIN_EXE_opcode_testgen"))
        .arg("extra")
        .assert()
        .failure();
}

#[test]
fn offline_run_over_populated_testdata_succeeds() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(
        tmp.path().join("metadata.json"),
        r#"{"opcodes": {"04": {"status": "normal", "flags-mask": 63}, "F4": {"status": "normal"}}}"#,
    )
    .unwrap();
    std::fs::write(tmp.path().join("04.json"), "[]").unwrap();
    let out = tmp.path().join("opcodes.odin");

    // Unroutable base URL: any network access would fail the run.
    Command::new(env!("CARGO_BIN_EXE_opcode_testgen"))
        .args(["--base-url", "http://127.0.0.1:9/v2", "--testdata-dir"])
        .arg(tmp.path())
        .arg("--output")
        .arg(&out)
        .assert()
        .success();

    let text = std::fs::read_to_string(&out).unwrap();
    assert!(text.starts_with("// This file is generated!\npackage tests\n"));
    assert!(text.contains("opcode_04 :: proc"));
    assert!(!text.contains("opcode_F4"));
}
