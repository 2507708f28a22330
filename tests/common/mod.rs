//! Common test utilities for wingtrim integration tests

#![allow(dead_code)]

use assert_cmd::cargo;
use assert_cmd::Command;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Two-lane sheet: AR1 left sits at +8.5 mm, everything else within one loop
pub const SAMPLE_SHEET: &str = "\
Input 1,Input 2,Tolerance,Correction
Alpha,M,10,0
Line A,Nominal,Left,Right,Line B,Nominal,Left,Right,Line C,Nominal,Left,Right,Line D,Nominal,Left,Right
A1,1000,1005,995,B1,990,992,991,C1,980,980,980,D1,970,969,971
A2,1000,1012,1001,B2,990,990,990,,,,,,,,
";

/// Helper to get a wingtrim command with logging quiet and the environment clean
pub fn wingtrim() -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("wingtrim"));
    cmd.env_remove("WINGTRIM_STATE_DIR");
    cmd.env_remove("WINGTRIM_LOG");
    cmd
}

/// Helper to create an empty state directory
pub fn setup_state_dir() -> TempDir {
    TempDir::new().unwrap()
}

/// wingtrim command bound to a state directory
pub fn wingtrim_in(tmp: &TempDir) -> Command {
    let mut cmd = wingtrim();
    cmd.arg("--state-dir").arg(tmp.path());
    cmd
}

/// Write a file next to the state directory and return its path
pub fn write_file(tmp: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = tmp.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

/// State directory with the sample sheet already imported
pub fn setup_with_sheet() -> TempDir {
    let tmp = setup_state_dir();
    let sheet = write_file(&tmp, "alpha.csv", SAMPLE_SHEET);
    wingtrim_in(&tmp).arg("import").arg(&sheet).assert().success();
    tmp
}

/// Run a command and parse its JSON output
pub fn json_output(tmp: &TempDir, args: &[&str]) -> serde_json::Value {
    let output = wingtrim_in(tmp)
        .args(["--format", "json"])
        .args(args)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "command {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}
