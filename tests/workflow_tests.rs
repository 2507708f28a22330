//! End-to-end trim sessions: import, inspect, plan, adjust, export

mod common;

use common::{json_output, setup_state_dir, setup_with_sheet, wingtrim_in, write_file};
use predicates::prelude::*;
use std::fs;

// ============================================================================
// Import / Export Tests
// ============================================================================

#[test]
fn test_import_reports_sheet() {
    let tmp = setup_state_dir();
    let sheet = write_file(&tmp, "alpha.csv", common::SAMPLE_SHEET);

    wingtrim_in(&tmp)
        .arg("import")
        .arg(&sheet)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 6 lines"))
        .stdout(predicate::str::contains("Alpha M"));
}

#[test]
fn test_import_semicolon_sheet() {
    let tmp = setup_state_dir();
    let text = common::SAMPLE_SHEET.replace(',', ";");
    let sheet = write_file(&tmp, "alpha.csv", &text);

    let summary = json_output(&tmp, &["import", sheet.to_str().unwrap()]);
    assert_eq!(summary["lines"], 6);
    assert_eq!(summary["delimiter"], ";");
}

#[test]
fn test_rejected_import_keeps_previous_sheet() {
    let tmp = setup_with_sheet();
    let bad = write_file(&tmp, "bad.csv", "just,some\nrandom,cells\n");

    wingtrim_in(&tmp)
        .arg("import")
        .arg(&bad)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unrecognized file format"));

    let status = json_output(&tmp, &["status"]);
    assert_eq!(status["wing"], "Alpha M");
    assert_eq!(status["lines"], 6);
}

#[test]
fn test_import_missing_file() {
    let tmp = setup_state_dir();
    wingtrim_in(&tmp)
        .args(["import", "does-not-exist.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot read"));
}

#[test]
fn test_export_without_sheet_fails() {
    let tmp = setup_state_dir();
    let out = tmp.path().join("out.csv");
    wingtrim_in(&tmp)
        .arg("export")
        .arg(&out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("No measurement sheet"));
}

#[test]
fn test_export_raw_sheet() {
    let tmp = setup_with_sheet();
    let out = tmp.path().join("out.csv");
    wingtrim_in(&tmp).arg("export").arg(&out).assert().success();

    let written = fs::read_to_string(&out).unwrap();
    assert!(written.contains("Nominal"));
    assert!(written.contains("A1,1000,1005,995,B1,990,992,991"));
}

// ============================================================================
// Inspection Tests
// ============================================================================

#[test]
fn test_lines_requires_sheet() {
    let tmp = setup_state_dir();
    wingtrim_in(&tmp)
        .arg("lines")
        .assert()
        .failure()
        .stderr(predicate::str::contains("wingtrim import"));
}

#[test]
fn test_lines_table() {
    let tmp = setup_with_sheet();
    wingtrim_in(&tmp)
        .args(["lines", "--lane", "a"])
        .assert()
        .success()
        .stdout(predicate::str::contains("A1"))
        .stdout(predicate::str::contains("A2"))
        .stdout(predicate::str::contains("AR1"))
        .stdout(predicate::str::contains("B1").not());
}

#[test]
fn test_lines_flagged_only() {
    let tmp = setup_with_sheet();
    let lines = json_output(&tmp, &["lines", "--flagged"]);
    let labels: Vec<&str> = lines
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["label"].as_str().unwrap())
        .collect();
    assert_eq!(labels, vec!["A2"]);
}

#[test]
fn test_groups_means() {
    let tmp = setup_with_sheet();
    wingtrim_in(&tmp)
        .arg("groups")
        .assert()
        .success()
        .stdout(predicate::str::contains("AR1"))
        .stdout(predicate::str::contains("+8.5"))
        .stdout(predicate::str::contains("-2.0"));
}

#[test]
fn test_groups_without_sheet_lists_declared_groups() {
    let tmp = setup_state_dir();
    wingtrim_in(&tmp)
        .args(["profile", "use", "generic-8"])
        .assert()
        .success();

    let groups = json_output(&tmp, &["groups"]);
    let groups = groups.as_array().unwrap();
    // 7 declared groups in generic-8, both sides each
    assert_eq!(groups.len(), 14);
    assert_eq!(groups[0]["group"], "AR1");
    assert!(groups[0]["mean_delta"].is_null());
    assert_eq!(groups[13]["group"], "DR1");

    wingtrim_in(&tmp)
        .arg("groups")
        .assert()
        .success()
        .stdout(predicate::str::contains("CR2"));
}

#[test]
fn test_series_average() {
    let tmp = setup_with_sheet();
    let points = json_output(&tmp, &["series", "A"]);
    assert_eq!(points[0]["index"], 1);
    assert_eq!(points[0]["value"], 0.0);
    assert_eq!(points[1]["index"], 2);
    assert_eq!(points[1]["value"], 6.5);
}

#[test]
fn test_series_left_side() {
    let tmp = setup_with_sheet();
    let points = json_output(&tmp, &["series", "A", "--mode", "left"]);
    assert_eq!(points[0]["value"], 5.0);
    assert_eq!(points[1]["value"], 12.0);
}

#[test]
fn test_series_plot() {
    let tmp = setup_with_sheet();
    wingtrim_in(&tmp)
        .args(["series", "A", "--plot"])
        .assert()
        .success()
        .stdout(predicate::str::contains("A1 .. A2"))
        .stdout(predicate::str::contains("tolerance"));
}

#[test]
fn test_suggest_lists_out_of_tolerance_group() {
    let tmp = setup_with_sheet();
    wingtrim_in(&tmp)
        .arg("suggest")
        .assert()
        .success()
        .stdout(predicate::str::contains("AR1"));
}

// ============================================================================
// Plan / Adjust Tests
// ============================================================================

#[test]
fn test_plan_proposes_one_loop() {
    let tmp = setup_with_sheet();
    let plan = json_output(&tmp, &["plan"]);
    let proposals = plan.as_array().unwrap();
    assert_eq!(proposals.len(), 1);
    assert_eq!(proposals[0]["group"], "AR1");
    assert_eq!(proposals[0]["side"], "L");
    assert_eq!(proposals[0]["loops_to_apply_signed"], -1);
    assert_eq!(proposals[0]["extra_mm"], -10.0);
    assert_eq!(proposals[0]["predicted_mean"], -1.5);
}

#[test]
fn test_plan_lane_filter_excludes_group() {
    let tmp = setup_with_sheet();
    wingtrim_in(&tmp)
        .args(["plan", "--lanes", "BCD"])
        .assert()
        .success()
        .stdout(predicate::str::contains("within one loop"));
}

#[test]
fn test_plan_apply_then_settles() {
    let tmp = setup_with_sheet();

    wingtrim_in(&tmp)
        .args(["plan", "--apply"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added 1 correction(s)"));

    let adjustments = json_output(&tmp, &["adjust", "show"]);
    assert_eq!(adjustments["AR1|L"], -10.0);

    // Second application has nothing left to correct
    wingtrim_in(&tmp)
        .args(["plan", "--apply"])
        .assert()
        .success()
        .stdout(predicate::str::contains("within one loop"));

    let adjustments = json_output(&tmp, &["adjust", "show"]);
    assert_eq!(adjustments["AR1|L"], -10.0);
}

#[test]
fn test_adjust_add_accumulates() {
    let tmp = setup_with_sheet();
    wingtrim_in(&tmp)
        .args(["adjust", "add", "AR1", "l", "5"])
        .assert()
        .success();
    wingtrim_in(&tmp)
        .args(["adjust", "add", "AR1", "l", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("AR1|L = +10.0 mm"));

    let lines = json_output(&tmp, &["lines", "--lane", "A"]);
    assert_eq!(lines[0]["left"]["after"]["delta"], 15.0);
    assert_eq!(lines[0]["left"]["after"]["severity"], "red");
}

#[test]
fn test_adjust_set_negative_and_reset() {
    let tmp = setup_with_sheet();
    wingtrim_in(&tmp)
        .args(["adjust", "set", "AR1", "both", "-3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("AR1|L = -3.0 mm"))
        .stdout(predicate::str::contains("AR1|R = -3.0 mm"));

    wingtrim_in(&tmp)
        .args(["adjust", "reset", "AR1", "r"])
        .assert()
        .success();
    let adjustments = json_output(&tmp, &["adjust", "show"]);
    assert_eq!(adjustments["AR1|L"], -3.0);
    assert!(adjustments.get("AR1|R").is_none());

    wingtrim_in(&tmp)
        .args(["adjust", "reset", "--all"])
        .assert()
        .success();
    wingtrim_in(&tmp)
        .args(["adjust", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No adjustments"));
}

#[test]
fn test_export_applied_folds_in_adjustments() {
    let tmp = setup_with_sheet();
    wingtrim_in(&tmp)
        .args(["plan", "--apply"])
        .assert()
        .success();

    let out = tmp.path().join("trimmed.csv");
    wingtrim_in(&tmp)
        .arg("export")
        .arg(&out)
        .arg("--applied")
        .assert()
        .success()
        .stdout(predicate::str::contains("trimmed measurements"));

    let written = fs::read_to_string(&out).unwrap();
    assert!(written.contains("A1,1000,995,995,B1,990,992,991"));
    assert!(written.contains("A2,1000,1002,1001"));
}

// ============================================================================
// Loop Tests
// ============================================================================

#[test]
fn test_loop_types_defaults() {
    let tmp = setup_state_dir();
    wingtrim_in(&tmp)
        .args(["loops", "types"])
        .assert()
        .success()
        .stdout(predicate::str::contains("SL"))
        .stdout(predicate::str::contains("L3"))
        .stdout(predicate::str::contains("-15.0"));
}

#[test]
fn test_loop_assignment_shifts_loops_state() {
    let tmp = setup_with_sheet();
    wingtrim_in(&tmp)
        .args(["loops", "set", "a2", "l", "L1"])
        .assert()
        .success();

    let lines = json_output(&tmp, &["lines", "--lane", "A", "--state", "loops"]);
    assert_eq!(lines[1]["label"], "A2");
    assert_eq!(lines[1]["left"]["loops"]["delta"], 7.0);
    assert_eq!(lines[1]["left"]["original"]["delta"], 12.0);
}

#[test]
fn test_loop_unknown_type_rejected() {
    let tmp = setup_with_sheet();
    wingtrim_in(&tmp)
        .args(["loops", "set", "A1", "l", "L9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown loop type"));
}

#[test]
fn test_loop_type_define_and_remove() {
    let tmp = setup_state_dir();
    wingtrim_in(&tmp)
        .args(["loops", "type", "L4", "-20"])
        .assert()
        .success();
    let types = json_output(&tmp, &["loops", "types"]);
    assert_eq!(types["L4"], -20.0);

    wingtrim_in(&tmp)
        .args(["loops", "type", "L4", "--remove"])
        .assert()
        .success();
    wingtrim_in(&tmp)
        .args(["loops", "type", "SL", "--remove"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be removed"));
}

#[test]
fn test_loop_presets_round_trip() {
    let tmp = setup_with_sheet();
    wingtrim_in(&tmp)
        .args(["loops", "set", "A1", "both", "L2"])
        .assert()
        .success();
    wingtrim_in(&tmp)
        .args(["loops", "preset", "save", "first-flight"])
        .assert()
        .success();
    wingtrim_in(&tmp).args(["loops", "clear"]).assert().success();
    wingtrim_in(&tmp)
        .args(["loops", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("baseline loop"));

    wingtrim_in(&tmp)
        .args(["loops", "preset", "load", "first-flight"])
        .assert()
        .success();
    wingtrim_in(&tmp)
        .args(["loops", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("A1|L"))
        .stdout(predicate::str::contains("L2"));

    wingtrim_in(&tmp)
        .args(["loops", "preset", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("first-flight"));
    wingtrim_in(&tmp)
        .args(["loops", "preset", "load", "missing"])
        .assert()
        .failure();
}
