// crates/survey-harness/tests/export_scenario.rs
// ============================================================================
// Module: Export Scenario Tests
// Description: End-to-end generate, export, write, and teardown runs.
// Purpose: Validate the CSV artifact, the report, and the audit trail.
// ============================================================================

//! Export scenario tests covering the default run and its audit events.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use survey_harness::DATA_DIR;
use survey_harness::DATA_FILE;
use survey_harness::N_USERS;
use survey_harness::run_export_scenario;
use survey_harness_config::HarnessConfig;
use survey_harness_core::ExportTable;
use survey_harness_core::FieldValue;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn scenario_config(root: &Path, audit_log: &Path) -> HarnessConfig {
    let mut config = HarnessConfig::default();
    config.export.data_dir = root.join(DATA_DIR);
    config.generate.seed = Some(2024);
    config.audit.path = Some(audit_log.display().to_string());
    config
}

fn event_names(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .expect("read audit log")
        .lines()
        .map(|line| {
            let value: serde_json::Value = serde_json::from_str(line).expect("json line");
            value["event"].as_str().expect("event name").to_string()
        })
        .collect()
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn default_scenario_writes_data_test_csv() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = scenario_config(dir.path(), &dir.path().join("audit.jsonl"));
    assert!(!dir.path().join(DATA_DIR).exists());

    let report = run_export_scenario(&config).expect("scenario");

    let expected = dir.path().join(DATA_DIR).join(DATA_FILE);
    assert_eq!(report.path, expected);
    assert_eq!(report.generated, N_USERS);
    assert!(report.rows >= N_USERS);
    assert_eq!(report.deleted, report.rows);

    let contents = fs::read_to_string(&expected).expect("read csv");
    let mut lines = contents.lines();
    let header = lines.next().expect("header row");
    assert!(header.starts_with("id,run_id,status,start_time,end_time,"));
    assert!(!header.starts_with(','));
    assert_eq!(lines.count(), report.rows);
}

#[test]
fn written_csv_round_trips_rows_and_columns() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = scenario_config(dir.path(), &dir.path().join("audit.jsonl"));
    let report = run_export_scenario(&config).expect("scenario");

    let table = ExportTable::read_csv(&report.path).expect("read back");
    assert_eq!(table.row_count(), report.rows);
    assert_eq!(table.column_count(), report.columns);
    let columns: BTreeSet<&str> = table.columns().iter().map(String::as_str).collect();
    for name in ["id", "run_id", "status", "age", "gender", "consent", "satisfaction"] {
        assert!(columns.contains(name), "missing column {name}");
    }
    let run_ids = table.column("run_id").expect("run_id column");
    assert!(run_ids.iter().all(|value| **value == FieldValue::Text(report.run_id.clone())));
}

#[test]
fn zero_participants_writes_header_only() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = scenario_config(dir.path(), &dir.path().join("audit.jsonl"));
    config.generate.participants = 0;

    let report = run_export_scenario(&config).expect("scenario");
    assert_eq!(report.generated, 0);
    assert_eq!(report.rows, 0);
    assert_eq!(report.deleted, 0);
    let contents = fs::read_to_string(&report.path).expect("read csv");
    assert_eq!(contents, "id,run_id,status,start_time,end_time\n");
}

#[test]
fn scenario_emits_lifecycle_audit_events_in_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    let log = dir.path().join("audit.jsonl");
    let mut config = scenario_config(dir.path(), &log);
    config.generate.participants = 5;

    run_export_scenario(&config).expect("scenario");
    assert_eq!(
        event_names(&log),
        vec![
            "harness_setup",
            "participants_generated",
            "export_built",
            "export_written",
            "teardown",
        ]
    );
}

#[test]
fn unwritable_output_still_tears_down() {
    let dir = tempfile::tempdir().expect("tempdir");
    let log = dir.path().join("audit.jsonl");
    let mut config = scenario_config(dir.path(), &log);
    fs::write(dir.path().join(DATA_DIR), b"blocks the data directory").expect("write blocker");
    config.generate.participants = 4;

    let err = run_export_scenario(&config).expect_err("write must fail");
    assert!(err.to_string().contains("export io error"), "unexpected error {err}");
    let events = event_names(&log);
    assert_eq!(events.last().map(String::as_str), Some("teardown"));
    assert!(!events.iter().any(|event| event == "export_written"));
}

#[test]
fn custom_file_name_is_used() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = scenario_config(dir.path(), &dir.path().join("audit.jsonl"));
    config.export.data_file = "participants.csv".to_string();
    config.generate.participants = 2;

    let report = run_export_scenario(&config).expect("scenario");
    assert_eq!(report.path, dir.path().join(DATA_DIR).join("participants.csv"));
    assert!(report.path.is_file());
}
