// crates/survey-harness/src/scenario.rs
// ============================================================================
// Module: Export Scenario
// Description: Generate, export, write, and tear down in one scoped run.
// Purpose: Smoke-test the participant model end to end.
// Dependencies: survey-harness-config, serde
// ============================================================================

//! ## Overview
//! [`run_export_scenario`] is the canonical harness run: generate
//! participants (100 by default), export every persisted participant, write
//! the table to `data/test.csv`, and tear down. Teardown runs on every exit
//! path; see [`TestApp::scope`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;

use serde::Serialize;
use survey_harness_config::HarnessConfig;

use crate::context::HarnessError;
use crate::context::TestApp;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Summary of a completed export scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioReport {
    /// Run identifier of the scenario's context.
    pub run_id: String,
    /// Participants generated by this run.
    pub generated: usize,
    /// Rows in the written export.
    pub rows: usize,
    /// Columns in the written export.
    pub columns: usize,
    /// Path of the written CSV file.
    pub path: PathBuf,
    /// Participants deleted by teardown.
    pub deleted: usize,
}

// ============================================================================
// SECTION: Scenario
// ============================================================================

/// Runs the export scenario with the given configuration.
///
/// # Errors
///
/// Returns [`HarnessError`] when setup, generation, export, writing, or
/// teardown fails. A body failure followed by a teardown failure is reported
/// as [`HarnessError::Scenario`].
pub fn run_export_scenario(config: &HarnessConfig) -> Result<ScenarioReport, HarnessError> {
    let app = TestApp::from_config(config)?;
    let run_id = app.run_id().to_string();
    let output = config.export.output_path();
    let ((generated, rows, columns, path), deleted) = app.scope(|app| {
        let ids = app.generate(config.generate.participants)?;
        let table = app.export()?;
        let path = app.write(&table, &output)?;
        Ok((ids.len(), table.row_count(), table.column_count(), path))
    })?;
    Ok(ScenarioReport {
        run_id,
        generated,
        rows,
        columns,
        path,
        deleted,
    })
}
