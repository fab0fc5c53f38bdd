// crates/survey-harness/src/lib.rs
// ============================================================================
// Module: Survey Harness Library
// Description: Scoped test context, export scenario, and audit logging.
// Purpose: Exercise the participant model against an isolated store.
// Dependencies: survey-harness-{config,core,store-sqlite}, serde, tempfile
// ============================================================================

//! ## Overview
//! `survey-harness` acquires an isolated participant store, fills it with
//! synthetic survey participants, exports them as CSV, and deletes them
//! again on every exit path. [`create_test_app`] is the zero-argument
//! factory; [`run_export_scenario`] is the full smoke run.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod context;
pub mod scenario;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::HarnessAuditEvent;
pub use audit::HarnessAuditSink;
pub use audit::HarnessEventKind;
pub use audit::HarnessFileAuditSink;
pub use audit::HarnessNoopAuditSink;
pub use audit::HarnessStderrAuditSink;
pub use audit::audit_sink_from_config;
pub use context::HarnessError;
pub use context::TestApp;
pub use context::create_test_app;
pub use scenario::ScenarioReport;
pub use scenario::run_export_scenario;
pub use survey_harness_config::DATA_DIR;
pub use survey_harness_config::DATA_FILE;
pub use survey_harness_config::N_USERS;
