// crates/survey-harness/src/audit.rs
// ============================================================================
// Module: Harness Audit Logging
// Description: Structured audit events for harness lifecycle steps.
// Purpose: Emit JSON-lines records of setup, generation, export, and teardown.
// Dependencies: survey-harness-config, survey-harness-core, serde, serde_json
// ============================================================================

//! ## Overview
//! Every lifecycle step of a [`crate::TestApp`] emits one
//! [`HarnessAuditEvent`]. Sinks serialize events as JSON lines to stderr or
//! an append-only file; the no-op sink discards them. Sink failures never
//! interrupt the harness.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;
use survey_harness_config::AuditConfig;
use survey_harness_core::RunId;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Harness lifecycle step an audit event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HarnessEventKind {
    /// Context acquired and store opened.
    HarnessSetup,
    /// Participants generated and committed.
    ParticipantsGenerated,
    /// Export table built from the store.
    ExportBuilt,
    /// Export table written to disk.
    ExportWritten,
    /// All participants deleted and committed.
    Teardown,
    /// Teardown could not complete.
    TeardownFailed,
}

/// Harness audit event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HarnessAuditEvent {
    /// Event identifier.
    pub event: HarnessEventKind,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Run the event belongs to.
    pub run_id: String,
    /// Participants visible to the session, or generated by this step.
    pub participants: Option<usize>,
    /// Export row count.
    pub rows: Option<usize>,
    /// Export column count.
    pub columns: Option<usize>,
    /// Records deleted by teardown.
    pub deleted: Option<usize>,
    /// Output path for written exports.
    pub path: Option<String>,
    /// Error message for failure events.
    pub error: Option<String>,
}

impl HarnessAuditEvent {
    /// Creates a new audit event with a consistent timestamp.
    #[must_use]
    pub fn new(event: HarnessEventKind, run_id: &RunId) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event,
            timestamp_ms,
            run_id: run_id.to_string(),
            participants: None,
            rows: None,
            columns: None,
            deleted: None,
            path: None,
            error: None,
        }
    }

    /// Sets the participant count.
    #[must_use]
    pub const fn with_participants(mut self, participants: usize) -> Self {
        self.participants = Some(participants);
        self
    }

    /// Sets the export shape.
    #[must_use]
    pub const fn with_shape(mut self, rows: usize, columns: usize) -> Self {
        self.rows = Some(rows);
        self.columns = Some(columns);
        self
    }

    /// Sets the deleted record count.
    #[must_use]
    pub const fn with_deleted(mut self, deleted: usize) -> Self {
        self.deleted = Some(deleted);
        self
    }

    /// Sets the output path.
    #[must_use]
    pub fn with_path(mut self, path: &Path) -> Self {
        self.path = Some(path.display().to_string());
        self
    }

    /// Sets the error message.
    #[must_use]
    pub fn with_error(mut self, error: impl ToString) -> Self {
        self.error = Some(error.to_string());
        self
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for harness lifecycle events.
pub trait HarnessAuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&self, event: &HarnessAuditEvent);
}

/// Audit sink that logs JSON lines to stderr.
pub struct HarnessStderrAuditSink;

impl HarnessAuditSink for HarnessStderrAuditSink {
    fn record(&self, event: &HarnessAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct HarnessFileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl HarnessFileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl HarnessAuditSink for HarnessFileAuditSink {
    fn record(&self, event: &HarnessAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// No-op audit sink.
pub struct HarnessNoopAuditSink;

impl HarnessAuditSink for HarnessNoopAuditSink {
    fn record(&self, _event: &HarnessAuditEvent) {}
}

// ============================================================================
// SECTION: Construction
// ============================================================================

/// Builds the audit sink selected by configuration.
///
/// # Errors
///
/// Returns an error if the configured audit file cannot be opened.
pub fn audit_sink_from_config(config: &AuditConfig) -> io::Result<Arc<dyn HarnessAuditSink>> {
    if !config.enabled {
        return Ok(Arc::new(HarnessNoopAuditSink));
    }
    match &config.path {
        Some(path) => Ok(Arc::new(HarnessFileAuditSink::new(Path::new(path))?)),
        None => Ok(Arc::new(HarnessStderrAuditSink)),
    }
}
