// crates/survey-harness/src/context.rs
// ============================================================================
// Module: Scoped Test Context
// Description: Isolated application context with guaranteed teardown.
// Purpose: Pair store setup with unconditional participant cleanup.
// Dependencies: survey-harness-{config,core,store-sqlite}, rand, tempfile
// ============================================================================

//! ## Overview
//! A [`TestApp`] owns one participant store session, a response generator and
//! an audit sink for the duration of a single run. Teardown deletes every
//! participant the session can see and commits. It runs when
//! [`TestApp::teardown`] is called, when a [`TestApp::scope`] body returns
//! (successfully or not), and on drop if neither happened since the last
//! write.
//!
//! With the default configuration the store is a fresh `SQLite` database in a
//! temporary directory owned by the context, so every run starts empty and
//! leaves nothing behind.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use rand::RngCore;
use rand::rngs::OsRng;
use survey_harness_config::ConfigError;
use survey_harness_config::HarnessConfig;
use survey_harness_config::StoreBackend;
use survey_harness_config::TEMP_STORE_FILE_NAME;
use survey_harness_core::ExportError;
use survey_harness_core::ExportTable;
use survey_harness_core::GenerateError;
use survey_harness_core::InMemoryParticipantStore;
use survey_harness_core::ParticipantId;
use survey_harness_core::ParticipantStore;
use survey_harness_core::ResponseGenerator;
use survey_harness_core::RunId;
use survey_harness_core::StoreError;
use survey_harness_core::export_all;
use survey_harness_core::generate_participants;
use survey_harness_store_sqlite::SqliteParticipantStore;
use tempfile::TempDir;
use thiserror::Error;

use crate::audit::HarnessAuditEvent;
use crate::audit::HarnessAuditSink;
use crate::audit::HarnessEventKind;
use crate::audit::audit_sink_from_config;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Harness errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - A teardown failure is never dropped: it is either the returned error or
///   attached to one.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Configuration could not be loaded or applied.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Store could not be opened or read.
    #[error("harness store error: {0}")]
    Store(#[from] StoreError),
    /// Participant generation failed.
    #[error("harness generate error: {0}")]
    Generate(#[from] GenerateError),
    /// Export could not be built or written.
    #[error("harness export error: {0}")]
    Export(#[from] ExportError),
    /// Teardown failed after an otherwise successful run.
    #[error("harness teardown failed: {0}")]
    Teardown(StoreError),
    /// The run failed and the teardown that followed failed too.
    #[error("{source}; teardown also failed: {teardown}")]
    Scenario {
        /// Primary failure from the run body.
        source: Box<Self>,
        /// Secondary teardown failure.
        teardown: StoreError,
    },
}

// ============================================================================
// SECTION: Context
// ============================================================================

/// Scoped, isolated harness context.
///
/// # Invariants
/// - `scratch`, when present, holds the store's database and outlives the
///   store (fields drop in declaration order).
pub struct TestApp {
    /// Participant store session.
    store: Box<dyn ParticipantStore>,
    /// Synthetic response generator.
    generator: ResponseGenerator,
    /// Identifier stamped on generated participants and audit events.
    run_id: RunId,
    /// Audit sink for lifecycle events.
    audit: Arc<dyn HarnessAuditSink>,
    /// True when drop has no teardown left to run: nothing was written since
    /// the last successful teardown, or a scope already reported its outcome.
    torn_down: bool,
    /// Temporary directory backing the default `SQLite` store.
    scratch: Option<TempDir>,
}

/// Creates a test context with the default configuration.
///
/// # Errors
///
/// Returns [`HarnessError`] when the temporary store cannot be created.
pub fn create_test_app() -> Result<TestApp, HarnessError> {
    TestApp::from_config(&HarnessConfig::default())
}

impl TestApp {
    /// Creates a test context from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError`] when the configuration is invalid or the
    /// store or audit sink cannot be opened.
    pub fn from_config(config: &HarnessConfig) -> Result<Self, HarnessError> {
        config.validate()?;
        let audit = audit_sink_from_config(&config.audit)
            .map_err(|err| ConfigError::Io(format!("audit sink: {err}")))?;
        let generator =
            ResponseGenerator::new(config.generate.survey_schema(), config.generate.seed)
                .map_err(|err| ConfigError::Invalid(format!("generate.schema: {err}")))?;
        let mut scratch = None;
        let store: Box<dyn ParticipantStore> = match config.store.backend {
            StoreBackend::Memory => Box::new(InMemoryParticipantStore::new()),
            StoreBackend::Sqlite => {
                let path = match &config.store.path {
                    Some(path) => path.clone(),
                    None => {
                        let dir = tempfile::tempdir().map_err(|err| {
                            StoreError::Io(format!("create temporary store directory: {err}"))
                        })?;
                        let path = dir.path().join(TEMP_STORE_FILE_NAME);
                        scratch = Some(dir);
                        path
                    }
                };
                let sqlite = SqliteParticipantStore::new(config.store.sqlite_config(path))
                    .map_err(StoreError::from)?;
                Box::new(sqlite)
            }
        };
        let mut app = Self::with_store(store, generator, audit)?;
        app.scratch = scratch;
        Ok(app)
    }

    /// Creates a test context over an already opened store.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Store`] when the store is not ready.
    pub fn with_store(
        store: Box<dyn ParticipantStore>,
        generator: ResponseGenerator,
        audit: Arc<dyn HarnessAuditSink>,
    ) -> Result<Self, HarnessError> {
        store.readiness()?;
        let participants = store.count()?;
        let run_id = new_run_id();
        audit.record(
            &HarnessAuditEvent::new(HarnessEventKind::HarnessSetup, &run_id)
                .with_participants(participants),
        );
        Ok(Self {
            store,
            generator,
            run_id,
            audit,
            torn_down: participants == 0,
            scratch: None,
        })
    }

    /// Returns the run identifier.
    #[must_use]
    pub const fn run_id(&self) -> &RunId {
        &self.run_id
    }

    /// Returns the temporary store directory, when the context owns one.
    #[must_use]
    pub fn scratch_dir(&self) -> Option<&Path> {
        self.scratch.as_ref().map(TempDir::path)
    }

    /// Returns the number of participants visible to the session.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Store`] when the store cannot be read.
    pub fn participant_count(&self) -> Result<usize, HarnessError> {
        Ok(self.store.count()?)
    }

    /// Generates and commits `count` participants.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Generate`] when the batch fails; nothing from
    /// the batch is persisted.
    pub fn generate(&mut self, count: usize) -> Result<Vec<ParticipantId>, HarnessError> {
        if count == 0 {
            return Ok(Vec::new());
        }
        self.torn_down = false;
        let ids = generate_participants(
            &mut *self.store,
            &mut self.generator,
            &self.run_id,
            now_ms(),
            count,
        )?;
        self.audit.record(
            &HarnessAuditEvent::new(HarnessEventKind::ParticipantsGenerated, &self.run_id)
                .with_participants(ids.len()),
        );
        Ok(ids)
    }

    /// Builds an export table of every participant visible to the session.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Export`] when participants cannot be read or a
    /// response field collides with a metadata column.
    pub fn export(&self) -> Result<ExportTable, HarnessError> {
        let table = export_all(&*self.store)?;
        self.audit.record(
            &HarnessAuditEvent::new(HarnessEventKind::ExportBuilt, &self.run_id)
                .with_shape(table.row_count(), table.column_count()),
        );
        Ok(table)
    }

    /// Writes an export table as CSV, creating the parent directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Export`] when the path is unwritable.
    pub fn write(&self, table: &ExportTable, path: &Path) -> Result<PathBuf, HarnessError> {
        table.write_csv(path)?;
        self.audit.record(
            &HarnessAuditEvent::new(HarnessEventKind::ExportWritten, &self.run_id)
                .with_shape(table.row_count(), table.column_count())
                .with_path(path),
        );
        Ok(path.to_path_buf())
    }

    /// Deletes every participant visible to the session and commits.
    ///
    /// Returns the number of deleted participants; a second call returns 0.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Teardown`] when a delete or the commit fails.
    pub fn teardown(&mut self) -> Result<usize, HarnessError> {
        self.teardown_store().map_err(HarnessError::Teardown)
    }

    /// Runs `body` against this context and tears down afterwards, whatever
    /// the body returned.
    ///
    /// Returns the body's value and the number of participants deleted by
    /// teardown.
    ///
    /// # Errors
    ///
    /// Returns the body error unchanged when teardown succeeds,
    /// [`HarnessError::Teardown`] when only teardown fails, and
    /// [`HarnessError::Scenario`] when both fail.
    pub fn scope<T, F>(mut self, body: F) -> Result<(T, usize), HarnessError>
    where
        F: FnOnce(&mut Self) -> Result<T, HarnessError>,
    {
        let outcome = body(&mut self);
        let teardown = self.teardown_store();
        // The outcome is reported to the caller; drop must not retry it.
        self.torn_down = true;
        match (outcome, teardown) {
            (Ok(value), Ok(deleted)) => Ok((value, deleted)),
            (Ok(_), Err(teardown)) => Err(HarnessError::Teardown(teardown)),
            (Err(source), Ok(_)) => Err(source),
            (Err(source), Err(teardown)) => Err(HarnessError::Scenario {
                source: Box::new(source),
                teardown,
            }),
        }
    }

    /// Creates a context from configuration and runs `body` inside
    /// [`TestApp::scope`].
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError`] from setup, the body, or teardown.
    pub fn run_scenario<T, F>(config: &HarnessConfig, body: F) -> Result<T, HarnessError>
    where
        F: FnOnce(&mut Self) -> Result<T, HarnessError>,
    {
        Self::from_config(config)?.scope(body).map(|(value, _)| value)
    }

    /// Deletes and commits every visible participant, recording the outcome.
    fn teardown_store(&mut self) -> Result<usize, StoreError> {
        match purge(&mut *self.store) {
            Ok(deleted) => {
                self.torn_down = true;
                self.audit.record(
                    &HarnessAuditEvent::new(HarnessEventKind::Teardown, &self.run_id)
                        .with_deleted(deleted),
                );
                Ok(deleted)
            }
            Err(err) => {
                self.audit.record(
                    &HarnessAuditEvent::new(HarnessEventKind::TeardownFailed, &self.run_id)
                        .with_error(&err),
                );
                Err(err)
            }
        }
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        if !self.torn_down {
            // Failures are already recorded by the audit sink.
            let _ = self.teardown_store();
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Deletes every visible participant and commits.
///
/// A failed delete or commit rolls the session back so no partial purge is
/// left staged. The purge error is returned even when the rollback fails.
fn purge(store: &mut dyn ParticipantStore) -> Result<usize, StoreError> {
    let records = store.query_all()?;
    let staged = records.iter().try_for_each(|record| store.delete(record.id));
    match staged.and_then(|()| store.commit()) {
        Ok(()) => Ok(records.len()),
        Err(err) => {
            let _ = store.rollback();
            Err(err)
        }
    }
}

/// Returns a fresh random run identifier.
fn new_run_id() -> RunId {
    RunId::new(format!("run-{:016x}", OsRng.next_u64()))
}

/// Returns the current unix time in milliseconds.
fn now_ms() -> i64 {
    let millis = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
    i64::try_from(millis).unwrap_or(i64::MAX)
}
