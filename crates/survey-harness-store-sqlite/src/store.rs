// crates/survey-harness-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Participant Store
// Description: Durable ParticipantStore backed by SQLite.
// Purpose: Persist participant records behind a unit-of-work session.
// Dependencies: survey-harness-core, rusqlite, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! This module implements a durable [`ParticipantStore`] using `SQLite`. The
//! first insert or delete after a commit opens an immediate transaction;
//! [`ParticipantStore::commit`] and [`ParticipantStore::rollback`] close it.
//! Reads run on the same connection, so a session sees its own staged
//! writes. Responses are stored as JSON and decoded on read; undecodable rows
//! fail closed as corruption.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;

use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::params;
use serde::Deserialize;
use survey_harness_core::ParticipantDraft;
use survey_harness_core::ParticipantId;
use survey_harness_core::ParticipantRecord;
use survey_harness_core::ParticipantStatus;
use survey_harness_core::ParticipantStore;
use survey_harness_core::Responses;
use survey_harness_core::RunId;
use survey_harness_core::StoreError;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum encoded response payload accepted per participant.
pub const MAX_RESPONSES_BYTES: usize = 256 * 1024;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `synchronous` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` participant store.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `busy_timeout_ms` is interpreted as milliseconds.
/// - `max_responses_bytes`, when set, must be greater than zero and no more
///   than [`MAX_RESPONSES_BYTES`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
    /// Optional maximum encoded response payload per participant.
    #[serde(default)]
    pub max_responses_bytes: Option<usize>,
}

impl SqliteStoreConfig {
    /// Creates a configuration with defaults for everything but the path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
            max_responses_bytes: None,
        }
    }

    /// Returns the effective response payload limit.
    #[must_use]
    pub const fn responses_limit(&self) -> usize {
        match self.max_responses_bytes {
            Some(limit) => limit,
            None => MAX_RESPONSES_BYTES,
        }
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::Invalid`] when the path or limits are unsafe.
    pub fn validate(&self) -> Result<(), SqliteStoreError> {
        validate_store_path(&self.path)?;
        if let Some(limit) = self.max_responses_bytes
            && (limit == 0 || limit > MAX_RESPONSES_BYTES)
        {
            return Err(SqliteStoreError::Invalid(format!(
                "max_responses_bytes out of range: {limit} (max {MAX_RESPONSES_BYTES})"
            )));
        }
        Ok(())
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` participant store errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Stored row could not be decoded.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid store data or configuration.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
    /// Response payload exceeded configured size limits.
    #[error("sqlite store payload too large: {actual_bytes} bytes (max {max_bytes})")]
    TooLarge {
        /// Maximum allowed bytes.
        max_bytes: usize,
        /// Actual payload size in bytes.
        actual_bytes: usize,
    },
    /// Participant does not exist.
    #[error("sqlite store participant not found: {0}")]
    NotFound(ParticipantId),
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) => Self::Store(message),
            SqliteStoreError::Corrupt(message) => Self::Corrupt(message),
            SqliteStoreError::VersionMismatch(message) => Self::VersionMismatch(message),
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
            SqliteStoreError::TooLarge {
                max_bytes,
                actual_bytes,
            } => Self::Invalid(format!(
                "responses exceed size limit: {actual_bytes} bytes (max {max_bytes})"
            )),
            SqliteStoreError::NotFound(id) => Self::NotFound(id),
        }
    }
}

/// Maps a rusqlite error into a store error.
fn db_error(err: &rusqlite::Error) -> SqliteStoreError {
    SqliteStoreError::Db(err.to_string())
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed participant store.
///
/// # Invariants
/// - `in_transaction` is true exactly while a `BEGIN` has not been matched by
///   `COMMIT` or `ROLLBACK`.
#[derive(Debug)]
pub struct SqliteParticipantStore {
    /// Store configuration.
    config: SqliteStoreConfig,
    /// Session connection.
    connection: Connection,
    /// Whether staged writes are pending.
    in_transaction: bool,
}

impl SqliteParticipantStore {
    /// Opens an `SQLite`-backed participant store, creating the database and
    /// its parent directory when missing.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// initialized.
    pub fn new(config: SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        config.validate()?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(&config)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            config,
            connection,
            in_transaction: false,
        })
    }

    /// Returns the database path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Returns true while uncommitted writes are pending.
    #[must_use]
    pub const fn has_pending_changes(&self) -> bool {
        self.in_transaction
    }

    /// Opens the session transaction if it is not already open.
    fn begin(&mut self) -> Result<(), SqliteStoreError> {
        if !self.in_transaction {
            self.connection.execute_batch("BEGIN IMMEDIATE;").map_err(|err| db_error(&err))?;
            self.in_transaction = true;
        }
        Ok(())
    }

    /// Stages an insert.
    fn insert_draft(&mut self, draft: &ParticipantDraft) -> Result<ParticipantId, SqliteStoreError> {
        let responses_json = serde_json::to_vec(&draft.responses)
            .map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
        let max_bytes = self.config.responses_limit();
        if responses_json.len() > max_bytes {
            return Err(SqliteStoreError::TooLarge {
                max_bytes,
                actual_bytes: responses_json.len(),
            });
        }
        self.begin()?;
        self.connection
            .execute(
                "INSERT INTO participants (run_id, status, started_at_ms, ended_at_ms, \
                 responses_json) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    draft.run_id.as_str(),
                    draft.status.as_str(),
                    draft.started_at_ms,
                    draft.ended_at_ms,
                    responses_json
                ],
            )
            .map_err(|err| db_error(&err))?;
        let rowid = self.connection.last_insert_rowid();
        u64::try_from(rowid)
            .ok()
            .and_then(ParticipantId::from_raw)
            .ok_or_else(|| SqliteStoreError::Corrupt(format!("invalid participant rowid: {rowid}")))
    }

    /// Reads every visible participant.
    fn load_all(&self) -> Result<Vec<ParticipantRecord>, SqliteStoreError> {
        let mut statement = self
            .connection
            .prepare(
                "SELECT participant_id, run_id, status, started_at_ms, ended_at_ms, \
                 responses_json FROM participants ORDER BY participant_id",
            )
            .map_err(|err| db_error(&err))?;
        let rows = statement
            .query_map(params![], |row| {
                Ok(StoredRow {
                    participant_id: row.get(0)?,
                    run_id: row.get(1)?,
                    status: row.get(2)?,
                    started_at_ms: row.get(3)?,
                    ended_at_ms: row.get(4)?,
                    responses_json: row.get(5)?,
                })
            })
            .map_err(|err| db_error(&err))?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row.map_err(|err| db_error(&err))?.decode()?);
        }
        Ok(records)
    }

    /// Stages a delete.
    fn delete_participant(&mut self, id: ParticipantId) -> Result<(), SqliteStoreError> {
        let raw = i64::try_from(id.get()).map_err(|_| SqliteStoreError::NotFound(id))?;
        self.begin()?;
        let changed = self
            .connection
            .execute("DELETE FROM participants WHERE participant_id = ?1", params![raw])
            .map_err(|err| db_error(&err))?;
        if changed == 0 {
            return Err(SqliteStoreError::NotFound(id));
        }
        Ok(())
    }

    /// Ends the session transaction with `statement`.
    fn finish(&mut self, statement: &str) -> Result<(), SqliteStoreError> {
        if self.in_transaction {
            self.connection.execute_batch(statement).map_err(|err| db_error(&err))?;
            self.in_transaction = false;
        }
        Ok(())
    }

    /// Counts visible participants.
    fn count_rows(&self) -> Result<usize, SqliteStoreError> {
        let count: i64 = self
            .connection
            .query_row("SELECT COUNT(1) FROM participants", params![], |row| row.get(0))
            .map_err(|err| db_error(&err))?;
        usize::try_from(count)
            .map_err(|_| SqliteStoreError::Corrupt(format!("invalid participant count: {count}")))
    }
}

impl ParticipantStore for SqliteParticipantStore {
    fn insert(&mut self, draft: ParticipantDraft) -> Result<ParticipantId, StoreError> {
        self.insert_draft(&draft).map_err(StoreError::from)
    }

    fn query_all(&self) -> Result<Vec<ParticipantRecord>, StoreError> {
        self.load_all().map_err(StoreError::from)
    }

    fn delete(&mut self, id: ParticipantId) -> Result<(), StoreError> {
        self.delete_participant(id).map_err(StoreError::from)
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        self.finish("COMMIT;").map_err(StoreError::from)
    }

    fn rollback(&mut self) -> Result<(), StoreError> {
        self.finish("ROLLBACK;").map_err(StoreError::from)
    }

    fn count(&self) -> Result<usize, StoreError> {
        self.count_rows().map_err(StoreError::from)
    }

    fn readiness(&self) -> Result<(), StoreError> {
        self.connection
            .query_row("SELECT 1", params![], |row| row.get::<_, i64>(0))
            .map(|_| ())
            .map_err(|err| StoreError::from(db_error(&err)))
    }
}

// ============================================================================
// SECTION: Rows
// ============================================================================

/// Raw participant row as stored.
struct StoredRow {
    /// Row identifier.
    participant_id: i64,
    /// Run identifier.
    run_id: String,
    /// Status label.
    status: String,
    /// Session start.
    started_at_ms: i64,
    /// Session end.
    ended_at_ms: Option<i64>,
    /// Encoded responses.
    responses_json: Vec<u8>,
}

impl StoredRow {
    /// Decodes the row into a participant record.
    fn decode(self) -> Result<ParticipantRecord, SqliteStoreError> {
        let id = u64::try_from(self.participant_id)
            .ok()
            .and_then(ParticipantId::from_raw)
            .ok_or_else(|| {
                SqliteStoreError::Corrupt(format!("invalid participant id: {}", self.participant_id))
            })?;
        let status = ParticipantStatus::parse(&self.status).ok_or_else(|| {
            SqliteStoreError::Corrupt(format!("participant {id} has unknown status: {}", self.status))
        })?;
        let responses: Responses = serde_json::from_slice(&self.responses_json).map_err(|err| {
            SqliteStoreError::Corrupt(format!("participant {id} responses: {err}"))
        })?;
        Ok(ParticipantRecord {
            id,
            run_id: RunId::new(self.run_id),
            status,
            started_at_ms: self.started_at_ms,
            ended_at_ms: self.ended_at_ms,
            responses,
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    if path.as_os_str().is_empty() {
        return Err(SqliteStoreError::Invalid("store path must not be empty".to_string()));
    }
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.exists() && path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection with secure defaults.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection =
        Connection::open_with_flags(&config.path, flags).map_err(|err| db_error(&err))?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies `SQLite` pragmas required for durability.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| db_error(&err))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| db_error(&err))?;
    connection
        .busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| db_error(&err))?;
    Ok(())
}

/// Initializes the `SQLite` schema or validates the existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction().map_err(|err| db_error(&err))?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(|err| db_error(&err))?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(|err| db_error(&err))?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(|err| db_error(&err))?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS participants (
                    participant_id INTEGER PRIMARY KEY AUTOINCREMENT,
                    run_id TEXT NOT NULL,
                    status TEXT NOT NULL,
                    started_at_ms INTEGER NOT NULL,
                    ended_at_ms INTEGER,
                    responses_json BLOB NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_participants_run_id
                    ON participants (run_id);",
            )
            .map_err(|err| db_error(&err))?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.commit().map_err(|err| db_error(&err))?;
    Ok(())
}
