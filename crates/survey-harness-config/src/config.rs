// crates/survey-harness-config/src/config.rs
// ============================================================================
// Module: Survey Harness Configuration
// Description: Configuration loading and validation for the survey harness.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: survey-harness-core, survey-harness-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Every section has defaults, so an absent default config file yields the
//! stock harness: an isolated `SQLite` store in a temporary directory, 100
//! generated participants, and an export at `data/test.csv`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use survey_harness_core::SurveySchema;
use survey_harness_store_sqlite::SqliteStoreConfig;
use survey_harness_store_sqlite::SqliteStoreMode;
use survey_harness_store_sqlite::SqliteSyncMode;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "survey-harness.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "SURVEY_HARNESS_CONFIG";
/// Directory the export is written to by default.
pub const DATA_DIR: &str = "data";
/// File name of the export by default.
pub const DATA_FILE: &str = "test.csv";
/// Number of participants generated by default.
pub const N_USERS: usize = 100;
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum participants generated in a single run.
pub const MAX_PARTICIPANTS: usize = 1_000_000;
/// Default `SQLite` busy timeout in milliseconds.
const DEFAULT_STORE_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Database file name used inside a temporary directory when no store path is set.
pub const TEMP_STORE_FILE_NAME: &str = "participants.sqlite3";
/// Maximum `SQLite` busy timeout in milliseconds.
const MAX_STORE_BUSY_TIMEOUT_MS: u64 = 60_000;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Survey harness configuration.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HarnessConfig {
    /// Participant store configuration.
    #[serde(default)]
    pub store: StoreConfig,
    /// Participant generation configuration.
    #[serde(default)]
    pub generate: GenerateConfig,
    /// Export output configuration.
    #[serde(default)]
    pub export: ExportConfig,
    /// Audit logging configuration.
    #[serde(default)]
    pub audit: AuditConfig,
}

impl HarnessConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// An explicit `path` or `SURVEY_HARNESS_CONFIG` must name an existing
    /// file. Without either, `survey-harness.toml` in the working directory
    /// is used when present and defaults otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(resolved) = resolve_path(path)? else {
            let config = Self::default();
            config.validate()?;
            return Ok(config);
        };
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved)
            .map_err(|err| ConfigError::Io(format!("{}: {err}", resolved.display())))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.store.validate()?;
        self.generate.validate()?;
        self.export.validate()?;
        self.audit.validate()?;
        Ok(())
    }
}

/// Participant store backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// `SQLite` database file.
    #[default]
    Sqlite,
    /// Process-local in-memory store.
    Memory,
}

/// Participant store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Store backend type.
    #[serde(rename = "type", default)]
    pub backend: StoreBackend,
    /// `SQLite` database path; a fresh temporary database is used when unset.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_store_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` synchronous mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
    /// Optional maximum encoded responses per participant.
    #[serde(default)]
    pub max_responses_bytes: Option<usize>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            path: None,
            busy_timeout_ms: default_store_busy_timeout_ms(),
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
            max_responses_bytes: None,
        }
    }
}

impl StoreConfig {
    /// Builds the `SQLite` store configuration for a database path.
    #[must_use]
    pub fn sqlite_config(&self, path: PathBuf) -> SqliteStoreConfig {
        SqliteStoreConfig {
            path,
            busy_timeout_ms: self.busy_timeout_ms,
            journal_mode: self.journal_mode,
            sync_mode: self.sync_mode,
            max_responses_bytes: self.max_responses_bytes,
        }
    }

    /// Validates store configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.busy_timeout_ms > MAX_STORE_BUSY_TIMEOUT_MS {
            return Err(ConfigError::Invalid(format!(
                "store.busy_timeout_ms exceeds {MAX_STORE_BUSY_TIMEOUT_MS}"
            )));
        }
        match self.backend {
            StoreBackend::Memory if self.path.is_some() => Err(ConfigError::Invalid(
                "store.path is only valid for the sqlite backend".to_string(),
            )),
            StoreBackend::Memory => Ok(()),
            StoreBackend::Sqlite => {
                let path =
                    self.path.clone().unwrap_or_else(|| PathBuf::from(TEMP_STORE_FILE_NAME));
                self.sqlite_config(path)
                    .validate()
                    .map_err(|err| ConfigError::Invalid(format!("store: {err}")))
            }
        }
    }
}

/// Participant generation configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerateConfig {
    /// Number of participants generated by the export scenario.
    #[serde(default = "default_participants")]
    pub participants: usize,
    /// Optional seed for reproducible responses.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Survey answered by generated participants; the built-in survey when unset.
    #[serde(default)]
    pub schema: Option<SurveySchema>,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            participants: default_participants(),
            seed: None,
            schema: None,
        }
    }
}

impl GenerateConfig {
    /// Returns the configured survey schema or the built-in survey.
    #[must_use]
    pub fn survey_schema(&self) -> SurveySchema {
        self.schema.clone().unwrap_or_default()
    }

    /// Validates generation configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.participants > MAX_PARTICIPANTS {
            return Err(ConfigError::Invalid(format!(
                "generate.participants exceeds {MAX_PARTICIPANTS}"
            )));
        }
        if let Some(schema) = &self.schema {
            schema
                .validate()
                .map_err(|err| ConfigError::Invalid(format!("generate.schema: {err}")))?;
        }
        Ok(())
    }
}

/// Export output configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExportConfig {
    /// Directory the CSV file is written to (created when missing).
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// CSV file name within `data_dir`.
    #[serde(default = "default_data_file")]
    pub data_file: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            data_file: default_data_file(),
        }
    }
}

impl ExportConfig {
    /// Returns the full output path.
    #[must_use]
    pub fn output_path(&self) -> PathBuf {
        self.data_dir.join(&self.data_file)
    }

    /// Validates export configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("export.data_dir", &self.data_dir.to_string_lossy())?;
        validate_path_string("export.data_file", &self.data_file)?;
        let mut components = Path::new(&self.data_file).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(()),
            _ => Err(ConfigError::Invalid(
                "export.data_file must be a plain file name".to_string(),
            )),
        }
    }
}

/// Audit logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Enable structured audit logging.
    #[serde(default = "default_audit_enabled")]
    pub enabled: bool,
    /// Optional audit log path (JSON lines); stderr when unset.
    #[serde(default)]
    pub path: Option<String>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_audit_enabled(),
            path: None,
        }
    }
}

impl AuditConfig {
    /// Validates audit configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.path {
            validate_path_string("audit.path", path)?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
///
/// Returns `None` when neither was given and the default file is absent.
fn resolve_path(path: Option<&Path>) -> Result<Option<PathBuf>, ConfigError> {
    if let Some(path) = path {
        return Ok(Some(path.to_path_buf()));
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(Some(PathBuf::from(env_path)));
    }
    let default_path = PathBuf::from(DEFAULT_CONFIG_NAME);
    Ok(default_path.is_file().then_some(default_path))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().to_string_lossy().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} component too long")));
        }
    }
    Ok(())
}

/// Default participant count.
const fn default_participants() -> usize {
    N_USERS
}

/// Default export directory.
fn default_data_dir() -> PathBuf {
    PathBuf::from(DATA_DIR)
}

/// Default export file name.
fn default_data_file() -> String {
    DATA_FILE.to_string()
}

/// Default `SQLite` busy timeout.
const fn default_store_busy_timeout_ms() -> u64 {
    DEFAULT_STORE_BUSY_TIMEOUT_MS
}

/// Default audit logging enabled.
const fn default_audit_enabled() -> bool {
    true
}
