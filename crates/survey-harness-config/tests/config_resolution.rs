//! Config path resolution tests for survey-harness-config.
// crates/survey-harness-config/tests/config_resolution.rs
// =============================================================================
// Module: Config Resolution Tests
// Description: Validate explicit, env, default-file, and fallback resolution.
// Purpose: Ensure each config source is honored in precedence order.
// =============================================================================

#![allow(
    clippy::use_debug,
    clippy::panic_in_result_fn,
    reason = "Test-only assertions and helpers are permitted."
)]

mod helpers;

use std::fs;
use std::path::Path;

use helpers::env::ProcessGuard;
use survey_harness_config::CONFIG_ENV_VAR;
use survey_harness_config::ConfigError;
use survey_harness_config::DEFAULT_CONFIG_NAME;
use survey_harness_config::HarnessConfig;
use tempfile::TempDir;

type TestResult = Result<(), String>;

fn write_participants(dir: &Path, name: &str, participants: usize) -> Result<String, String> {
    let path = dir.join(name);
    fs::write(&path, format!("[generate]\nparticipants = {participants}\n"))
        .map_err(|err| err.to_string())?;
    Ok(path.display().to_string())
}

fn expect_participants(result: Result<HarnessConfig, ConfigError>, expected: usize) -> TestResult {
    let config = result.map_err(|err| err.to_string())?;
    if config.generate.participants == expected {
        Ok(())
    } else {
        Err(format!("loaded {} participants, expected {expected}", config.generate.participants))
    }
}

#[test]
fn env_var_names_the_config_file() -> TestResult {
    let mut process = ProcessGuard::acquire()?;
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let path = write_participants(dir.path(), "from-env.toml", 7)?;
    process.set_var(CONFIG_ENV_VAR, &path);
    expect_participants(HarnessConfig::load(None), 7)
}

#[test]
fn explicit_path_takes_precedence_over_env_var() -> TestResult {
    let mut process = ProcessGuard::acquire()?;
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let env_path = write_participants(dir.path(), "from-env.toml", 7)?;
    let explicit = write_participants(dir.path(), "explicit.toml", 3)?;
    process.set_var(CONFIG_ENV_VAR, &env_path);
    expect_participants(HarnessConfig::load(Some(Path::new(&explicit))), 3)
}

#[test]
fn missing_env_path_is_an_io_error() -> TestResult {
    let mut process = ProcessGuard::acquire()?;
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let missing = dir.path().join("missing.toml");
    process.set_var(CONFIG_ENV_VAR, &missing.display().to_string());
    match HarnessConfig::load(None) {
        Err(ConfigError::Io(message)) if message.contains("missing.toml") => Ok(()),
        other => Err(format!("expected io error, got {other:?}")),
    }
}

#[test]
fn overlong_env_path_is_rejected() -> TestResult {
    let mut process = ProcessGuard::acquire()?;
    process.set_var(CONFIG_ENV_VAR, &"a".repeat(5_000));
    match HarnessConfig::load(None) {
        Err(ConfigError::Invalid(message)) if message.contains("max length") => Ok(()),
        other => Err(format!("expected invalid path, got {other:?}")),
    }
}

#[test]
fn default_file_in_working_directory_is_loaded() -> TestResult {
    let mut process = ProcessGuard::acquire()?;
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    write_participants(dir.path(), DEFAULT_CONFIG_NAME, 9)?;
    process.remove_var(CONFIG_ENV_VAR);
    process.set_current_dir(dir.path())?;
    expect_participants(HarnessConfig::load(None), 9)
}

#[test]
fn env_var_takes_precedence_over_default_file() -> TestResult {
    let mut process = ProcessGuard::acquire()?;
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    write_participants(dir.path(), DEFAULT_CONFIG_NAME, 9)?;
    let env_path = write_participants(dir.path(), "from-env.toml", 5)?;
    process.set_var(CONFIG_ENV_VAR, &env_path);
    process.set_current_dir(dir.path())?;
    expect_participants(HarnessConfig::load(None), 5)
}

#[test]
fn no_source_falls_back_to_defaults() -> TestResult {
    let mut process = ProcessGuard::acquire()?;
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    process.remove_var(CONFIG_ENV_VAR);
    process.set_current_dir(dir.path())?;
    let config = HarnessConfig::load(None).map_err(|err| err.to_string())?;
    if config == HarnessConfig::default() {
        Ok(())
    } else {
        Err(format!("expected defaults, got {config:?}"))
    }
}
