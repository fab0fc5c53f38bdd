// crates/survey-harness/src/main_tests.rs
// ============================================================================
// Module: CLI Main Helpers Tests
// Description: Unit tests for argument parsing and run overrides.
// Purpose: Ensure command-line options land in the right config fields.
// Dependencies: survey-harness CLI entry point
// ============================================================================

//! ## Overview
//! Validates that `run` options parse and override loaded configuration, and
//! that the config subcommands are wired.

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
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;

use clap::CommandFactory;
use clap::Parser;
use survey_harness_config::HarnessConfig;

use super::Cli;
use super::Commands;
use super::ConfigCommand;
use super::apply_run_overrides;

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn cli_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn run_overrides_replace_config_values() {
    let cli = Cli::try_parse_from([
        "survey-harness",
        "run",
        "--count",
        "12",
        "--seed",
        "9",
        "--data-dir",
        "out",
        "--data-file",
        "users.csv",
    ])
    .expect("parse run");
    let Some(Commands::Run(command)) = cli.command else {
        panic!("expected run command");
    };
    let mut config = HarnessConfig::default();
    apply_run_overrides(&mut config, command);
    assert_eq!(config.generate.participants, 12);
    assert_eq!(config.generate.seed, Some(9));
    assert_eq!(config.export.output_path(), PathBuf::from("out").join("users.csv"));
    config.validate().expect("overrides stay valid");
}

#[test]
fn run_without_options_keeps_defaults() {
    let cli = Cli::try_parse_from(["survey-harness", "run"]).expect("parse run");
    let Some(Commands::Run(command)) = cli.command else {
        panic!("expected run command");
    };
    let mut config = HarnessConfig::default();
    apply_run_overrides(&mut config, command);
    assert_eq!(config, HarnessConfig::default());
}

#[test]
fn config_subcommands_parse() {
    let cli = Cli::try_parse_from(["survey-harness", "config", "validate", "--config", "h.toml"])
        .expect("parse config validate");
    match cli.command {
        Some(Commands::Config {
            command: ConfigCommand::Validate(command),
        }) => assert_eq!(command.config, Some(PathBuf::from("h.toml"))),
        other => panic!("unexpected command {other:?}"),
    }
    let cli =
        Cli::try_parse_from(["survey-harness", "config", "example"]).expect("parse config example");
    assert!(matches!(
        cli.command,
        Some(Commands::Config {
            command: ConfigCommand::Example
        })
    ));
}

#[test]
fn version_flag_is_global() {
    let cli = Cli::try_parse_from(["survey-harness", "--version"]).expect("parse version");
    assert!(cli.show_version);
    assert!(cli.command.is_none());
}

#[test]
fn negative_count_is_rejected() {
    assert!(Cli::try_parse_from(["survey-harness", "run", "--count", "-1"]).is_err());
}
