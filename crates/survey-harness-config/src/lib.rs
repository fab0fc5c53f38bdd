// crates/survey-harness-config/src/lib.rs
// ============================================================================
// Module: Survey Harness Config Library
// Description: Canonical config model, loading, and validation.
// Purpose: Single source of truth for survey-harness.toml semantics.
// Dependencies: survey-harness-core, survey-harness-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! `survey-harness-config` defines the configuration model for the survey
//! harness: which participant store to open, how many participants to
//! generate, where the export lands, and where audit events go. Loading is
//! strict and fail-closed; unknown keys are rejected.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
