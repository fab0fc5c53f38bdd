// crates/survey-harness-store-sqlite/src/lib.rs
// ============================================================================
// Module: SQLite Participant Store
// Description: Durable ParticipantStore backend using SQLite.
// Purpose: Provide file-backed persistence for synthetic survey participants.
// Dependencies: survey-harness-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate provides a SQLite-backed [`ParticipantStore`] implementation
//! with session semantics: writes open a transaction that stays pending until
//! commit or rollback. Response maps are stored as JSON so the set of fields
//! is not fixed by the table layout.
//!
//! [`ParticipantStore`]: survey_harness_core::ParticipantStore

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::MAX_RESPONSES_BYTES;
pub use store::SqliteParticipantStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
