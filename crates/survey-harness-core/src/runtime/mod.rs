// crates/survey-harness-core/src/runtime/mod.rs
// ============================================================================
// Module: Survey Harness Runtime
// Description: Participant generation, export tables, and in-memory storage.
// Purpose: Provide the participant model operations the harness drives.
// Dependencies: crate::{core, interfaces}, csv, rand
// ============================================================================

//! ## Overview
//! Runtime modules generate synthetic participants through any
//! [`crate::ParticipantStore`], build tabular exports of what the store holds,
//! and serialize those exports as CSV. The runtime never reads wall-clock
//! time; callers pass the reference timestamp explicitly.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod export;
pub mod generator;
pub mod model;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use export::ExportError;
pub use export::ExportTable;
pub use generator::ResponseGenerator;
pub use model::GenerateError;
pub use model::export_all;
pub use model::generate_participants;
pub use store::InMemoryParticipantStore;
