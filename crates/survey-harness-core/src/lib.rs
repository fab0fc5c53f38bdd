// crates/survey-harness-core/src/lib.rs
// ============================================================================
// Module: Survey Harness Core Library
// Description: Public API surface for the Survey Harness core.
// Purpose: Expose participant types, store interfaces, and runtime helpers.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Survey Harness core defines synthetic survey participants, the session-style
//! store contract they persist through, a deterministic response generator, and
//! the export table written to CSV. It is backend-agnostic; durable storage
//! lives in `survey-harness-store-sqlite`.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::*;

pub use interfaces::ParticipantStore;
pub use interfaces::StoreError;
pub use runtime::ExportError;
pub use runtime::ExportTable;
pub use runtime::GenerateError;
pub use runtime::InMemoryParticipantStore;
pub use runtime::ResponseGenerator;
pub use runtime::export_all;
pub use runtime::generate_participants;
