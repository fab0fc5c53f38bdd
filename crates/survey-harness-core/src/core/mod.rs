// crates/survey-harness-core/src/core/mod.rs
// ============================================================================
// Module: Survey Harness Core Types
// Description: Participant records, identifiers, and survey schemas.
// Purpose: Provide stable, serializable types shared by stores and harnesses.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Core types describe what a synthetic participant looks like before and
//! after persistence, and which questions the generator answers on its behalf.
//! Response fields are a dynamic name to value map; no survey layout is fixed
//! at compile time.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod identifiers;
pub mod participant;
pub mod schema;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use identifiers::FieldName;
pub use identifiers::ParticipantId;
pub use identifiers::RunId;
pub use participant::FieldValue;
pub use participant::ParticipantDraft;
pub use participant::ParticipantRecord;
pub use participant::ParticipantStatus;
pub use participant::Responses;
pub use schema::QuestionKind;
pub use schema::QuestionSpec;
pub use schema::SchemaError;
pub use schema::SurveySchema;
