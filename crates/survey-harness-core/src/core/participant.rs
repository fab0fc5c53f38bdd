// crates/survey-harness-core/src/core/participant.rs
// ============================================================================
// Module: Survey Participants
// Description: Participant drafts, persisted records, and response values.
// Purpose: Model one synthetic survey respondent independent of storage.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`ParticipantDraft`] is what the generator produces; a store assigns a
//! [`ParticipantId`] and hands back [`ParticipantRecord`] values on query.
//! Responses are a dynamic [`FieldName`] to [`FieldValue`] map so the set of
//! columns is decided by the survey schema at runtime.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::FieldName;
use crate::core::identifiers::ParticipantId;
use crate::core::identifiers::RunId;

// ============================================================================
// SECTION: Values
// ============================================================================

/// Response map keyed by field name (sorted for deterministic output).
pub type Responses = BTreeMap<FieldName, FieldValue>;

/// Single response value.
///
/// # Invariants
/// - `Null` marks an unanswered or absent field and renders as an empty cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum FieldValue {
    /// Missing value.
    #[default]
    Null,
    /// Boolean answer (checkbox).
    Bool(bool),
    /// Integer answer.
    Integer(i64),
    /// Floating point answer.
    Float(f64),
    /// Free text or choice label.
    Text(String),
}

impl FieldValue {
    /// Returns true when the value is [`FieldValue::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Infers a value from a CSV cell.
    ///
    /// Empty cells become `Null`; `true`/`false`, integers and floats are
    /// recognized before falling back to text.
    #[must_use]
    pub fn from_cell(cell: &str) -> Self {
        if cell.is_empty() {
            return Self::Null;
        }
        match cell {
            "true" => return Self::Bool(true),
            "false" => return Self::Bool(false),
            _ => {}
        }
        if let Ok(value) = cell.parse::<i64>() {
            return Self::Integer(value);
        }
        if let Ok(value) = cell.parse::<f64>()
            && value.is_finite()
        {
            return Self::Float(value);
        }
        Self::Text(cell.to_string())
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(value) => value.fmt(f),
            Self::Integer(value) => value.fmt(f),
            Self::Float(value) => value.fmt(f),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

// ============================================================================
// SECTION: Status
// ============================================================================

/// Lifecycle status of a participant's survey session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantStatus {
    /// Session started but not finished.
    InProgress,
    /// Every required question answered.
    Completed,
    /// Session abandoned partway through.
    Failed,
}

impl ParticipantStatus {
    /// Returns the stable string label used in storage and exports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Parses a stable string label.
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for ParticipantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Records
// ============================================================================

/// Participant data before a store assigns an identifier.
///
/// # Invariants
/// - `ended_at_ms`, when present, is not earlier than `started_at_ms`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantDraft {
    /// Harness run that created the participant.
    pub run_id: RunId,
    /// Session status.
    pub status: ParticipantStatus,
    /// Session start (unix epoch milliseconds).
    pub started_at_ms: i64,
    /// Session end (unix epoch milliseconds) when finished.
    pub ended_at_ms: Option<i64>,
    /// Collected responses.
    pub responses: Responses,
}

/// Participant persisted by a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantRecord {
    /// Store-assigned identifier.
    pub id: ParticipantId,
    /// Harness run that created the participant.
    pub run_id: RunId,
    /// Session status.
    pub status: ParticipantStatus,
    /// Session start (unix epoch milliseconds).
    pub started_at_ms: i64,
    /// Session end (unix epoch milliseconds) when finished.
    pub ended_at_ms: Option<i64>,
    /// Collected responses.
    pub responses: Responses,
}

impl ParticipantRecord {
    /// Builds a persisted record from a draft and its assigned identifier.
    #[must_use]
    pub fn from_draft(id: ParticipantId, draft: ParticipantDraft) -> Self {
        Self {
            id,
            run_id: draft.run_id,
            status: draft.status,
            started_at_ms: draft.started_at_ms,
            ended_at_ms: draft.ended_at_ms,
            responses: draft.responses,
        }
    }
}
