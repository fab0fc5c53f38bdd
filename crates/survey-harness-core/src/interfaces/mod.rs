// crates/survey-harness-core/src/interfaces/mod.rs
// ============================================================================
// Module: Survey Harness Interfaces
// Description: Backend-agnostic session interface for participant storage.
// Purpose: Define the contract surface the harness drives stores through.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! A [`ParticipantStore`] behaves like a unit-of-work session: inserts and
//! deletes are staged until [`ParticipantStore::commit`] and discarded by
//! [`ParticipantStore::rollback`]. Reads observe staged changes so a caller
//! sees its own writes before committing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::ParticipantDraft;
use crate::core::ParticipantId;
use crate::core::ParticipantRecord;

// ============================================================================
// SECTION: Participant Store
// ============================================================================

/// Participant store errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Store I/O error.
    #[error("participant store io error: {0}")]
    Io(String),
    /// Store data is corrupted.
    #[error("participant store corruption: {0}")]
    Corrupt(String),
    /// Store schema version mismatch.
    #[error("participant store version mismatch: {0}")]
    VersionMismatch(String),
    /// Store data or request is invalid.
    #[error("participant store invalid data: {0}")]
    Invalid(String),
    /// Record does not exist.
    #[error("participant not found: {0}")]
    NotFound(ParticipantId),
    /// Store reported an error.
    #[error("participant store error: {0}")]
    Store(String),
}

/// Session-style participant persistence.
pub trait ParticipantStore {
    /// Stages a new participant and returns its assigned identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the draft cannot be staged.
    fn insert(&mut self, draft: ParticipantDraft) -> Result<ParticipantId, StoreError>;

    /// Returns every participant visible to the session, ordered by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when records cannot be read or decoded.
    fn query_all(&self) -> Result<Vec<ParticipantRecord>, StoreError>;

    /// Stages deletion of a participant.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the participant is not visible to
    /// the session, or another [`StoreError`] when staging fails.
    fn delete(&mut self, id: ParticipantId) -> Result<(), StoreError>;

    /// Makes all staged changes durable.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the commit fails; staged changes are then
    /// left pending.
    fn commit(&mut self) -> Result<(), StoreError>;

    /// Discards all staged changes.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the rollback fails.
    fn rollback(&mut self) -> Result<(), StoreError>;

    /// Returns the number of participants visible to the session.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when records cannot be counted.
    fn count(&self) -> Result<usize, StoreError> {
        Ok(self.query_all()?.len())
    }

    /// Reports store readiness.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store is unavailable.
    fn readiness(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

impl<S: ParticipantStore + ?Sized> ParticipantStore for Box<S> {
    fn insert(&mut self, draft: ParticipantDraft) -> Result<ParticipantId, StoreError> {
        (**self).insert(draft)
    }

    fn query_all(&self) -> Result<Vec<ParticipantRecord>, StoreError> {
        (**self).query_all()
    }

    fn delete(&mut self, id: ParticipantId) -> Result<(), StoreError> {
        (**self).delete(id)
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        (**self).commit()
    }

    fn rollback(&mut self) -> Result<(), StoreError> {
        (**self).rollback()
    }

    fn count(&self) -> Result<usize, StoreError> {
        (**self).count()
    }

    fn readiness(&self) -> Result<(), StoreError> {
        (**self).readiness()
    }
}
