// crates/survey-harness-core/src/runtime/model.rs
// ============================================================================
// Module: Participant Model Operations
// Description: Bulk participant generation and export over any store.
// Purpose: Provide the bulk-generate and export-all operations of the model.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! [`generate_participants`] drafts `count` participants, stages them in the
//! store session and commits once, rolling back on any failure so a partial
//! batch never becomes durable. [`export_all`] reads every participant the
//! session can see into an [`ExportTable`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::ParticipantId;
use crate::core::RunId;
use crate::interfaces::ParticipantStore;
use crate::interfaces::StoreError;
use crate::runtime::export::ExportError;
use crate::runtime::export::ExportTable;
use crate::runtime::generator::ResponseGenerator;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Participant generation errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerateError {
    /// Store rejected the batch.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Store failed and the rollback that followed failed too.
    #[error("{source}; rollback also failed: {rollback}")]
    RollbackFailed {
        /// Original store failure.
        source: StoreError,
        /// Rollback failure.
        rollback: StoreError,
    },
}

// ============================================================================
// SECTION: Operations
// ============================================================================

/// Generates and persists `count` synthetic participants tagged with `run_id`.
///
/// `count == 0` leaves the store untouched.
///
/// # Errors
///
/// Returns [`GenerateError`] when staging or committing fails; staged
/// participants from this call are rolled back first.
pub fn generate_participants<S>(
    store: &mut S,
    generator: &mut ResponseGenerator,
    run_id: &RunId,
    now_ms: i64,
    count: usize,
) -> Result<Vec<ParticipantId>, GenerateError>
where
    S: ParticipantStore + ?Sized,
{
    if count == 0 {
        return Ok(Vec::new());
    }
    let mut ids = Vec::with_capacity(count);
    match stage_batch(store, generator, run_id, now_ms, count, &mut ids) {
        Ok(()) => Ok(ids),
        Err(source) => match store.rollback() {
            Ok(()) => Err(GenerateError::Store(source)),
            Err(rollback) => Err(GenerateError::RollbackFailed {
                source,
                rollback,
            }),
        },
    }
}

/// Stages `count` drafts and commits them.
fn stage_batch<S>(
    store: &mut S,
    generator: &mut ResponseGenerator,
    run_id: &RunId,
    now_ms: i64,
    count: usize,
    ids: &mut Vec<ParticipantId>,
) -> Result<(), StoreError>
where
    S: ParticipantStore + ?Sized,
{
    for _ in 0 .. count {
        ids.push(store.insert(generator.draft(run_id, now_ms))?);
    }
    store.commit()
}

/// Builds an export table of every participant visible to the store session.
///
/// # Errors
///
/// Returns [`ExportError::Store`] when participants cannot be read, or
/// [`ExportError::Invalid`] when a stored response field collides with a
/// metadata column.
pub fn export_all<S>(store: &S) -> Result<ExportTable, ExportError>
where
    S: ParticipantStore + ?Sized,
{
    let records = store.query_all()?;
    ExportTable::from_records(&records)
}
