// crates/survey-harness-core/src/runtime/store.rs
// ============================================================================
// Module: In-Memory Participant Store
// Description: Session-style participant store kept entirely in memory.
// Purpose: Back tests and ephemeral harness runs without a database file.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! [`InMemoryParticipantStore`] keeps a committed map and, while a session has
//! uncommitted writes, a staged copy of it. Clones share state, so a caller
//! can keep a handle and inspect what a harness left behind.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use crate::core::ParticipantDraft;
use crate::core::ParticipantId;
use crate::core::ParticipantRecord;
use crate::interfaces::ParticipantStore;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Records keyed by identifier.
type RecordMap = BTreeMap<ParticipantId, ParticipantRecord>;

/// Shared store state.
#[derive(Debug, Default)]
struct StoreState {
    /// Durable records.
    committed: RecordMap,
    /// Working copy while uncommitted changes exist.
    staged: Option<RecordMap>,
    /// Last assigned identifier value.
    last_id: u64,
}

impl StoreState {
    /// Returns the records visible to the session.
    fn visible(&self) -> &RecordMap {
        self.staged.as_ref().unwrap_or(&self.committed)
    }

    /// Returns the working copy, creating it from committed state on first write.
    fn working(&mut self) -> &mut RecordMap {
        let committed = &self.committed;
        self.staged.get_or_insert_with(|| committed.clone())
    }
}

/// In-memory participant store for tests and ephemeral runs.
#[derive(Debug, Default, Clone)]
pub struct InMemoryParticipantStore {
    /// Store state protected by a mutex.
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryParticipantStore {
    /// Creates a new, empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of committed participants, ignoring staged changes.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store mutex is poisoned.
    pub fn committed_count(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.committed.len())
    }

    /// Locks the shared state.
    fn lock(&self) -> Result<MutexGuard<'_, StoreState>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Store("participant store mutex poisoned".to_string()))
    }
}

impl ParticipantStore for InMemoryParticipantStore {
    fn insert(&mut self, draft: ParticipantDraft) -> Result<ParticipantId, StoreError> {
        let mut guard = self.lock()?;
        let next = guard
            .last_id
            .checked_add(1)
            .ok_or_else(|| StoreError::Store("participant id space exhausted".to_string()))?;
        let id = ParticipantId::from_raw(next)
            .ok_or_else(|| StoreError::Store("participant id must be non-zero".to_string()))?;
        guard.last_id = next;
        guard.working().insert(id, ParticipantRecord::from_draft(id, draft));
        drop(guard);
        Ok(id)
    }

    fn query_all(&self) -> Result<Vec<ParticipantRecord>, StoreError> {
        let guard = self.lock()?;
        Ok(guard.visible().values().cloned().collect())
    }

    fn delete(&mut self, id: ParticipantId) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        if !guard.visible().contains_key(&id) {
            return Err(StoreError::NotFound(id));
        }
        guard.working().remove(&id);
        drop(guard);
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        if let Some(staged) = guard.staged.take() {
            guard.committed = staged;
        }
        drop(guard);
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), StoreError> {
        self.lock()?.staged = None;
        Ok(())
    }

    fn count(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.visible().len())
    }
}
