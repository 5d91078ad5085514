//! Committed transition log.

use crate::StoreError;
use ehr_types::TransitionId;

/// Append-only log of committed transitions (serialized bytes keyed by id).
pub trait TransitionStore {
    /// Store a transition. Storing an id twice is a `Duplicate` error.
    fn put_transition(&self, id: &TransitionId, bytes: &[u8]) -> Result<(), StoreError>;

    /// Drop a transition whose commit did not go through. `NotFound` if the
    /// id was never stored.
    fn remove_transition(&self, id: &TransitionId) -> Result<(), StoreError>;

    fn get_transition(&self, id: &TransitionId) -> Result<Vec<u8>, StoreError>;

    fn exists(&self, id: &TransitionId) -> Result<bool, StoreError>;

    fn transition_count(&self) -> Result<u64, StoreError>;
}
