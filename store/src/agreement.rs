//! Versioned agreement storage.
//!
//! Rows are keyed by agreement id and version. Each agreement has at most one
//! current version; every other version is retired and kept for history.

use crate::StoreError;
use ehr_types::{AgreementId, StateAndRef, StateRef, Timestamp, TransitionId};
use serde::{Deserialize, Serialize};

/// One stored version of an agreement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgreementRecord {
    pub version: StateAndRef,
    /// Transition that produced this version.
    pub produced_by: TransitionId,
    /// Transition that consumed it, once retired.
    pub consumed_by: Option<TransitionId>,
    pub recorded_at: Timestamp,
}

impl AgreementRecord {
    pub fn is_current(&self) -> bool {
        self.consumed_by.is_none()
    }
}

/// The effect of one committed transition on the agreement table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionChange {
    pub transition: TransitionId,
    pub consumed: Option<StateRef>,
    pub produced: Option<StateAndRef>,
    pub recorded_at: Timestamp,
}

/// Trait for the versioned agreement table.
pub trait AgreementStore {
    /// Apply `change` only if it extends what is stored: the consumed version
    /// must be current, and a version produced from nothing must name an
    /// unknown agreement. Anything else is a `Conflict`, and nothing is written.
    fn commit(&self, change: &VersionChange) -> Result<(), StoreError>;

    /// Apply a change committed elsewhere.
    ///
    /// The consumed version may be unknown here (the holder was not told
    /// about earlier versions), but a change that does not move the agreement
    /// forward from what is held is a `Conflict`.
    fn record(&self, change: &VersionChange) -> Result<(), StoreError>;

    /// The current version of an agreement. `NotFound` once it is retired
    /// without a successor.
    fn current(&self, id: &AgreementId) -> Result<StateAndRef, StoreError>;

    fn get_version(&self, reference: &StateRef) -> Result<AgreementRecord, StoreError>;

    /// Every stored version of an agreement, oldest first.
    fn history(&self, id: &AgreementId) -> Result<Vec<AgreementRecord>, StoreError>;

    /// The current version of every live agreement.
    fn list_current(&self) -> Result<Vec<StateAndRef>, StoreError>;

    fn current_count(&self) -> Result<u64, StoreError>;
}
