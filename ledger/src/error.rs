use ehr_types::{AgreementId, StateRef, TransitionId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a legal transition lost to another one.
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum Conflict {
    #[error("transition {0} is already committed")]
    AlreadyCommitted(TransitionId),

    #[error("version {0} is no longer current")]
    StaleInput(StateRef),

    #[error("agreement {0} already exists")]
    AgreementExists(AgreementId),
}

#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum CommitError {
    /// The transition raced another one; re-derive from the current version.
    #[error("commit conflict: {0}")]
    Conflict(#[from] Conflict),

    /// The transition is not acceptable as submitted.
    #[error("commit rejected: {0}")]
    Rejected(String),

    #[error("finality service unavailable: {0}")]
    Unavailable(String),
}

impl CommitError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}
