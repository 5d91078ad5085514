//! The finality boundary.

use crate::CommitError;
use async_trait::async_trait;
use ehr_contract::SignedTransition;
use ehr_types::{StateAndRef, StateRef, Timestamp, TransitionId};
use serde::{Deserialize, Serialize};

/// Proof that a transition was accepted, and what it did.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitReceipt {
    pub id: TransitionId,
    pub consumed: Option<StateRef>,
    pub produced: Option<StateAndRef>,
    pub committed_at: Timestamp,
}

/// Globally orders committed transitions.
///
/// Implementations must re-check signatures and the contract, and must accept
/// at most one transition per consumed version.
#[async_trait]
pub trait FinalityService: Send + Sync {
    async fn submit(&self, transition: SignedTransition) -> Result<CommitReceipt, CommitError>;
}
