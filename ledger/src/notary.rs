//! Reference notary: re-verifies every submission and applies it with a
//! conditional update over the agreement store.

use crate::{CommitError, CommitReceipt, Conflict, FinalityService};
use async_trait::async_trait;
use ehr_contract::{verify_transition, SignedTransition};
use ehr_store::{AgreementStore, StoreError, TransitionStore, VersionChange};
use ehr_types::{Clock, SystemClock, TransitionId};
use std::sync::{Arc, Mutex};

/// Single-consumption notary over any store implementing both
/// [`AgreementStore`] and [`TransitionStore`].
///
/// Checks run outside the commit lock; the duplicate check, the log append
/// and the conditional update run under it, so two submissions consuming the
/// same version cannot both succeed. The log entry is written first and
/// dropped again if the update is refused, so a failed submission leaves
/// both tables as they were.
pub struct LedgerNotary<S> {
    store: S,
    clock: Arc<dyn Clock>,
    commit_lock: Mutex<()>,
}

impl<S> LedgerNotary<S>
where
    S: AgreementStore + TransitionStore + Send + Sync,
{
    pub fn new(store: S) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: S, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            commit_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Look up a committed transition.
    pub fn committed(&self, id: &TransitionId) -> Result<SignedTransition, StoreError> {
        let bytes = self.store.get_transition(id)?;
        bincode::deserialize(&bytes).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    pub fn summary(&self) -> Result<LedgerSummary, StoreError> {
        Ok(LedgerSummary {
            live_agreements: self.store.current_count()?,
            transitions: self.store.transition_count()?,
        })
    }

    fn commit(&self, signed: &SignedTransition) -> Result<CommitReceipt, CommitError> {
        let bytes = bincode::serialize(signed).map_err(|e| CommitError::Rejected(e.to_string()))?;
        let consumed = signed.transition.consumed().copied();
        let produced = signed.transition.produced().into_iter().next();
        let change = VersionChange {
            transition: signed.id,
            consumed,
            produced: produced.clone(),
            recorded_at: self.clock.now(),
        };

        let _guard = self
            .commit_lock
            .lock()
            .map_err(|_| CommitError::Unavailable("commit lock poisoned".into()))?;

        if self.store.exists(&signed.id).map_err(unavailable)? {
            return Err(Conflict::AlreadyCommitted(signed.id).into());
        }
        self.store
            .put_transition(&signed.id, &bytes)
            .map_err(|e| match e {
                StoreError::Duplicate(_) => Conflict::AlreadyCommitted(signed.id).into(),
                other => unavailable(other),
            })?;
        if let Err(e) = self.store.commit(&change) {
            if let Err(undo) = self.store.remove_transition(&signed.id) {
                tracing::error!(
                    transition = %signed.id,
                    error = %undo,
                    "refused transition left in the log"
                );
            }
            return Err(match e {
                StoreError::Conflict(_) => match (consumed, &produced) {
                    (Some(stale), _) => CommitError::Conflict(Conflict::StaleInput(stale)),
                    (None, Some(version)) => {
                        CommitError::Conflict(Conflict::AgreementExists(version.state.id))
                    }
                    (None, None) => CommitError::Rejected("transition changes nothing".into()),
                },
                other => unavailable(other),
            });
        }

        Ok(CommitReceipt {
            id: signed.id,
            consumed,
            produced,
            committed_at: change.recorded_at,
        })
    }
}

fn unavailable(e: StoreError) -> CommitError {
    CommitError::Unavailable(e.to_string())
}

#[async_trait]
impl<S> FinalityService for LedgerNotary<S>
where
    S: AgreementStore + TransitionStore + Send + Sync,
{
    async fn submit(&self, transition: SignedTransition) -> Result<CommitReceipt, CommitError> {
        transition
            .verify_signatures()
            .and_then(|()| verify_transition(&transition.transition))
            .map_err(|e| {
                tracing::warn!(transition = %transition.id, error = %e, "notary rejected transition");
                CommitError::Rejected(e.to_string())
            })?;

        match self.commit(&transition) {
            Ok(receipt) => {
                tracing::info!(
                    transition = %receipt.id,
                    intent = %transition.transition.intent(),
                    "transition committed"
                );
                Ok(receipt)
            }
            Err(e) => {
                tracing::debug!(transition = %transition.id, error = %e, "commit refused");
                Err(e)
            }
        }
    }
}

/// Summary statistics for the notary's ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerSummary {
    pub live_agreements: u64,
    pub transitions: u64,
}
