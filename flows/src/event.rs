//! What flows report while they run.

use crate::FlowError;
use ehr_types::{AgreementId, AgreementStatus, Party, TransitionId};

#[derive(Clone, Debug)]
pub enum FlowEvent {
    Started {
        flow: &'static str,
    },
    Committed {
        flow: &'static str,
        transition: TransitionId,
        agreement: AgreementId,
        status: Option<AgreementStatus>,
    },
    Failed {
        flow: &'static str,
        error: FlowError,
    },
    /// A participant did not take delivery of a committed transition.
    DistributionFailed {
        party: Party,
        transition: TransitionId,
        reason: String,
    },
    /// A transition this party committed could not be written to its own
    /// vault. The commit stands; the vault is behind the ledger.
    RecordFailed {
        transition: TransitionId,
        reason: String,
    },
    NotificationFailed {
        party: Party,
        reason: String,
    },
    /// This party countersigned someone else's proposal.
    Endorsed {
        transition: TransitionId,
        proposer: Party,
    },
    /// This party refused someone else's proposal.
    Declined {
        transition: TransitionId,
        proposer: Party,
        reason: String,
    },
    /// A transition committed elsewhere was recorded in this party's vault.
    Recorded {
        transition: TransitionId,
        agreement: AgreementId,
        from: Party,
    },
    NoticeReceived {
        from: Party,
        agreement: Option<AgreementId>,
        text: String,
    },
}

/// Receives [`FlowEvent`]s. Must not block.
pub trait FlowObserver: Send + Sync {
    fn on_event(&self, event: &FlowEvent);
}

/// Discards every event.
impl FlowObserver for () {
    fn on_event(&self, _event: &FlowEvent) {}
}
