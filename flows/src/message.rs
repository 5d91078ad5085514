//! Messages exchanged over flow sessions.

use ehr_contract::{SignedTransition, TransitionSignature};
use ehr_types::AgreementId;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowMessage {
    /// Please check and countersign. Carries the proposer's signature.
    Propose(SignedTransition),
    /// The responder's endorsement of a proposal.
    Signature(TransitionSignature),
    /// The responder refuses to endorse.
    Decline { reason: String },
    /// A committed, fully signed transition to record.
    Finalized(SignedTransition),
    Notice {
        agreement: Option<AgreementId>,
        text: String,
    },
    Ack,
}

impl FlowMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Propose(_) => "propose",
            Self::Signature(_) => "signature",
            Self::Decline { .. } => "decline",
            Self::Finalized(_) => "finalized",
            Self::Notice { .. } => "notice",
            Self::Ack => "ack",
        }
    }
}
