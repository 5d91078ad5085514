use ehr_contract::ContractError;
use ehr_ledger::{CommitError, Conflict};
use ehr_store::StoreError;
use ehr_types::AgreementId;
use std::fmt;
use thiserror::Error;

/// How signature collection with a counterparty went wrong.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CoordinationFailure {
    Declined(String),
    Timeout,
    Unreachable(String),
    /// The counterparty answered with something that makes no sense here.
    Protocol(String),
}

impl fmt::Display for CoordinationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Declined(reason) => write!(f, "declined: {reason}"),
            Self::Timeout => f.write_str("timed out"),
            Self::Unreachable(reason) => write!(f, "unreachable: {reason}"),
            Self::Protocol(reason) => write!(f, "protocol error: {reason}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum FlowError {
    /// Bad or unresolvable input; the flow never started.
    #[error("invalid parameter: {0}")]
    Parameter(String),

    #[error("agreement not found: {0}")]
    NotFound(AgreementId),

    /// The proposal breaks a contract rule; nothing was sent.
    #[error("verification failed: {0}")]
    Verification(#[from] ContractError),

    #[error("coordination with {party} failed: {failure}")]
    Coordination {
        party: String,
        failure: CoordinationFailure,
    },

    /// Lost a race at the finality service; re-derive from the current version.
    #[error("commit conflict: {0}")]
    Conflict(Conflict),

    #[error("commit rejected: {0}")]
    Rejected(String),

    #[error("finality service unavailable: {0}")]
    Unavailable(String),

    #[error("vault error: {0}")]
    Store(#[from] StoreError),
}

impl From<CommitError> for FlowError {
    fn from(e: CommitError) -> Self {
        match e {
            CommitError::Conflict(conflict) => Self::Conflict(conflict),
            CommitError::Rejected(reason) => Self::Rejected(reason),
            CommitError::Unavailable(reason) => Self::Unavailable(reason),
        }
    }
}

impl FlowError {
    /// Short stable label, for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Parameter(_) | Self::NotFound(_) => "parameter",
            Self::Verification(_) => "verification",
            Self::Coordination { .. } => "coordination",
            Self::Conflict(_) => "conflict",
            Self::Rejected(_) => "rejected",
            Self::Unavailable(_) => "unavailable",
            Self::Store(_) => "store",
        }
    }
}
