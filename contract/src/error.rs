use crate::Intent;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ContractError {
    /// Structural or status rule broken.
    #[error("{intent} transition rejected: {rule}")]
    Violation { intent: Intent, rule: String },

    /// Signer set does not match what the intent requires.
    #[error("{intent} transition not authorized: {rule}")]
    Unauthorized { intent: Intent, rule: String },

    #[error("unrecognized intent: {0}")]
    UnrecognizedIntent(String),

    #[error("transition {claimed} does not match its content (computed {computed})")]
    IdMismatch { claimed: String, computed: String },

    #[error("invalid signature by {signer} on transition {transition}")]
    InvalidSignature { signer: String, transition: String },

    #[error("signature by {signer} is not declared on transition {transition}")]
    UndeclaredSigner { signer: String, transition: String },

    #[error("transition {transition} is missing the signature of {signer}")]
    MissingSignature { signer: String, transition: String },

    #[error("transition encoding failed: {0}")]
    Encoding(String),
}

impl ContractError {
    /// Whether this error is about who signed rather than what was proposed.
    pub fn is_authorization(&self) -> bool {
        matches!(
            self,
            Self::Unauthorized { .. }
                | Self::InvalidSignature { .. }
                | Self::UndeclaredSigner { .. }
                | Self::MissingSignature { .. }
        )
    }
}
