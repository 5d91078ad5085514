//! Parse and construction errors for the shared types.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypesError {
    #[error("malformed agreement id {0:?}")]
    InvalidAgreementId(String),

    #[error("invalid party name: {0}")]
    InvalidPartyName(String),

    #[error("invalid hex for {what}: {reason}")]
    InvalidHex { what: &'static str, reason: String },
}
