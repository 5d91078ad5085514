use ehr_flows::{AttachmentError, FlowError};
use ehr_store::StoreError;
use ehr_types::AgreementId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    /// A flow failed; see [`FlowError::kind`] for which class of failure.
    #[error(transparent)]
    Flow(#[from] FlowError),

    #[error("attachment error: {0}")]
    Attachment(#[from] AttachmentError),

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RPC server error: {0}")]
    Rpc(String),
}

impl NodeError {
    pub(crate) fn parameter(msg: impl Into<String>) -> Self {
        Self::Flow(FlowError::Parameter(msg.into()))
    }

    /// Map a vault lookup failure for `id`.
    pub(crate) fn lookup(id: AgreementId, e: StoreError) -> Self {
        match e {
            StoreError::NotFound(_) => Self::Flow(FlowError::NotFound(id)),
            other => Self::Flow(FlowError::Store(other)),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Flow(FlowError::NotFound(_)) | Self::Attachment(AttachmentError::NotFound(_))
        )
    }
}

impl From<StoreError> for NodeError {
    fn from(e: StoreError) -> Self {
        Self::Flow(FlowError::Store(e))
    }
}
