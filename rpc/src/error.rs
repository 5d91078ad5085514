//! RPC error types and their HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ehr_flows::{AttachmentError, CoordinationFailure, FlowError};
use ehr_node::NodeError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    /// Malformed request: missing field, unparsable id or cursor.
    #[error("{0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Node(#[from] NodeError),

    #[error("server error: {0}")]
    Server(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
}

impl RpcError {
    /// Status code and stable error code for this failure.
    pub fn status(&self) -> (StatusCode, &'static str) {
        match self {
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Server(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            Self::Node(NodeError::Flow(e)) => match e {
                FlowError::Parameter(_) => (StatusCode::BAD_REQUEST, "BAD_PARAMETER"),
                FlowError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                FlowError::Verification(_) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "VERIFICATION_FAILED")
                }
                FlowError::Coordination {
                    failure: CoordinationFailure::Timeout,
                    ..
                } => (StatusCode::GATEWAY_TIMEOUT, "COUNTERPARTY_TIMEOUT"),
                FlowError::Coordination { .. } => (StatusCode::BAD_GATEWAY, "COORDINATION_FAILED"),
                FlowError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
                FlowError::Rejected(_) => (StatusCode::UNPROCESSABLE_ENTITY, "REJECTED"),
                FlowError::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE"),
                FlowError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORE_ERROR"),
            },
            Self::Node(NodeError::Attachment(e)) => match e {
                AttachmentError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                AttachmentError::TooLarge { .. } => {
                    (StatusCode::PAYLOAD_TOO_LARGE, "ATTACHMENT_TOO_LARGE")
                }
                AttachmentError::Backend(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "ATTACHMENT_STORE_ERROR")
                }
            },
            Self::Node(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let (status, code) = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, code, "request failed");
        } else {
            tracing::debug!(error = %self, code, "request refused");
        }
        let body = ErrorResponse {
            error: self.to_string(),
            code,
        };
        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type ApiResult<T> = Result<T, RpcError>;

#[cfg(test)]
mod tests {
    use super::*;
    use ehr_ledger::Conflict;
    use ehr_types::{AgreementId, StateRef};

    fn status_of(e: FlowError) -> StatusCode {
        RpcError::from(NodeError::from(e)).status().0
    }

    #[test]
    fn flow_failures_map_to_distinct_statuses() {
        assert_eq!(status_of(FlowError::Parameter("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(FlowError::NotFound(AgreementId::generate())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(FlowError::Conflict(Conflict::StaleInput(StateRef::new(
                AgreementId::generate(),
                1
            )))),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(FlowError::Coordination {
                party: "Doctor D2".into(),
                failure: CoordinationFailure::Timeout,
            }),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            status_of(FlowError::Coordination {
                party: "Doctor D2".into(),
                failure: CoordinationFailure::Declined("stale".into()),
            }),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn oversized_attachment_is_413() {
        let e = RpcError::from(NodeError::from(AttachmentError::TooLarge { size: 2, limit: 1 }));
        assert_eq!(e.status(), (StatusCode::PAYLOAD_TOO_LARGE, "ATTACHMENT_TOO_LARGE"));
    }
}
