//! HTTP API for an EHR agreement node.
//!
//! Provides endpoints for:
//! - Node identity, status, notice inbox and Prometheus metrics
//! - Agreement queries (list, get, parties, version history)
//! - Starting flows (create, request, approve, activate, suspend, reject,
//!   share, delete)
//! - Attachment upload and download

pub mod error;
pub mod handlers;
pub mod pagination;
pub mod router;
pub mod server;
pub mod state;

pub use error::{ApiResult, RpcError};
pub use router::create_router;
pub use server::RpcServer;
pub use state::AppState;
