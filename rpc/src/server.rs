//! Axum-based HTTP server for one node.

use std::net::SocketAddr;
use std::sync::Arc;

use ehr_node::{until_shutdown, AgreementNode};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::error::RpcError;
use crate::router::create_router;
use crate::state::AppState;

pub struct RpcServer {
    addr: SocketAddr,
    node: Arc<AgreementNode>,
}

impl RpcServer {
    /// Serve `node` on localhost at `port`.
    pub fn new(port: u16, node: Arc<AgreementNode>) -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], port)),
            node,
        }
    }

    pub fn with_addr(addr: SocketAddr, node: Arc<AgreementNode>) -> Self {
        Self { addr, node }
    }

    /// Serve until `shutdown` fires.
    pub async fn serve(self, shutdown: broadcast::Receiver<()>) -> Result<(), RpcError> {
        let listener = TcpListener::bind(self.addr)
            .await
            .map_err(|e| RpcError::Server(format!("bind {}: {e}", self.addr)))?;
        let party = self.node.me().name.clone();
        tracing::info!(party = %party, addr = %self.addr, "HTTP server listening");

        let app = create_router(AppState::new(self.node));
        axum::serve(listener, app)
            .with_graceful_shutdown(until_shutdown(shutdown))
            .await
            .map_err(|e| RpcError::Server(e.to_string()))?;

        tracing::info!(party = %party, "HTTP server stopped");
        Ok(())
    }
}
