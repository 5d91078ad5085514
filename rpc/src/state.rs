use std::sync::Arc;

use ehr_node::AgreementNode;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub node: Arc<AgreementNode>,
}

impl AppState {
    pub fn new(node: Arc<AgreementNode>) -> Self {
        Self { node }
    }
}
