//! Notices delivered over flow sessions.

use crate::{FlowMessage, Notifier, SessionTransport, TransportError};
use async_trait::async_trait;
use ehr_types::Party;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

/// Delivers a notice by opening a session and waiting for an acknowledgement.
pub struct SessionNotifier {
    transport: Arc<dyn SessionTransport>,
    timeout: Duration,
}

impl SessionNotifier {
    pub fn new(transport: Arc<dyn SessionTransport>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }
}

#[async_trait]
impl Notifier for SessionNotifier {
    async fn notify(&self, party: &Party, text: &str) -> Result<(), TransportError> {
        let delivery = async {
            let mut session = self.transport.open_session(party).await?;
            session
                .send(FlowMessage::Notice {
                    agreement: None,
                    text: text.to_string(),
                })
                .await?;
            session.receive().await
        };
        match timeout(self.timeout, delivery).await {
            Ok(Ok(FlowMessage::Ack)) => Ok(()),
            Ok(Ok(other)) => Err(TransportError::Closed(format!(
                "{party} answered a notice with {}",
                other.kind()
            ))),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(TransportError::Unreachable(format!("{party} (timed out)"))),
        }
    }
}
