//! Traits for everything a flow talks to outside the agreement core.

use crate::FlowMessage;
use async_trait::async_trait;
use ehr_types::{AttachmentRef, Party, PartyName, PublicKey};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("{0} is unreachable")]
    Unreachable(String),

    #[error("session closed by {0}")]
    Closed(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AttachmentError {
    #[error("attachment not found: {0}")]
    NotFound(AttachmentRef),

    #[error("attachment is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },

    #[error("attachment store error: {0}")]
    Backend(String),
}

/// Resolves well-known names to parties.
#[async_trait]
pub trait IdentityService: Send + Sync {
    async fn resolve(&self, name: &PartyName) -> Option<Party>;

    async fn party_from_key(&self, key: &PublicKey) -> Option<Party>;
}

/// Opens request/response sessions with other parties.
#[async_trait]
pub trait SessionTransport: Send + Sync {
    async fn open_session(&self, counterparty: &Party) -> Result<Box<dyn FlowSession>, TransportError>;
}

/// One conversation with one counterparty.
#[async_trait]
pub trait FlowSession: Send {
    /// The party on the other end.
    fn counterparty(&self) -> &Party;

    async fn send(&mut self, message: FlowMessage) -> Result<(), TransportError>;

    async fn receive(&mut self) -> Result<FlowMessage, TransportError>;
}

/// Delivers a short human-readable notice to a party.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, party: &Party, text: &str) -> Result<(), TransportError>;
}

/// Opaque content store. Agreements only ever carry the reference.
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    async fn store(&self, content: Vec<u8>) -> Result<AttachmentRef, AttachmentError>;

    async fn fetch(&self, reference: &AttachmentRef) -> Result<Vec<u8>, AttachmentError>;
}
