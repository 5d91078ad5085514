//! Nullable network — in-process sessions over tokio channels.
//!
//! Every party gets a [`NullEndpoint`] to open sessions from, and registers a
//! [`Responder`] to answer sessions opened to it. Opening a session spawns
//! the responder on the other end. Parties can be made unreachable (opening
//! fails) or silent (the session opens but nobody ever answers).

use async_trait::async_trait;
use ehr_flows::{FlowMessage, FlowSession, Responder, SessionTransport, TransportError};
use ehr_types::{Party, PublicKey};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// One message that crossed the network, for assertions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentMessage {
    pub from: PublicKey,
    pub to: PublicKey,
    pub kind: &'static str,
}

#[derive(Default)]
struct Inner {
    responders: Mutex<HashMap<PublicKey, Responder>>,
    unreachable: Mutex<HashSet<PublicKey>>,
    silent: Mutex<HashSet<PublicKey>>,
    /// Sessions opened to silent parties, held open so they never close.
    parked: Mutex<Vec<ChannelSession>>,
    sent: Mutex<Vec<SentMessage>>,
}

/// A test network connecting parties in one process.
#[derive(Clone, Default)]
pub struct NullNetwork {
    inner: Arc<Inner>,
}

impl NullNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport that opens sessions as `me`.
    pub fn endpoint(&self, me: Party) -> NullEndpoint {
        NullEndpoint {
            me,
            inner: self.inner.clone(),
        }
    }

    /// Answer sessions opened to `party` with `responder`.
    pub fn register(&self, party: &Party, responder: Responder) {
        self.inner
            .responders
            .lock()
            .unwrap()
            .insert(party.key, responder);
    }

    /// Opening a session to `key` fails while set.
    pub fn set_unreachable(&self, key: PublicKey, unreachable: bool) {
        let mut set = self.inner.unreachable.lock().unwrap();
        if unreachable {
            set.insert(key);
        } else {
            set.remove(&key);
        }
    }

    /// Sessions to `key` open but are never answered while set.
    pub fn set_silent(&self, key: PublicKey, silent: bool) {
        let mut set = self.inner.silent.lock().unwrap();
        if silent {
            set.insert(key);
        } else {
            set.remove(&key);
        }
    }

    /// Get all sent messages (for assertions).
    pub fn sent(&self) -> Vec<SentMessage> {
        self.inner.sent.lock().unwrap().clone()
    }

    /// Messages of one kind sent to `to`.
    pub fn sent_to(&self, to: &PublicKey, kind: &str) -> usize {
        self.inner
            .sent
            .lock()
            .unwrap()
            .iter()
            .filter(|m| &m.to == to && m.kind == kind)
            .count()
    }

    /// Clear the sent log.
    pub fn reset(&self) {
        self.inner.sent.lock().unwrap().clear();
    }
}

/// One party's view of a [`NullNetwork`].
#[derive(Clone)]
pub struct NullEndpoint {
    me: Party,
    inner: Arc<Inner>,
}

#[async_trait]
impl SessionTransport for NullEndpoint {
    async fn open_session(&self, counterparty: &Party) -> Result<Box<dyn FlowSession>, TransportError> {
        if self.inner.unreachable.lock().unwrap().contains(&counterparty.key) {
            tracing::trace!(from = %self.me, to = %counterparty, "null network: unreachable");
            return Err(TransportError::Unreachable(counterparty.to_string()));
        }
        let responder = self
            .inner
            .responders
            .lock()
            .unwrap()
            .get(&counterparty.key)
            .cloned()
            .ok_or_else(|| TransportError::Unreachable(counterparty.to_string()))?;

        let (to_remote, remote_inbox) = unbounded_channel();
        let (to_local, local_inbox) = unbounded_channel();
        let local = ChannelSession {
            me: self.me.key,
            counterparty: counterparty.clone(),
            outbox: to_remote,
            inbox: local_inbox,
            inner: self.inner.clone(),
        };
        let remote = ChannelSession {
            me: counterparty.key,
            counterparty: self.me.clone(),
            outbox: to_local,
            inbox: remote_inbox,
            inner: self.inner.clone(),
        };

        if self.inner.silent.lock().unwrap().contains(&counterparty.key) {
            self.inner.parked.lock().unwrap().push(remote);
        } else {
            tokio::spawn(async move { responder.handle(Box::new(remote)).await });
        }
        Ok(Box::new(local))
    }
}

struct ChannelSession {
    me: PublicKey,
    counterparty: Party,
    outbox: UnboundedSender<FlowMessage>,
    inbox: UnboundedReceiver<FlowMessage>,
    inner: Arc<Inner>,
}

#[async_trait]
impl FlowSession for ChannelSession {
    fn counterparty(&self) -> &Party {
        &self.counterparty
    }

    async fn send(&mut self, message: FlowMessage) -> Result<(), TransportError> {
        let kind = message.kind();
        self.outbox
            .send(message)
            .map_err(|_| TransportError::Closed(self.counterparty.to_string()))?;
        self.inner.sent.lock().unwrap().push(SentMessage {
            from: self.me,
            to: self.counterparty.key,
            kind,
        });
        Ok(())
    }

    async fn receive(&mut self) -> Result<FlowMessage, TransportError> {
        self.inbox
            .recv()
            .await
            .ok_or_else(|| TransportError::Closed(self.counterparty.to_string()))
    }
}
