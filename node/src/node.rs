//! One party's node: caller-facing operations and queries over its flows.

use std::sync::Arc;

use ehr_flows::{
    run_flow, AttachmentStore, CreateFlow, DeleteFlow, Flow, FlowContext, FlowEvent,
    FlowOutcome, FlowServices, IdentityService, Notifier, Responder, SessionNotifier,
    SessionTransport, ShareFlow, StatusFlow,
};
use ehr_ledger::FinalityService;
use ehr_store::{AgreementRecord, AgreementStore};
use ehr_types::{
    AgreementId, AttachmentRef, Clock, KeyPair, Party, PartyName, Role, StateAndRef, Timestamp,
};
use serde::Serialize;

use crate::config::NodeConfig;
use crate::error::NodeError;
use crate::events::{EventBus, Inbox, Notice};
use crate::metrics::NodeMetrics;

/// The boundaries a node is wired to.
///
/// `notifier` defaults to delivering notices over `transport`.
#[derive(Clone)]
pub struct NodeServices {
    pub identity: Arc<dyn IdentityService>,
    pub transport: Arc<dyn SessionTransport>,
    pub finality: Arc<dyn FinalityService>,
    pub vault: Arc<dyn AgreementStore + Send + Sync>,
    pub attachments: Arc<dyn AttachmentStore>,
    pub notifier: Option<Arc<dyn Notifier>>,
    pub clock: Arc<dyn Clock>,
}

/// Snapshot for the `/status` endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NodeStatus {
    pub party: String,
    pub key: String,
    pub agreements: u64,
    pub notices: usize,
    pub uptime_secs: u64,
}

/// A running node for one party.
pub struct AgreementNode {
    config: NodeConfig,
    ctx: FlowContext,
    attachments: Arc<dyn AttachmentStore>,
    events: Arc<EventBus>,
    inbox: Arc<Inbox>,
    metrics: Arc<NodeMetrics>,
    started_at: Timestamp,
}

fn parse_name(raw: &str) -> Result<PartyName, NodeError> {
    PartyName::parse(raw).map_err(|e| NodeError::parameter(e.to_string()))
}

impl AgreementNode {
    pub fn new(config: NodeConfig, keypair: KeyPair, services: NodeServices) -> Result<Self, NodeError> {
        config.validate()?;
        let name = PartyName::parse(&config.party_name)
            .map_err(|e| NodeError::Config(format!("party_name: {e}")))?;
        let me = Party::new(name, keypair.public);

        let events = Arc::new(EventBus::new());
        let metrics = Arc::new(NodeMetrics::new());
        let inbox = Arc::new(Inbox::new(config.inbox_capacity, services.clock.clone()));

        {
            let metrics = metrics.clone();
            let vault = services.vault.clone();
            events.subscribe(Box::new(move |event| {
                metrics.observe(event);
                if matches!(event, FlowEvent::Committed { .. } | FlowEvent::Recorded { .. }) {
                    if let Ok(count) = vault.current_count() {
                        metrics.agreements.set(count as i64);
                    }
                }
            }));
        }
        {
            let inbox = inbox.clone();
            events.subscribe(Box::new(move |event| inbox.observe(event)));
        }

        let notifier: Arc<dyn Notifier> = match services.notifier.clone() {
            Some(notifier) => notifier,
            None => Arc::new(SessionNotifier::new(
                services.transport.clone(),
                config.session_timeout(),
            )),
        };
        let flow_services = FlowServices {
            identity: services.identity,
            transport: services.transport,
            finality: services.finality,
            vault: services.vault,
            notifier,
            clock: services.clock.clone(),
            observer: events.clone(),
        };
        let ctx = FlowContext::new(
            me.clone(),
            Arc::new(keypair),
            flow_services,
            config.session_timeout(),
        );

        tracing::info!(party = %me, "node ready");
        Ok(Self {
            config,
            ctx,
            attachments: services.attachments,
            events,
            inbox,
            metrics,
            started_at: services.clock.now(),
        })
    }

    pub fn me(&self) -> &Party {
        self.ctx.me()
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn metrics(&self) -> &NodeMetrics {
        &self.metrics
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// The counterparty side of this node's flows, for the transport to
    /// hand inbound sessions to.
    pub fn responder(&self) -> Responder {
        Responder::new(self.ctx.clone())
    }

    async fn run(&self, flow: &dyn Flow) -> Result<FlowOutcome, NodeError> {
        let timer = self.metrics.flow_latency_seconds.start_timer();
        let result = run_flow(&self.ctx, flow).await;
        timer.observe_duration();
        Ok(result?)
    }

    // ── Flows ───────────────────────────────────────────────────────────

    /// Issue a `PENDING` agreement held only by this node.
    pub async fn create(
        &self,
        subject: &str,
        target: &str,
        note: Option<String>,
        attachment: Option<AttachmentRef>,
    ) -> Result<FlowOutcome, NodeError> {
        self.issue(subject, target, note, attachment, false).await
    }

    /// Issue a `PENDING` agreement and hand it to the subject and target.
    pub async fn request(
        &self,
        subject: &str,
        target: &str,
        note: Option<String>,
        attachment: Option<AttachmentRef>,
    ) -> Result<FlowOutcome, NodeError> {
        self.issue(subject, target, note, attachment, true).await
    }

    async fn issue(
        &self,
        subject: &str,
        target: &str,
        note: Option<String>,
        attachment: Option<AttachmentRef>,
        distribute: bool,
    ) -> Result<FlowOutcome, NodeError> {
        let flow = CreateFlow {
            subject: parse_name(subject)?,
            target: parse_name(target)?,
            note: note.filter(|n| !n.trim().is_empty()),
            attachment,
            distribute,
        };
        self.run(&flow).await
    }

    pub async fn approve(&self, id: AgreementId, target: &str) -> Result<FlowOutcome, NodeError> {
        self.run(&StatusFlow::approve(id, parse_name(target)?)).await
    }

    pub async fn activate(&self, id: AgreementId, target: &str) -> Result<FlowOutcome, NodeError> {
        self.run(&StatusFlow::activate(id, parse_name(target)?)).await
    }

    pub async fn suspend(&self, id: AgreementId, target: &str) -> Result<FlowOutcome, NodeError> {
        self.run(&StatusFlow::suspend(id, parse_name(target)?)).await
    }

    pub async fn reject(&self, id: AgreementId, counterparty: &str) -> Result<FlowOutcome, NodeError> {
        self.run(&StatusFlow::reject(id, parse_name(counterparty)?)).await
    }

    pub async fn share(&self, id: AgreementId, subject: &str, target: &str) -> Result<FlowOutcome, NodeError> {
        let flow = ShareFlow {
            agreement: id,
            subject: parse_name(subject)?,
            target: parse_name(target)?,
        };
        self.run(&flow).await
    }

    pub async fn delete(&self, id: AgreementId, counterparty: &str) -> Result<FlowOutcome, NodeError> {
        let flow = DeleteFlow {
            agreement: id,
            counterparty: parse_name(counterparty)?,
        };
        self.run(&flow).await
    }

    // ── Queries ─────────────────────────────────────────────────────────

    fn vault(&self) -> &Arc<dyn AgreementStore + Send + Sync> {
        &self.ctx.services().vault
    }

    /// Current version of every agreement this node holds.
    pub fn list(&self) -> Result<Vec<StateAndRef>, NodeError> {
        Ok(self.vault().list_current()?)
    }

    pub fn get(&self, id: AgreementId) -> Result<StateAndRef, NodeError> {
        self.vault().current(&id).map_err(|e| NodeError::lookup(id, e))
    }

    pub fn party(&self, id: AgreementId, role: Role) -> Result<Party, NodeError> {
        Ok(self.get(id)?.state.party(role).clone())
    }

    pub fn subject(&self, id: AgreementId) -> Result<Party, NodeError> {
        self.party(id, Role::Subject)
    }

    pub fn origin(&self, id: AgreementId) -> Result<Party, NodeError> {
        self.party(id, Role::Origin)
    }

    pub fn target(&self, id: AgreementId) -> Result<Party, NodeError> {
        self.party(id, Role::Target)
    }

    /// Every version this node recorded, oldest first. Includes retired
    /// agreements.
    pub fn history(&self, id: AgreementId) -> Result<Vec<AgreementRecord>, NodeError> {
        self.vault().history(&id).map_err(|e| NodeError::lookup(id, e))
    }

    /// Notices received from other parties, oldest first.
    pub fn inbox(&self) -> Vec<Notice> {
        self.inbox.list()
    }

    pub fn status(&self) -> Result<NodeStatus, NodeError> {
        let agreements = self.vault().current_count()?;
        self.metrics.agreements.set(agreements as i64);
        let me = self.me();
        Ok(NodeStatus {
            party: me.name.to_string(),
            key: me.key.to_string(),
            agreements,
            notices: self.inbox.len(),
            uptime_secs: self
                .started_at
                .elapsed_since(self.ctx.services().clock.now()),
        })
    }

    // ── Attachments ─────────────────────────────────────────────────────

    pub async fn upload(&self, content: Vec<u8>) -> Result<AttachmentRef, NodeError> {
        let size = content.len();
        let reference = self.attachments.store(content).await?;
        tracing::info!(attachment = %reference, size, "attachment stored");
        Ok(reference)
    }

    pub async fn download(&self, reference: &AttachmentRef) -> Result<Vec<u8>, NodeError> {
        Ok(self.attachments.fetch(reference).await?)
    }
}
