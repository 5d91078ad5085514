//! The initiating side of each flow.

use crate::pipeline::{execute, Plan};
use crate::{FlowContext, FlowError, FlowEvent};
use async_trait::async_trait;
use ehr_contract::{Intent, Transition};
use ehr_store::StoreError;
use ehr_types::{
    Agreement, AgreementId, AgreementStatus, AttachmentRef, Party, PartyName, StateAndRef,
    TransitionId,
};
use tracing::Instrument;

/// What a committed flow produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlowOutcome {
    pub transition: TransitionId,
    pub agreement: AgreementId,
    /// The new current version; `None` after a deletion.
    pub produced: Option<StateAndRef>,
}

/// One coordination procedure, started by a caller on one party's node.
#[async_trait]
pub trait Flow: Send + Sync {
    fn name(&self) -> &'static str;

    async fn call(&self, ctx: &FlowContext) -> Result<FlowOutcome, FlowError>;
}

/// Run `flow` inside a span, reporting start, commit or failure to the
/// context's observer.
pub async fn run_flow(ctx: &FlowContext, flow: &dyn Flow) -> Result<FlowOutcome, FlowError> {
    let name = flow.name();
    let observer = &ctx.services().observer;
    observer.on_event(&FlowEvent::Started { flow: name });

    let span = tracing::info_span!("flow", flow = name, party = %ctx.me().name);
    let result = flow.call(ctx).instrument(span).await;
    match &result {
        Ok(outcome) => {
            tracing::info!(
                flow = name,
                transition = %outcome.transition,
                agreement = %outcome.agreement,
                "flow committed"
            );
            observer.on_event(&FlowEvent::Committed {
                flow: name,
                transition: outcome.transition,
                agreement: outcome.agreement,
                status: outcome.produced.as_ref().map(|v| v.state.status),
            });
        }
        Err(e) => {
            tracing::warn!(flow = name, error = %e, "flow failed");
            observer.on_event(&FlowEvent::Failed {
                flow: name,
                error: e.clone(),
            });
        }
    }
    result
}

async fn resolve(ctx: &FlowContext, name: &PartyName) -> Result<Party, FlowError> {
    ctx.services()
        .identity
        .resolve(name)
        .await
        .ok_or_else(|| FlowError::Parameter(format!("party named {name} cannot be found")))
}

fn current(ctx: &FlowContext, id: &AgreementId) -> Result<StateAndRef, FlowError> {
    ctx.services().vault.current(id).map_err(|e| match e {
        StoreError::NotFound(_) => FlowError::NotFound(*id),
        other => FlowError::Store(other),
    })
}

fn others(ctx: &FlowContext, agreement: &Agreement) -> Vec<Party> {
    agreement
        .participants()
        .into_iter()
        .filter(|p| p.key != ctx.me().key)
        .cloned()
        .collect()
}

/// A participant of `agreement` other than this party, named `name`.
fn counterparty(ctx: &FlowContext, agreement: &Agreement, name: &PartyName, party: Party) -> Result<Party, FlowError> {
    if party.key == ctx.me().key {
        return Err(FlowError::Parameter(format!("{name} is this party")));
    }
    if !agreement.is_participant(&party.key) {
        return Err(FlowError::Parameter(format!(
            "{name} is not a participant of agreement {}",
            agreement.id
        )));
    }
    Ok(party)
}

fn outcome(agreement: AgreementId, transition: TransitionId, produced: Option<StateAndRef>) -> FlowOutcome {
    FlowOutcome {
        transition,
        agreement,
        produced,
    }
}

/// Issue a new `PENDING` agreement with this party as origin custodian.
///
/// With `distribute` set this is the request flow: the subject and target
/// receive the new agreement once it is committed.
pub struct CreateFlow {
    pub subject: PartyName,
    pub target: PartyName,
    pub note: Option<String>,
    pub attachment: Option<AttachmentRef>,
    pub distribute: bool,
}

#[async_trait]
impl Flow for CreateFlow {
    fn name(&self) -> &'static str {
        if self.distribute {
            "request"
        } else {
            "create"
        }
    }

    async fn call(&self, ctx: &FlowContext) -> Result<FlowOutcome, FlowError> {
        let subject = resolve(ctx, &self.subject).await?;
        let target = resolve(ctx, &self.target).await?;
        let agreement = Agreement::new(
            ctx.me().clone(),
            target.clone(),
            subject.clone(),
            self.note.clone(),
            self.attachment,
        );
        let id = agreement.id;
        let distribute_to = if self.distribute {
            vec![subject, target]
        } else {
            Vec::new()
        };
        let plan = Plan {
            transition: Transition::create(agreement, ctx.services().clock.now()),
            countersigners: Vec::new(),
            distribute_to,
            notice: None,
        };
        let (_, receipt) = execute(ctx, plan).await?;
        Ok(outcome(id, receipt.id, receipt.produced))
    }
}

/// Subject-initiated status change: approve, activate, reject or suspend.
pub struct StatusFlow {
    pub intent: Intent,
    pub agreement: AgreementId,
    /// For reject, the counterparty to notify. Otherwise the expected target
    /// custodian, checked against the agreement.
    pub party: PartyName,
}

impl StatusFlow {
    pub fn approve(agreement: AgreementId, target: PartyName) -> Self {
        Self {
            intent: Intent::Approve,
            agreement,
            party: target,
        }
    }

    pub fn activate(agreement: AgreementId, target: PartyName) -> Self {
        Self {
            intent: Intent::Activate,
            agreement,
            party: target,
        }
    }

    pub fn suspend(agreement: AgreementId, target: PartyName) -> Self {
        Self {
            intent: Intent::Suspend,
            agreement,
            party: target,
        }
    }

    pub fn reject(agreement: AgreementId, counterparty: PartyName) -> Self {
        Self {
            intent: Intent::Reject,
            agreement,
            party: counterparty,
        }
    }
}

#[async_trait]
impl Flow for StatusFlow {
    fn name(&self) -> &'static str {
        match self.intent {
            Intent::Approve => "approve",
            Intent::Activate => "activate",
            Intent::Reject => "reject",
            Intent::Suspend => "suspend",
            _ => "status",
        }
    }

    async fn call(&self, ctx: &FlowContext) -> Result<FlowOutcome, FlowError> {
        let status = self.intent.target_status().ok_or_else(|| {
            FlowError::Parameter(format!("{} does not change an agreement's status", self.intent))
        })?;
        let named = resolve(ctx, &self.party).await?;
        let current = current(ctx, &self.agreement)?;
        let agreement = current.state.clone();

        let notice = match self.intent {
            Intent::Reject => {
                let counterparty = counterparty(ctx, &agreement, &self.party, named)?;
                (counterparty, format!("Agreement {} rejected by {}", agreement.id, ctx.me().name))
            }
            _ => {
                if named != agreement.target {
                    return Err(FlowError::Parameter(format!(
                        "{} is not the target of agreement {}",
                        self.party, agreement.id
                    )));
                }
                let text = match status {
                    AgreementStatus::Active => format!(
                        "Agreement {} approved by the subject and is now active",
                        agreement.id
                    ),
                    other => format!("Agreement {} is now {other}", agreement.id),
                };
                (agreement.origin.clone(), text)
            }
        };

        let me = ctx.me().key;
        let plan = Plan {
            transition: Transition::change_status(
                current,
                self.intent.clone(),
                status,
                me,
                [me],
                ctx.services().clock.now(),
            ),
            countersigners: Vec::new(),
            distribute_to: others(ctx, &agreement),
            notice: Some(notice).filter(|(party, _)| party.key != me),
        };
        let (_, receipt) = execute(ctx, plan).await?;
        Ok(outcome(agreement.id, receipt.id, receipt.produced))
    }
}

/// Re-issue an `ACTIVE` agreement endorsed by this party, the subject and
/// the target custodian.
pub struct ShareFlow {
    pub agreement: AgreementId,
    pub subject: PartyName,
    pub target: PartyName,
}

#[async_trait]
impl Flow for ShareFlow {
    fn name(&self) -> &'static str {
        "share"
    }

    async fn call(&self, ctx: &FlowContext) -> Result<FlowOutcome, FlowError> {
        let subject = resolve(ctx, &self.subject).await?;
        let target = resolve(ctx, &self.target).await?;
        let current = current(ctx, &self.agreement)?;
        let agreement = current.state.clone();

        if subject != agreement.subject {
            return Err(FlowError::Parameter(format!(
                "{} is not the subject of agreement {}",
                self.subject, agreement.id
            )));
        }
        if target != agreement.target {
            return Err(FlowError::Parameter(format!(
                "{} is not the target of agreement {}",
                self.target, agreement.id
            )));
        }
        if agreement.status != AgreementStatus::Active {
            return Err(FlowError::Parameter(format!(
                "only ACTIVE agreements can be shared, {} is {}",
                agreement.id, agreement.status
            )));
        }

        let me = ctx.me().clone();
        let countersigners: Vec<Party> = [subject, target]
            .into_iter()
            .filter(|p| p.key != me.key)
            .collect();
        let signers: Vec<_> = countersigners
            .iter()
            .map(|p| p.key)
            .chain(std::iter::once(me.key))
            .collect();
        let plan = Plan {
            transition: Transition::share(current, me.key, signers, ctx.services().clock.now()),
            countersigners,
            distribute_to: others(ctx, &agreement),
            notice: None,
        };
        let (_, receipt) = execute(ctx, plan).await?;
        Ok(outcome(agreement.id, receipt.id, receipt.produced))
    }
}

/// Retire an agreement, endorsed by this party and one counterparty.
pub struct DeleteFlow {
    pub agreement: AgreementId,
    pub counterparty: PartyName,
}

#[async_trait]
impl Flow for DeleteFlow {
    fn name(&self) -> &'static str {
        "delete"
    }

    async fn call(&self, ctx: &FlowContext) -> Result<FlowOutcome, FlowError> {
        let named = resolve(ctx, &self.counterparty).await?;
        let current = current(ctx, &self.agreement)?;
        let agreement = current.state.clone();
        let counterparty = counterparty(ctx, &agreement, &self.counterparty, named)?;

        let me = ctx.me().key;
        let plan = Plan {
            transition: Transition::delete(
                current,
                me,
                [me, counterparty.key],
                ctx.services().clock.now(),
            ),
            countersigners: vec![counterparty],
            distribute_to: others(ctx, &agreement),
            notice: None,
        };
        let (_, receipt) = execute(ctx, plan).await?;
        Ok(outcome(agreement.id, receipt.id, None))
    }
}
