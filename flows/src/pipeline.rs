//! The steps every flow shares once its transition is built: verify, sign,
//! collect, submit, record, distribute, notify.

use crate::{CoordinationFailure, FlowContext, FlowError, FlowEvent, FlowMessage};
use ehr_contract::{verify_transition, SignedTransition, Transition, TransitionSignature};
use ehr_ledger::CommitReceipt;
use ehr_store::VersionChange;
use ehr_types::Party;
use tokio::time::timeout;

/// A built transition and who has to hear about it.
pub struct Plan {
    pub transition: Transition,
    /// Parties whose signatures must be collected, in order.
    pub countersigners: Vec<Party>,
    /// Participants that receive the committed transition.
    pub distribute_to: Vec<Party>,
    /// Optional notice for one party once committed.
    pub notice: Option<(Party, String)>,
}

fn coordination(party: &Party, failure: CoordinationFailure) -> FlowError {
    FlowError::Coordination {
        party: party.to_string(),
        failure,
    }
}

/// Drive `plan` to a commit. Nothing is persisted unless the finality
/// service accepts the transition; only distribution and notification
/// failures after that point are tolerated.
pub async fn execute(ctx: &FlowContext, plan: Plan) -> Result<(SignedTransition, CommitReceipt), FlowError> {
    verify_transition(&plan.transition)?;
    let mut signed = ctx.sign(plan.transition)?;

    for party in &plan.countersigners {
        let signature = collect_signature(ctx, party, &signed).await?;
        signed
            .add_signature(signature)
            .map_err(|e| coordination(party, CoordinationFailure::Protocol(e.to_string())))?;
    }
    signed.verify_signatures()?;

    let receipt = ctx.services().finality.submit(signed.clone()).await?;

    let change = VersionChange {
        transition: receipt.id,
        consumed: receipt.consumed,
        produced: receipt.produced.clone(),
        recorded_at: receipt.committed_at,
    };
    if let Err(e) = ctx.services().vault.record(&change) {
        tracing::error!(transition = %receipt.id, error = %e, "committed transition not recorded locally");
        ctx.services().observer.on_event(&FlowEvent::RecordFailed {
            transition: receipt.id,
            reason: e.to_string(),
        });
    }

    distribute(ctx, &signed, &plan.distribute_to).await;
    if let Some((party, text)) = plan.notice {
        if let Err(e) = ctx.services().notifier.notify(&party, &text).await {
            tracing::warn!(party = %party, error = %e, "notification failed");
            ctx.services().observer.on_event(&FlowEvent::NotificationFailed {
                party,
                reason: e.to_string(),
            });
        }
    }

    Ok((signed, receipt))
}

/// One request/response round trip: send the proposal, wait for a
/// signature or a decline, bounded by the session timeout.
async fn collect_signature(
    ctx: &FlowContext,
    party: &Party,
    signed: &SignedTransition,
) -> Result<TransitionSignature, FlowError> {
    let exchange = async {
        let transport = &ctx.services().transport;
        let mut session = transport
            .open_session(party)
            .await
            .map_err(|e| CoordinationFailure::Unreachable(e.to_string()))?;
        tracing::debug!(party = %party, transition = %signed.id, "requesting signature");
        session
            .send(FlowMessage::Propose(signed.clone()))
            .await
            .map_err(|e| CoordinationFailure::Unreachable(e.to_string()))?;
        match session
            .receive()
            .await
            .map_err(|e| CoordinationFailure::Unreachable(e.to_string()))?
        {
            FlowMessage::Signature(signature) if signature.signer == party.key => Ok(signature),
            FlowMessage::Signature(signature) => Err(CoordinationFailure::Protocol(format!(
                "signature by {} instead of {}",
                signature.signer.fingerprint(),
                party.key.fingerprint()
            ))),
            FlowMessage::Decline { reason } => Err(CoordinationFailure::Declined(reason)),
            other => Err(CoordinationFailure::Protocol(format!(
                "expected a signature, got {}",
                other.kind()
            ))),
        }
    };

    match timeout(ctx.session_timeout(), exchange).await {
        Ok(Ok(signature)) => Ok(signature),
        Ok(Err(failure)) => Err(coordination(party, failure)),
        Err(_) => Err(coordination(party, CoordinationFailure::Timeout)),
    }
}

/// Send the committed transition to every participant but ourselves.
/// Best-effort: failures are logged and reported, never returned.
async fn distribute(ctx: &FlowContext, signed: &SignedTransition, parties: &[Party]) {
    for party in parties.iter().filter(|p| p.key != ctx.me().key) {
        let delivery = async {
            let mut session = ctx.services().transport.open_session(party).await?;
            session.send(FlowMessage::Finalized(signed.clone())).await?;
            session.receive().await
        };
        let reason = match timeout(ctx.session_timeout(), delivery).await {
            Ok(Ok(FlowMessage::Ack)) => {
                tracing::debug!(party = %party, transition = %signed.id, "transition delivered");
                continue;
            }
            Ok(Ok(FlowMessage::Decline { reason })) => reason,
            Ok(Ok(other)) => format!("unexpected {} reply", other.kind()),
            Ok(Err(e)) => e.to_string(),
            Err(_) => "timed out".to_string(),
        };
        tracing::warn!(party = %party, transition = %signed.id, %reason, "distribution failed");
        ctx.services().observer.on_event(&FlowEvent::DistributionFailed {
            party: party.clone(),
            transition: signed.id,
            reason,
        });
    }
}
