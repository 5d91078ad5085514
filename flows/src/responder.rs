//! The counterparty side of every flow.

use crate::{FlowContext, FlowEvent, FlowMessage, FlowSession};
use ehr_contract::{verify_transition, SignedTransition, TransitionSignature};
use ehr_store::VersionChange;
use ehr_types::{AgreementId, Party};
use tokio::time::timeout;

/// Answers sessions opened by other parties' flows.
///
/// A proposal is endorsed only after the same checks the proposer ran:
/// signatures so far, the contract, this party being a declared signer, and
/// the consumed version matching this party's own vault.
#[derive(Clone)]
pub struct Responder {
    ctx: FlowContext,
}

impl Responder {
    pub fn new(ctx: FlowContext) -> Self {
        Self { ctx }
    }

    /// Serve one inbound session: read one message, send one reply.
    pub async fn handle(&self, mut session: Box<dyn FlowSession>) {
        let from = session.counterparty().clone();
        let message = match timeout(self.ctx.session_timeout(), session.receive()).await {
            Ok(Ok(message)) => message,
            Ok(Err(e)) => {
                tracing::debug!(from = %from, error = %e, "inbound session closed early");
                return;
            }
            Err(_) => {
                tracing::debug!(from = %from, "inbound session idle, dropping");
                return;
            }
        };
        tracing::debug!(from = %from, kind = message.kind(), "inbound message");

        let reply = self.respond(&from, message);
        if let Err(e) = session.send(reply).await {
            tracing::warn!(from = %from, error = %e, "reply not delivered");
        }
    }

    /// The reply to one inbound message.
    pub fn respond(&self, from: &Party, message: FlowMessage) -> FlowMessage {
        let observer = &self.ctx.services().observer;
        match message {
            FlowMessage::Propose(signed) => match self.endorse(from, &signed) {
                Ok(signature) => {
                    tracing::info!(proposer = %from, transition = %signed.id, "proposal endorsed");
                    observer.on_event(&FlowEvent::Endorsed {
                        transition: signed.id,
                        proposer: from.clone(),
                    });
                    FlowMessage::Signature(signature)
                }
                Err(reason) => {
                    tracing::info!(proposer = %from, transition = %signed.id, %reason, "proposal declined");
                    observer.on_event(&FlowEvent::Declined {
                        transition: signed.id,
                        proposer: from.clone(),
                        reason: reason.clone(),
                    });
                    FlowMessage::Decline { reason }
                }
            },
            FlowMessage::Finalized(signed) => match self.record(from, &signed) {
                Ok(agreement) => {
                    observer.on_event(&FlowEvent::Recorded {
                        transition: signed.id,
                        agreement,
                        from: from.clone(),
                    });
                    FlowMessage::Ack
                }
                Err(reason) => {
                    tracing::warn!(from = %from, transition = %signed.id, %reason, "finalized transition not recorded");
                    FlowMessage::Decline { reason }
                }
            },
            FlowMessage::Notice { agreement, text } => {
                tracing::info!(from = %from, %text, "notice received");
                observer.on_event(&FlowEvent::NoticeReceived {
                    from: from.clone(),
                    agreement,
                    text,
                });
                FlowMessage::Ack
            }
            other => FlowMessage::Decline {
                reason: format!("unexpected {} message", other.kind()),
            },
        }
    }

    fn endorse(&self, from: &Party, signed: &SignedTransition) -> Result<TransitionSignature, String> {
        let me = self.ctx.me();
        let tx = &signed.transition;
        signed.verify_partial().map_err(|e| e.to_string())?;
        if tx.proposer != from.key || !signed.signed_keys().contains(&from.key) {
            return Err("proposal is not signed by the party proposing it".into());
        }
        verify_transition(tx).map_err(|e| e.to_string())?;
        if !tx.command.signers.contains(&me.key) {
            return Err(format!("{} is not a declared signer", me.name));
        }
        if let Some(input) = tx.inputs.first() {
            let held = self
                .ctx
                .services()
                .vault
                .current(&input.state.id)
                .map_err(|e| format!("consumed version unknown here: {e}"))?;
            if &held != input {
                return Err(format!(
                    "consumed version {} does not match the held version {}",
                    input.reference, held.reference
                ));
            }
        }
        Ok(self.ctx.endorse(signed))
    }

    fn record(&self, from: &Party, signed: &SignedTransition) -> Result<AgreementId, String> {
        let tx = &signed.transition;
        signed.verify_signatures().map_err(|e| e.to_string())?;
        verify_transition(tx).map_err(|e| e.to_string())?;
        if !tx.participant_keys().contains(&from.key) {
            return Err(format!("{} is not a participant", from.name));
        }
        if !tx.participant_keys().contains(&self.ctx.me().key) {
            return Err(format!("{} is not a participant", self.ctx.me().name));
        }
        let agreement = tx
            .agreement()
            .map(|a| a.id)
            .ok_or_else(|| "transition names no agreement".to_string())?;
        let change = VersionChange {
            transition: signed.id,
            consumed: tx.consumed().copied(),
            produced: tx.produced().into_iter().next(),
            recorded_at: self.ctx.services().clock.now(),
        };
        self.ctx
            .services()
            .vault
            .record(&change)
            .map_err(|e| e.to_string())?;
        tracing::info!(from = %from, transition = %signed.id, agreement = %agreement, "transition recorded");
        Ok(agreement)
    }
}
