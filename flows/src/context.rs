//! Everything a flow needs to run on behalf of one party.

use crate::{FlowObserver, IdentityService, Notifier, SessionTransport};
use ehr_contract::{SignedTransition, Transition, TransitionSignature};
use ehr_ledger::FinalityService;
use ehr_store::AgreementStore;
use ehr_types::{Clock, KeyPair, Party};
use std::sync::Arc;
use std::time::Duration;

/// The services a party's flows are wired to.
#[derive(Clone)]
pub struct FlowServices {
    pub identity: Arc<dyn IdentityService>,
    pub transport: Arc<dyn SessionTransport>,
    pub finality: Arc<dyn FinalityService>,
    /// This party's own record of agreement versions.
    pub vault: Arc<dyn AgreementStore + Send + Sync>,
    pub notifier: Arc<dyn Notifier>,
    pub clock: Arc<dyn Clock>,
    pub observer: Arc<dyn FlowObserver>,
}

/// One party's identity and key plus its services.
///
/// Cheap to clone; every flow invocation gets its own copy.
#[derive(Clone)]
pub struct FlowContext {
    me: Party,
    keypair: Arc<KeyPair>,
    services: FlowServices,
    session_timeout: Duration,
}

impl FlowContext {
    pub fn new(me: Party, keypair: Arc<KeyPair>, services: FlowServices, session_timeout: Duration) -> Self {
        Self {
            me,
            keypair,
            services,
            session_timeout,
        }
    }

    pub fn me(&self) -> &Party {
        &self.me
    }

    pub fn services(&self) -> &FlowServices {
        &self.services
    }

    pub fn session_timeout(&self) -> Duration {
        self.session_timeout
    }

    /// Wrap `transition` and sign it as this party.
    pub fn sign(&self, transition: Transition) -> Result<SignedTransition, ehr_contract::ContractError> {
        SignedTransition::signed_by(transition, &self.keypair)
    }

    /// This party's signature over someone else's transition.
    pub fn endorse(&self, signed: &SignedTransition) -> TransitionSignature {
        signed.endorse(&self.keypair)
    }
}
