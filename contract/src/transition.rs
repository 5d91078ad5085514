//! Proposed agreement transitions.

use crate::{ContractError, Intent};
use ehr_crypto::hash_transition;
use ehr_types::{Agreement, AgreementStatus, PublicKey, StateAndRef, StateRef, Timestamp, TransitionId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Declared intent plus the keys that must endorse the transition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub intent: Intent,
    pub signers: BTreeSet<PublicKey>,
}

impl Command {
    pub fn new(intent: Intent, signers: impl IntoIterator<Item = PublicKey>) -> Self {
        Self {
            intent,
            signers: signers.into_iter().collect(),
        }
    }

    /// Whether the signer set is exactly `{key}`.
    pub fn signed_only_by(&self, key: &PublicKey) -> bool {
        self.signers.len() == 1 && self.signers.contains(key)
    }
}

/// A proposed state change: the versions it consumes, the versions it
/// produces, and the command authorizing it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub inputs: Vec<StateAndRef>,
    pub outputs: Vec<Agreement>,
    pub command: Command,
    /// Party that built the proposal and drives signature collection.
    pub proposer: PublicKey,
    pub timestamp: Timestamp,
}

impl Transition {
    /// Issue a new agreement. The origin custodian proposes and is the only signer.
    pub fn create(agreement: Agreement, timestamp: Timestamp) -> Self {
        let origin = agreement.origin.key;
        Self {
            inputs: Vec::new(),
            outputs: vec![agreement],
            command: Command::new(Intent::Create, [origin]),
            proposer: origin,
            timestamp,
        }
    }

    /// Move the current version to `status`, endorsed by `signers`.
    pub fn change_status(
        current: StateAndRef,
        intent: Intent,
        status: AgreementStatus,
        proposer: PublicKey,
        signers: impl IntoIterator<Item = PublicKey>,
        timestamp: Timestamp,
    ) -> Self {
        let output = current.state.with_status(status);
        Self {
            inputs: vec![current],
            outputs: vec![output],
            command: Command::new(intent, signers),
            proposer,
            timestamp,
        }
    }

    /// Re-issue the current version unchanged so every signer holds it.
    pub fn share(
        current: StateAndRef,
        proposer: PublicKey,
        signers: impl IntoIterator<Item = PublicKey>,
        timestamp: Timestamp,
    ) -> Self {
        let output = current.state.clone();
        Self {
            inputs: vec![current],
            outputs: vec![output],
            command: Command::new(Intent::Share, signers),
            proposer,
            timestamp,
        }
    }

    /// Retire the current version without producing a successor.
    pub fn delete(
        current: StateAndRef,
        proposer: PublicKey,
        signers: impl IntoIterator<Item = PublicKey>,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            inputs: vec![current],
            outputs: Vec::new(),
            command: Command::new(Intent::Delete, signers),
            proposer,
            timestamp,
        }
    }

    pub fn intent(&self) -> &Intent {
        &self.command.intent
    }

    /// Canonical encoding that ids and signatures are computed over.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, ContractError> {
        bincode::serialize(self).map_err(|e| ContractError::Encoding(e.to_string()))
    }

    pub fn id(&self) -> Result<TransitionId, ContractError> {
        Ok(hash_transition(&self.canonical_bytes()?))
    }

    /// The single version this transition consumes, if any.
    pub fn consumed(&self) -> Option<&StateRef> {
        self.inputs.first().map(|input| &input.reference)
    }

    /// The agreement this transition is about.
    pub fn agreement(&self) -> Option<&Agreement> {
        self.outputs
            .first()
            .or_else(|| self.inputs.first().map(|input| &input.state))
    }

    /// Produced versions with the addresses they will live at once committed.
    ///
    /// A successor takes the next version number of the version it consumes;
    /// a version produced from nothing starts at [`StateRef::FIRST_VERSION`].
    pub fn produced(&self) -> Vec<StateAndRef> {
        self.outputs
            .iter()
            .map(|output| {
                let reference = match self
                    .inputs
                    .iter()
                    .find(|input| input.state.id == output.id)
                {
                    Some(input) => input.reference.next(),
                    None => StateRef::new(output.id, StateRef::FIRST_VERSION),
                };
                StateAndRef {
                    state: output.clone(),
                    reference,
                }
            })
            .collect()
    }

    /// Every party key that should hold the outcome of this transition.
    pub fn participant_keys(&self) -> BTreeSet<PublicKey> {
        self.inputs
            .iter()
            .map(|input| &input.state)
            .chain(self.outputs.iter())
            .flat_map(|agreement| agreement.participants().map(|p| p.key))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ehr_types::{Party, PartyName};

    fn party(name: &str, byte: u8) -> Party {
        Party::new(PartyName::parse(name).unwrap(), PublicKey([byte; 32]))
    }

    fn pending() -> Agreement {
        Agreement::new(party("Doctor D1", 1), party("Doctor D2", 2), party("Patient P", 3), None, None)
    }

    #[test]
    fn create_is_signed_by_origin() {
        let tx = Transition::create(pending(), Timestamp::new(10));
        assert!(tx.command.signed_only_by(&PublicKey([1; 32])));
        assert_eq!(tx.proposer, PublicKey([1; 32]));
        assert!(tx.consumed().is_none());
    }

    #[test]
    fn produced_versions_follow_consumed_ones() {
        let agreement = pending();
        let created = Transition::create(agreement.clone(), Timestamp::new(10));
        let first = created.produced();
        assert_eq!(first[0].reference.version, StateRef::FIRST_VERSION);

        let activate = Transition::change_status(
            first[0].clone(),
            Intent::Activate,
            AgreementStatus::Active,
            PublicKey([3; 32]),
            [PublicKey([3; 32])],
            Timestamp::new(11),
        );
        let second = activate.produced();
        assert_eq!(second[0].reference, first[0].reference.next());
        assert_eq!(second[0].state.status, AgreementStatus::Active);
    }

    #[test]
    fn delete_produces_nothing() {
        let current = Transition::create(pending(), Timestamp::new(1)).produced().remove(0);
        let tx = Transition::delete(current, PublicKey([1; 32]), [PublicKey([1; 32])], Timestamp::new(2));
        assert!(tx.produced().is_empty());
        assert_eq!(tx.agreement().map(|a| a.status), Some(AgreementStatus::Pending));
    }

    #[test]
    fn id_depends_on_content() {
        let a = Transition::create(pending(), Timestamp::new(10));
        let mut b = a.clone();
        assert_eq!(a.id().unwrap(), b.id().unwrap());
        b.timestamp = Timestamp::new(11);
        assert_ne!(a.id().unwrap(), b.id().unwrap());
    }

    #[test]
    fn participant_keys_cover_all_roles() {
        let tx = Transition::create(pending(), Timestamp::new(1));
        let keys = tx.participant_keys();
        assert_eq!(keys.len(), 3);
        assert!(keys.contains(&PublicKey([2; 32])));
    }
}
