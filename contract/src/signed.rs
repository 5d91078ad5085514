//! Transitions together with the endorsements collected for them.

use crate::{ContractError, Transition};
use ehr_crypto::{sign_message, verify_signature};
use ehr_types::{KeyPair, PublicKey, Signature, TransitionId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One party's endorsement of a transition id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionSignature {
    pub signer: PublicKey,
    pub signature: Signature,
}

/// A transition, its id, and the signatures gathered so far.
///
/// The id travels with the transition but is never trusted: every check
/// recomputes it from the content first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransition {
    pub id: TransitionId,
    pub transition: Transition,
    pub signatures: Vec<TransitionSignature>,
}

impl SignedTransition {
    /// Wrap a transition with no signatures yet.
    pub fn new(transition: Transition) -> Result<Self, ContractError> {
        let id = transition.id()?;
        Ok(Self {
            id,
            transition,
            signatures: Vec::new(),
        })
    }

    /// Wrap a transition and sign it as `keypair`.
    pub fn signed_by(transition: Transition, keypair: &KeyPair) -> Result<Self, ContractError> {
        let mut signed = Self::new(transition)?;
        let signature = signed.endorse(keypair);
        signed.add_signature(signature)?;
        Ok(signed)
    }

    /// Produce `keypair`'s signature over this transition's id without
    /// attaching it.
    pub fn endorse(&self, keypair: &KeyPair) -> TransitionSignature {
        TransitionSignature {
            signer: keypair.public,
            signature: sign_message(self.id.as_bytes(), &keypair.private),
        }
    }

    /// Attach a signature after checking it is valid and declared.
    /// A repeated signature from the same signer is ignored.
    pub fn add_signature(&mut self, signature: TransitionSignature) -> Result<(), ContractError> {
        self.check_signature(&signature)?;
        if !self.signed_keys().contains(&signature.signer) {
            self.signatures.push(signature);
        }
        Ok(())
    }

    /// Keys that have signed so far.
    pub fn signed_keys(&self) -> BTreeSet<PublicKey> {
        self.signatures.iter().map(|s| s.signer).collect()
    }

    /// Declared signers that have not signed yet.
    pub fn missing_signers(&self) -> Vec<PublicKey> {
        let signed = self.signed_keys();
        self.transition
            .command
            .signers
            .iter()
            .filter(|key| !signed.contains(key))
            .copied()
            .collect()
    }

    pub fn is_fully_signed(&self) -> bool {
        self.missing_signers().is_empty()
    }

    /// The carried id matches the content.
    pub fn check_id(&self) -> Result<(), ContractError> {
        let computed = self.transition.id()?;
        if computed != self.id {
            return Err(ContractError::IdMismatch {
                claimed: self.id.to_string(),
                computed: computed.to_string(),
            });
        }
        Ok(())
    }

    /// Every signature present is valid and from a declared signer.
    /// Signatures may still be missing.
    pub fn verify_partial(&self) -> Result<(), ContractError> {
        self.check_id()?;
        for signature in &self.signatures {
            self.check_signature(signature)?;
        }
        Ok(())
    }

    /// Every declared signer has produced a valid signature, and nobody else has.
    pub fn verify_signatures(&self) -> Result<(), ContractError> {
        self.verify_partial()?;
        if let Some(missing) = self.missing_signers().first() {
            return Err(ContractError::MissingSignature {
                signer: missing.to_string(),
                transition: self.id.to_string(),
            });
        }
        Ok(())
    }

    fn check_signature(&self, signature: &TransitionSignature) -> Result<(), ContractError> {
        if !self.transition.command.signers.contains(&signature.signer) {
            return Err(ContractError::UndeclaredSigner {
                signer: signature.signer.to_string(),
                transition: self.id.to_string(),
            });
        }
        if !verify_signature(self.id.as_bytes(), &signature.signature, &signature.signer) {
            return Err(ContractError::InvalidSignature {
                signer: signature.signer.to_string(),
                transition: self.id.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Intent;
    use ehr_crypto::keypair_from_seed;
    use ehr_types::{Agreement, AgreementStatus, Party, PartyName, Timestamp};

    struct Parties {
        origin: KeyPair,
        target: KeyPair,
        subject: KeyPair,
    }

    fn parties() -> Parties {
        Parties {
            origin: keypair_from_seed(&[1; 32]),
            target: keypair_from_seed(&[2; 32]),
            subject: keypair_from_seed(&[3; 32]),
        }
    }

    fn agreement(p: &Parties) -> Agreement {
        let party = |name: &str, kp: &KeyPair| Party::new(PartyName::parse(name).unwrap(), kp.public);
        Agreement::new(
            party("Doctor D1", &p.origin),
            party("Doctor D2", &p.target),
            party("Patient P", &p.subject),
            None,
            None,
        )
    }

    fn share(p: &Parties) -> Transition {
        let current = Transition::create(agreement(p), Timestamp::new(1)).produced().remove(0);
        let active = Transition::change_status(
            current,
            Intent::Activate,
            AgreementStatus::Active,
            p.subject.public,
            [p.subject.public],
            Timestamp::new(2),
        )
        .produced()
        .remove(0);
        Transition::share(
            active,
            p.subject.public,
            [p.subject.public, p.target.public],
            Timestamp::new(3),
        )
    }

    #[test]
    fn signing_accumulates_until_complete() {
        let p = parties();
        let mut signed = SignedTransition::signed_by(share(&p), &p.subject).unwrap();
        assert_eq!(signed.missing_signers(), vec![p.target.public]);
        assert!(signed.verify_partial().is_ok());
        assert!(matches!(
            signed.verify_signatures(),
            Err(ContractError::MissingSignature { .. })
        ));

        let countersignature = signed.endorse(&p.target);
        signed.add_signature(countersignature).unwrap();
        assert!(signed.is_fully_signed());
        assert!(signed.verify_signatures().is_ok());
    }

    #[test]
    fn undeclared_signer_is_refused() {
        let p = parties();
        let mut signed = SignedTransition::new(share(&p)).unwrap();
        let stray = signed.endorse(&p.origin);
        assert!(matches!(
            signed.add_signature(stray),
            Err(ContractError::UndeclaredSigner { .. })
        ));
    }

    #[test]
    fn forged_signature_is_refused() {
        let p = parties();
        let mut signed = SignedTransition::new(share(&p)).unwrap();
        let mut forged = signed.endorse(&p.target);
        forged.signer = p.subject.public;
        assert!(matches!(
            signed.add_signature(forged),
            Err(ContractError::InvalidSignature { .. })
        ));
    }

    #[test]
    fn tampered_content_breaks_id() {
        let p = parties();
        let mut signed = SignedTransition::signed_by(share(&p), &p.subject).unwrap();
        signed.transition.timestamp = Timestamp::new(99);
        assert!(matches!(
            signed.verify_partial(),
            Err(ContractError::IdMismatch { .. })
        ));
    }

    #[test]
    fn duplicate_signature_is_not_stored_twice() {
        let p = parties();
        let mut signed = SignedTransition::signed_by(share(&p), &p.subject).unwrap();
        let again = signed.endorse(&p.subject);
        signed.add_signature(again).unwrap();
        assert_eq!(signed.signatures.len(), 1);
    }
}
