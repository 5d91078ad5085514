use proptest::prelude::*;
use proptest::sample::subsequence;

use ehr_contract::{verify_transition, ContractError, Intent, Transition};
use ehr_types::{Agreement, AgreementStatus, Party, PartyName, PublicKey, StateAndRef, StateRef, Timestamp};

const ORIGIN: PublicKey = PublicKey([1; 32]);
const TARGET: PublicKey = PublicKey([2; 32]);
const SUBJECT: PublicKey = PublicKey([3; 32]);
const OUTSIDER: PublicKey = PublicKey([4; 32]);

fn status() -> impl Strategy<Value = AgreementStatus> {
    prop_oneof![
        Just(AgreementStatus::Pending),
        Just(AgreementStatus::Approved),
        Just(AgreementStatus::Active),
        Just(AgreementStatus::Rejected),
        Just(AgreementStatus::Suspended),
    ]
}

fn status_intent() -> impl Strategy<Value = Intent> {
    prop_oneof![
        Just(Intent::Approve),
        Just(Intent::Activate),
        Just(Intent::Reject),
        Just(Intent::Suspend),
    ]
}

fn signer_set() -> impl Strategy<Value = Vec<PublicKey>> {
    subsequence(vec![ORIGIN, TARGET, SUBJECT, OUTSIDER], 1..=4)
}

fn party(byte: u8) -> Party {
    Party::new(PartyName::parse(&format!("Party {byte}")).unwrap(), PublicKey([byte; 32]))
}

fn agreement(status: AgreementStatus) -> Agreement {
    Agreement::new(party(1), party(2), party(3), Some("referral".into()), None).with_status(status)
}

fn current(status: AgreementStatus) -> StateAndRef {
    let state = agreement(status);
    StateAndRef {
        reference: StateRef::new(state.id, 4),
        state,
    }
}

proptest! {
    /// Every accepted creation names three distinct parties.
    #[test]
    fn accepted_creations_have_distinct_parties(o in 1u8..4, t in 1u8..4, s in 1u8..4) {
        let a = Agreement::new(party(o), party(t), party(s), None, None);
        let tx = Transition::create(a.clone(), Timestamp::new(1));
        if verify_transition(&tx).is_ok() {
            prop_assert!(a.parties_distinct());
        }
        if o == t {
            prop_assert!(verify_transition(&tx).is_err());
        }
    }

    /// A creation is accepted only for a PENDING output.
    #[test]
    fn creation_requires_pending(s in status()) {
        let tx = Transition::create(agreement(s), Timestamp::new(1));
        prop_assert_eq!(verify_transition(&tx).is_ok(), s == AgreementStatus::Pending);
    }

    /// Status changes are accepted only when signed by exactly the subject.
    #[test]
    fn status_changes_need_exactly_the_subject(
        from in status(),
        intent in status_intent(),
        signers in signer_set(),
    ) {
        let to = intent.target_status().unwrap();
        let tx = Transition::change_status(current(from), intent, to, signers[0], signers.clone(), Timestamp::new(2));
        let result = verify_transition(&tx);
        if signers != vec![SUBJECT] {
            prop_assert!(result.is_err());
        } else {
            prop_assert_eq!(result.is_ok(), from != to);
        }
    }

    /// A status change never yields a status other than the intent's own.
    #[test]
    fn status_changes_produce_only_their_target(from in status(), intent in status_intent(), produced in status()) {
        let tx = Transition::change_status(current(from), intent.clone(), produced, SUBJECT, [SUBJECT], Timestamp::new(2));
        if verify_transition(&tx).is_ok() {
            prop_assert_eq!(Some(produced), intent.target_status());
        }
    }

    /// Share is accepted iff the subject signs and nobody outside the agreement does.
    #[test]
    fn share_signers(signers in signer_set()) {
        let tx = Transition::share(current(AgreementStatus::Active), signers[0], signers.clone(), Timestamp::new(3));
        let expected = signers.contains(&SUBJECT) && !signers.contains(&OUTSIDER);
        prop_assert_eq!(verify_transition(&tx).is_ok(), expected);
    }

    /// A share that consumes nothing is never accepted, so it cannot stand in
    /// for a creation.
    #[test]
    fn share_without_input_is_rejected(s in status(), o in 1u8..4, t in 1u8..4, signers in signer_set()) {
        let mut issued = agreement(s);
        issued.origin = party(o);
        issued.target = party(t);
        let mut tx = Transition::share(current(AgreementStatus::Active), signers[0], signers, Timestamp::new(3));
        tx.inputs.clear();
        tx.outputs = vec![issued];
        prop_assert!(verify_transition(&tx).is_err());
    }

    /// Delete is accepted iff every signer is a participant.
    #[test]
    fn delete_signers(from in status(), signers in signer_set()) {
        let tx = Transition::delete(current(from), signers[0], signers.clone(), Timestamp::new(3));
        prop_assert_eq!(verify_transition(&tx).is_ok(), !signers.contains(&OUTSIDER));
    }

    /// Unknown tags never pass, whatever the rest of the transition looks like.
    #[test]
    fn unrecognized_tags_always_fail(tag in "[a-z]{1,12}", from in status()) {
        prop_assume!(Intent::KNOWN.iter().all(|known| known.as_str() != tag));
        let mut tx = Transition::change_status(current(from), Intent::Activate, AgreementStatus::Active, SUBJECT, [SUBJECT], Timestamp::new(2));
        tx.command.intent = Intent::from(tag.clone());
        prop_assert_eq!(verify_transition(&tx), Err(ContractError::UnrecognizedIntent(tag)));
    }

    /// Verification is a pure function of the transition.
    #[test]
    fn verdict_is_deterministic(from in status(), intent in status_intent(), signers in signer_set()) {
        let to = intent.target_status().unwrap();
        let tx = Transition::change_status(current(from), intent, to, signers[0], signers, Timestamp::new(2));
        prop_assert_eq!(verify_transition(&tx), verify_transition(&tx.clone()));
    }
}
