//! Transition verification.
//!
//! Stateless and deterministic: the verdict depends on the transition alone.
//! Whether the consumed version is still current is the finality service's
//! question, not this module's.

use crate::error::ContractError;
use crate::{Intent, Transition};
use ehr_types::{Agreement, AgreementStatus, StateAndRef};

/// Decide whether `tx` is a legal agreement transition. All-or-nothing: the
/// first broken rule is reported and nothing else is judged.
pub fn verify_transition(tx: &Transition) -> Result<(), ContractError> {
    match tx.intent() {
        Intent::Create => verify_create(tx),
        Intent::Approve => verify_status_change(tx, AgreementStatus::Approved),
        Intent::Activate => verify_status_change(tx, AgreementStatus::Active),
        Intent::Reject => verify_status_change(tx, AgreementStatus::Rejected),
        Intent::Suspend => verify_status_change(tx, AgreementStatus::Suspended),
        Intent::Share => verify_share(tx),
        Intent::Delete => verify_delete(tx),
        Intent::Unrecognized(tag) => Err(ContractError::UnrecognizedIntent(tag.clone())),
    }
}

fn violation(tx: &Transition, rule: impl Into<String>) -> ContractError {
    ContractError::Violation {
        intent: tx.intent().clone(),
        rule: rule.into(),
    }
}

fn unauthorized(tx: &Transition, rule: impl Into<String>) -> ContractError {
    ContractError::Unauthorized {
        intent: tx.intent().clone(),
        rule: rule.into(),
    }
}

/// Rules shared by every known intent.
fn verify_common(tx: &Transition) -> Result<(), ContractError> {
    if tx.command.signers.is_empty() {
        return Err(unauthorized(tx, "at least one signer is required"));
    }
    if !tx.command.signers.contains(&tx.proposer) {
        return Err(unauthorized(tx, "the proposer must be among the signers"));
    }
    for input in &tx.inputs {
        if input.reference.id != input.state.id {
            return Err(violation(
                tx,
                format!(
                    "consumed reference {} does not address agreement {}",
                    input.reference, input.state.id
                ),
            ));
        }
    }
    Ok(())
}

fn single_input<'a>(tx: &'a Transition) -> Result<&'a StateAndRef, ContractError> {
    match tx.inputs.as_slice() {
        [input] => Ok(input),
        inputs => Err(violation(
            tx,
            format!("exactly one prior version must be consumed, found {}", inputs.len()),
        )),
    }
}

fn single_output<'a>(tx: &'a Transition) -> Result<&'a Agreement, ContractError> {
    match tx.outputs.as_slice() {
        [output] => Ok(output),
        outputs => Err(violation(
            tx,
            format!("exactly one version must be produced, found {}", outputs.len()),
        )),
    }
}

fn verify_create(tx: &Transition) -> Result<(), ContractError> {
    verify_common(tx)?;
    if !tx.inputs.is_empty() {
        return Err(violation(tx, "no prior version may be consumed when creating an agreement"));
    }
    let output = single_output(tx)?;
    if output.status != AgreementStatus::Pending {
        return Err(violation(
            tx,
            format!("a new agreement must be PENDING, found {}", output.status),
        ));
    }
    if output.origin == output.target {
        return Err(violation(tx, "origin and target custodians must differ"));
    }
    if !output.parties_distinct() {
        return Err(violation(tx, "origin, target and subject must be three distinct parties"));
    }
    if !tx.command.signed_only_by(&output.origin.key) {
        return Err(unauthorized(tx, "only the origin custodian may sign a creation"));
    }
    Ok(())
}

/// Approve, Activate, Reject and Suspend: the subject alone moves one
/// version to `target`, changing nothing but the status.
fn verify_status_change(tx: &Transition, target: AgreementStatus) -> Result<(), ContractError> {
    verify_common(tx)?;
    let input = single_input(tx)?;
    let output = single_output(tx)?;
    if input.state.status == target {
        return Err(violation(tx, format!("the consumed version is already {target}")));
    }
    if output.status != target {
        return Err(violation(
            tx,
            format!("the produced version must be {target}, found {}", output.status),
        ));
    }
    if !input.state.same_identity_fields(output) {
        return Err(violation(tx, "only the status may change"));
    }
    if !tx.command.signed_only_by(&input.state.subject.key) {
        return Err(unauthorized(tx, "the signers must be exactly the subject"));
    }
    Ok(())
}

fn verify_share(tx: &Transition) -> Result<(), ContractError> {
    verify_common(tx)?;
    let input = single_input(tx)?;
    let output = single_output(tx)?;
    if &input.state != output {
        return Err(violation(tx, "a share must not change the agreement"));
    }
    if !tx.command.signers.contains(&output.subject.key) {
        return Err(unauthorized(tx, "the subject must be among the signers"));
    }
    if !tx.command.signers.iter().all(|key| output.is_participant(key)) {
        return Err(unauthorized(tx, "every signer must be a participant"));
    }
    Ok(())
}

fn verify_delete(tx: &Transition) -> Result<(), ContractError> {
    verify_common(tx)?;
    let input = single_input(tx)?;
    if !tx.outputs.is_empty() {
        return Err(violation(
            tx,
            format!("a deletion produces no version, found {}", tx.outputs.len()),
        ));
    }
    if !tx.command.signers.iter().all(|key| input.state.is_participant(key)) {
        return Err(unauthorized(tx, "every signer must be a participant"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Command;
    use ehr_types::{Party, PartyName, PublicKey, StateRef, Timestamp};

    const D1: PublicKey = PublicKey([1; 32]);
    const D2: PublicKey = PublicKey([2; 32]);
    const P: PublicKey = PublicKey([3; 32]);
    const STRANGER: PublicKey = PublicKey([9; 32]);

    fn party(name: &str, key: PublicKey) -> Party {
        Party::new(PartyName::parse(name).unwrap(), key)
    }

    fn pending() -> Agreement {
        Agreement::new(
            party("Doctor D1", D1),
            party("Doctor D2", D2),
            party("Patient P", P),
            Some("n".into()),
            None,
        )
    }

    fn at_version(state: Agreement, version: u64) -> StateAndRef {
        StateAndRef {
            reference: StateRef::new(state.id, version),
            state,
        }
    }

    fn status_change(from: AgreementStatus, intent: Intent, to: AgreementStatus, signer: PublicKey) -> Transition {
        let current = at_version(pending().with_status(from), 2);
        Transition::change_status(current, intent, to, signer, [signer], Timestamp::new(5))
    }

    fn assert_violation(tx: &Transition) {
        assert!(
            matches!(verify_transition(tx), Err(ContractError::Violation { .. })),
            "expected violation, got {:?}",
            verify_transition(tx)
        );
    }

    fn assert_unauthorized(tx: &Transition) {
        assert!(
            matches!(verify_transition(tx), Err(ContractError::Unauthorized { .. })),
            "expected unauthorized, got {:?}",
            verify_transition(tx)
        );
    }

    // Create

    #[test]
    fn test_create_valid() {
        let tx = Transition::create(pending(), Timestamp::new(1));
        assert!(verify_transition(&tx).is_ok());
    }

    #[test]
    fn test_create_origin_equals_target() {
        let mut agreement = pending();
        agreement.target = party("Doctor D1 again", D1);
        let tx = Transition::create(agreement, Timestamp::new(1));
        assert_violation(&tx);
    }

    #[test]
    fn test_create_subject_equals_custodian() {
        let mut agreement = pending();
        agreement.subject = party("Patient is D2", D2);
        assert_violation(&Transition::create(agreement, Timestamp::new(1)));
    }

    #[test]
    fn test_create_with_prior_version() {
        let mut tx = Transition::create(pending(), Timestamp::new(1));
        tx.inputs.push(at_version(pending(), 1));
        assert_violation(&tx);
    }

    #[test]
    fn test_create_non_pending_output() {
        let tx = Transition::create(pending().with_status(AgreementStatus::Active), Timestamp::new(1));
        assert_violation(&tx);
    }

    #[test]
    fn test_create_two_outputs() {
        let mut tx = Transition::create(pending(), Timestamp::new(1));
        tx.outputs.push(pending());
        assert_violation(&tx);
    }

    #[test]
    fn test_create_signed_by_subject() {
        let mut tx = Transition::create(pending(), Timestamp::new(1));
        tx.command = Command::new(Intent::Create, [P]);
        tx.proposer = P;
        assert_unauthorized(&tx);
    }

    #[test]
    fn test_create_extra_signer() {
        let mut tx = Transition::create(pending(), Timestamp::new(1));
        tx.command = Command::new(Intent::Create, [D1, D2]);
        assert_unauthorized(&tx);
    }

    // Status changes

    #[test]
    fn test_activate_valid() {
        let tx = status_change(AgreementStatus::Pending, Intent::Activate, AgreementStatus::Active, P);
        assert!(verify_transition(&tx).is_ok());
    }

    #[test]
    fn test_activate_signed_by_target() {
        let tx = status_change(AgreementStatus::Pending, Intent::Activate, AgreementStatus::Active, D2);
        assert_unauthorized(&tx);
    }

    #[test]
    fn test_activate_with_extra_signer() {
        let mut tx = status_change(AgreementStatus::Pending, Intent::Activate, AgreementStatus::Active, P);
        tx.command.signers.insert(D1);
        assert_unauthorized(&tx);
    }

    #[test]
    fn test_activate_already_active() {
        let tx = status_change(AgreementStatus::Active, Intent::Activate, AgreementStatus::Active, P);
        assert_violation(&tx);
    }

    #[test]
    fn test_reject_cannot_produce_active() {
        let tx = status_change(AgreementStatus::Pending, Intent::Reject, AgreementStatus::Active, P);
        assert_violation(&tx);
    }

    #[test]
    fn test_approve_produces_approved() {
        let ok = status_change(AgreementStatus::Pending, Intent::Approve, AgreementStatus::Approved, P);
        assert!(verify_transition(&ok).is_ok());
        let loose = status_change(AgreementStatus::Pending, Intent::Approve, AgreementStatus::Suspended, P);
        assert_violation(&loose);
    }

    #[test]
    fn test_suspend_then_reactivate() {
        let suspend = status_change(AgreementStatus::Active, Intent::Suspend, AgreementStatus::Suspended, P);
        assert!(verify_transition(&suspend).is_ok());
        let reactivate = status_change(AgreementStatus::Suspended, Intent::Activate, AgreementStatus::Active, P);
        assert!(verify_transition(&reactivate).is_ok());
    }

    #[test]
    fn test_status_change_must_preserve_parties() {
        let mut tx = status_change(AgreementStatus::Pending, Intent::Activate, AgreementStatus::Active, P);
        tx.outputs[0].target = party("Doctor D3", PublicKey([4; 32]));
        assert_violation(&tx);
    }

    #[test]
    fn test_status_change_must_preserve_note() {
        let mut tx = status_change(AgreementStatus::Pending, Intent::Suspend, AgreementStatus::Suspended, P);
        tx.outputs[0].note = None;
        assert_violation(&tx);
    }

    #[test]
    fn test_status_change_without_input() {
        let mut tx = status_change(AgreementStatus::Pending, Intent::Activate, AgreementStatus::Active, P);
        tx.inputs.clear();
        assert_violation(&tx);
    }

    #[test]
    fn test_consumed_reference_must_match_state() {
        let mut tx = status_change(AgreementStatus::Pending, Intent::Activate, AgreementStatus::Active, P);
        tx.inputs[0].reference = StateRef::new(pending().id, 2);
        assert_violation(&tx);
    }

    // Share

    fn share(signers: &[PublicKey]) -> Transition {
        let current = at_version(pending().with_status(AgreementStatus::Active), 3);
        Transition::share(current, signers[0], signers.iter().copied(), Timestamp::new(7))
    }

    #[test]
    fn test_share_valid() {
        assert!(verify_transition(&share(&[P, D2])).is_ok());
    }

    #[test]
    fn test_share_without_subject() {
        assert_unauthorized(&share(&[D1, D2]));
    }

    #[test]
    fn test_share_with_outsider() {
        assert_unauthorized(&share(&[P, STRANGER]));
    }

    #[test]
    fn test_share_must_not_change_content() {
        let mut tx = share(&[P, D2]);
        tx.outputs[0].status = AgreementStatus::Suspended;
        assert_violation(&tx);
    }

    #[test]
    fn test_share_without_input_cannot_issue_an_agreement() {
        let mut issued = pending().with_status(AgreementStatus::Active);
        issued.target = party("Doctor D1 again", D1);
        let mut tx = share(&[P]);
        tx.inputs.clear();
        tx.outputs = vec![issued];
        assert_violation(&tx);
    }

    #[test]
    fn test_share_with_two_inputs() {
        let mut tx = share(&[P, D2]);
        tx.inputs.push(tx.inputs[0].clone());
        assert_violation(&tx);
    }

    #[test]
    fn test_share_without_output() {
        let mut tx = share(&[P, D2]);
        tx.outputs.clear();
        assert_violation(&tx);
    }

    // Delete

    fn delete(signers: &[PublicKey]) -> Transition {
        let current = at_version(pending().with_status(AgreementStatus::Active), 3);
        Transition::delete(current, signers[0], signers.iter().copied(), Timestamp::new(8))
    }

    #[test]
    fn test_delete_valid() {
        assert!(verify_transition(&delete(&[D1, P])).is_ok());
    }

    #[test]
    fn test_delete_with_output() {
        let mut tx = delete(&[D1, P]);
        tx.outputs.push(pending());
        assert_violation(&tx);
    }

    #[test]
    fn test_delete_without_input() {
        let mut tx = delete(&[D1, P]);
        tx.inputs.clear();
        assert_violation(&tx);
    }

    #[test]
    fn test_delete_by_outsider() {
        assert_unauthorized(&delete(&[STRANGER]));
    }

    // Common

    #[test]
    fn test_unrecognized_intent() {
        let mut tx = status_change(AgreementStatus::Pending, Intent::Activate, AgreementStatus::Active, P);
        tx.command.intent = Intent::Unrecognized("transfer".into());
        assert_eq!(
            verify_transition(&tx),
            Err(ContractError::UnrecognizedIntent("transfer".into()))
        );
    }

    #[test]
    fn test_empty_signer_set() {
        let mut tx = delete(&[D1]);
        tx.command.signers.clear();
        assert_unauthorized(&tx);
    }

    #[test]
    fn test_proposer_must_sign() {
        let mut tx = share(&[P, D2]);
        tx.proposer = D1;
        assert_unauthorized(&tx);
    }
}
