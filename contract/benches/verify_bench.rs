use criterion::{black_box, criterion_group, criterion_main, Criterion};

use ehr_contract::{verify_transition, Intent, SignedTransition, Transition};
use ehr_crypto::keypair_from_seed;
use ehr_types::{Agreement, AgreementStatus, Party, PartyName, Timestamp};

fn sample() -> (Transition, ehr_types::KeyPair) {
    let subject = keypair_from_seed(&[3; 32]);
    let party = |name: &str, seed: u8| {
        Party::new(PartyName::parse(name).unwrap(), keypair_from_seed(&[seed; 32]).public)
    };
    let agreement = Agreement::new(
        party("Doctor D1", 1),
        party("Doctor D2", 2),
        Party::new(PartyName::parse("Patient P").unwrap(), subject.public),
        Some("referral".into()),
        None,
    );
    let current = Transition::create(agreement, Timestamp::new(1)).produced().remove(0);
    let tx = Transition::change_status(
        current,
        Intent::Activate,
        AgreementStatus::Active,
        subject.public,
        [subject.public],
        Timestamp::new(2),
    );
    (tx, subject)
}

fn verify_transition_bench(c: &mut Criterion) {
    let (tx, _) = sample();

    c.bench_function("verify_activate", |b| {
        b.iter(|| verify_transition(black_box(&tx)))
    });
}

fn sign_transition_bench(c: &mut Criterion) {
    let (tx, subject) = sample();

    c.bench_function("sign_activate", |b| {
        b.iter(|| SignedTransition::signed_by(black_box(tx.clone()), &subject))
    });
}

fn verify_signatures_bench(c: &mut Criterion) {
    let (tx, subject) = sample();
    let signed = SignedTransition::signed_by(tx, &subject).unwrap();

    c.bench_function("verify_signatures_activate", |b| {
        b.iter(|| black_box(&signed).verify_signatures())
    });
}

criterion_group!(
    benches,
    verify_transition_bench,
    sign_transition_bench,
    verify_signatures_bench,
);
criterion_main!(benches);
