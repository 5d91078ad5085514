use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn ed25519_sign_bench(c: &mut Criterion) {
    let kp = ehr_crypto::generate_keypair();
    let msg = [42u8; 256];

    c.bench_function("ed25519_sign_256B", |b| {
        b.iter(|| ehr_crypto::sign_message(black_box(&msg), &kp.private))
    });
}

fn ed25519_verify_bench(c: &mut Criterion) {
    let kp = ehr_crypto::generate_keypair();
    let msg = [42u8; 256];
    let sig = ehr_crypto::sign_message(&msg, &kp.private);

    c.bench_function("ed25519_verify_256B", |b| {
        b.iter(|| ehr_crypto::verify_signature(black_box(&msg), &sig, &kp.public))
    });
}

fn hash_transition_bench(c: &mut Criterion) {
    let encoded = vec![0xABu8; 512];

    c.bench_function("hash_transition_512B", |b| {
        b.iter(|| ehr_crypto::hash_transition(black_box(&encoded)))
    });
}

fn hash_attachment_bench(c: &mut Criterion) {
    let content = vec![0xCDu8; 64 * 1024];

    c.bench_function("hash_attachment_64KB", |b| {
        b.iter(|| ehr_crypto::hash_attachment(black_box(&content)))
    });
}

criterion_group!(
    benches,
    ed25519_sign_bench,
    ed25519_verify_bench,
    hash_transition_bench,
    hash_attachment_bench,
);
criterion_main!(benches);
