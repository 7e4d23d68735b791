// Copyright (c) 2024, The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

#![expect(missing_docs)]

#[macro_use]
extern crate criterion;

use criterion::Criterion;
use rand_chacha::ChaCha12Rng;
use rand_core::{CryptoRngCore, SeedableRng};
use ringct::{
    generate_key_image,
    generate_keys_with_rng,
    KeyImage,
    MlsagSignature,
    PublicKey,
    RangeProof,
    Ring,
    RingMatrix,
    RingSignature,
    SecretKey,
};

// Parameters
const RING_SIZES: [usize; 4] = [2, 11, 16, 64];
const MLSAG_WIDTHS: [usize; 3] = [1, 2, 4];
const MLSAG_RING_SIZE: usize = 11;

// Generate an `n x m` ring with a signer row at index zero
fn generate_data<R: CryptoRngCore>(n: usize, m: usize, rng: &mut R) -> (Vec<Vec<PublicKey>>, Vec<SecretKey>, Vec<KeyImage>) {
    let signer = (0..m).map(|_| generate_keys_with_rng(rng)).collect::<Vec<_>>();

    let mut rows = vec![signer.iter().map(|(public_key, _)| *public_key).collect::<Vec<PublicKey>>()];
    for _ in 1..n {
        rows.push((0..m).map(|_| generate_keys_with_rng(rng).0).collect());
    }

    let key_images = signer
        .iter()
        .map(|(public_key, secret_key)| generate_key_image(secret_key, public_key))
        .collect();
    let secret_keys = signer.into_iter().map(|(_, secret_key)| secret_key).collect();

    (rows, secret_keys, key_images)
}

fn generate_ring_signature(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate_ring_signature");
    let mut rng = ChaCha12Rng::seed_from_u64(8675309);

    for n in RING_SIZES {
        let label = format!("Generate ring signature: n = {}", n);
        group.bench_function(&label, |b| {
            // Generate data
            let (rows, secret_keys, key_images) = generate_data(n, 1, &mut rng);
            let keys = rows.into_iter().flatten().collect::<Vec<PublicKey>>();
            let ring = Ring::new(&keys).unwrap();

            // Start the benchmark
            b.iter(|| {
                RingSignature::sign_with_rng(b"message", &ring, &key_images[0], &secret_keys[0], 0, &mut rng).unwrap();
            })
        });
    }
    group.finish();
}

fn verify_ring_signature(c: &mut Criterion) {
    let mut group = c.benchmark_group("verify_ring_signature");
    let mut rng = ChaCha12Rng::seed_from_u64(8675309);

    for n in RING_SIZES {
        let label = format!("Verify ring signature: n = {}", n);
        group.bench_function(&label, |b| {
            // Generate data
            let (rows, secret_keys, key_images) = generate_data(n, 1, &mut rng);
            let keys = rows.into_iter().flatten().collect::<Vec<PublicKey>>();
            let ring = Ring::new(&keys).unwrap();
            let signature =
                RingSignature::sign_with_rng(b"message", &ring, &key_images[0], &secret_keys[0], 0, &mut rng).unwrap();

            // Start the benchmark
            b.iter(|| {
                assert!(signature.verify(b"message", &ring));
            })
        });
    }
    group.finish();
}

fn generate_mlsag(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate_mlsag");
    let mut rng = ChaCha12Rng::seed_from_u64(8675309);

    for m in MLSAG_WIDTHS {
        let label = format!("Generate MLSAG: n = {}, m = {}", MLSAG_RING_SIZE, m);
        group.bench_function(&label, |b| {
            // Generate data
            let (rows, secret_keys, key_images) = generate_data(MLSAG_RING_SIZE, m, &mut rng);
            let ring = RingMatrix::new(&rows).unwrap();

            // Start the benchmark
            b.iter(|| {
                MlsagSignature::sign_with_rng(b"message", &ring, &key_images, &secret_keys, 0, &mut rng).unwrap();
            })
        });
    }
    group.finish();
}

fn verify_mlsag(c: &mut Criterion) {
    let mut group = c.benchmark_group("verify_mlsag");
    let mut rng = ChaCha12Rng::seed_from_u64(8675309);

    for m in MLSAG_WIDTHS {
        let label = format!("Verify MLSAG: n = {}, m = {}", MLSAG_RING_SIZE, m);
        group.bench_function(&label, |b| {
            // Generate data
            let (rows, secret_keys, key_images) = generate_data(MLSAG_RING_SIZE, m, &mut rng);
            let ring = RingMatrix::new(&rows).unwrap();
            let signature =
                MlsagSignature::sign_with_rng(b"message", &ring, &key_images, &secret_keys, 0, &mut rng).unwrap();

            // Start the benchmark
            b.iter(|| {
                assert!(signature.verify(b"message", &ring));
            })
        });
    }
    group.finish();
}

fn range_proof(c: &mut Criterion) {
    let mut group = c.benchmark_group("range_proof");
    let mut rng = ChaCha12Rng::seed_from_u64(8675309);

    group.bench_function("Generate range proof", |b| {
        b.iter(|| RangeProof::prove_with_rng(0xDEAD_BEEF, &mut rng))
    });

    let (commitment, _, proof) = RangeProof::prove_with_rng(0xDEAD_BEEF, &mut rng);
    group.bench_function("Verify range proof", |b| {
        b.iter(|| {
            assert!(proof.verify(&commitment));
        })
    });
    group.finish();
}

criterion_group! {
    name = generate;
    config = Criterion::default();
    targets = generate_ring_signature, generate_mlsag
}

criterion_group! {
    name = verify;
    config = Criterion::default();
    targets = verify_ring_signature, verify_mlsag
}

criterion_group! {
    name = range;
    config = Criterion::default();
    targets = range_proof
}

criterion_main!(generate, verify, range);
