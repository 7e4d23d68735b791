// Copyright (c) 2024, The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use curve25519_dalek::{EdwardsPoint, Scalar};
use sha3::{Digest, Keccak256};

/// Hash arbitrary data with `cn_fast_hash`.
///
/// This is Keccak-256 with the original Keccak padding (not SHA3-256), which equals the first 32 bytes of the
/// Keccak-1600 state after absorbing `data`.
pub fn cn_fast_hash(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// Hash arbitrary data to a scalar by reducing its `cn_fast_hash` digest modulo the group order.
pub fn hash_to_scalar(data: &[u8]) -> Scalar {
    Scalar::from_bytes_mod_order(cn_fast_hash(data))
}

/// Hash a 32-byte key to a group element.
///
/// The `cn_fast_hash` digest of `key` is mapped to a curve point and then multiplied by the cofactor, so the result
/// always lies in the prime-order subgroup. This is the base used for key images.
pub fn hash_to_ec(key: &[u8; 32]) -> EdwardsPoint {
    monero_generators::hash_to_point(*key)
}

/// An incremental hasher producing challenge scalars.
///
/// Feeding data in several `update` calls is equivalent to calling [`hash_to_scalar`] on the concatenation, without
/// building the preimage buffer.
#[derive(Clone, Default)]
pub struct ChallengeHasher {
    hasher: Keccak256,
}

impl ChallengeHasher {
    /// Start a new challenge.
    pub fn new() -> Self {
        Self::default()
    }

    /// Absorb more data.
    pub fn update(&mut self, data: &[u8]) -> &mut Self {
        Digest::update(&mut self.hasher, data);
        self
    }

    /// Absorb the encoding of a group element.
    pub fn update_point(&mut self, point: &EdwardsPoint) -> &mut Self {
        self.update(point.compress().as_bytes())
    }

    /// Finish the hash and reduce it to a scalar.
    pub fn finalize(self) -> Scalar {
        Scalar::from_bytes_mod_order(self.hasher.finalize().into())
    }
}
