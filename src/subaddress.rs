// Copyright (c) 2024, The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use curve25519_dalek::Scalar;

use crate::{
    domains::SUBADDRESS_PREFIX,
    hash::ChallengeHasher,
    keys::{KeyError, PublicKey, SecretKey},
    ops::{add_keys_mult_base, scalar_mult},
};

/// The index of a subaddress, as a `(major, minor)` pair.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct SubaddressIndex {
    major: u32,
    minor: u32,
}

impl SubaddressIndex {
    /// Generate a new [`SubaddressIndex`].
    pub fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Get the major index.
    pub fn get_major(&self) -> u32 {
        self.major
    }

    /// Get the minor index.
    pub fn get_minor(&self) -> u32 {
        self.minor
    }

    /// Get the encoding `major || minor`, each as a little-endian 32-bit integer.
    pub fn to_bytes(&self) -> [u8; 8] {
        let mut bytes = [0u8; 8];
        bytes[..4].copy_from_slice(&self.major.to_le_bytes());
        bytes[4..].copy_from_slice(&self.minor.to_le_bytes());

        bytes
    }
}

/// Compute the subaddress offset `m = Hs("SubAddr\0" || a || major || minor)` for the view key `a`.
pub fn subaddress_m(a: &SecretKey, index: &SubaddressIndex) -> Scalar {
    let mut hasher = ChallengeHasher::new();
    hasher
        .update(SUBADDRESS_PREFIX)
        .update(a.as_bytes())
        .update(&index.to_bytes());

    hasher.finalize()
}

/// Compute the subaddress spend key `D = B + m*G`.
///
/// If `B` is not a valid point, returns a [`KeyError`].
#[allow(non_snake_case)]
pub fn subaddress_public_spend(a: &SecretKey, B: &PublicKey, index: &SubaddressIndex) -> Result<PublicKey, KeyError> {
    add_keys_mult_base(&subaddress_m(a, index), B)
}

/// Compute the subaddress key pair `(D, C)`, where `D = B + m*G` is the spend key and `C = a*D` is the view key.
///
/// If `B` is not a valid point, returns a [`KeyError`].
#[allow(non_snake_case)]
pub fn generate_subaddress(
    a: &SecretKey,
    B: &PublicKey,
    index: &SubaddressIndex,
) -> Result<(PublicKey, PublicKey), KeyError> {
    let D = subaddress_public_spend(a, B, index)?;
    let C = scalar_mult(a.as_scalar(), &D)?;

    Ok((D, C))
}

/// Compute the one-time secret key `pre + m` for an output sent to a subaddress.
///
/// Here `pre` is the key from [`get_stealth_key`](`crate::stealth::get_stealth_key`).
pub fn subaddress_stealth_secret(pre: &SecretKey, a: &SecretKey, index: &SubaddressIndex) -> SecretKey {
    SecretKey::from_scalar(pre.as_scalar() + subaddress_m(a, index))
}
