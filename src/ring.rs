// Copyright (c) 2024, The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use alloc::vec::Vec;

use curve25519_dalek::{
    edwards::VartimeEdwardsPrecomputation,
    traits::VartimePrecomputedMultiscalarMul,
    EdwardsPoint,
    Scalar,
};
use snafu::prelude::*;

use crate::{
    domains::MIN_RING_SIZE,
    hash::hash_to_ec,
    keys::{KeyError, KeyImage, PublicKey},
};

/// Errors that can arise relating to [`Ring`] and [`RingMatrix`].
#[derive(Debug, Eq, PartialEq, Snafu)]
pub enum RingError {
    /// The ring does not have a valid shape.
    #[snafu(display("Ring size mismatch: {reason}"))]
    RingSizeMismatch {
        /// The reason for the size error.
        reason: &'static str,
    },
    /// A ring member is not a valid public key.
    #[snafu(display("Invalid ring member: {source}"), context(false))]
    InvalidKey {
        /// The underlying key error.
        source: KeyError,
    },
}

/// A ring of public keys.
///
/// A ring has at least two members, each of which decodes to a valid curve point.
/// Internally, it also contains each member's hash-to-point image, which both signing and verification need.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Ring {
    keys: Vec<PublicKey>,
    points: Vec<EdwardsPoint>,
    hashed_points: Vec<EdwardsPoint>,
}

impl Ring {
    /// Generate a new [`Ring`] from a slice of public keys.
    ///
    /// If there are fewer than two keys, or any key fails to decode, returns a [`RingError`].
    pub fn new(keys: &[PublicKey]) -> Result<Self, RingError> {
        if keys.len() < MIN_RING_SIZE {
            return Err(RingError::RingSizeMismatch {
                reason: "ring has fewer than two members",
            });
        }

        let points = keys
            .iter()
            .map(PublicKey::decompress)
            .collect::<Result<Vec<EdwardsPoint>, KeyError>>()?;
        let hashed_points = keys.iter().map(|key| hash_to_ec(key.as_bytes())).collect();

        Ok(Self {
            keys: keys.to_vec(),
            points,
            hashed_points,
        })
    }

    /// Get the public keys for this [`Ring`].
    pub fn get_keys(&self) -> &[PublicKey] {
        &self.keys
    }

    /// Get the number of members of this [`Ring`].
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// A [`Ring`] is never empty.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Get the decoded members.
    pub(crate) fn get_points(&self) -> &[EdwardsPoint] {
        &self.points
    }

    /// Get the hash-to-point images of the members.
    pub(crate) fn get_hashed_points(&self) -> &[EdwardsPoint] {
        &self.hashed_points
    }
}

/// A matrix of public keys for MLSAG.
///
/// The matrix has `n >= 2` rows, each holding the same number `m >= 1` of public keys. Every key must decode to a valid
/// curve point. Entries are stored row-major.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RingMatrix {
    n: usize,
    m: usize,
    keys: Vec<PublicKey>,
    points: Vec<EdwardsPoint>,
    hashed_points: Vec<EdwardsPoint>,
}

impl RingMatrix {
    /// Generate a new [`RingMatrix`] from rows of public keys.
    ///
    /// If there are fewer than two rows, the rows are empty or of differing lengths, or any key fails to decode, returns
    /// a [`RingError`].
    pub fn new(rows: &[Vec<PublicKey>]) -> Result<Self, RingError> {
        if rows.len() < MIN_RING_SIZE {
            return Err(RingError::RingSizeMismatch {
                reason: "ring has fewer than two rows",
            });
        }

        // Every row must match the first
        let m = rows.first().map(Vec::len).unwrap_or_default();
        if m == 0 {
            return Err(RingError::RingSizeMismatch {
                reason: "ring rows are empty",
            });
        }
        if rows.iter().any(|row| row.len() != m) {
            return Err(RingError::RingSizeMismatch {
                reason: "ring rows have differing lengths",
            });
        }

        let keys = rows.iter().flatten().copied().collect::<Vec<PublicKey>>();
        let points = keys
            .iter()
            .map(PublicKey::decompress)
            .collect::<Result<Vec<EdwardsPoint>, KeyError>>()?;
        let hashed_points = keys.iter().map(|key| hash_to_ec(key.as_bytes())).collect();

        Ok(Self {
            n: rows.len(),
            m,
            keys,
            points,
            hashed_points,
        })
    }

    /// Get the number of rows `n` of this [`RingMatrix`].
    pub fn get_n(&self) -> usize {
        self.n
    }

    /// Get the number of columns `m` of this [`RingMatrix`].
    pub fn get_m(&self) -> usize {
        self.m
    }

    /// Get a row of public keys.
    ///
    /// If `row >= n`, returns `None`.
    pub fn get_row(&self, row: usize) -> Option<&[PublicKey]> {
        self.keys.chunks_exact(self.m).nth(row)
    }

    /// Get the decoded members, row-major.
    pub(crate) fn get_points(&self) -> &[EdwardsPoint] {
        &self.points
    }

    /// Get the hash-to-point images of the members, row-major.
    pub(crate) fn get_hashed_points(&self) -> &[EdwardsPoint] {
        &self.hashed_points
    }
}

/// A key image prepared for repeated variable-time multiplication.
pub(crate) struct KeyImageTable {
    table: VartimeEdwardsPrecomputation,
}

impl KeyImageTable {
    /// Decode a key image and precompute its multiples.
    ///
    /// If the key image does not decode, or has a small-order component, returns a [`KeyError`].
    pub(crate) fn new(key_image: &KeyImage) -> Result<Self, KeyError> {
        let point = key_image.decompress()?;
        if !point.is_torsion_free() {
            return Err(KeyError::InvalidPointEncoding);
        }

        Ok(Self {
            table: VartimeEdwardsPrecomputation::new([point]),
        })
    }

    /// Compute the `(L, R)` pair `(s*G + c*P, s*Hp(P) + c*I)` for a ring member that is not the signer.
    ///
    /// This runs in variable time, so only use it with public scalars.
    #[allow(non_snake_case)]
    pub(crate) fn decoy_pair(
        &self,
        c: &Scalar,
        s: &Scalar,
        P: &EdwardsPoint,
        hashed_P: &EdwardsPoint,
    ) -> (EdwardsPoint, EdwardsPoint) {
        let L = EdwardsPoint::vartime_double_scalar_mul_basepoint(c, P, s);
        let R = self.table.vartime_mixed_multiscalar_mul([c], [s], [hashed_P]);

        (L, R)
    }
}

/// Compute the `(L, R)` pair `(a*G, a*Hp(P))` for the signer, in constant time.
#[allow(non_snake_case)]
pub(crate) fn signer_pair(alpha: &Scalar, hashed_P: &EdwardsPoint) -> (EdwardsPoint, EdwardsPoint) {
    (EdwardsPoint::mul_base(alpha), alpha * hashed_P)
}
