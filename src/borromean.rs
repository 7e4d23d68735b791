// Copyright (c) 2024, The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use alloc::vec::Vec;

#[cfg(feature = "borsh")]
use borsh::{BorshDeserialize, BorshSerialize};
use curve25519_dalek::{EdwardsPoint, Scalar};
use itertools::izip;
#[cfg(feature = "rand")]
use rand_core::OsRng;
use rand_core::CryptoRngCore;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use snafu::prelude::*;
use subtle::{Choice, ConditionallySelectable, ConstantTimeEq};
use tracing::debug;
use zeroize::Zeroizing;

use crate::{
    domains::TRANSCRIPT_BORROMEAN,
    hash::ChallengeHasher,
    transcript::NonceTranscript,
    util::{read_scalar, SERIALIZED_BYTES},
};

/// Errors that can arise relating to [`BorromeanSignature`].
#[derive(Debug, Eq, PartialEq, Snafu)]
pub enum BorromeanError {
    /// An invalid parameter was provided.
    #[snafu(display("Invalid parameter: {reason}"))]
    InvalidParameter {
        /// The reason for the parameter error.
        reason: &'static str,
    },
    /// Signature deserialization failed.
    #[snafu(display("Signature deserialization failed"))]
    FailedDeserialization,
}

/// A Borromean ring signature over a collection of two-member rings.
///
/// Ring `i` has members `P1[i]` and `P2[i]`, and the signer knows the discrete logarithm of one of them.
/// All rings share the single challenge `ee`.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct BorromeanSignature {
    s0: Vec<Scalar>,
    s1: Vec<Scalar>,
    ee: Scalar,
}

// Hash a single point to a scalar
fn hash_point(point: &EdwardsPoint) -> Scalar {
    let mut hasher = ChallengeHasher::new();
    hasher.update_point(point);
    hasher.finalize()
}

impl BorromeanSignature {
    /// Generate a [`BorromeanSignature`] using the operating system's random number generator.
    ///
    /// For each ring `i`, `x[i]` must be the discrete logarithm of `p2[i]` if `indices[i]` is set, and of `p1[i]`
    /// otherwise. If this is not the case, or the inputs have differing or zero lengths, returns a [`BorromeanError`].
    #[cfg(feature = "rand")]
    pub fn generate(
        x: &[Scalar],
        p1: &[EdwardsPoint],
        p2: &[EdwardsPoint],
        indices: &[Choice],
    ) -> Result<Self, BorromeanError> {
        Self::generate_with_rng(x, p1, p2, indices, &mut OsRng)
    }

    /// Generate a [`BorromeanSignature`] using a [`CryptoRngCore`] random number generator `rng`.
    ///
    /// For each ring `i`, `x[i]` must be the discrete logarithm of `p2[i]` if `indices[i]` is set, and of `p1[i]`
    /// otherwise. If this is not the case, or the inputs have differing or zero lengths, returns a [`BorromeanError`].
    ///
    /// The indices are secret, so generation runs the same operations whichever ring members they select.
    pub fn generate_with_rng<R: CryptoRngCore>(
        x: &[Scalar],
        p1: &[EdwardsPoint],
        p2: &[EdwardsPoint],
        indices: &[Choice],
        rng: &mut R,
    ) -> Result<Self, BorromeanError> {
        let n = x.len();
        if n == 0 {
            return Err(BorromeanError::InvalidParameter {
                reason: "there must be at least one ring",
            });
        }
        if p1.len() != n || p2.len() != n || indices.len() != n {
            return Err(BorromeanError::InvalidParameter {
                reason: "input lengths must match",
            });
        }

        // Each secret must open its selected ring member
        let mut valid = Choice::from(1);
        for (x, p1, p2, index) in izip!(x, p1, p2, indices) {
            let selected = EdwardsPoint::conditional_select(p1, p2, *index);
            valid &= EdwardsPoint::mul_base(x).ct_eq(&selected);
        }
        if !bool::from(valid) {
            return Err(BorromeanError::InvalidParameter {
                reason: "secret does not match the selected ring member",
            });
        }

        Ok(Self::generate_unchecked(x, p1, p2, indices, rng))
    }

    /// Generate a [`BorromeanSignature`] without checking the secrets or lengths.
    ///
    /// Mismatched secrets produce a signature that does not verify.
    #[allow(non_snake_case)]
    pub(crate) fn generate_unchecked<R: CryptoRngCore>(
        x: &[Scalar],
        p1: &[EdwardsPoint],
        p2: &[EdwardsPoint],
        indices: &[Choice],
        rng: &mut R,
    ) -> Self {
        let n = x.len();

        let statement = p1
            .iter()
            .chain(p2)
            .map(|point| point.compress().to_bytes())
            .collect::<Vec<[u8; 32]>>();
        let witness = x.iter().collect::<Vec<&Scalar>>();
        let mut transcript = NonceTranscript::new(
            TRANSCRIPT_BORROMEAN,
            &[],
            statement.iter().map(|bytes| bytes.as_slice()),
            &witness,
            rng,
        );

        // Start each ring at the signer's member; both legs are always computed and one is selected
        let mut alpha = Zeroizing::new(Vec::<Scalar>::with_capacity(n));
        let mut s0 = alloc::vec![Scalar::ZERO; n];
        let mut s1 = alloc::vec![Scalar::ZERO; n];
        let mut hasher = ChallengeHasher::new();
        for i in 0..n {
            alpha.push(transcript.random_scalar());
            s1[i] = transcript.random_scalar();

            let L = EdwardsPoint::mul_base(&alpha[i]);
            let L1_decoy = EdwardsPoint::mul_base(&s1[i]) + hash_point(&L) * p2[i];
            let L1 = EdwardsPoint::conditional_select(&L1_decoy, &L, indices[i]);
            hasher.update_point(&L1);
        }
        let ee = hasher.finalize();

        // Close each ring at the signer's member
        for i in 0..n {
            let s0_decoy = transcript.random_scalar();
            let c = hash_point(&(EdwardsPoint::mul_base(&s0_decoy) + ee * p1[i]));

            let s0_closed = alpha[i] - x[i] * ee;
            let s1_closed = alpha[i] - x[i] * c;
            s0[i] = Scalar::conditional_select(&s0_closed, &s0_decoy, indices[i]);
            s1[i].conditional_assign(&s1_closed, indices[i]);
        }

        Self { s0, s1, ee }
    }

    /// Verify a [`BorromeanSignature`] against the ring members `p1` and `p2`.
    ///
    /// Returns `true` only if every ring closes under the shared challenge.
    #[allow(non_snake_case)]
    pub fn verify(&self, p1: &[EdwardsPoint], p2: &[EdwardsPoint]) -> bool {
        let n = self.s0.len();
        if n == 0 {
            debug!("Rejected Borromean signature: there are no rings");
            return false;
        }
        if self.s1.len() != n || p1.len() != n || p2.len() != n {
            debug!(
                rings = n,
                p1 = p1.len(),
                p2 = p2.len(),
                "Rejected Borromean signature: input lengths do not match"
            );
            return false;
        }

        let mut hasher = ChallengeHasher::new();
        for (s0, s1, p1, p2) in izip!(&self.s0, &self.s1, p1, p2) {
            let c = hash_point(&EdwardsPoint::vartime_double_scalar_mul_basepoint(&self.ee, p1, s0));
            let L1 = EdwardsPoint::vartime_double_scalar_mul_basepoint(&c, p2, s1);
            hasher.update_point(&L1);
        }

        let result = bool::from(hasher.finalize().ct_eq(&self.ee));
        if !result {
            debug!(rings = n, "Rejected Borromean signature: challenge does not match");
        }

        result
    }

    /// Get the number of rings.
    pub fn len(&self) -> usize {
        self.s0.len()
    }

    /// Check whether there are no rings.
    pub fn is_empty(&self) -> bool {
        self.s0.is_empty()
    }

    /// Serialize a [`BorromeanSignature`] to a canonical byte vector.
    ///
    /// The encoding is `s0[0..n] || s1[0..n] || ee`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity((2 * self.s0.len() + 1) * SERIALIZED_BYTES);
        for s in self.s0.iter().chain(&self.s1).chain(core::iter::once(&self.ee)) {
            result.extend_from_slice(s.as_bytes());
        }

        result
    }

    /// Deserialize a [`BorromeanSignature`] from a canonical byte slice.
    ///
    /// The number of rings is inferred from the length. If `bytes` is not a canonical encoding of a signature with at
    /// least one ring, returns a [`BorromeanError`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, BorromeanError> {
        if bytes.len() % SERIALIZED_BYTES != 0 {
            return Err(BorromeanError::FailedDeserialization);
        }
        let count = bytes.len() / SERIALIZED_BYTES;
        if count < 3 || count % 2 == 0 {
            return Err(BorromeanError::FailedDeserialization);
        }
        let n = count / 2;

        let mut scalars = bytes
            .chunks_exact(SERIALIZED_BYTES)
            .map(|chunk| read_scalar(chunk).ok_or(BorromeanError::FailedDeserialization))
            .collect::<Result<Vec<Scalar>, BorromeanError>>()?;
        let ee = scalars.pop().ok_or(BorromeanError::FailedDeserialization)?;
        let s1 = scalars.split_off(n);

        Ok(Self { s0: scalars, s1, ee })
    }
}

#[cfg(feature = "borsh")]
impl BorshSerialize for BorromeanSignature {
    fn serialize<W: borsh::io::Write>(&self, writer: &mut W) -> borsh::io::Result<()> {
        let signature_bytes = self.to_bytes();
        BorshSerialize::serialize(&signature_bytes, writer)
    }
}

#[cfg(feature = "borsh")]
impl BorshDeserialize for BorromeanSignature {
    fn deserialize_reader<R: borsh::io::Read>(reader: &mut R) -> borsh::io::Result<Self> {
        let signature_bytes: Vec<u8> = BorshDeserialize::deserialize_reader(reader)?;
        Self::from_bytes(&signature_bytes)
            .map_err(|_| borsh::io::Error::new(borsh::io::ErrorKind::InvalidData, "Failed to deserialize"))
    }
}
