// Copyright (c) 2024, The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use alloc::vec::Vec;
use core::iter::empty;

#[cfg(feature = "borsh")]
use borsh::{BorshDeserialize, BorshSerialize};
use curve25519_dalek::{EdwardsPoint, Scalar};
use itertools::Itertools;
#[cfg(feature = "rand")]
use rand_core::OsRng;
use rand_core::CryptoRngCore;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use snafu::prelude::*;
use subtle::{Choice, ConditionallySelectable, ConstantTimeEq};
use tracing::{debug, trace};
use zeroize::Zeroizing;

use crate::{
    borromean::BorromeanSignature,
    commitment::{powers_of_two_H, Commitment},
    domains::{RANGE_PROOF_BITS, TRANSCRIPT_RANGE_PROOF},
    keys::KeyError,
    transcript::NonceTranscript,
    util::{read_array, SERIALIZED_BYTES},
};

/// The size of a serialized [`RangeProof`].
pub const SERIALIZED_RANGE_PROOF_BYTES: usize = (3 * RANGE_PROOF_BITS + 1) * SERIALIZED_BYTES;

/// Errors that can arise relating to [`RangeProof`].
#[derive(Debug, Eq, PartialEq, Snafu)]
pub enum RangeProofError {
    /// Proof deserialization failed.
    #[snafu(display("Proof deserialization failed"))]
    FailedDeserialization,
}

/// A Borromean range proof that a Pedersen commitment opens to a 64-bit value.
///
/// The proof commits to each bit of the value separately. Bit commitment `C_i` opens to either `0` or `2^i`, which a
/// two-member Borromean ring per bit demonstrates; the bit commitments sum to the committed value.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct RangeProof {
    bit_commitments: Vec<Commitment>,
    signature: BorromeanSignature,
}

// Commit to a single bit as `mask*G + bit*2^i*H`, in constant time
#[allow(non_snake_case)]
fn bit_commitment(mask: &Scalar, bit: Choice, H_power: &EdwardsPoint) -> EdwardsPoint {
    let mask_G = EdwardsPoint::mul_base(mask);
    EdwardsPoint::conditional_select(&mask_G, &(mask_G + H_power), bit)
}

impl RangeProof {
    /// Commit to `amount` and prove its range, using the operating system's random number generator.
    ///
    /// Returns the commitment, its mask, and the proof.
    #[cfg(feature = "rand")]
    pub fn prove(amount: u64) -> (Commitment, Zeroizing<Scalar>, Self) {
        Self::prove_with_rng(amount, &mut OsRng)
    }

    /// Commit to `amount` and prove its range, using a [`CryptoRngCore`] random number generator `rng`.
    ///
    /// Returns the commitment, its mask, and the proof.
    #[allow(non_snake_case)]
    pub fn prove_with_rng<R: CryptoRngCore>(amount: u64, rng: &mut R) -> (Commitment, Zeroizing<Scalar>, Self) {
        let amount_bytes = Zeroizing::new(amount.to_le_bytes());
        let mut transcript = NonceTranscript::new(
            TRANSCRIPT_RANGE_PROOF,
            amount_bytes.as_slice(),
            empty::<&[u8]>(),
            &[],
            rng,
        );

        let bits = (0..RANGE_PROOF_BITS)
            .map(|i| Choice::from(((amount >> i) & 1) as u8))
            .collect::<Vec<Choice>>();
        let masks = Zeroizing::new(
            (0..RANGE_PROOF_BITS)
                .map(|_| transcript.random_scalar())
                .collect::<Vec<Scalar>>(),
        );

        // Commit to each bit, and find the other ring member
        let H_powers = powers_of_two_H(RANGE_PROOF_BITS);
        let (p1, p2): (Vec<EdwardsPoint>, Vec<EdwardsPoint>) = masks
            .iter()
            .zip(&bits)
            .zip(&H_powers)
            .map(|((mask, bit), H_power)| {
                let C = bit_commitment(mask, *bit, H_power);
                (C, C - H_power)
            })
            .unzip();

        let signature = BorromeanSignature::generate_unchecked(&masks, &p1, &p2, &bits, rng);

        let mask = Zeroizing::new(masks.iter().sum::<Scalar>());
        let commitment = Commitment::from_point(&p1.iter().sum::<EdwardsPoint>());
        let proof = Self {
            bit_commitments: p1.iter().map(Commitment::from_point).collect(),
            signature,
        };

        (commitment, mask, proof)
    }

    /// Verify a [`RangeProof`] for a commitment.
    ///
    /// Returns `true` only if the bit commitments sum to `commitment` and every bit commitment opens to `0` or `2^i`.
    #[allow(non_snake_case)]
    pub fn verify(&self, commitment: &Commitment) -> bool {
        if self.bit_commitments.len() != RANGE_PROOF_BITS {
            debug!(
                bits = self.bit_commitments.len(),
                "Rejected range proof: wrong number of bit commitments"
            );
            return false;
        }

        let p1 = match self
            .bit_commitments
            .iter()
            .map(Commitment::decompress)
            .collect::<Result<Vec<EdwardsPoint>, KeyError>>()
        {
            Ok(p1) => p1,
            Err(error) => {
                debug!(%error, "Rejected range proof: invalid bit commitment");
                return false;
            },
        };

        // The bit commitments must add up to the commitment
        let sum = Commitment::from_point(&p1.iter().sum::<EdwardsPoint>());
        if !bool::from(sum.ct_eq(commitment)) {
            debug!("Rejected range proof: bit commitments do not sum to the commitment");
            return false;
        }

        let p2 = p1
            .iter()
            .zip_eq(powers_of_two_H(RANGE_PROOF_BITS))
            .map(|(C, H_power)| C - H_power)
            .collect::<Vec<EdwardsPoint>>();

        let result = self.signature.verify(&p1, &p2);
        if result {
            trace!("Verified range proof");
        } else {
            debug!("Rejected range proof: Borromean signature is invalid");
        }

        result
    }

    /// Get the bit commitments.
    pub fn get_bit_commitments(&self) -> &[Commitment] {
        &self.bit_commitments
    }

    /// Get the Borromean signature over the bit commitments.
    pub fn get_signature(&self) -> &BorromeanSignature {
        &self.signature
    }

    /// Serialize a [`RangeProof`] to a canonical byte vector.
    ///
    /// The encoding is the bit commitments followed by the Borromean signature.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(SERIALIZED_RANGE_PROOF_BYTES);
        for commitment in &self.bit_commitments {
            result.extend_from_slice(commitment.as_bytes());
        }
        result.extend(self.signature.to_bytes());

        result
    }

    /// Deserialize a [`RangeProof`] from a canonical byte slice.
    ///
    /// If `bytes` is not a canonical encoding of a range proof, returns a [`RangeProofError`].
    /// Bit commitments are not decoded until verification.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RangeProofError> {
        if bytes.len() != SERIALIZED_RANGE_PROOF_BYTES {
            return Err(RangeProofError::FailedDeserialization);
        }

        let (commitment_bytes, signature_bytes) = bytes.split_at(RANGE_PROOF_BITS * SERIALIZED_BYTES);
        let bit_commitments = commitment_bytes
            .chunks_exact(SERIALIZED_BYTES)
            .map(|chunk| {
                read_array(chunk)
                    .map(Commitment::from_bytes)
                    .ok_or(RangeProofError::FailedDeserialization)
            })
            .collect::<Result<Vec<Commitment>, RangeProofError>>()?;
        let signature =
            BorromeanSignature::from_bytes(signature_bytes).map_err(|_| RangeProofError::FailedDeserialization)?;

        Ok(Self {
            bit_commitments,
            signature,
        })
    }
}

#[cfg(feature = "borsh")]
impl BorshSerialize for RangeProof {
    fn serialize<W: borsh::io::Write>(&self, writer: &mut W) -> borsh::io::Result<()> {
        let proof_bytes = self.to_bytes();
        BorshSerialize::serialize(&proof_bytes, writer)
    }
}

#[cfg(feature = "borsh")]
impl BorshDeserialize for RangeProof {
    fn deserialize_reader<R: borsh::io::Read>(reader: &mut R) -> borsh::io::Result<Self> {
        let proof_bytes: Vec<u8> = BorshDeserialize::deserialize_reader(reader)?;
        Self::from_bytes(&proof_bytes)
            .map_err(|_| borsh::io::Error::new(borsh::io::ErrorKind::InvalidData, "Failed to deserialize"))
    }
}

#[cfg(test)]
mod test {
    use alloc::vec::Vec;

    use curve25519_dalek::{EdwardsPoint, Scalar};
    use rand_chacha::ChaCha12Rng;
    use rand_core::SeedableRng;

    use super::*;
    use crate::commitment::{commit, generator_H};

    #[test]
    fn test_completeness() {
        let mut rng = ChaCha12Rng::seed_from_u64(8675309);

        for amount in [0, 1, 2, 1 << 32, u64::from(u32::MAX), u64::MAX] {
            let (commitment, mask, proof) = RangeProof::prove_with_rng(amount, &mut rng);

            // The commitment opens to the amount
            assert_eq!(commitment, commit(&mask, amount));

            assert_eq!(proof.get_bit_commitments().len(), RANGE_PROOF_BITS);
            assert!(proof.verify(&commitment));
        }
    }

    #[test]
    #[allow(non_snake_case)]
    fn test_bit_commitment() {
        let mut rng = ChaCha12Rng::seed_from_u64(8675309);
        let H_powers = powers_of_two_H(RANGE_PROOF_BITS);

        for (i, H_power) in H_powers.iter().enumerate() {
            let mask = Scalar::random(&mut rng);
            assert_eq!(
                Commitment::from_point(&bit_commitment(&mask, Choice::from(0), H_power)),
                commit(&mask, 0)
            );
            assert_eq!(
                Commitment::from_point(&bit_commitment(&mask, Choice::from(1), H_power)),
                commit(&mask, 1 << i)
            );
        }
    }

    #[test]
    fn test_tampered_commitment() {
        let mut rng = ChaCha12Rng::seed_from_u64(8675309);
        let (commitment, mask, proof) = RangeProof::prove_with_rng(1234, &mut rng);

        // The Borromean part is still valid, but the sum is not
        assert!(!proof.verify(&commit(&mask, 1235)));
        assert!(!proof.verify(&commit(&(*mask + Scalar::ONE), 1234)));

        // Swapping two bit commitments keeps the sum but breaks the signature
        let mut evil = proof.clone();
        evil.bit_commitments.swap(0, 1);
        assert!(!evil.verify(&commitment));

        // A missing bit commitment
        let mut evil = proof.clone();
        evil.bit_commitments.pop();
        assert!(!evil.verify(&commitment));

        // An invalid bit commitment encoding
        let mut evil = proof;
        evil.bit_commitments[3] = Commitment::from_bytes(crate::keys::test::invalid_encoding());
        assert!(!evil.verify(&commitment));
    }

    #[test]
    #[allow(non_snake_case)]
    fn test_out_of_range_digit() {
        let mut rng = ChaCha12Rng::seed_from_u64(8675309);
        let H_powers = powers_of_two_H(RANGE_PROOF_BITS);

        // Commit to the digit `2` in the lowest position, which is neither `0` nor `1`
        let masks = (0..RANGE_PROOF_BITS)
            .map(|_| Scalar::random(&mut rng))
            .collect::<Vec<Scalar>>();
        let p1 = masks
            .iter()
            .enumerate()
            .map(|(i, mask)| {
                let mask_G = EdwardsPoint::mul_base(mask);
                if i == 0 {
                    mask_G + generator_H() + generator_H()
                } else {
                    mask_G
                }
            })
            .collect::<Vec<EdwardsPoint>>();
        let p2 = p1
            .iter()
            .zip(&H_powers)
            .map(|(C, H_power)| C - H_power)
            .collect::<Vec<EdwardsPoint>>();
        let commitment = Commitment::from_point(&p1.iter().sum::<EdwardsPoint>());
        assert_eq!(commitment, commit(&masks.iter().sum::<Scalar>(), 2));

        // Whichever member we claim, we don't know its discrete logarithm
        for claim in [0u8, 1] {
            let mut bits = alloc::vec![Choice::from(0); RANGE_PROOF_BITS];
            bits[0] = Choice::from(claim);
            let proof = RangeProof {
                bit_commitments: p1.iter().map(Commitment::from_point).collect(),
                signature: BorromeanSignature::generate_unchecked(&masks, &p1, &p2, &bits, &mut rng),
            };

            assert!(!proof.verify(&commitment));
        }
    }

    #[test]
    fn test_serialization() {
        let mut rng = ChaCha12Rng::seed_from_u64(8675309);
        let (commitment, _, proof) = RangeProof::prove_with_rng(0xDEAD_BEEF, &mut rng);

        let bytes = proof.to_bytes();
        assert_eq!(bytes.len(), SERIALIZED_RANGE_PROOF_BYTES);
        assert_eq!(bytes.len(), 6176);

        let parsed = RangeProof::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, proof);
        assert!(parsed.verify(&commitment));

        // Bad lengths
        assert!(RangeProof::from_bytes(&bytes[..bytes.len() - 1]).is_err());
        assert!(RangeProof::from_bytes(&[bytes.as_slice(), &[0u8; 32][..]].concat()).is_err());

        // Non-canonical scalar
        let mut evil = bytes;
        let length = evil.len();
        evil[length - SERIALIZED_BYTES..].copy_from_slice(&[0xFF; 32]);
        assert_eq!(RangeProof::from_bytes(&evil), Err(RangeProofError::FailedDeserialization));
    }
}
