// Copyright (c) 2024, The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use alloc::vec::Vec;

#[cfg(feature = "borsh")]
use borsh::{BorshDeserialize, BorshSerialize};
use curve25519_dalek::{EdwardsPoint, Scalar};
use itertools::Itertools;
#[cfg(feature = "rand")]
use rand_core::OsRng;
use rand_core::CryptoRngCore;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use tracing::{debug, trace};
use zeroize::Zeroizing;

use crate::{
    domains::{MIN_RING_SIZE, TRANSCRIPT_MLSAG},
    keys::{generate_key_image, KeyImage, SecretKey},
    ring::{signer_pair, KeyImageTable, RingMatrix},
    ring_signature::{challenge, SignatureError},
    transcript::NonceTranscript,
    util::{read_array, read_scalar, SERIALIZED_BYTES},
};

/// The size of each serialized dimension.
const DIMENSION_BYTES: usize = 4;

/// A multilayered linkable spontaneous anonymous group (MLSAG) signature.
///
/// The signer proves knowledge of the secret keys for an entire row of a [`RingMatrix`], producing one key image per
/// column. Each ring step hashes every column's `(L, R)` pair into a single challenge.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct MlsagSignature {
    c1: Scalar,
    s: Vec<Vec<Scalar>>,
    key_images: Vec<KeyImage>,
}

impl MlsagSignature {
    /// Sign a message against a [`RingMatrix`], using the operating system's random number generator.
    ///
    /// The secret keys must belong to the row at `index`, one per column, and `key_images` must be their key images.
    /// If any of this is not the case, returns a [`SignatureError`].
    #[cfg(feature = "rand")]
    pub fn sign(
        message: &[u8],
        ring: &RingMatrix,
        key_images: &[KeyImage],
        secret_keys: &[SecretKey],
        index: usize,
    ) -> Result<Self, SignatureError> {
        Self::sign_with_rng(message, ring, key_images, secret_keys, index, &mut OsRng)
    }

    /// Sign a message against a [`RingMatrix`], using a [`CryptoRngCore`] random number generator `rng`.
    ///
    /// The secret keys must belong to the row at `index`, one per column, and `key_images` must be their key images.
    /// If any of this is not the case, returns a [`SignatureError`].
    #[allow(non_snake_case)]
    pub fn sign_with_rng<R: CryptoRngCore>(
        message: &[u8],
        ring: &RingMatrix,
        key_images: &[KeyImage],
        secret_keys: &[SecretKey],
        index: usize,
        rng: &mut R,
    ) -> Result<Self, SignatureError> {
        let n = ring.get_n();
        let m = ring.get_m();

        if secret_keys.len() != m || key_images.len() != m {
            return Err(SignatureError::InvalidParameter {
                reason: "secret key and key image counts must match the ring width",
            });
        }
        let signer_row = ring.get_row(index).ok_or(SignatureError::InvalidParameter {
            reason: "signer index is outside the ring",
        })?;

        // Each secret key must match its column, and produce the given key image
        for ((secret_key, public_key), key_image) in secret_keys.iter().zip(signer_row).zip(key_images) {
            if !bool::from(secret_key.public_key().ct_eq(public_key)) {
                return Err(SignatureError::InvalidParameter {
                    reason: "secret key does not match the ring member at the signer index",
                });
            }
            if !bool::from(generate_key_image(secret_key, public_key).ct_eq(key_image)) {
                return Err(SignatureError::InvalidParameter {
                    reason: "key image does not match the secret key",
                });
            }
        }
        let tables = key_images
            .iter()
            .map(KeyImageTable::new)
            .collect::<Result<Vec<KeyImageTable>, _>>()?;

        let points = ring.get_points().chunks_exact(m).collect::<Vec<&[EdwardsPoint]>>();
        let hashed_points = ring.get_hashed_points().chunks_exact(m).collect::<Vec<&[EdwardsPoint]>>();

        let secrets = secret_keys.iter().map(SecretKey::as_scalar).collect::<Vec<&Scalar>>();
        let mut transcript = NonceTranscript::new(
            TRANSCRIPT_MLSAG,
            message,
            (0..n)
                .filter_map(|row| ring.get_row(row))
                .flatten()
                .map(|key| key.as_bytes().as_slice())
                .chain(key_images.iter().map(|key_image| key_image.as_bytes().as_slice())),
            &secrets,
            rng,
        );

        // Start the walk at the signer
        let alphas = Zeroizing::new((0..m).map(|_| transcript.random_scalar()).collect::<Vec<Scalar>>());
        let pairs = alphas
            .iter()
            .zip(hashed_points[index])
            .map(|(alpha, hashed_P)| signer_pair(alpha, hashed_P))
            .collect::<Vec<_>>();
        let mut c = challenge(message, &pairs);

        let mut s = alloc::vec![alloc::vec![Scalar::ZERO; m]; n];
        let mut c1 = c;
        let mut i = (index + 1) % n;

        // Fill in every decoy row, tracking the challenge at the first row
        while i != index {
            s[i] = (0..m).map(|_| transcript.random_scalar()).collect();
            c = Self::step(message, &c, &s[i], points[i], hashed_points[i], &tables);

            i = (i + 1) % n;
            if i == 0 {
                c1 = c;
            }
        }

        // Close the ring in every column
        s[index] = alphas
            .iter()
            .zip(secrets)
            .map(|(alpha, secret)| alpha - c * secret)
            .collect();

        Ok(Self {
            c1,
            s,
            key_images: key_images.to_vec(),
        })
    }

    // Hash one decoy row into the next challenge
    #[allow(non_snake_case)]
    fn step(
        message: &[u8],
        c: &Scalar,
        s: &[Scalar],
        points: &[EdwardsPoint],
        hashed_points: &[EdwardsPoint],
        tables: &[KeyImageTable],
    ) -> Scalar {
        let pairs = itertools::izip!(s, points, hashed_points, tables)
            .map(|(s, P, hashed_P, table)| table.decoy_pair(c, s, P, hashed_P))
            .collect::<Vec<_>>();

        challenge(message, &pairs)
    }

    /// Verify an [`MlsagSignature`] on a message against a [`RingMatrix`].
    ///
    /// Returns `true` only if the ring closes. Malformed key images, or a response table or key image count that does
    /// not match the ring shape, mean the signature is rejected.
    pub fn verify(&self, message: &[u8], ring: &RingMatrix) -> bool {
        let n = ring.get_n();
        let m = ring.get_m();

        if self.s.len() != n || self.s.iter().any(|row| row.len() != m) || self.key_images.len() != m {
            debug!(n, m, "Rejected MLSAG signature: shape does not match ring");
            return false;
        }

        let tables = match self
            .key_images
            .iter()
            .map(KeyImageTable::new)
            .collect::<Result<Vec<KeyImageTable>, _>>()
        {
            Ok(tables) => tables,
            Err(error) => {
                debug!(%error, "Rejected MLSAG signature: invalid key image");
                return false;
            },
        };

        let c = ring
            .get_points()
            .chunks_exact(m)
            .zip_eq(ring.get_hashed_points().chunks_exact(m))
            .zip_eq(&self.s)
            .fold(self.c1, |c, ((points, hashed_points), s)| {
                Self::step(message, &c, s, points, hashed_points, &tables)
            });

        let result = bool::from(c.ct_eq(&self.c1));
        if result {
            trace!(n, m, "Verified MLSAG signature");
        } else {
            debug!(n, m, "Rejected MLSAG signature: ring does not close");
        }

        result
    }

    /// Get the key images, one per column.
    pub fn get_key_images(&self) -> &[KeyImage] {
        &self.key_images
    }

    /// Get the challenge at the first row.
    pub fn get_c1(&self) -> &Scalar {
        &self.c1
    }

    /// Get the response table, one row per ring row.
    pub fn get_s(&self) -> &[Vec<Scalar>] {
        &self.s
    }

    /// Serialize an [`MlsagSignature`] to a canonical byte vector.
    ///
    /// The encoding is `n || m || c1 || s || key_images`, where the dimensions are 32-bit little-endian integers and `s`
    /// is row-major. The 8-byte dimension prefix is not part of the bare `c1 || s || key_images` signature layout; it
    /// lets [`MlsagSignature::from_bytes`] recover the shape without the ring. Callers that carry the shape separately
    /// can strip the first 8 bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let n = self.s.len();
        let m = self.key_images.len();

        let mut result = Vec::with_capacity(2 * DIMENSION_BYTES + (1 + n * m + m) * SERIALIZED_BYTES);
        // Dimensions always fit, since they come from a signature we built or parsed
        #[allow(clippy::cast_possible_truncation)]
        let dimensions = [n as u32, m as u32];
        for dimension in dimensions {
            result.extend_from_slice(&dimension.to_le_bytes());
        }
        result.extend_from_slice(self.c1.as_bytes());
        for s in self.s.iter().flatten() {
            result.extend_from_slice(s.as_bytes());
        }
        for key_image in &self.key_images {
            result.extend_from_slice(key_image.as_bytes());
        }

        result
    }

    /// Deserialize an [`MlsagSignature`] from a canonical byte slice.
    ///
    /// If `bytes` is not a canonical encoding of a signature with at least two rows and one column, returns a
    /// [`SignatureError`]. Key images are not decoded until verification.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SignatureError> {
        let read_dimension = |range: core::ops::Range<usize>| -> Result<usize, SignatureError> {
            let dimension = bytes
                .get(range)
                .and_then(|chunk| <[u8; DIMENSION_BYTES]>::try_from(chunk).ok())
                .ok_or(SignatureError::FailedDeserialization)?;
            usize::try_from(u32::from_le_bytes(dimension)).map_err(|_| SignatureError::FailedDeserialization)
        };
        let n = read_dimension(0..DIMENSION_BYTES)?;
        let m = read_dimension(DIMENSION_BYTES..2 * DIMENSION_BYTES)?;
        if n < MIN_RING_SIZE || m == 0 {
            return Err(SignatureError::FailedDeserialization);
        }

        // Check the exact length without overflowing
        let expected = n
            .checked_mul(m)
            .and_then(|nm| nm.checked_add(m + 1))
            .and_then(|count| count.checked_mul(SERIALIZED_BYTES))
            .and_then(|length| length.checked_add(2 * DIMENSION_BYTES))
            .ok_or(SignatureError::FailedDeserialization)?;
        if bytes.len() != expected {
            return Err(SignatureError::FailedDeserialization);
        }

        let mut chunks = bytes[2 * DIMENSION_BYTES..].chunks_exact(SERIALIZED_BYTES);
        let c1 = chunks
            .next()
            .and_then(read_scalar)
            .ok_or(SignatureError::FailedDeserialization)?;
        let s = (0..n)
            .map(|_| {
                chunks
                    .by_ref()
                    .take(m)
                    .map(|chunk| read_scalar(chunk).ok_or(SignatureError::FailedDeserialization))
                    .collect::<Result<Vec<Scalar>, SignatureError>>()
            })
            .collect::<Result<Vec<Vec<Scalar>>, SignatureError>>()?;
        let key_images = chunks
            .map(|chunk| {
                read_array(chunk)
                    .map(KeyImage::from_bytes)
                    .ok_or(SignatureError::FailedDeserialization)
            })
            .collect::<Result<Vec<KeyImage>, SignatureError>>()?;

        Ok(Self { c1, s, key_images })
    }
}

#[cfg(feature = "borsh")]
impl BorshSerialize for MlsagSignature {
    fn serialize<W: borsh::io::Write>(&self, writer: &mut W) -> borsh::io::Result<()> {
        let signature_bytes = self.to_bytes();
        BorshSerialize::serialize(&signature_bytes, writer)
    }
}

#[cfg(feature = "borsh")]
impl BorshDeserialize for MlsagSignature {
    fn deserialize_reader<R: borsh::io::Read>(reader: &mut R) -> borsh::io::Result<Self> {
        let signature_bytes: Vec<u8> = BorshDeserialize::deserialize_reader(reader)?;
        Self::from_bytes(&signature_bytes)
            .map_err(|_| borsh::io::Error::new(borsh::io::ErrorKind::InvalidData, "Failed to deserialize"))
    }
}
