// Copyright (c) 2024, The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use alloc::vec::Vec;
use core::iter::once;

#[cfg(feature = "borsh")]
use borsh::{BorshDeserialize, BorshSerialize};
use curve25519_dalek::Scalar;
use itertools::izip;
#[cfg(feature = "rand")]
use rand_core::OsRng;
use rand_core::CryptoRngCore;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use snafu::prelude::*;
use subtle::ConstantTimeEq;
use tracing::{debug, trace};
use zeroize::Zeroizing;

use crate::{
    domains::{MIN_RING_SIZE, TRANSCRIPT_RING_SIGNATURE},
    hash::ChallengeHasher,
    keys::{generate_key_image, KeyError, KeyImage, SecretKey},
    ring::{signer_pair, KeyImageTable, Ring},
    transcript::NonceTranscript,
    util::{read_array, read_scalar, SERIALIZED_BYTES},
};

/// A linkable ring signature.
///
/// The signature holds the challenge `c1` at the first ring member, one response per member, and the signer's key
/// image.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct RingSignature {
    c1: Scalar,
    s: Vec<Scalar>,
    key_image: KeyImage,
}

/// Errors that can arise relating to [`RingSignature`] and [`MlsagSignature`](`crate::MlsagSignature`).
#[derive(Debug, Eq, PartialEq, Snafu)]
pub enum SignatureError {
    /// An invalid parameter was provided.
    #[snafu(display("Invalid parameter: {reason}"))]
    InvalidParameter {
        /// The reason for the parameter error.
        reason: &'static str,
    },
    /// A key or key image could not be used.
    #[snafu(display("Invalid key: {source}"), context(false))]
    Key {
        /// The underlying key error.
        source: KeyError,
    },
    /// Signature deserialization failed.
    #[snafu(display("Signature deserialization failed"))]
    FailedDeserialization,
}

/// Compute the challenge `Hs(message || L || R)` over any number of `(L, R)` pairs.
#[allow(non_snake_case)]
pub(crate) fn challenge<'a, I>(message: &[u8], pairs: I) -> Scalar
where
    I: IntoIterator<Item = &'a (curve25519_dalek::EdwardsPoint, curve25519_dalek::EdwardsPoint)>,
{
    let mut hasher = ChallengeHasher::new();
    hasher.update(message);
    for (L, R) in pairs {
        hasher.update_point(L).update_point(R);
    }

    hasher.finalize()
}

impl RingSignature {
    /// Sign a message against a [`Ring`], using the operating system's random number generator.
    ///
    /// The secret key must belong to the ring member at `index`, and `key_image` must be its key image.
    /// If any of this is not the case, returns a [`SignatureError`].
    #[cfg(feature = "rand")]
    pub fn sign(
        message: &[u8],
        ring: &Ring,
        key_image: &KeyImage,
        secret_key: &SecretKey,
        index: usize,
    ) -> Result<Self, SignatureError> {
        Self::sign_with_rng(message, ring, key_image, secret_key, index, &mut OsRng)
    }

    /// Sign a message against a [`Ring`], using a [`CryptoRngCore`] random number generator `rng`.
    ///
    /// The secret key must belong to the ring member at `index`, and `key_image` must be its key image.
    /// If any of this is not the case, returns a [`SignatureError`].
    #[allow(non_snake_case)]
    pub fn sign_with_rng<R: CryptoRngCore>(
        message: &[u8],
        ring: &Ring,
        key_image: &KeyImage,
        secret_key: &SecretKey,
        index: usize,
        rng: &mut R,
    ) -> Result<Self, SignatureError> {
        let n = ring.len();
        let keys = ring.get_keys();
        let points = ring.get_points();
        let hashed_points = ring.get_hashed_points();

        // Check that the signer is in the ring where we expect
        let signer = keys.get(index).ok_or(SignatureError::InvalidParameter {
            reason: "signer index is outside the ring",
        })?;
        if !bool::from(secret_key.public_key().ct_eq(signer)) {
            return Err(SignatureError::InvalidParameter {
                reason: "secret key does not match the ring member at the signer index",
            });
        }
        if !bool::from(generate_key_image(secret_key, signer).ct_eq(key_image)) {
            return Err(SignatureError::InvalidParameter {
                reason: "key image does not match the secret key",
            });
        }
        let table = KeyImageTable::new(key_image)?;

        let mut transcript = NonceTranscript::new(
            TRANSCRIPT_RING_SIGNATURE,
            message,
            keys.iter()
                .map(|key| key.as_bytes().as_slice())
                .chain(once(key_image.as_bytes().as_slice())),
            &[secret_key.as_scalar()],
            rng,
        );

        // Start the walk at the signer
        let alpha = Zeroizing::new(transcript.random_scalar());
        let mut c = challenge(message, &[signer_pair(&alpha, &hashed_points[index])]);

        let mut s = alloc::vec![Scalar::ZERO; n];
        let mut c1 = c;
        let mut i = (index + 1) % n;

        // Fill in every decoy response, tracking the challenge at the first member
        while i != index {
            s[i] = transcript.random_scalar();
            c = challenge(message, &[table.decoy_pair(&c, &s[i], &points[i], &hashed_points[i])]);

            i = (i + 1) % n;
            if i == 0 {
                c1 = c;
            }
        }

        // Close the ring
        s[index] = *alpha - c * secret_key.as_scalar();

        Ok(Self {
            c1,
            s,
            key_image: *key_image,
        })
    }

    /// Verify a [`RingSignature`] on a message against a [`Ring`].
    ///
    /// Returns `true` only if the ring closes. A malformed key image or a response count that does not match the ring
    /// size means the signature is rejected.
    #[allow(non_snake_case)]
    pub fn verify(&self, message: &[u8], ring: &Ring) -> bool {
        if self.s.len() != ring.len() {
            debug!(
                responses = self.s.len(),
                ring_size = ring.len(),
                "Rejected ring signature: response count does not match ring size"
            );
            return false;
        }

        let table = match KeyImageTable::new(&self.key_image) {
            Ok(table) => table,
            Err(error) => {
                debug!(%error, "Rejected ring signature: invalid key image");
                return false;
            },
        };

        let c = izip!(ring.get_points(), ring.get_hashed_points(), &self.s).fold(self.c1, |c, (P, hashed_P, s)| {
            challenge(message, &[table.decoy_pair(&c, s, P, hashed_P)])
        });

        let result = bool::from(c.ct_eq(&self.c1));
        if result {
            trace!(ring_size = ring.len(), "Verified ring signature");
        } else {
            debug!(ring_size = ring.len(), "Rejected ring signature: ring does not close");
        }

        result
    }

    /// Get the key image of this [`RingSignature`].
    pub fn get_key_image(&self) -> &KeyImage {
        &self.key_image
    }

    /// Get the challenge at the first ring member.
    pub fn get_c1(&self) -> &Scalar {
        &self.c1
    }

    /// Get the responses, one per ring member.
    pub fn get_s(&self) -> &[Scalar] {
        &self.s
    }

    /// Serialize a [`RingSignature`] to a canonical byte vector.
    ///
    /// The encoding is `c1 || s[0] || ... || s[n-1] || key_image`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity((self.s.len() + 2) * SERIALIZED_BYTES);
        result.extend_from_slice(self.c1.as_bytes());
        for s in &self.s {
            result.extend_from_slice(s.as_bytes());
        }
        result.extend_from_slice(self.key_image.as_bytes());

        result
    }

    /// Deserialize a [`RingSignature`] from a canonical byte slice.
    ///
    /// The ring size is inferred from the length. If `bytes` is not a canonical encoding of a signature over at least
    /// two members, returns a [`SignatureError`]. The key image is not decoded until verification.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SignatureError> {
        if bytes.len() % SERIALIZED_BYTES != 0 || bytes.len() / SERIALIZED_BYTES < MIN_RING_SIZE + 2 {
            return Err(SignatureError::FailedDeserialization);
        }

        let mut chunks = bytes.chunks_exact(SERIALIZED_BYTES);
        let n = chunks.len() - 2;

        let c1 = chunks
            .next()
            .and_then(read_scalar)
            .ok_or(SignatureError::FailedDeserialization)?;
        let s = chunks
            .by_ref()
            .take(n)
            .map(|chunk| read_scalar(chunk).ok_or(SignatureError::FailedDeserialization))
            .collect::<Result<Vec<Scalar>, SignatureError>>()?;
        let key_image = chunks
            .next()
            .and_then(read_array)
            .map(KeyImage::from_bytes)
            .ok_or(SignatureError::FailedDeserialization)?;

        Ok(Self { c1, s, key_image })
    }
}

#[cfg(feature = "borsh")]
impl BorshSerialize for RingSignature {
    fn serialize<W: borsh::io::Write>(&self, writer: &mut W) -> borsh::io::Result<()> {
        let signature_bytes = self.to_bytes();
        BorshSerialize::serialize(&signature_bytes, writer)
    }
}

#[cfg(feature = "borsh")]
impl BorshDeserialize for RingSignature {
    fn deserialize_reader<R: borsh::io::Read>(reader: &mut R) -> borsh::io::Result<Self> {
        let signature_bytes: Vec<u8> = BorshDeserialize::deserialize_reader(reader)?;
        Self::from_bytes(&signature_bytes)
            .map_err(|_| borsh::io::Error::new(borsh::io::ErrorKind::InvalidData, "Failed to deserialize"))
    }
}

#[cfg(test)]
mod test {
    use alloc::vec::Vec;

    use rand_chacha::ChaCha12Rng;
    use rand_core::{CryptoRngCore, SeedableRng};

    use super::*;
    use crate::keys::{generate_keys_with_rng, PublicKey};

    // Generate a ring of size `n` with a fresh signer at `index`
    fn generate_data<R: CryptoRngCore>(
        n: usize,
        index: usize,
        rng: &mut R,
    ) -> (Ring, Vec<PublicKey>, SecretKey, KeyImage) {
        let (public_key, secret_key) = generate_keys_with_rng(rng);
        let keys = (0..n)
            .map(|i| {
                if i == index {
                    public_key
                } else {
                    generate_keys_with_rng(rng).0
                }
            })
            .collect::<Vec<PublicKey>>();
        let ring = Ring::new(&keys).unwrap();
        let key_image = generate_key_image(&secret_key, &public_key);

        (ring, keys, secret_key, key_image)
    }

    #[test]
    fn test_completeness() {
        let mut rng = ChaCha12Rng::seed_from_u64(8675309);
        let message = b"Test message";

        for (n, index) in [(2, 0), (2, 1), (3, 1), (5, 0), (5, 4), (11, 6), (16, 15)] {
            let (ring, _, secret_key, key_image) = generate_data(n, index, &mut rng);
            let signature =
                RingSignature::sign_with_rng(message, &ring, &key_image, &secret_key, index, &mut rng).unwrap();

            assert!(signature.verify(message, &ring));
            assert_eq!(signature.get_s().len(), n);
            assert_eq!(signature.get_key_image(), &key_image);
        }
    }

    #[test]
    fn test_wrong_message_or_ring() {
        let mut rng = ChaCha12Rng::seed_from_u64(8675309);
        let (ring, _, secret_key, key_image) = generate_data(4, 2, &mut rng);
        let signature = RingSignature::sign_with_rng(b"message", &ring, &key_image, &secret_key, 2, &mut rng).unwrap();

        assert!(!signature.verify(b"other message", &ring));

        let (other_ring, _, _, _) = generate_data(4, 2, &mut rng);
        assert!(!signature.verify(b"message", &other_ring));

        // A ring of a different size is rejected outright
        let (larger_ring, _, _, _) = generate_data(5, 2, &mut rng);
        assert!(!signature.verify(b"message", &larger_ring));
    }

    // Bit positions to flip, from the lowest to the highest of a 32-byte encoding
    const FLIPPED_BITS: [usize; 7] = [0, 1, 7, 100, 200, 252, 255];

    fn flip_bit(mut bytes: [u8; 32], bit: usize) -> [u8; 32] {
        bytes[bit / 8] ^= 1 << (bit % 8);
        bytes
    }

    #[test]
    fn test_bit_flips() {
        let mut rng = ChaCha12Rng::seed_from_u64(8675309);
        let message = b"Test message";
        let (ring, _, secret_key, key_image) = generate_data(5, 3, &mut rng);
        let signature = RingSignature::sign_with_rng(message, &ring, &key_image, &secret_key, 3, &mut rng).unwrap();

        for bit in FLIPPED_BITS {
            // Flip a single bit in each response
            for i in 0..ring.len() {
                let mut evil = signature.clone();
                evil.s[i] = Scalar::from_bytes_mod_order(flip_bit(evil.s[i].to_bytes(), bit));
                assert!(!evil.verify(message, &ring));
            }

            // Flip a single bit in the challenge
            let mut evil = signature.clone();
            evil.c1 = Scalar::from_bytes_mod_order(flip_bit(evil.c1.to_bytes(), bit));
            assert!(!evil.verify(message, &ring));

            // Flip a single bit in the key image
            let mut evil = signature.clone();
            evil.key_image = KeyImage::from_bytes(flip_bit(evil.key_image.to_bytes(), bit));
            assert!(!evil.verify(message, &ring));
        }

        assert!(signature.verify(message, &ring));
    }

    #[test]
    fn test_linkability() {
        let mut rng = ChaCha12Rng::seed_from_u64(8675309);
        let (_, mut keys, secret_key, key_image) = generate_data(4, 1, &mut rng);
        let ring = Ring::new(&keys).unwrap();
        let signature = RingSignature::sign_with_rng(b"first", &ring, &key_image, &secret_key, 1, &mut rng).unwrap();

        // Put the same key in a different ring at a different index
        keys.swap(1, 3);
        keys[0] = generate_keys_with_rng(&mut rng).0;
        let other_ring = Ring::new(&keys).unwrap();
        let other_signature =
            RingSignature::sign_with_rng(b"second", &other_ring, &key_image, &secret_key, 3, &mut rng).unwrap();

        assert!(signature.verify(b"first", &ring));
        assert!(other_signature.verify(b"second", &other_ring));
        assert_eq!(signature.get_key_image(), other_signature.get_key_image());
    }

    #[test]
    fn test_small_order_key_image() {
        let mut rng = ChaCha12Rng::seed_from_u64(8675309);
        let message = b"Test message";
        let (ring, _, secret_key, key_image) = generate_data(3, 0, &mut rng);
        let signature = RingSignature::sign_with_rng(message, &ring, &key_image, &secret_key, 0, &mut rng).unwrap();

        let mut evil = signature.clone();
        let tainted = key_image.decompress().unwrap() + curve25519_dalek::constants::EIGHT_TORSION[1];
        evil.key_image = KeyImage::from_point(&tainted);

        assert!(!evil.verify(message, &ring));
    }

    #[test]
    fn test_invalid_signer() {
        let mut rng = ChaCha12Rng::seed_from_u64(8675309);
        let message = b"Test message";
        let (ring, _, secret_key, key_image) = generate_data(4, 2, &mut rng);

        // Index out of range
        assert!(matches!(
            RingSignature::sign_with_rng(message, &ring, &key_image, &secret_key, 4, &mut rng),
            Err(SignatureError::InvalidParameter { .. })
        ));

        // Wrong index
        assert!(matches!(
            RingSignature::sign_with_rng(message, &ring, &key_image, &secret_key, 1, &mut rng),
            Err(SignatureError::InvalidParameter { .. })
        ));

        // Wrong secret key
        let (_, other_secret_key) = generate_keys_with_rng(&mut rng);
        assert!(matches!(
            RingSignature::sign_with_rng(message, &ring, &key_image, &other_secret_key, 2, &mut rng),
            Err(SignatureError::InvalidParameter { .. })
        ));

        // Wrong key image
        let other_key_image = KeyImage::from_point(&curve25519_dalek::constants::ED25519_BASEPOINT_POINT);
        assert!(matches!(
            RingSignature::sign_with_rng(message, &ring, &other_key_image, &secret_key, 2, &mut rng),
            Err(SignatureError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_serialization() {
        let mut rng = ChaCha12Rng::seed_from_u64(8675309);
        let message = b"Test message";
        let (ring, _, secret_key, key_image) = generate_data(6, 5, &mut rng);
        let signature = RingSignature::sign_with_rng(message, &ring, &key_image, &secret_key, 5, &mut rng).unwrap();

        let bytes = signature.to_bytes();
        assert_eq!(bytes.len(), (6 + 2) * SERIALIZED_BYTES);

        let parsed = RingSignature::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, signature);
        assert_eq!(parsed.to_bytes(), bytes);
        assert!(parsed.verify(message, &ring));
    }

    #[test]
    fn test_deserialization_failures() {
        let mut rng = ChaCha12Rng::seed_from_u64(8675309);
        let (ring, _, secret_key, key_image) = generate_data(2, 0, &mut rng);
        let bytes = RingSignature::sign_with_rng(b"message", &ring, &key_image, &secret_key, 0, &mut rng)
            .unwrap()
            .to_bytes();

        // Truncated or extended
        assert!(RingSignature::from_bytes(&bytes[..bytes.len() - 1]).is_err());
        let mut extended = bytes.clone();
        extended.push(0);
        assert!(RingSignature::from_bytes(&extended).is_err());

        // Too few members
        assert!(RingSignature::from_bytes(&bytes[SERIALIZED_BYTES..]).is_err());
        assert!(RingSignature::from_bytes(&[]).is_err());

        // Non-canonical response
        let mut evil = bytes.clone();
        evil[SERIALIZED_BYTES..2 * SERIALIZED_BYTES].copy_from_slice(&[0xFF; 32]);
        assert_eq!(
            RingSignature::from_bytes(&evil),
            Err(SignatureError::FailedDeserialization)
        );

        // Non-canonical challenge
        let mut evil = bytes.clone();
        evil[..SERIALIZED_BYTES].copy_from_slice(&[0xFF; 32]);
        assert!(RingSignature::from_bytes(&evil).is_err());

        // Points are not checked until verification
        let mut evil = bytes;
        let length = evil.len();
        evil[length - SERIALIZED_BYTES..].copy_from_slice(&crate::keys::test::invalid_encoding());
        let parsed = RingSignature::from_bytes(&evil).unwrap();
        assert!(!parsed.verify(b"message", &ring));
    }
}
