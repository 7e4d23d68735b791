// Copyright (c) 2024, The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use core::fmt;

use curve25519_dalek::{EdwardsPoint, Scalar};
#[cfg(feature = "rand")]
use rand_core::OsRng;
use rand_core::CryptoRngCore;
use snafu::prelude::*;
use subtle::{Choice, ConstantTimeEq};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::hash::hash_to_ec;

/// Errors that can arise relating to keys and encoded group elements.
#[derive(Debug, Eq, PartialEq, Snafu)]
pub enum KeyError {
    /// A 32-byte value did not decode to a valid curve point.
    #[snafu(display("A 32-byte value did not decode to a valid curve point"))]
    InvalidPointEncoding,
    /// A scalar was not reduced modulo the group order.
    #[snafu(display("A scalar was not reduced modulo the group order"))]
    InvalidScalarRange,
}

/// Defines a 32-byte encoded group element type.
///
/// The encoding is kept as-is; it is only decoded (and validated) when a group operation needs it.
macro_rules! point_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
        #[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
        pub struct $name([u8; 32]);

        impl $name {
            /// Wrap an encoding without validating it.
            pub const fn from_bytes(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }

            /// Encode a group element.
            pub fn from_point(point: &::curve25519_dalek::EdwardsPoint) -> Self {
                Self(point.compress().to_bytes())
            }

            /// Get the encoding.
            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }

            /// Get a copy of the encoding.
            pub fn to_bytes(&self) -> [u8; 32] {
                self.0
            }

            /// Decode the group element, failing if the encoding is not a valid curve point.
            pub fn decompress(&self) -> Result<::curve25519_dalek::EdwardsPoint, $crate::keys::KeyError> {
                ::curve25519_dalek::edwards::CompressedEdwardsY(self.0)
                    .decompress()
                    .ok_or($crate::keys::KeyError::InvalidPointEncoding)
            }
        }

        impl ::subtle::ConstantTimeEq for $name {
            fn ct_eq(&self, other: &Self) -> ::subtle::Choice {
                ::subtle::ConstantTimeEq::ct_eq(&self.0[..], &other.0[..])
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }
    };
}
pub(crate) use point_type;

point_type!(
    /// A public key `P = x*G`.
    PublicKey
);

point_type!(
    /// A key image `I = x*Hp(P)`.
    ///
    /// Key images are deterministic in the secret key, so two signatures carrying the same key image were produced with
    /// the same secret key.
    KeyImage
);

/// A secret key.
///
/// This is always a canonical scalar, and is zeroized when dropped. Equality is checked in constant time.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey(Scalar);

impl ConstantTimeEq for SecretKey {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.0.ct_eq(&other.0)
    }
}

impl PartialEq for SecretKey {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(other).into()
    }
}

impl Eq for SecretKey {}

impl SecretKey {
    /// Generate a new random [`SecretKey`] using a [`CryptoRngCore`] random number generator `rng`.
    pub fn random<R: CryptoRngCore>(rng: &mut R) -> Self {
        Self(Scalar::random(rng))
    }

    /// Parse a [`SecretKey`] from its canonical encoding.
    ///
    /// If `bytes` is not reduced modulo the group order, returns a [`KeyError`].
    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self, KeyError> {
        Option::<Scalar>::from(Scalar::from_canonical_bytes(bytes))
            .map(Self)
            .ok_or(KeyError::InvalidScalarRange)
    }

    /// Build a [`SecretKey`] by reducing `bytes` modulo the group order.
    pub fn from_bytes_mod_order(bytes: [u8; 32]) -> Self {
        Self(Scalar::from_bytes_mod_order(bytes))
    }

    /// Wrap an existing scalar.
    pub fn from_scalar(scalar: Scalar) -> Self {
        Self(scalar)
    }

    /// Get the underlying scalar.
    pub fn as_scalar(&self) -> &Scalar {
        &self.0
    }

    /// Get the canonical encoding.
    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_bytes()
    }

    /// Compute the [`PublicKey`] `x*G` for this [`SecretKey`].
    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_point(&EdwardsPoint::mul_base(&self.0))
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(..)")
    }
}

/// Generate a new key pair using a [`CryptoRngCore`] random number generator `rng`.
pub fn generate_keys_with_rng<R: CryptoRngCore>(rng: &mut R) -> (PublicKey, SecretKey) {
    let secret_key = SecretKey::random(rng);

    (secret_key.public_key(), secret_key)
}

/// Generate a new key pair using the operating system's random number generator.
#[cfg(feature = "rand")]
pub fn generate_keys() -> (PublicKey, SecretKey) {
    generate_keys_with_rng(&mut OsRng)
}

/// Compute the [`PublicKey`] for an encoded secret key.
///
/// If `secret` is not a canonical scalar, returns a [`KeyError`] instead of reducing it.
pub fn secret_to_public(secret: &[u8; 32]) -> Result<PublicKey, KeyError> {
    Ok(SecretKey::from_bytes(*secret)?.public_key())
}

/// Check that a [`PublicKey`] decodes to a curve point.
pub fn check_key(public_key: &PublicKey) -> bool {
    public_key.decompress().is_ok()
}

/// Compute the [`KeyImage`] `x*Hp(P)` binding `secret_key` to `public_key`.
///
/// The hash-to-point map clears the cofactor, so the image lies in the prime-order subgroup.
pub fn generate_key_image(secret_key: &SecretKey, public_key: &PublicKey) -> KeyImage {
    KeyImage::from_point(&(secret_key.as_scalar() * hash_to_ec(public_key.as_bytes())))
}
