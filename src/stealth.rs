// Copyright (c) 2024, The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use alloc::vec::Vec;

use curve25519_dalek::Scalar;
#[cfg(feature = "rand")]
use rand_core::OsRng;
use rand_core::CryptoRngCore;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::{
    domains::TRANSCRIPT_STEALTH,
    hash::hash_to_scalar,
    keys::{KeyError, PublicKey, SecretKey},
    ops::{add_keys_mult_base, scalar_mult, scalar_mult8, scalar_mult_base, sub_keys_mult_base},
    transcript::NonceTranscript,
    util::{write_varint, MAX_VARINT_BYTES},
};

/// The kind of address an output is sent to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AddressType {
    /// A standard address `(A, B)`, with transaction key `R = r*G`.
    Standard,
    /// A subaddress `(C, D)`, with transaction key `R = r*D`.
    Subaddress,
}

/// A one-time output key and the transaction key that lets its recipient find it.
#[allow(non_snake_case)]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StealthAddress {
    r: SecretKey,
    R: PublicKey,
    P: PublicKey,
}

/// Compute `Hs(derivation || varint(output_index))` for a shared derivation point.
pub fn derivation_to_scalar(derivation: &PublicKey, output_index: u64) -> Scalar {
    let mut preimage = Zeroizing::new(Vec::<u8>::with_capacity(32 + MAX_VARINT_BYTES));
    preimage.extend_from_slice(derivation.as_bytes());
    write_varint(output_index, &mut preimage);

    hash_to_scalar(&preimage)
}

impl StealthAddress {
    /// Build a [`StealthAddress`] for the address `(A, B)` from a chosen transaction secret `r`.
    ///
    /// The one-time key is `P = Hs(8*r*A || varint(output_index))*G + B`.
    /// If `A` or `B` is not a valid point, returns a [`KeyError`].
    #[allow(non_snake_case)]
    pub fn new(
        r: SecretKey,
        A: &PublicKey,
        B: &PublicKey,
        output_index: u64,
        address_type: AddressType,
    ) -> Result<Self, KeyError> {
        let derivation = scalar_mult8(r.as_scalar(), A)?;
        let d = Zeroizing::new(derivation_to_scalar(&derivation, output_index));
        let P = add_keys_mult_base(&d, B)?;

        let R = match address_type {
            AddressType::Standard => scalar_mult_base(r.as_scalar()),
            AddressType::Subaddress => scalar_mult(r.as_scalar(), B)?,
        };

        Ok(Self { r, R, P })
    }

    /// Build a [`StealthAddress`] for the address `(A, B)` with a random transaction secret, using the operating
    /// system's random number generator.
    ///
    /// If `A` or `B` is not a valid point, returns a [`KeyError`].
    #[allow(non_snake_case)]
    #[cfg(feature = "rand")]
    pub fn random(
        A: &PublicKey,
        B: &PublicKey,
        output_index: u64,
        address_type: AddressType,
    ) -> Result<Self, KeyError> {
        Self::random_with_rng(A, B, output_index, address_type, &mut OsRng)
    }

    /// Build a [`StealthAddress`] for the address `(A, B)` with a random transaction secret, using a [`CryptoRngCore`]
    /// random number generator `rng`.
    ///
    /// If `A` or `B` is not a valid point, returns a [`KeyError`].
    #[allow(non_snake_case)]
    pub fn random_with_rng<R: CryptoRngCore>(
        A: &PublicKey,
        B: &PublicKey,
        output_index: u64,
        address_type: AddressType,
        rng: &mut R,
    ) -> Result<Self, KeyError> {
        let mut transcript = NonceTranscript::new(
            TRANSCRIPT_STEALTH,
            &output_index.to_le_bytes(),
            [A.as_bytes().as_slice(), B.as_bytes().as_slice()],
            &[],
            rng,
        );
        let r = SecretKey::from_scalar(transcript.random_scalar());

        Self::new(r, A, B, output_index, address_type)
    }

    /// Get the transaction secret `r`.
    pub fn get_r(&self) -> &SecretKey {
        &self.r
    }

    /// Get the transaction public key `R`.
    #[allow(non_snake_case)]
    pub fn get_R(&self) -> &PublicKey {
        &self.R
    }

    /// Get the one-time output key `P`.
    #[allow(non_snake_case)]
    pub fn get_P(&self) -> &PublicKey {
        &self.P
    }
}

/// The result of checking whether an output belongs to a spend key.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Ownership {
    /// The output was sent to the spend key that was checked.
    Owned,
    /// The output was not sent to the spend key that was checked.
    ///
    /// If it was sent to one of the view key's subaddresses, `spend_key` is that subaddress spend key.
    NotOwned {
        /// The candidate spend key `P - d*G`.
        spend_key: PublicKey,
    },
}

impl Ownership {
    /// Check if the output is owned.
    pub fn is_owned(&self) -> bool {
        matches!(self, Self::Owned)
    }

    /// Get the candidate spend key, which is all zero bytes for an owned output.
    pub fn get_spend_key(&self) -> PublicKey {
        match self {
            Self::Owned => PublicKey::default(),
            Self::NotOwned { spend_key } => *spend_key,
        }
    }
}

/// Check whether the one-time key `P` with transaction key `R` belongs to the view key `a` and spend key `B`.
///
/// The recomputed key is compared with `P` in constant time. A mismatch is not an error; instead, the candidate spend
/// key `P - d*G` is returned for subaddress lookup. If `P`, `R`, or `B` is not a valid point, returns a [`KeyError`].
#[allow(non_snake_case)]
pub fn is_stealth_mine(
    P: &PublicKey,
    R: &PublicKey,
    a: &SecretKey,
    B: &PublicKey,
    output_index: u64,
) -> Result<Ownership, KeyError> {
    let derivation = scalar_mult8(a.as_scalar(), R)?;
    let d = Zeroizing::new(derivation_to_scalar(&derivation, output_index));

    if bool::from(add_keys_mult_base(&d, B)?.ct_eq(P)) {
        return Ok(Ownership::Owned);
    }

    Ok(Ownership::NotOwned {
        spend_key: sub_keys_mult_base(&d, P)?,
    })
}

/// Recover the one-time secret key `d + b` for an output with transaction key `R`.
///
/// This does not check ownership; use [`is_stealth_mine`] first. If `R` is not a valid point, returns a [`KeyError`].
#[allow(non_snake_case)]
pub fn get_stealth_key(R: &PublicKey, a: &SecretKey, b: &SecretKey, output_index: u64) -> Result<SecretKey, KeyError> {
    let derivation = scalar_mult8(a.as_scalar(), R)?;
    let d = Zeroizing::new(derivation_to_scalar(&derivation, output_index));

    Ok(SecretKey::from_scalar(*d + b.as_scalar()))
}
