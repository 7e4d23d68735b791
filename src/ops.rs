// Copyright (c) 2024, The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

//! Group arithmetic over encoded points.
//!
//! Each function decodes its point inputs, failing with [`KeyError::InvalidPointEncoding`] if any of them is not a
//! valid curve point, and encodes the result. The `8` variants multiply by the cofactor; use them whenever an externally
//! supplied point feeds a shared secret or key image.

use curve25519_dalek::{EdwardsPoint, Scalar};

use crate::keys::{KeyError, PublicKey};

/// Compute `a*G`.
pub fn scalar_mult_base(a: &Scalar) -> PublicKey {
    PublicKey::from_point(&EdwardsPoint::mul_base(a))
}

/// Compute `A + B`.
#[allow(non_snake_case)]
pub fn add_keys(A: &PublicKey, B: &PublicKey) -> Result<PublicKey, KeyError> {
    Ok(PublicKey::from_point(&(A.decompress()? + B.decompress()?)))
}

/// Compute `A - B`.
#[allow(non_snake_case)]
pub fn sub_keys(A: &PublicKey, B: &PublicKey) -> Result<PublicKey, KeyError> {
    Ok(PublicKey::from_point(&(A.decompress()? - B.decompress()?)))
}

/// Compute `a*G + B`.
#[allow(non_snake_case)]
pub fn add_keys_mult_base(a: &Scalar, B: &PublicKey) -> Result<PublicKey, KeyError> {
    Ok(PublicKey::from_point(&(EdwardsPoint::mul_base(a) + B.decompress()?)))
}

/// Compute `a*G + b*B`.
///
/// This runs in variable time, so only use it with public scalars.
#[allow(non_snake_case)]
pub fn add_keys_double_mult_base(a: &Scalar, b: &Scalar, B: &PublicKey) -> Result<PublicKey, KeyError> {
    Ok(PublicKey::from_point(&EdwardsPoint::vartime_double_scalar_mul_basepoint(
        b,
        &B.decompress()?,
        a,
    )))
}

/// Compute `B - a*G`.
#[allow(non_snake_case)]
pub fn sub_keys_mult_base(a: &Scalar, B: &PublicKey) -> Result<PublicKey, KeyError> {
    Ok(PublicKey::from_point(&(B.decompress()? - EdwardsPoint::mul_base(a))))
}

/// Compute `a*B`.
#[allow(non_snake_case)]
pub fn scalar_mult(a: &Scalar, B: &PublicKey) -> Result<PublicKey, KeyError> {
    Ok(PublicKey::from_point(&(a * B.decompress()?)))
}

/// Compute `8*a*B`.
#[allow(non_snake_case)]
pub fn scalar_mult8(a: &Scalar, B: &PublicKey) -> Result<PublicKey, KeyError> {
    Ok(PublicKey::from_point(&(a * B.decompress()?).mul_by_cofactor()))
}

/// Compute `8*A`.
#[allow(non_snake_case)]
pub fn mul8(A: &PublicKey) -> Result<PublicKey, KeyError> {
    Ok(PublicKey::from_point(&A.decompress()?.mul_by_cofactor()))
}
