// Copyright (c) 2024, The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use alloc::vec::Vec;
use core::iter::successors;

use curve25519_dalek::{EdwardsPoint, Scalar};

use crate::keys::point_type;

point_type!(
    /// A Pedersen commitment `C = a*G + v*H` to a value `v` with mask `a`.
    Commitment
);

/// Get the alternate generator `H` used for committed values.
///
/// Nobody knows the discrete logarithm of `H` with respect to `G`.
#[allow(non_snake_case)]
pub fn generator_H() -> EdwardsPoint {
    *monero_generators::H
}

/// Get the powers `2^i * H` for `i` in `0..count`.
pub(crate) fn powers_of_two_H(count: usize) -> Vec<EdwardsPoint> {
    successors(Some(generator_H()), |point| Some(point + point))
        .take(count)
        .collect()
}

/// Commit to `value` with the blinding factor `mask`.
pub fn commit(mask: &Scalar, value: u64) -> Commitment {
    Commitment::from_point(&(EdwardsPoint::mul_base(mask) + Scalar::from(value) * generator_H()))
}
