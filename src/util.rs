// Copyright (c) 2024, The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use alloc::vec::Vec;

use curve25519_dalek::Scalar;

/// The size of a serialized scalar or group element.
pub(crate) const SERIALIZED_BYTES: usize = 32;

/// The maximum number of bytes in the varint encoding of a [`prim@u64`].
pub const MAX_VARINT_BYTES: usize = 10;

/// Append the varint encoding of `value` to `out`, returning the number of bytes written.
///
/// This is little-endian base-128: each byte carries seven bits of the value, and the high bit is set on every byte
/// except the last.
pub fn write_varint(mut value: u64, out: &mut Vec<u8>) -> usize {
    let mut written = 0;
    while value >= 0x80 {
        // This can't truncate since we mask the low seven bits
        #[allow(clippy::cast_possible_truncation)]
        out.push((value as u8 & 0x7F) | 0x80);
        value >>= 7;
        written += 1;
    }

    // The remaining value fits in seven bits
    #[allow(clippy::cast_possible_truncation)]
    out.push(value as u8);

    written + 1
}

/// Read a 32-byte array from a chunk of exactly that length.
pub(crate) fn read_array(chunk: &[u8]) -> Option<[u8; SERIALIZED_BYTES]> {
    chunk.try_into().ok()
}

/// Read a canonical scalar from a 32-byte chunk.
pub(crate) fn read_scalar(chunk: &[u8]) -> Option<Scalar> {
    Scalar::from_canonical_bytes(read_array(chunk)?).into()
}
