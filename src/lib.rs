// Copyright (c) 2024, The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

//! Linkable ring signatures, MLSAG, Borromean range proofs, and stealth address derivation for CryptoNote-style RingCT.
//!
//! # Overview
//!
//! A linkable ring signature lets a signer sign a message against a set of public keys (a _ring_). Successful
//! verification means the signer knew the secret key for one of the ring members, without revealing which. Each
//! signature also carries a _key image_ `I = x*Hp(P)`; two verified signatures with the same key image were produced
//! with the same secret key, which is how double spends are detected.
//!
//! This library provides:
//! - [Key generation and group helpers](`crate::keys`) over the Ed25519 group, including key images.
//! - [Domain-separated hashing](`crate::hash`): `cn_fast_hash` (Keccak-256), hash-to-scalar, and hash-to-point.
//! - [Stealth addresses](`crate::stealth`) and [subaddresses](`crate::subaddress`) for one-time output keys.
//! - [Linkable ring signatures](`crate::ring_signature`) over a flat [`Ring`].
//! - [MLSAG signatures](`crate::mlsag`) over a [`RingMatrix`] of key vectors, with one key image per column.
//! - [Borromean ring signatures](`crate::borromean`) and the [range proofs](`crate::range_proof`) built from them.
//!
//! # Implementation notes
//!
//! This implementation makes several opinionated choices:
//! - It uses [`curve25519-dalek`](https://crates.io/crates/curve25519-dalek) Edwards points for group operations.
//! - It uses Keccak-256 with the original padding (`cn_fast_hash`) for every challenge, so signatures are bit-compatible
//!   with other CryptoNote implementations.
//! - Randomness is always an explicit [`CryptoRngCore`](`rand_core::CryptoRngCore`) supplied by the caller. Signing
//!   nonces are drawn from a [Merlin](https://merlin.cool/) transcript generator bound to the statement and witness.
//!
//! The implementation keeps dependencies to a minimum, and is `no_std` friendly.
//!
//! There are several features available.
//!
//! | Feature | Default? | Description |
//! | :--- | :---: | :--- |
//! | `borsh` | | Adds signature and proof serialization and deserialization via [`borsh`](https://crates.io/crates/borsh) |
//! | `rand` | ✓ | Adds entry points that supply a cryptographically-secure random number generator |
//! | `serde` | | Adds signature and proof serialization and deserialization via [`serde`](https://crates.io/crates/serde) |
//! | `std` | ✓ | Adds corresponding dependency features |
//!
//! Verification emits [`tracing`](https://crates.io/crates/tracing) events describing why a signature or proof was
//! rejected. No secret data is ever included in these events.
//!
//! # Warning
//!
//! While this implementation is written with security in mind, it is currently **experimental** and not suitable for
//! production use.
//!
//! # Example
//!
//! Here's a complete example of how to generate and verify a linkable ring signature.
//!
//! ```
//! # #[cfg(feature = "rand")]
//! # {
//! use rand_core::OsRng;
//! use ringct::*;
//!
//! let mut rng = OsRng;
//!
//! // Our key pair, and the index where it will appear in the ring
//! let (public_key, secret_key) = generate_keys_with_rng(&mut rng);
//! let index = 3;
//!
//! // Fill the rest of the ring with decoys
//! let keys = (0..8)
//!     .map(|i| {
//!         if i == index {
//!             public_key
//!         } else {
//!             generate_keys_with_rng(&mut rng).0
//!         }
//!     })
//!     .collect::<Vec<PublicKey>>();
//! let ring = Ring::new(&keys).unwrap();
//!
//! // The key image links any two signatures made with the same key
//! let key_image = generate_key_image(&secret_key, &public_key);
//!
//! let message = b"Spend this output";
//! let signature =
//!     RingSignature::sign_with_rng(message, &ring, &key_image, &secret_key, index, &mut rng).unwrap();
//!
//! assert!(signature.verify(message, &ring));
//! # }
//! ```

#![no_std]

extern crate alloc;

/// Generic Borromean ring signatures.
pub mod borromean;
pub use borromean::{BorromeanError, BorromeanSignature};
/// Pedersen commitments.
pub mod commitment;
pub use commitment::{commit, Commitment};
/// Domain-separated hashing.
pub mod hash;
/// Keys, key images, and key generation.
pub mod keys;
pub use keys::{
    check_key,
    generate_key_image,
    secret_to_public,
    KeyError,
    KeyImage,
    PublicKey,
    SecretKey,
};
#[cfg(feature = "rand")]
pub use keys::generate_keys;
pub use keys::generate_keys_with_rng;
/// MLSAG signatures.
pub mod mlsag;
pub use mlsag::MlsagSignature;
/// Group arithmetic helpers over encoded points.
pub mod ops;
/// Borromean range proofs.
pub mod range_proof;
pub use range_proof::{RangeProof, RangeProofError};
/// Validated rings of public keys.
pub mod ring;
pub use ring::{Ring, RingError, RingMatrix};
/// Linkable ring signatures.
pub mod ring_signature;
pub use ring_signature::{RingSignature, SignatureError};
/// Stealth address derivation.
pub mod stealth;
pub use stealth::{AddressType, Ownership, StealthAddress};
/// Subaddress derivation.
pub mod subaddress;
pub use subaddress::SubaddressIndex;
/// Signing nonce transcripts.
pub(crate) mod transcript;
/// Various utility functionality.
pub mod util;

/// Domain separators and protocol constants
pub(crate) mod domains {
    // Version
    pub(crate) const VERSION: u64 = 0;

    // Protocol sizes
    pub(crate) const MIN_RING_SIZE: usize = 2;
    pub(crate) const RANGE_PROOF_BITS: usize = 64;

    // Subaddress derivation, including the trailing NUL
    pub(crate) const SUBADDRESS_PREFIX: &[u8; 8] = b"SubAddr\0";

    // Nonce transcripts
    pub(crate) const TRANSCRIPT_RING_SIGNATURE: &str = "RingCT ring signature nonces";
    pub(crate) const TRANSCRIPT_MLSAG: &str = "RingCT MLSAG nonces";
    pub(crate) const TRANSCRIPT_BORROMEAN: &str = "RingCT Borromean nonces";
    pub(crate) const TRANSCRIPT_RANGE_PROOF: &str = "RingCT range proof masks";
    pub(crate) const TRANSCRIPT_STEALTH: &str = "RingCT stealth secret";
}
