// Copyright (c) 2024, The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use curve25519_dalek::Scalar;
use merlin::{Transcript, TranscriptRng};
use rand_core::CryptoRngCore;

use crate::domains;

/// A generator for signing nonces and masks.
///
/// The generator is keyed by a Merlin transcript over the public statement and rekeyed with the witness, then finalized
/// with an external random number generator. Nonces stay unpredictable if either the witness or the external generator
/// is secret.
pub(crate) struct NonceTranscript {
    transcript_rng: TranscriptRng,
}

impl NonceTranscript {
    /// Initialize a nonce generator.
    pub(crate) fn new<'a, I, R>(
        domain: &'static str,
        message: &[u8],
        statement: I,
        witness: &[&Scalar],
        external_rng: &mut R,
    ) -> Self
    where
        I: IntoIterator<Item = &'a [u8]>,
        R: CryptoRngCore,
    {
        let mut transcript = Transcript::new(domain.as_bytes());
        transcript.append_u64(b"version", domains::VERSION);
        transcript.append_message(b"message", message);
        for item in statement {
            transcript.append_message(b"statement", item);
        }

        let transcript_rng = witness
            .iter()
            .fold(transcript.build_rng(), |builder, secret| {
                builder.rekey_with_witness_bytes(b"witness", secret.as_bytes())
            })
            .finalize(external_rng);

        Self { transcript_rng }
    }

    /// Draw a uniformly random scalar.
    pub(crate) fn random_scalar(&mut self) -> Scalar {
        Scalar::random(&mut self.transcript_rng)
    }
}

#[cfg(test)]
mod test {
    use curve25519_dalek::Scalar;
    use rand_chacha::ChaCha12Rng;
    use rand_core::SeedableRng;

    use super::NonceTranscript;

    #[test]
    fn test_nonces_depend_on_inputs() {
        let witness = Scalar::ONE;
        let other_witness = Scalar::ONE + Scalar::ONE;

        let nonce = |message: &[u8], witness: &Scalar| {
            let mut rng = ChaCha12Rng::seed_from_u64(8675309);
            NonceTranscript::new("Test nonces", message, [&[0u8; 32][..]], &[witness], &mut rng).random_scalar()
        };

        // The same inputs and external randomness give the same nonce
        assert_eq!(nonce(b"message", &witness), nonce(b"message", &witness));

        // Changing the message or witness changes the nonce
        assert_ne!(nonce(b"message", &witness), nonce(b"other message", &witness));
        assert_ne!(nonce(b"message", &witness), nonce(b"message", &other_witness));
    }

    #[test]
    fn test_nonces_depend_on_external_rng() {
        let witness = Scalar::ONE;
        let mut rng = ChaCha12Rng::seed_from_u64(8675309);

        let mut nonce = || {
            NonceTranscript::new("Test nonces", b"message", [&[0u8; 32][..]], &[&witness], &mut rng).random_scalar()
        };
        let first = nonce();
        let second = nonce();

        assert_ne!(first, second);
    }
}
