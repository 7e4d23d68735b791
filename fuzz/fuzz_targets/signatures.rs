// Copyright (c) 2024, The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

#![no_main]

use libfuzzer_sys::fuzz_target;
use ringct::{MlsagSignature, RingSignature};

// Test basic deserialization and canonical serialization
fuzz_target!(|data: &[u8]| {
	// If deserialization succeeds, serialization should be canonical
	if let Ok(signature) = RingSignature::from_bytes(data) {
		assert_eq!(&signature.to_bytes(), data);
	}
	if let Ok(signature) = MlsagSignature::from_bytes(data) {
		assert_eq!(&signature.to_bytes(), data);
	}
});
