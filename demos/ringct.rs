// Copyright (c) 2024, The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

//! In a RingCT design, outputs have (roughly speaking) two parts that we need:
//! - a one-time output key, derived from a recipient address and a transaction secret
//! - a value commitment, with a range proof showing the value can't overflow
//!
//! To spend an output, we sign with an MLSAG over a matrix of candidate outputs. The first column holds output keys,
//! and the second holds each value commitment minus the commitment of the new output.
//!
//! This example walks through sending, scanning, and spending a single output.
