// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Capacity estimation for the keyed adaptive mode.
//!
//! The order covers every sample, so the raw capacity of an `n` sample
//! buffer is `(n - 64) / 8` payload bytes. The plaintext capacity is smaller:
//! encryption adds the IV and PKCS#7 padding, the robust layer adds its
//! 12 byte header and multiplies by the repeat factor.

use super::crypto;
use super::pipeline::StegoParams;
use super::robust::ROBUST_HEADER_LEN;

pub use super::lsb::capacity_from_order;

/// Embedded payload size (the length written to the `ASTG` header) for a
/// plaintext of `plaintext_len` bytes.
pub fn payload_overhead(plaintext_len: usize, params: &StegoParams) -> usize {
    let mut len = if params.encrypt {
        crypto::encrypted_len(plaintext_len)
    } else {
        plaintext_len
    };
    if let Some(robust) = &params.robust {
        len = robust.encoded_len(len);
    }
    len
}

/// Largest plaintext length that fits in `samples_len` samples with
/// `params`, or 0 if not even an empty plaintext fits.
pub fn estimate_capacity(samples_len: usize, params: &StegoParams) -> usize {
    let mut budget = capacity_from_order(samples_len);

    if let Some(robust) = &params.robust {
        budget = match (budget / robust.repeat.max(1)).checked_sub(ROBUST_HEADER_LEN) {
            Some(b) => b,
            None => return 0,
        };
    }

    if params.encrypt {
        // IV plus at least one block; every further whole block adds 16 bytes
        // of plaintext, and the final block holds up to 15.
        let blocks = budget.saturating_sub(crypto::IV_LEN) / crypto::BLOCK_LEN;
        if blocks == 0 {
            return 0;
        }
        budget = blocks * crypto::BLOCK_LEN - 1;
    }

    tracing::trace!(samples_len, capacity = budget, "estimated capacity");
    budget
}
