// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! LSB writing and reading along a sample order.
//!
//! Bit `i` of the message lives in the least-significant bit of sample
//! `order[i]`. Since `order` is a permutation, every touched sample is written
//! exactly once and the result does not depend on write order.

use super::error::{Result, StegoError};
use super::frame::{self, HEADER_BITS, HEADER_LEN};

/// Payload bytes that fit behind the 64-bit header in `positions` samples.
pub fn capacity_from_order(positions: usize) -> usize {
    positions.saturating_sub(HEADER_BITS) / 8
}

/// Write `message` (a full `ASTG` message) into the LSBs at `order[..bits]`.
///
/// The capacity check runs before any sample is modified.
///
/// # Errors
/// [`StegoError::CapacityExceeded`] if the message needs more bits than
/// `order` provides. `requested` is the payload size in bytes.
pub fn embed_bits(samples: &mut [i16], order: &[usize], message: &[u8]) -> Result<()> {
    let bits = frame::bytes_to_bits(message);
    if bits.len() > order.len() {
        return Err(StegoError::CapacityExceeded {
            requested: message.len().saturating_sub(HEADER_LEN),
            available: capacity_from_order(order.len()),
        });
    }
    if let Some(&bad) = order[..bits.len()].iter().find(|&&idx| idx >= samples.len()) {
        return Err(StegoError::invalid(format!(
            "order index {bad} out of range for {} samples",
            samples.len()
        )));
    }

    for (&idx, &bit) in order.iter().zip(&bits) {
        samples[idx] = (samples[idx] & !1) | i16::from(bit);
    }
    Ok(())
}

/// Read the LSBs at the given positions, in order.
///
/// Positions past the end of `samples` read as 0.
pub fn read_bits(samples: &[i16], positions: &[usize]) -> Vec<u8> {
    positions
        .iter()
        .map(|&idx| samples.get(idx).map_or(0, |&s| (s & 1) as u8))
        .collect()
}

/// Read an `ASTG` message along `order` and return its payload.
///
/// # Errors
/// - [`StegoError::PreambleNotFound`] if the order is shorter than the header
///   or the first 32 bits are not the preamble.
/// - [`StegoError::CapacityMismatch`] if the declared length needs more
///   positions than the order has.
pub fn extract_message(samples: &[i16], order: &[usize]) -> Result<Vec<u8>> {
    if order.len() < HEADER_BITS {
        return Err(StegoError::PreambleNotFound);
    }
    let header = frame::bits_to_bytes(&read_bits(samples, &order[..HEADER_BITS]));
    let declared = frame::parse_header(&header)?;

    let needed = declared
        .checked_mul(8)
        .and_then(|bits| bits.checked_add(HEADER_BITS))
        .filter(|&total| total <= order.len())
        .ok_or(StegoError::CapacityMismatch {
            declared: declared.saturating_mul(8),
            available: order.len() - HEADER_BITS,
        })?;

    Ok(frame::bits_to_bytes(&read_bits(samples, &order[HEADER_BITS..needed])))
}
