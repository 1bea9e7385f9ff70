// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Non-keyed sequential LSB mode.
//!
//! Writes the `ASTG` message into consecutive samples, optionally restricted
//! to the samples of loud frames by an energy mask. There is no key: anyone
//! who knows (or guesses) the mask can read the payload. The extractor does
//! not need to know where the message starts; it scans the recovered bytes
//! for the preamble.

use super::energy;
use super::error::{Result, StegoError};
use super::frame::{self, HEADER_LEN, PREAMBLE};
use super::lsb;

/// Mark the samples of frames whose mean absolute amplitude is at or above
/// the given percentile of all frame energies.
///
/// Uncovered samples (gaps when `hop_size > frame_size`) stay `false`. An
/// empty buffer yields an empty mask.
///
/// # Errors
/// [`StegoError::InvalidParameter`] for a zero frame or hop size or a
/// percentile outside `[0, 100]`.
pub fn compute_energy_mask(
    samples: &[i16],
    frame_size: usize,
    hop_size: usize,
    percentile: f64,
) -> Result<Vec<bool>> {
    if !percentile.is_finite() || !(0.0..=100.0).contains(&percentile) {
        return Err(StegoError::invalid(format!(
            "percentile must be within [0, 100], got {percentile}"
        )));
    }
    let (energies, edges) = energy::frame_mean_abs(samples, frame_size, hop_size)?;
    let threshold = energy::percentile(&energies, percentile);

    let mut mask = vec![false; samples.len()];
    for (fb, &e) in edges.iter().zip(&energies) {
        if e >= threshold {
            mask[fb.start..fb.end].fill(true);
        }
    }
    tracing::trace!(
        selected = mask.iter().filter(|&&m| m).count(),
        total = mask.len(),
        threshold,
        "energy mask"
    );
    Ok(mask)
}

fn mask_positions(mask: &[bool], samples_len: usize) -> Result<Vec<usize>> {
    if mask.len() != samples_len {
        return Err(StegoError::invalid(format!(
            "mask covers {} samples, buffer has {samples_len}",
            mask.len()
        )));
    }
    Ok(mask
        .iter()
        .enumerate()
        .filter_map(|(i, &m)| m.then_some(i))
        .collect())
}

/// Embed `payload` at the first positions of `mask`, or from sample 0 when
/// no mask is given. Returns a modified copy of `samples`.
///
/// # Errors
/// - [`StegoError::InvalidParameter`] if the mask length differs from the buffer.
/// - [`StegoError::CapacityExceeded`] if the framed payload does not fit.
pub fn embed_sequential(samples: &[i16], payload: &[u8], mask: Option<&[bool]>) -> Result<Vec<i16>> {
    let positions = match mask {
        Some(mask) => mask_positions(mask, samples.len())?,
        None => (0..samples.len()).collect(),
    };
    let message = frame::frame_message(payload)?;

    let mut stego = samples.to_vec();
    lsb::embed_bits(&mut stego, &positions, &message)?;
    tracing::debug!(
        payload_len = payload.len(),
        samples_used = message.len() * 8,
        "sequential embed"
    );
    Ok(stego)
}

/// Byte offset of the first preamble occurrence.
fn find_preamble(bytes: &[u8]) -> Option<usize> {
    bytes.windows(PREAMBLE.len()).position(|w| w == PREAMBLE)
}

/// Recover a sequentially embedded payload.
///
/// Reads the mask positions, or the first `8 * (8 + max_payload_bytes)`
/// samples without a mask, and unframes from the first preamble found.
///
/// # Errors
/// - [`StegoError::InvalidParameter`] if the mask length differs from the buffer.
/// - [`StegoError::PreambleNotFound`] if no preamble occurs in the read bytes.
/// - [`StegoError::TruncatedHeader`] / [`StegoError::InsufficientData`] if the
///   message runs past the read window (raise `max_payload_bytes`).
pub fn extract_sequential(
    samples: &[i16],
    max_payload_bytes: usize,
    mask: Option<&[bool]>,
) -> Result<Vec<u8>> {
    let positions = match mask {
        Some(mask) => mask_positions(mask, samples.len())?,
        None => {
            let window = max_payload_bytes
                .saturating_add(HEADER_LEN)
                .saturating_mul(8)
                .min(samples.len());
            (0..window).collect()
        }
    };
    let bytes = frame::bits_to_bytes(&lsb::read_bits(samples, &positions));

    let start = find_preamble(&bytes).ok_or(StegoError::PreambleNotFound)?;
    let payload = frame::unframe(&bytes[start..])?;
    tracing::debug!(offset = start, payload_len = payload.len(), "sequential extract");
    Ok(payload.to_vec())
}
