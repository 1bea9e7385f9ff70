// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! CRC + repetition + interleave robustness layer.
//!
//! Wraps the payload in a CRC-protected frame before it is handed to the
//! message framer:
//!
//! ```text
//! [4 bytes ] magic "RBST"
//! [4 bytes ] payload length (big-endian u32)
//! [4 bytes ] CRC-32 (IEEE) of the payload (big-endian)
//! [N bytes ] payload
//! ```
//!
//! Every frame bit is then repeated `repeat` times (odd, decoded by majority
//! vote) and the expanded bit stream is optionally interleaved with a keyed
//! permutation so that a burst of neighbouring flips lands in different
//! repetition blocks.
//!
//! The interleave seed is `SHA-256(key || "RBST" || total_bits:u64_be ||
//! repeat:u32_be)[..8]` and the permutation is the portable Fisher-Yates of
//! [`permute::shuffled_indices`].

use super::error::{Result, StegoError};
use super::frame::{bits_to_bytes, bytes_to_bits};
use super::permute;

/// Magic bytes opening a robust frame.
pub const ROBUST_MAGIC: &[u8; 4] = b"RBST";

/// Robust frame header: magic + length + CRC.
pub const ROBUST_HEADER_LEN: usize = 12;

/// Largest expanded bit stream the u32 Fisher-Yates interleaver can permute.
const MAX_INTERLEAVE_BITS: usize = u32::MAX as usize;

/// Repetition and interleaving settings. Must match between encode and decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RobustParams {
    /// Copies of every frame bit. Odd, at least 1.
    pub repeat: usize,
    /// Scramble the expanded bit stream with a keyed permutation.
    pub interleave: bool,
}

impl Default for RobustParams {
    fn default() -> Self {
        Self { repeat: 3, interleave: true }
    }
}

impl RobustParams {
    pub fn new(repeat: usize, interleave: bool) -> Result<Self> {
        let params = Self { repeat, interleave };
        params.validate()?;
        Ok(params)
    }

    /// Majority voting needs an odd number of copies.
    pub fn validate(&self) -> Result<()> {
        if self.repeat < 1 {
            return Err(StegoError::invalid("repeat must be >= 1"));
        }
        if self.repeat % 2 == 0 {
            return Err(StegoError::invalid(format!(
                "repeat must be odd for majority vote, got {}",
                self.repeat
            )));
        }
        if u32::try_from(self.repeat).is_err() {
            return Err(StegoError::invalid("repeat does not fit in u32"));
        }
        Ok(())
    }

    /// Whether the frame bits are transformed at all.
    fn expands(&self) -> bool {
        self.repeat > 1 || self.interleave
    }

    /// Encoded size in bytes for a payload of `payload_len` bytes.
    ///
    /// Saturates at `usize::MAX` for absurd repeat factors.
    pub fn encoded_len(&self, payload_len: usize) -> usize {
        ROBUST_HEADER_LEN
            .saturating_add(payload_len)
            .saturating_mul(self.repeat)
    }
}

fn interleave_seed(key: &[u8], total_bits: usize, repeat: usize) -> u64 {
    permute::seed_from_parts(&[
        key,
        ROBUST_MAGIC,
        &(total_bits as u64).to_be_bytes(),
        &(repeat as u32).to_be_bytes(),
    ])
}

/// Keyed permutation applied to an expanded stream of `total_bits` bits.
pub fn interleave_permutation(key: &[u8], total_bits: usize, repeat: usize) -> Vec<usize> {
    permute::shuffled_indices(total_bits, interleave_seed(key, total_bits, repeat))
}

/// Build the CRC-protected frame without repetition or interleaving.
pub fn build_robust_frame(payload: &[u8]) -> Result<Vec<u8>> {
    let len = u32::try_from(payload.len())
        .map_err(|_| StegoError::invalid("payload longer than u32::MAX bytes"))?;
    let crc = crc32fast::hash(payload);

    let mut frame = Vec::with_capacity(ROBUST_HEADER_LEN + payload.len());
    frame.extend_from_slice(ROBUST_MAGIC);
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend_from_slice(&crc.to_be_bytes());
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Parse and CRC-check a robust frame. Trailing bytes are ignored.
pub fn parse_robust_frame(inner: &[u8]) -> Result<Vec<u8>> {
    if inner.len() < ROBUST_HEADER_LEN || &inner[..4] != ROBUST_MAGIC {
        return Err(StegoError::RobustDecodeFailed);
    }
    let len = u32::from_be_bytes([inner[4], inner[5], inner[6], inner[7]]) as usize;
    let stored_crc = u32::from_be_bytes([inner[8], inner[9], inner[10], inner[11]]);

    let body = &inner[ROBUST_HEADER_LEN..];
    if body.len() < len {
        return Err(StegoError::RobustDecodeFailed);
    }
    let payload = &body[..len];
    if crc32fast::hash(payload) != stored_crc {
        return Err(StegoError::RobustDecodeFailed);
    }
    Ok(payload.to_vec())
}

/// Repeat every bit `repeat` times in place order: `b0 b0 b0 b1 b1 b1 ...`.
pub fn repeat_bits(bits: &[u8], repeat: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(bits.len() * repeat);
    for &bit in bits {
        out.extend(std::iter::repeat(bit).take(repeat));
    }
    out
}

/// Majority vote over consecutive blocks of `repeat` bits.
///
/// Returns `None` if the bit count is not a multiple of `repeat`.
pub fn majority_vote(bits: &[u8], repeat: usize) -> Option<Vec<u8>> {
    if repeat == 0 || bits.len() % repeat != 0 {
        return None;
    }
    let needed = repeat / 2 + 1;
    Some(
        bits.chunks(repeat)
            .map(|block| {
                let ones = block.iter().filter(|&&b| b & 1 == 1).count();
                u8::from(ones >= needed)
            })
            .collect(),
    )
}

/// Encode `payload` with CRC, repetition and optional interleaving.
///
/// With `repeat == 1` and no interleaving the plain robust frame is returned.
///
/// # Errors
/// [`StegoError::InvalidParameter`] for an even or zero `repeat`, or when
/// the expanded stream would exceed the interleaver range. The size check
/// runs before any bit is expanded.
pub fn encode(payload: &[u8], key: &[u8], params: &RobustParams) -> Result<Vec<u8>> {
    params.validate()?;
    let frame = build_robust_frame(payload)?;
    if !params.expands() {
        return Ok(frame);
    }

    let fits = frame
        .len()
        .checked_mul(8)
        .and_then(|bits| bits.checked_mul(params.repeat))
        .is_some_and(|bits| bits <= MAX_INTERLEAVE_BITS);
    if !fits {
        return Err(StegoError::invalid("robust-coded payload exceeds the interleaver range"));
    }

    let expanded = repeat_bits(&bytes_to_bits(&frame), params.repeat);
    let out_bits = if params.interleave && !expanded.is_empty() {
        let perm = interleave_permutation(key, expanded.len(), params.repeat);
        perm.iter().map(|&src| expanded[src]).collect()
    } else {
        expanded
    };

    tracing::trace!(
        payload_len = payload.len(),
        encoded_bits = out_bits.len(),
        repeat = params.repeat,
        interleave = params.interleave,
        "robust encode"
    );
    Ok(bits_to_bytes(&out_bits))
}

/// Decode bytes produced by [`encode`] with the same key and parameters.
///
/// # Errors
/// - [`StegoError::InvalidParameter`] for an even or zero `repeat`.
/// - [`StegoError::RobustDecodeFailed`] on any structural or CRC mismatch.
pub fn decode(encoded: &[u8], key: &[u8], params: &RobustParams) -> Result<Vec<u8>> {
    params.validate()?;
    if !params.expands() {
        return parse_robust_frame(encoded);
    }

    if encoded.len() > MAX_INTERLEAVE_BITS / 8 {
        return Err(StegoError::RobustDecodeFailed);
    }
    let mut bits = bytes_to_bits(encoded);
    if params.interleave && !bits.is_empty() {
        // Encoded bit i came from expanded bit perm[i].
        let inv = permute::invert(&interleave_permutation(key, bits.len(), params.repeat));
        bits = inv.iter().map(|&i| bits[i]).collect();
    }

    let inner_bits = if params.repeat > 1 {
        majority_vote(&bits, params.repeat).ok_or(StegoError::RobustDecodeFailed)?
    } else {
        bits
    };
    parse_robust_frame(&bits_to_bytes(&inner_bits))
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &[u8] = b"0123456789abcdef";

    #[test]
    fn even_and_zero_repeat_rejected() {
        for repeat in [0, 2, 4] {
            assert!(matches!(
                encode(b"x", KEY, &RobustParams { repeat, interleave: false }),
                Err(StegoError::InvalidParameter(_))
            ));
            assert!(matches!(
                decode(b"x", KEY, &RobustParams { repeat, interleave: true }),
                Err(StegoError::InvalidParameter(_))
            ));
        }
        assert!(RobustParams::new(2, true).is_err());
        assert!(RobustParams::new(5, true).is_ok());
    }

    #[test]
    fn plain_frame_when_not_expanded() {
        let params = RobustParams { repeat: 1, interleave: false };
        let enc = encode(b"hi", KEY, &params).unwrap();
        assert_eq!(&enc[..4], b"RBST");
        assert_eq!(&enc[4..8], &[0, 0, 0, 2]);
        assert_eq!(&enc[8..12], &crc32fast::hash(b"hi").to_be_bytes());
        assert_eq!(&enc[12..], b"hi");
        assert_eq!(decode(&enc, KEY, &params).unwrap(), b"hi");
    }

    #[test]
    fn repetition_layout_without_interleave() {
        let params = RobustParams { repeat: 3, interleave: false };
        let enc = encode(&[0xA5], KEY, &params).unwrap();
        assert_eq!(enc.len(), params.encoded_len(1));
        // First frame byte 'R' = 0x52 = 0101_0010 -> each bit tripled
        let bits = bytes_to_bits(&enc);
        assert_eq!(&bits[..24], &repeat_bits(&bytes_to_bits(b"R"), 3)[..]);
    }

    #[test]
    fn roundtrip_all_modes() {
        let payload: Vec<u8> = (0..=255u8).collect();
        for repeat in [1, 3, 5] {
            for interleave in [false, true] {
                let params = RobustParams { repeat, interleave };
                let enc = encode(&payload, KEY, &params).unwrap();
                assert_eq!(enc.len(), params.encoded_len(payload.len()));
                assert_eq!(decode(&enc, KEY, &params).unwrap(), payload, "{params:?}");
            }
        }
    }

    #[test]
    fn interleave_changes_layout_and_depends_on_key() {
        let plain = encode(b"payload", KEY, &RobustParams { repeat: 3, interleave: false }).unwrap();
        let a = encode(b"payload", KEY, &RobustParams { repeat: 3, interleave: true }).unwrap();
        let b = encode(b"payload", b"other key", &RobustParams { repeat: 3, interleave: true }).unwrap();
        assert_ne!(plain, a);
        assert_ne!(a, b);
    }

    #[test]
    fn wrong_key_fails_with_interleave() {
        let params = RobustParams { repeat: 3, interleave: true };
        let enc = encode(b"some secret payload", KEY, &params).unwrap();
        assert!(matches!(decode(&enc, b"wrong", &params), Err(StegoError::RobustDecodeFailed)));
    }

    #[test]
    fn one_flip_per_block_is_corrected() {
        let params = RobustParams { repeat: 3, interleave: false };
        let enc = encode(b"tolerant", KEY, &params).unwrap();
        let mut bits = bytes_to_bits(&enc);
        for (block, chunk) in bits.chunks_mut(3).enumerate() {
            chunk[block % 3] ^= 1;
        }
        let corrupted = bits_to_bytes(&bits);
        assert_eq!(decode(&corrupted, KEY, &params).unwrap(), b"tolerant");
    }

    #[test]
    fn two_flips_per_block_fail_cleanly() {
        let params = RobustParams { repeat: 3, interleave: false };
        let enc = encode(b"fragile", KEY, &params).unwrap();
        let mut bits = bytes_to_bits(&enc);
        for chunk in bits.chunks_mut(3) {
            chunk[0] ^= 1;
            chunk[2] ^= 1;
        }
        let corrupted = bits_to_bytes(&bits);
        assert!(matches!(decode(&corrupted, KEY, &params), Err(StegoError::RobustDecodeFailed)));
    }

    #[test]
    fn crc_mismatch_detected() {
        let params = RobustParams { repeat: 1, interleave: false };
        let mut enc = encode(b"abc", KEY, &params).unwrap();
        let last = enc.len() - 1;
        enc[last] ^= 0x01;
        assert!(matches!(decode(&enc, KEY, &params), Err(StegoError::RobustDecodeFailed)));
    }

    #[test]
    fn bad_lengths_fail_without_panic() {
        let p3 = RobustParams { repeat: 3, interleave: false };
        // 1 byte = 8 bits, not a multiple of 3
        assert!(matches!(decode(&[0xFF], KEY, &p3), Err(StegoError::RobustDecodeFailed)));
        assert!(matches!(decode(&[], KEY, &p3), Err(StegoError::RobustDecodeFailed)));
        let p1 = RobustParams { repeat: 1, interleave: true };
        assert!(matches!(decode(&[], KEY, &p1), Err(StegoError::RobustDecodeFailed)));
        let plain = RobustParams { repeat: 1, interleave: false };
        assert!(matches!(
            decode(b"RBST\xff\xff\xff\xff\0\0\0\0", KEY, &plain),
            Err(StegoError::RobustDecodeFailed)
        ));
    }

    #[test]
    fn oversized_repeat_rejected_before_expanding() {
        let params = RobustParams { repeat: 1_000_000_001, interleave: false };
        assert!(params.validate().is_ok());
        assert!(matches!(
            encode(&[0u8; 64], KEY, &params),
            Err(StegoError::InvalidParameter(_))
        ));
        assert_eq!(params.encoded_len(usize::MAX), usize::MAX);
    }

    #[test]
    fn majority_vote_blocks() {
        assert_eq!(majority_vote(&[1, 1, 0, 0, 0, 1, 1, 0, 1], 3), Some(vec![1, 0, 1]));
        assert_eq!(majority_vote(&[1, 0], 3), None);
    }
}
