// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Message framing and bit packing.
//!
//! The message is the self-describing container written into the sample
//! LSBs:
//!
//! ```text
//! [4 bytes ] preamble "ASTG"
//! [4 bytes ] payload length (big-endian u32)
//! [N bytes ] payload
//! ```
//!
//! The payload is whatever the inner layers produced: plaintext, an
//! `IV || ciphertext` blob, or a robust frame. Bits are packed MSB first.

use super::error::{Result, StegoError};

/// Magic bytes that open every embedded message.
pub const PREAMBLE: &[u8; 4] = b"ASTG";

/// Header length in bytes: preamble + u32 length.
pub const HEADER_LEN: usize = PREAMBLE.len() + 4;

/// Header length in bits (64).
pub const HEADER_BITS: usize = HEADER_LEN * 8;

/// Build `PREAMBLE || len_be32 || payload`.
///
/// # Errors
/// [`StegoError::InvalidParameter`] if the payload length does not fit in u32.
pub fn frame_message(payload: &[u8]) -> Result<Vec<u8>> {
    let len = u32::try_from(payload.len())
        .map_err(|_| StegoError::invalid("payload longer than u32::MAX bytes"))?;

    let mut msg = Vec::with_capacity(HEADER_LEN + payload.len());
    msg.extend_from_slice(PREAMBLE);
    msg.extend_from_slice(&len.to_be_bytes());
    msg.extend_from_slice(payload);
    Ok(msg)
}

/// Parse the header fields from the first [`HEADER_LEN`] bytes.
///
/// Returns the declared payload length.
pub fn parse_header(data: &[u8]) -> Result<usize> {
    if data.len() < PREAMBLE.len() || &data[..PREAMBLE.len()] != PREAMBLE {
        return Err(StegoError::PreambleNotFound);
    }
    if data.len() < HEADER_LEN {
        return Err(StegoError::TruncatedHeader);
    }
    let len = u32::from_be_bytes([data[4], data[5], data[6], data[7]]);
    Ok(len as usize)
}

/// Strip the header from a message, returning exactly the declared payload.
///
/// `data` may be longer than the message (trailing bytes are ignored).
///
/// # Errors
/// - [`StegoError::PreambleNotFound`] if the data does not start with `ASTG`.
/// - [`StegoError::TruncatedHeader`] if the length field is cut off.
/// - [`StegoError::InsufficientData`] if fewer than `length` bytes follow.
pub fn unframe(data: &[u8]) -> Result<&[u8]> {
    let declared = parse_header(data)?;
    let available = data.len() - HEADER_LEN;
    if declared > available {
        return Err(StegoError::InsufficientData { declared, available });
    }
    Ok(&data[HEADER_LEN..HEADER_LEN + declared])
}

/// Convert bytes to a bit vector (MSB first within each byte).
pub fn bytes_to_bits(bytes: &[u8]) -> Vec<u8> {
    let mut bits = Vec::with_capacity(bytes.len() * 8);
    for &byte in bytes {
        for bit_pos in (0..8).rev() {
            bits.push((byte >> bit_pos) & 1);
        }
    }
    bits
}

/// Convert a bit vector (MSB first) back to bytes.
/// Pads the last byte with zero bits if `bits.len()` is not a multiple of 8.
pub fn bits_to_bytes(bits: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(bits.len().div_ceil(8));
    for chunk in bits.chunks(8) {
        let mut byte = 0u8;
        for (i, &bit) in chunk.iter().enumerate() {
            byte |= (bit & 1) << (7 - i);
        }
        bytes.push(byte);
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_layout() {
        let msg = frame_message(b"HELLO").unwrap();
        assert_eq!(&msg[..4], b"ASTG");
        assert_eq!(&msg[4..8], &[0, 0, 0, 5]);
        assert_eq!(&msg[8..], b"HELLO");
        assert_eq!(msg.len(), HEADER_LEN + 5);
    }

    #[test]
    fn unframe_roundtrip_ignores_trailing_bytes() {
        let mut msg = frame_message(&[9, 8, 7]).unwrap();
        msg.extend_from_slice(&[0xFF; 10]);
        assert_eq!(unframe(&msg).unwrap(), &[9, 8, 7]);
    }

    #[test]
    fn empty_payload() {
        let msg = frame_message(&[]).unwrap();
        assert_eq!(msg.len(), HEADER_LEN);
        assert!(unframe(&msg).unwrap().is_empty());
    }

    #[test]
    fn wrong_magic() {
        let mut msg = frame_message(b"abc").unwrap();
        msg[0] = b'X';
        assert!(matches!(unframe(&msg), Err(StegoError::PreambleNotFound)));
        assert!(matches!(unframe(b"AS"), Err(StegoError::PreambleNotFound)));
        assert!(matches!(unframe(&[]), Err(StegoError::PreambleNotFound)));
    }

    #[test]
    fn truncated_header() {
        assert!(matches!(unframe(b"ASTG\x00\x00"), Err(StegoError::TruncatedHeader)));
    }

    #[test]
    fn declared_length_past_end() {
        let msg = frame_message(&[1u8; 20]).unwrap();
        match unframe(&msg[..HEADER_LEN + 5]) {
            Err(StegoError::InsufficientData { declared, available }) => {
                assert_eq!(declared, 20);
                assert_eq!(available, 5);
            }
            other => panic!("expected InsufficientData, got {other:?}"),
        }
    }

    #[test]
    fn bytes_bits_roundtrip() {
        let original = vec![0xDE, 0xAD, 0xBE, 0xEF];
        let bits = bytes_to_bits(&original);
        assert_eq!(bits.len(), 32);
        assert_eq!(&bits[..8], &[1, 1, 0, 1, 1, 1, 1, 0]);
        assert_eq!(bits_to_bytes(&bits), original);
    }

    #[test]
    fn bits_to_bytes_partial_byte() {
        // 10110_000 = 0xB0
        assert_eq!(bits_to_bytes(&[1, 0, 1, 1, 0]), vec![0xB0]);
    }
}
