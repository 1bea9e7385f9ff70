// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Error types for the steganography pipeline.
//!
//! [`StegoError`] covers every failure mode from parameter validation through
//! framing, robust decoding and decryption. The variants fall in two groups:
//!
//! - **Caller misuse** (`InvalidParameter`, `CapacityExceeded`): reported as
//!   hard errors before any sample is touched.
//! - **No payload here** (`PreambleNotFound`, `TruncatedHeader`,
//!   `InsufficientData`, `CapacityMismatch`, `RobustDecodeFailed`,
//!   `IntegrityError`): the expected outcome of extracting with the wrong key
//!   or parameters, or from audio that carries nothing. See
//!   [`StegoError::is_no_payload`].

use thiserror::Error;

/// Errors that can occur during steganographic embedding or extraction.
#[derive(Debug, Error)]
pub enum StegoError {
    /// A parameter violates a precondition (even repeat factor, zero frame
    /// size, percentile out of range, unsupported key length, ...).
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The framed payload does not fit in the available sample positions.
    #[error("payload too large: {requested} bytes requested, capacity is {available} bytes")]
    CapacityExceeded { requested: usize, available: usize },

    /// The `ASTG` preamble was not found at the ordered positions.
    #[error("preamble not found")]
    PreambleNotFound,

    /// Fewer than 8 header bytes were available after the preamble check.
    #[error("message header truncated")]
    TruncatedHeader,

    /// The declared payload length runs past the end of the extracted bytes.
    #[error("declared payload length {declared} exceeds the {available} bytes available")]
    InsufficientData { declared: usize, available: usize },

    /// The declared payload length exceeds what the order can hold.
    #[error("declared payload of {declared} bits exceeds the {available} ordered positions")]
    CapacityMismatch { declared: usize, available: usize },

    /// CRC, magic or repetition structure of the robust frame did not check out.
    #[error("robust payload decode failed")]
    RobustDecodeFailed,

    /// CBC decryption produced invalid padding or a malformed blob.
    #[error("decryption integrity check failed (wrong key?)")]
    IntegrityError,

    /// The WAV file could not be opened, parsed or written.
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
}

impl StegoError {
    /// Returns `true` for the extraction-path outcomes that mean "no valid
    /// payload at these positions" rather than caller misuse.
    pub fn is_no_payload(&self) -> bool {
        matches!(
            self,
            Self::PreambleNotFound
                | Self::TruncatedHeader
                | Self::InsufficientData { .. }
                | Self::CapacityMismatch { .. }
                | Self::RobustDecodeFailed
                | Self::IntegrityError
        )
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }
}

/// Result alias used throughout the `stego` module.
pub type Result<T> = std::result::Result<T, StegoError>;
