// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Keyed adaptive embed / extract pipeline.
//!
//! Embedding composes the layers in this order:
//! 1. Keyed energy-adaptive order of the cover samples ([`order`]).
//! 2. Optional AES-CBC encryption of the plaintext ([`crypto`]).
//! 3. Optional CRC + repetition + interleave coding ([`robust`]).
//! 4. `ASTG` message framing ([`frame`]).
//! 5. LSB writes along the order, into a copy of the cover ([`lsb`]).
//!
//! Extraction recomputes the order from the stego samples and reverses every
//! step. Key and parameters must match between the two sides; nothing in the
//! message records them.

use super::capacity;
use super::crypto;
use super::error::{Result, StegoError};
use super::frame;
use super::lsb;
use super::order::{self, OrderParams};
use super::robust::{self, RobustParams};

/// Everything that must agree between [`embed`] and [`extract`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StegoParams {
    /// Analysis window length in samples.
    pub frame_size: usize,
    /// Distance between window starts in samples.
    pub hop_size: usize,
    /// Percentile (0..=100) below which frames are pushed late. 0 disables.
    pub energy_percentile: f64,
    /// Encrypt the plaintext with AES-CBC under the key. Requires a 16, 24
    /// or 32 byte key.
    pub encrypt: bool,
    /// Robust coding layer, or `None` to embed the (encrypted) payload as is.
    pub robust: Option<RobustParams>,
}

impl Default for StegoParams {
    fn default() -> Self {
        let order = OrderParams::default();
        Self {
            frame_size: order.frame_size,
            hop_size: order.hop_size,
            energy_percentile: order.energy_percentile,
            encrypt: true,
            robust: None,
        }
    }
}

impl StegoParams {
    pub fn with_framing(mut self, frame_size: usize, hop_size: usize) -> Self {
        self.frame_size = frame_size;
        self.hop_size = hop_size;
        self
    }

    pub fn with_energy_percentile(mut self, energy_percentile: f64) -> Self {
        self.energy_percentile = energy_percentile;
        self
    }

    pub fn with_encryption(mut self, encrypt: bool) -> Self {
        self.encrypt = encrypt;
        self
    }

    pub fn with_robust(mut self, robust: Option<RobustParams>) -> Self {
        self.robust = robust;
        self
    }

    /// The subset of parameters that drives the sample order.
    pub fn order_params(&self) -> OrderParams {
        OrderParams {
            frame_size: self.frame_size,
            hop_size: self.hop_size,
            energy_percentile: self.energy_percentile,
        }
    }

    /// Check every precondition that does not depend on the key.
    pub fn validate(&self) -> Result<()> {
        self.order_params().validate()?;
        if let Some(robust) = &self.robust {
            robust.validate()?;
        }
        Ok(())
    }

    /// Check parameters and, when encryption is on, the key length.
    fn validate_with_key(&self, key: &[u8]) -> Result<()> {
        self.validate()?;
        if self.encrypt {
            crypto::validate_key(key)?;
        }
        Ok(())
    }
}

/// Turn a plaintext into the payload that gets framed: encryption first,
/// then robust coding.
pub fn encode_payload(plaintext: &[u8], key: &[u8], params: &StegoParams) -> Result<Vec<u8>> {
    let mut payload = if params.encrypt {
        crypto::encrypt(plaintext, key)?
    } else {
        plaintext.to_vec()
    };
    if let Some(robust) = &params.robust {
        payload = robust::encode(&payload, key, robust)?;
    }
    Ok(payload)
}

/// Inverse of [`encode_payload`].
pub fn decode_payload(payload: &[u8], key: &[u8], params: &StegoParams) -> Result<Vec<u8>> {
    let inner = match &params.robust {
        Some(robust) => robust::decode(payload, key, robust)?,
        None => payload.to_vec(),
    };
    if params.encrypt {
        crypto::decrypt(&inner, key)
    } else {
        Ok(inner)
    }
}

/// Hide `plaintext` in a copy of `samples`.
///
/// The cover buffer is never modified. Only the LSBs of the first
/// `64 + 8 * payload_len` ordered samples can change.
///
/// # Errors
/// - `StegoError::InvalidParameter` if `params` fail validation, or
///   encryption is on and the key is not 16, 24 or 32 bytes.
/// - `StegoError::CapacityExceeded` if the encoded payload does not fit.
pub fn embed(
    samples: &[i16],
    plaintext: &[u8],
    key: &[u8],
    params: &StegoParams,
) -> Result<Vec<i16>> {
    params.validate_with_key(key)?;

    let order = order::generate_order(samples, key, &params.order_params())?;
    let available = lsb::capacity_from_order(order.len());
    let requested = capacity::payload_overhead(plaintext.len(), params);
    if requested > available {
        return Err(StegoError::CapacityExceeded { requested, available });
    }

    let payload = encode_payload(plaintext, key, params)?;
    let message = frame::frame_message(&payload)?;

    let mut stego = samples.to_vec();
    lsb::embed_bits(&mut stego, &order, &message)?;

    tracing::debug!(
        samples = samples.len(),
        plaintext_len = plaintext.len(),
        payload_len = payload.len(),
        bits_written = message.len() * 8,
        capacity = available,
        "embedded payload"
    );
    Ok(stego)
}

/// Recover the plaintext, reporting exactly why extraction failed.
///
/// # Errors
/// - `StegoError::InvalidParameter` for invalid parameters or key length.
/// - Any of the "no payload" kinds (see `StegoError::is_no_payload`) when
///   the samples do not carry a message for this key and these parameters.
pub fn try_extract(samples: &[i16], key: &[u8], params: &StegoParams) -> Result<Vec<u8>> {
    params.validate_with_key(key)?;

    let order = order::generate_order(samples, key, &params.order_params())?;
    let payload = lsb::extract_message(samples, &order)?;
    tracing::trace!(payload_len = payload.len(), "message located");

    decode_payload(&payload, key, params)
}

/// Recover the plaintext, or `None` if these samples carry no message for
/// this key and these parameters.
///
/// # Errors
/// Only precondition violations (`StegoError::InvalidParameter`).
pub fn extract(samples: &[i16], key: &[u8], params: &StegoParams) -> Result<Option<Vec<u8>>> {
    match try_extract(samples, key, params) {
        Ok(plaintext) => {
            tracing::debug!(plaintext_len = plaintext.len(), "extracted payload");
            Ok(Some(plaintext))
        }
        Err(e) if e.is_no_payload() => {
            tracing::debug!(error = %e, "no payload recovered");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
