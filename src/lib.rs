// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! # astg-core
//!
//! Keyed, energy-adaptive LSB steganography for 16-bit PCM audio.
//!
//! A payload is hidden in the least-significant bits of a mono sample
//! buffer. The positions come from a permutation seeded by the key and
//! biased toward loud frames, so only a key holder can find the bits and
//! the changes land where they are least audible. The payload can be
//! AES-CBC encrypted and protected by a CRC + repetition + interleave layer
//! before it is framed as `"ASTG" || length || payload`.
//!
//! The engine (`stego` module) works on in-memory `i16` buffers. The `audio`
//! module adds WAV file adapters (via `hound`), `metrics` adds SNR and BER.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use astg_core::{embed, extract, StegoParams};
//!
//! let key = astg_core::derive_key("passphrase", 16).unwrap();
//! let params = StegoParams::default().with_energy_percentile(20.0);
//! let stego = embed(&cover_samples, b"secret message", &key, &params).unwrap();
//! let recovered = extract(&stego, &key, &params).unwrap();
//! assert_eq!(recovered.as_deref(), Some(&b"secret message"[..]));
//! ```

pub mod audio;
pub mod metrics;
pub mod stego;

pub use stego::{embed, extract, try_extract, StegoParams, RobustParams, OrderParams, StegoError, Result};
pub use stego::{encode_payload, decode_payload, generate_order};
pub use stego::{estimate_capacity, payload_overhead};
pub use stego::{compute_energy_mask, embed_sequential, extract_sequential};
pub use stego::crypto::derive_key;
pub use audio::{embed_file, extract_file, read_wav_mono_i16, write_wav_mono_i16};
pub use metrics::{bit_error_rate, snr_db};
