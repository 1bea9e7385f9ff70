// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Audio LSB steganography engine.
//!
//! Two embedding modes share the `ASTG` message format:
//!
//! - **Keyed adaptive** (`embed` / `extract`): bits are scattered over a
//!   key-seeded permutation of the samples, biased toward loud frames, with
//!   optional AES-CBC encryption and CRC + repetition + interleave coding.
//!
//! - **Sequential** (`embed_sequential` / `extract_sequential`): bits are
//!   written to consecutive samples, optionally restricted to an energy
//!   mask. No key; the extractor scans for the preamble.

pub mod error;
pub mod energy;
pub mod permute;
pub mod order;
pub mod frame;
pub mod robust;
pub mod crypto;
pub mod lsb;
pub mod capacity;
pub mod sequential;
mod pipeline;

pub use error::{Result, StegoError};
pub use order::{generate_order, OrderParams};
pub use robust::RobustParams;
pub use pipeline::{decode_payload, embed, encode_payload, extract, try_extract, StegoParams};
pub use capacity::{estimate_capacity, payload_overhead};
pub use sequential::{compute_energy_mask, embed_sequential, extract_sequential};
