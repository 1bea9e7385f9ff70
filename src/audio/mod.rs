// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Audio file adapters around the sample-buffer engine.

pub mod wav;

pub use wav::{embed_file, extract_file, read_wav_mono_i16, write_wav_mono_i16};
