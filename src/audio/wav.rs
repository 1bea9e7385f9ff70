// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! 16-bit PCM WAV reading and writing (via `hound`).
//!
//! The engine works on one channel. Multi-channel files are reduced to their
//! first channel on read, and output is always written mono.

use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::stego::error::{Result, StegoError};
use crate::stego::{self, StegoParams};

/// Read the first channel of a 16-bit integer PCM WAV file.
///
/// Returns the samples together with the file's original spec.
///
/// # Errors
/// - [`StegoError::Wav`] if the file cannot be opened or parsed.
/// - [`StegoError::InvalidParameter`] for float or non-16-bit PCM.
pub fn read_wav_mono_i16(path: impl AsRef<Path>) -> Result<(Vec<i16>, WavSpec)> {
    let mut reader = WavReader::open(path.as_ref())?;
    let spec = reader.spec();
    if spec.sample_format != SampleFormat::Int || spec.bits_per_sample != 16 {
        return Err(StegoError::invalid(format!(
            "expected 16-bit integer PCM, got {}-bit {:?}",
            spec.bits_per_sample, spec.sample_format
        )));
    }
    if spec.channels == 0 {
        return Err(StegoError::invalid("WAV file declares zero channels"));
    }

    let samples = reader
        .samples::<i16>()
        .step_by(spec.channels as usize)
        .collect::<std::result::Result<Vec<i16>, hound::Error>>()?;

    tracing::debug!(
        path = %path.as_ref().display(),
        samples = samples.len(),
        channels = spec.channels,
        sample_rate = spec.sample_rate,
        "read wav"
    );
    Ok((samples, spec))
}

/// Write samples as a mono 16-bit PCM WAV file.
pub fn write_wav_mono_i16(path: impl AsRef<Path>, samples: &[i16], sample_rate: u32) -> Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path.as_ref(), spec)?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Read `cover`, hide `plaintext` with [`stego::embed`] and write the
/// result to `out` at the cover's sample rate.
pub fn embed_file(
    cover: impl AsRef<Path>,
    out: impl AsRef<Path>,
    plaintext: &[u8],
    key: &[u8],
    params: &StegoParams,
) -> Result<()> {
    let (samples, spec) = read_wav_mono_i16(cover)?;
    let marked = stego::embed(&samples, plaintext, key, params)?;
    write_wav_mono_i16(out, &marked, spec.sample_rate)
}

/// Read the WAV at `path` and recover its payload with [`stego::extract`].
pub fn extract_file(
    path: impl AsRef<Path>,
    key: &[u8],
    params: &StegoParams,
) -> Result<Option<Vec<u8>>> {
    let (samples, _) = read_wav_mono_i16(path)?;
    stego::extract(&samples, key, params)
}
