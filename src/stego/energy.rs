// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Frame segmentation and per-frame energy scoring.
//!
//! The signal is cut into windows of `frame_size` samples starting every
//! `hop_size` samples. Windows may overlap (`hop < frame`) or leave gaps
//! (`hop > frame`); the last window is clipped to the buffer end. Each window
//! gets one RMS score, which drives the energy-adaptive ordering in
//! [`order`](super::order).
//!
//! RMS is accumulated in `f64` in sample order, so the serial and the
//! `parallel` (rayon) paths produce bit-identical scores.

use super::error::{Result, StegoError};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Half-open sample range `[start, end)` covered by one analysis frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameBounds {
    pub start: usize,
    pub end: usize,
}

impl FrameBounds {
    /// The samples this frame covers.
    pub fn slice<'a>(&self, samples: &'a [i16]) -> &'a [i16] {
        &samples[self.start..self.end]
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Reject zero frame or hop sizes, which would produce no frames or loop forever.
pub fn validate_framing(frame_size: usize, hop_size: usize) -> Result<()> {
    if frame_size == 0 {
        return Err(StegoError::invalid("frame_size must be positive"));
    }
    if hop_size == 0 {
        return Err(StegoError::invalid("hop_size must be positive"));
    }
    Ok(())
}

/// Compute frame bounds for a buffer of `n` samples.
///
/// Frames start at `0, hop, 2*hop, ...` while `start < n`; each ends at
/// `min(start + frame_size, n)`.
pub fn frame_edges(n: usize, frame_size: usize, hop_size: usize) -> Result<Vec<FrameBounds>> {
    validate_framing(frame_size, hop_size)?;

    let mut edges = Vec::with_capacity(n / hop_size + 1);
    let mut start = 0usize;
    while start < n {
        let end = start.saturating_add(frame_size).min(n);
        if start >= end {
            break;
        }
        edges.push(FrameBounds { start, end });
        start += hop_size;
    }
    Ok(edges)
}

fn rms(frame: &[i16]) -> f64 {
    if frame.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = frame
        .iter()
        .map(|&s| {
            let v = s as f64;
            v * v
        })
        .sum();
    (sum_sq / frame.len() as f64).sqrt()
}

/// Root-mean-square energy of every frame, together with the frame bounds.
///
/// An all-silent buffer yields 0.0 for every frame; an empty buffer yields
/// no frames.
pub fn frame_rms(
    samples: &[i16],
    frame_size: usize,
    hop_size: usize,
) -> Result<(Vec<f64>, Vec<FrameBounds>)> {
    let edges = frame_edges(samples.len(), frame_size, hop_size)?;

    #[cfg(feature = "parallel")]
    let scores: Vec<f64> = edges
        .par_iter()
        .map(|fb| rms(fb.slice(samples)))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let scores: Vec<f64> = edges
        .iter()
        .map(|fb| rms(fb.slice(samples)))
        .collect();

    Ok((scores, edges))
}

/// Mean absolute sample value per frame (the energy measure of the
/// non-keyed masking mode).
pub fn frame_mean_abs(
    samples: &[i16],
    frame_size: usize,
    hop_size: usize,
) -> Result<(Vec<f64>, Vec<FrameBounds>)> {
    let edges = frame_edges(samples.len(), frame_size, hop_size)?;
    let energies = edges
        .iter()
        .map(|fb| {
            if fb.is_empty() {
                return 0.0;
            }
            let sum: f64 = fb.slice(samples).iter().map(|&s| (s as f64).abs()).sum();
            sum / fb.len() as f64
        })
        .collect();
    Ok((energies, edges))
}

/// Percentile of `values` with linear interpolation between closest ranks.
///
/// `percentile` is in `[0, 100]`. Returns 0.0 for an empty slice.
pub fn percentile(values: &[f64], percentile: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let rank = (percentile / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}
