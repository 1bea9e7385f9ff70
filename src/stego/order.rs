// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Keyed, energy-adaptive sample ordering.
//!
//! Produces the permutation of sample indices that embedder and extractor
//! both walk when writing or reading payload bits. Loud frames come early,
//! quiet frames late, and the key decides the order within that bias:
//!
//! 1. Per-frame RMS ([`energy::frame_rms`]), min-max normalized to `[0, 1]`
//!    (a flat signal scores 1.0 everywhere).
//! 2. With `energy_percentile > 0`, frames strictly below that percentile of
//!    the normalized scores are attenuated by [`LOW_ENERGY_ATTENUATION`].
//! 3. Frame scores are broadcast to their samples (later frames win in
//!    overlaps; uncovered samples score 0).
//! 4. One ChaCha20 uniform draw per sample, seeded from `SHA-256(key)`.
//! 5. Sort key `draw / (score + ORDER_EPSILON)`, stable ascending sort.
//!
//! The order depends only on (key, samples, frame_size, hop_size,
//! energy_percentile), never on the payload size, so any prefix of it is a
//! valid embedding path for a smaller payload.
//!
//! Scores are computed from the samples with their LSBs cleared. Embedding
//! only rewrites LSBs, so the extractor, scoring the stego signal, derives
//! exactly the order the embedder used on the cover.

use super::energy::{self, FrameBounds};
use super::error::{Result, StegoError};
use super::permute;

/// Added to every score before division so silent samples still get a finite key.
pub const ORDER_EPSILON: f64 = 1e-6;

/// Multiplier applied to frames below the energy percentile.
pub const LOW_ENERGY_ATTENUATION: f64 = 0.1;

/// Normalized score range below which all frames count as equally loud.
const FLAT_RANGE: f64 = 1e-12;

/// Parameters that determine the sample ordering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderParams {
    /// Analysis window length in samples.
    pub frame_size: usize,
    /// Distance between window starts in samples.
    pub hop_size: usize,
    /// Frames below this percentile (0..=100) of normalized energy are
    /// pushed late. 0 disables attenuation.
    pub energy_percentile: f64,
}

impl Default for OrderParams {
    fn default() -> Self {
        Self {
            frame_size: 1024,
            hop_size: 512,
            energy_percentile: 0.0,
        }
    }
}

impl OrderParams {
    pub fn validate(&self) -> Result<()> {
        energy::validate_framing(self.frame_size, self.hop_size)?;
        if !self.energy_percentile.is_finite()
            || !(0.0..=100.0).contains(&self.energy_percentile)
        {
            return Err(StegoError::invalid(format!(
                "energy_percentile must be within [0, 100], got {}",
                self.energy_percentile
            )));
        }
        Ok(())
    }
}

/// Min-max normalize to `[0, 1]`; a flat input maps to all ones.
pub fn normalize_scores(scores: &[f64]) -> Vec<f64> {
    if scores.is_empty() {
        return Vec::new();
    }
    let (mn, mx) = scores
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &s| (lo.min(s), hi.max(s)));
    let range = mx - mn;
    if range < FLAT_RANGE {
        return vec![1.0; scores.len()];
    }
    scores.iter().map(|&s| (s - mn) / range).collect()
}

/// Attenuate scores strictly below the given percentile of `scores`.
fn attenuate_low_energy(scores: &mut [f64], energy_percentile: f64) {
    if energy_percentile <= 0.0 || scores.is_empty() {
        return;
    }
    let threshold = energy::percentile(scores, energy_percentile);
    for s in scores.iter_mut() {
        if *s < threshold {
            *s *= LOW_ENERGY_ATTENUATION;
        }
    }
}

/// Spread each frame's score over its samples. Samples outside every frame stay 0.
fn broadcast_scores(n: usize, edges: &[FrameBounds], scores: &[f64]) -> Vec<f64> {
    let mut per_sample = vec![0.0f64; n];
    for (fb, &score) in edges.iter().zip(scores) {
        per_sample[fb.start..fb.end].fill(score);
    }
    per_sample
}

/// Per-sample adaptive scores (steps 1-3 of the ordering), computed on the
/// LSB-cleared signal.
pub fn sample_scores(samples: &[i16], params: &OrderParams) -> Result<Vec<f64>> {
    params.validate()?;
    let carrier: Vec<i16> = samples.iter().map(|&s| s & !1).collect();
    let (rms, edges) = energy::frame_rms(&carrier, params.frame_size, params.hop_size)?;
    let mut scores = normalize_scores(&rms);
    attenuate_low_energy(&mut scores, params.energy_percentile);
    Ok(broadcast_scores(samples.len(), &edges, &scores))
}

/// Generate the keyed, energy-adaptive permutation of `[0, samples.len())`.
///
/// Deterministic for fixed inputs. An empty buffer yields an empty order.
///
/// # Errors
/// [`StegoError::InvalidParameter`] if `params` fails validation.
pub fn generate_order(samples: &[i16], key: &[u8], params: &OrderParams) -> Result<Vec<usize>> {
    let scores = sample_scores(samples, params)?;
    let n = scores.len();

    let draws = permute::uniform_draws(permute::key_seed(key), n);
    let sort_keys: Vec<f64> = draws
        .iter()
        .zip(&scores)
        .map(|(&r, &s)| r / (s + ORDER_EPSILON))
        .collect();

    // slice::sort_by is stable: equal keys keep ascending index order.
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| sort_keys[a].total_cmp(&sort_keys[b]));

    tracing::trace!(samples = n, "generated sample order");
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn silent_then_loud(n: usize) -> Vec<i16> {
        (0..n)
            .map(|i| if i < n / 2 { 0 } else if i % 2 == 0 { 8000 } else { -8000 })
            .collect()
    }

    fn is_permutation(order: &[usize], n: usize) -> bool {
        let mut seen = vec![false; n];
        order.len() == n
            && order.iter().all(|&i| i < n && !std::mem::replace(&mut seen[i], true))
    }

    #[test]
    fn normalize_flat_is_all_ones() {
        assert_eq!(normalize_scores(&[5.0, 5.0, 5.0]), vec![1.0, 1.0, 1.0]);
        assert!(normalize_scores(&[]).is_empty());
    }

    #[test]
    fn normalize_min_max() {
        assert_eq!(normalize_scores(&[2.0, 4.0, 6.0]), vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn attenuation_below_threshold_only() {
        let mut s = vec![0.0, 0.25, 0.5, 0.75, 1.0];
        // 50th percentile = 0.5: only 0.0 and 0.25 are strictly below
        attenuate_low_energy(&mut s, 50.0);
        assert_eq!(s, vec![0.0, 0.025, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn attenuation_disabled_at_zero() {
        let mut s = vec![0.1, 0.9];
        attenuate_low_energy(&mut s, 0.0);
        assert_eq!(s, vec![0.1, 0.9]);
    }

    #[test]
    fn broadcast_later_frames_win_and_gaps_are_zero() {
        let edges = [
            FrameBounds { start: 0, end: 4 },
            FrameBounds { start: 2, end: 6 },
        ];
        let per = broadcast_scores(8, &edges, &[0.3, 0.9]);
        assert_eq!(per, vec![0.3, 0.3, 0.9, 0.9, 0.9, 0.9, 0.0, 0.0]);
    }

    #[test]
    fn order_is_permutation() {
        let samples = silent_then_loud(5000);
        let order = generate_order(&samples, b"key", &OrderParams::default()).unwrap();
        assert!(is_permutation(&order, samples.len()));
    }

    #[test]
    fn order_deterministic() {
        let samples = silent_then_loud(4000);
        let params = OrderParams { energy_percentile: 20.0, ..OrderParams::default() };
        let a = generate_order(&samples, b"k1", &params).unwrap();
        let b = generate_order(&samples, b"k1", &params).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn order_depends_on_key() {
        let samples = silent_then_loud(4000);
        let params = OrderParams::default();
        let a = generate_order(&samples, b"k1", &params).unwrap();
        let b = generate_order(&samples, b"k2", &params).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn loud_samples_come_first() {
        let samples = silent_then_loud(8192);
        let order = generate_order(&samples, b"key", &OrderParams::default()).unwrap();
        // Samples before 3584 belong only to silent frames (score 0, key
        // ~1e6 * draw); reaching the first 1000 would need a draw below ~2e-7.
        assert!(order[..1000].iter().all(|&i| i >= 3584));
        let early_loud = order[..1000].iter().filter(|&&i| i >= 4096).count();
        assert!(early_loud > 800, "only {early_loud} of the first 1000 positions are loud");
    }

    #[test]
    fn order_ignores_lsb_changes() {
        let cover = silent_then_loud(6000);
        let stego: Vec<i16> = cover
            .iter()
            .enumerate()
            .map(|(i, &s)| (s & !1) | ((i % 3 == 0) as i16))
            .collect();
        let params = OrderParams { energy_percentile: 20.0, ..OrderParams::default() };
        assert_eq!(
            generate_order(&cover, b"key", &params).unwrap(),
            generate_order(&stego, b"key", &params).unwrap()
        );
    }

    #[test]
    fn empty_buffer_empty_order() {
        let order = generate_order(&[], b"key", &OrderParams::default()).unwrap();
        assert!(order.is_empty());
    }

    #[test]
    fn flat_signal_orders_by_draw() {
        // All scores 1.0, so the order is the argsort of the raw draws.
        let samples = vec![100i16; 300];
        let order = generate_order(&samples, b"flat", &OrderParams::default()).unwrap();
        let draws = permute::uniform_draws(permute::key_seed(b"flat"), 300);
        for w in order.windows(2) {
            assert!(draws[w[0]] <= draws[w[1]]);
        }
    }

    #[test]
    fn invalid_percentile_rejected() {
        let params = OrderParams { energy_percentile: 101.0, ..OrderParams::default() };
        assert!(matches!(
            generate_order(&[1, 2, 3], b"k", &params),
            Err(StegoError::InvalidParameter(_))
        ));
        let params = OrderParams { energy_percentile: f64::NAN, ..OrderParams::default() };
        assert!(params.validate().is_err());
    }
}
