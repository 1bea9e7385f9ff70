// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Embedding quality metrics.

use crate::stego::error::{Result, StegoError};

const POWER_FLOOR: f64 = 1e-12;

/// Signal-to-noise ratio in dB of `stego` against `original`.
///
/// Both signals are scaled by their common peak before comparing, so the
/// result does not depend on absolute level. Buffers of different length are
/// compared over their common prefix.
pub fn snr_db(original: &[i16], stego: &[i16]) -> f64 {
    let n = original.len().min(stego.len());
    let (x, y) = (&original[..n], &stego[..n]);

    let peak = x
        .iter()
        .chain(y)
        .map(|&s| (s as f64).abs())
        .fold(POWER_FLOOR, f64::max);

    let (mut p_sig, mut p_noise) = (0.0f64, 0.0f64);
    for (&a, &b) in x.iter().zip(y) {
        let a = a as f64 / peak;
        let b = b as f64 / peak;
        p_sig += a * a;
        p_noise += (b - a) * (b - a);
    }
    if n > 0 {
        p_sig /= n as f64;
        p_noise /= n as f64;
    }
    10.0 * ((p_sig + POWER_FLOOR) / (p_noise + POWER_FLOOR)).log10()
}

/// Fraction of positions where two bit sequences differ.
///
/// # Errors
/// [`StegoError::InvalidParameter`] if the lengths differ.
pub fn bit_error_rate(a: &[u8], b: &[u8]) -> Result<f64> {
    if a.len() != b.len() {
        return Err(StegoError::invalid(format!(
            "bit sequences differ in length: {} vs {}",
            a.len(),
            b.len()
        )));
    }
    if a.is_empty() {
        return Ok(0.0);
    }
    let errors = a.iter().zip(b).filter(|(x, y)| x != y).count();
    Ok(errors as f64 / a.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_signals_hit_the_floor() {
        let x: Vec<i16> = (0..1000).map(|i| ((i * 37) % 2000 - 1000) as i16).collect();
        // Zero noise leaves only the 1e-12 floor: roughly 10 * log10(0.33 / 1e-12).
        assert!(snr_db(&x, &x) > 110.0);
    }

    #[test]
    fn lsb_noise_snr() {
        // Full-scale square wave, every sample off by one.
        let x: Vec<i16> = (0..1000).map(|i| if i % 2 == 0 { 32_000 } else { -32_000 }).collect();
        let y: Vec<i16> = x.iter().map(|&s| s + 1).collect();
        // signal power 1, noise power (1/32000)^2
        let expected = 10.0 * (32_000.0f64 * 32_000.0).log10();
        assert!((snr_db(&x, &y) - expected).abs() < 0.01);
    }

    #[test]
    fn snr_uses_common_prefix() {
        let x = vec![1000i16; 10];
        let mut y = vec![1000i16; 20];
        y[15] = 0;
        assert!(snr_db(&x, &y) > 100.0);
        assert_eq!(snr_db(&[], &[]), 0.0);
    }

    #[test]
    fn ber_counts_differences() {
        assert_eq!(bit_error_rate(&[0, 1, 1, 0], &[0, 1, 0, 1]).unwrap(), 0.5);
        assert_eq!(bit_error_rate(&[1, 1], &[1, 1]).unwrap(), 0.0);
        assert_eq!(bit_error_rate(&[], &[]).unwrap(), 0.0);
    }

    #[test]
    fn ber_length_mismatch() {
        assert!(matches!(bit_error_rate(&[0], &[0, 1]), Err(StegoError::InvalidParameter(_))));
    }
}
