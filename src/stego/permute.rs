// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Keyed seeds and portable index permutations.
//!
//! Every pseudo-random choice in the engine runs on ChaCha20
//! (`rand_chacha::ChaCha20Rng`) seeded through `SeedableRng::seed_from_u64`
//! with a 64-bit seed taken from a SHA-256 digest (first 8 bytes, big-endian).
//! Embedder and extractor interoperate only if both sides draw byte-identical
//! streams, so the generator, the seed expansion and the draw pattern are all
//! fixed here.
//!
//! # Cross-platform portability
//!
//! The Fisher-Yates shuffle uses `u32` for `gen_range` (not `usize`) so that
//! the amount of PRNG entropy consumed per step is the same on 32-bit and
//! 64-bit targets.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use sha2::{Digest, Sha256};

/// Hash the concatenation of `parts` with SHA-256 and return the first
/// 8 bytes as a big-endian `u64`.
pub fn seed_from_parts(parts: &[&[u8]]) -> u64 {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    let digest = hasher.finalize();
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(head)
}

/// 64-bit ordering seed for a raw key: `SHA-256(key)[..8]` as big-endian.
pub fn key_seed(key: &[u8]) -> u64 {
    seed_from_parts(&[key])
}

/// Deterministic generator for a 64-bit seed.
pub fn keyed_rng(seed: u64) -> ChaCha20Rng {
    ChaCha20Rng::seed_from_u64(seed)
}

/// Draw `n` i.i.d. uniform values in `[0, 1)`, one per index, in index order.
pub fn uniform_draws(seed: u64, n: usize) -> Vec<f64> {
    let mut rng = keyed_rng(seed);
    (0..n).map(|_| rng.gen::<f64>()).collect()
}

/// Random permutation of `[0, n)` via a portable Fisher-Yates shuffle.
///
/// # Panics
/// Panics if `n` exceeds `u32::MAX + 1`; callers bound `n` by payload bit
/// counts, which are far below that.
pub fn shuffled_indices(n: usize, seed: u64) -> Vec<usize> {
    assert!(u32::try_from(n.saturating_sub(1)).is_ok(), "permutation too large for u32 shuffle");
    let mut perm: Vec<usize> = (0..n).collect();
    let mut rng = keyed_rng(seed);
    for i in (1..n).rev() {
        let j = rng.gen_range(0..=(i as u32)) as usize;
        perm.swap(i, j);
    }
    perm
}

/// Inverse of a permutation: `inv[perm[i]] = i`.
pub fn invert(perm: &[usize]) -> Vec<usize> {
    let mut inv = vec![0usize; perm.len()];
    for (i, &p) in perm.iter().enumerate() {
        inv[p] = i;
    }
    inv
}
