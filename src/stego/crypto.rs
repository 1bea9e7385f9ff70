// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Payload encryption.
//!
//! AES in CBC mode with PKCS#7 padding. The key size picks the variant:
//! 16 bytes for AES-128, 24 for AES-192, 32 for AES-256. Every call draws a
//! fresh random IV which is prepended to the ciphertext:
//!
//! ```text
//! [16 bytes] IV
//! [N bytes ] ciphertext (N a non-zero multiple of 16)
//! ```
//!
//! CBC carries no authentication; a wrong key is detected through invalid
//! padding, which happens with probability ~255/256 per attempt. The outer
//! preamble check and the optional robust CRC catch most of the remainder.

use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use aes::{Aes128, Aes192, Aes256, Block};
use rand::RngCore;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use super::error::{Result, StegoError};

/// AES block size in bytes.
pub const BLOCK_LEN: usize = 16;

/// CBC initialization vector length in bytes.
pub const IV_LEN: usize = 16;

/// Accepted raw key lengths.
pub const KEY_LENGTHS: [usize; 3] = [16, 24, 32];

/// AES variant selected by key length.
enum AesCipher {
    Aes128(Aes128),
    Aes192(Aes192),
    Aes256(Aes256),
}

impl AesCipher {
    fn new(key: &[u8]) -> Result<Self> {
        validate_key(key)?;
        let cipher = match key.len() {
            16 => Aes128::new_from_slice(key).map(Self::Aes128),
            24 => Aes192::new_from_slice(key).map(Self::Aes192),
            _ => Aes256::new_from_slice(key).map(Self::Aes256),
        };
        cipher.map_err(|_| StegoError::invalid("invalid AES key length"))
    }

    fn encrypt_block(&self, block: &mut Block) {
        match self {
            Self::Aes128(c) => c.encrypt_block(block),
            Self::Aes192(c) => c.encrypt_block(block),
            Self::Aes256(c) => c.encrypt_block(block),
        }
    }

    fn decrypt_block(&self, block: &mut Block) {
        match self {
            Self::Aes128(c) => c.decrypt_block(block),
            Self::Aes192(c) => c.decrypt_block(block),
            Self::Aes256(c) => c.decrypt_block(block),
        }
    }
}

/// Check that `key` is a valid AES key length.
pub fn validate_key(key: &[u8]) -> Result<()> {
    if KEY_LENGTHS.contains(&key.len()) {
        Ok(())
    } else {
        Err(StegoError::invalid(format!(
            "AES key must be 16, 24 or 32 bytes, got {}",
            key.len()
        )))
    }
}

/// Derive raw key bytes from a passphrase: `SHA-256(passphrase)[..key_len]`.
pub fn derive_key(passphrase: &str, key_len: usize) -> Result<Zeroizing<Vec<u8>>> {
    if !KEY_LENGTHS.contains(&key_len) {
        return Err(StegoError::invalid(format!(
            "key length must be 16, 24 or 32 bytes, got {key_len}"
        )));
    }
    let digest: Zeroizing<[u8; 32]> = Zeroizing::new(Sha256::digest(passphrase.as_bytes()).into());
    Ok(Zeroizing::new(digest[..key_len].to_vec()))
}

/// Ciphertext blob length (IV included) for a plaintext of `plaintext_len` bytes.
pub fn encrypted_len(plaintext_len: usize) -> usize {
    IV_LEN + (plaintext_len / BLOCK_LEN + 1) * BLOCK_LEN
}

/// Encrypt with AES-CBC under a fresh random IV. Returns `IV || ciphertext`.
///
/// # Errors
/// [`StegoError::InvalidParameter`] if the key is not 16, 24 or 32 bytes.
pub fn encrypt(plaintext: &[u8], key: &[u8]) -> Result<Vec<u8>> {
    let mut iv = [0u8; IV_LEN];
    rand::thread_rng().fill_bytes(&mut iv);
    encrypt_with_iv(plaintext, key, &iv)
}

/// Encrypt with AES-CBC under a caller-provided IV. Returns `IV || ciphertext`.
///
/// Only for reproducible vectors; reusing an IV with the same key leaks
/// equality of plaintext prefixes.
pub fn encrypt_with_iv(plaintext: &[u8], key: &[u8], iv: &[u8; IV_LEN]) -> Result<Vec<u8>> {
    let cipher = AesCipher::new(key)?;

    // PKCS#7: always pad, a full block when already aligned.
    let pad = BLOCK_LEN - plaintext.len() % BLOCK_LEN;
    let mut padded = Zeroizing::new(Vec::with_capacity(plaintext.len() + pad));
    padded.extend_from_slice(plaintext);
    padded.resize(plaintext.len() + pad, pad as u8);

    let mut out = Vec::with_capacity(IV_LEN + padded.len());
    out.extend_from_slice(iv);

    let mut prev = *iv;
    for chunk in padded.chunks_exact(BLOCK_LEN) {
        let mut xored = [0u8; BLOCK_LEN];
        for i in 0..BLOCK_LEN {
            xored[i] = chunk[i] ^ prev[i];
        }
        let mut block = Block::from(xored);
        cipher.encrypt_block(&mut block);
        prev.copy_from_slice(&block);
        out.extend_from_slice(&block);
    }
    Ok(out)
}

/// Decrypt an `IV || ciphertext` blob produced by [`encrypt`].
///
/// # Errors
/// - [`StegoError::InvalidParameter`] if the key is not 16, 24 or 32 bytes.
/// - [`StegoError::IntegrityError`] if the blob is malformed or the padding
///   is invalid after decryption (typically a wrong key).
pub fn decrypt(blob: &[u8], key: &[u8]) -> Result<Vec<u8>> {
    let cipher = AesCipher::new(key)?;

    if blob.len() < IV_LEN + BLOCK_LEN || (blob.len() - IV_LEN) % BLOCK_LEN != 0 {
        return Err(StegoError::IntegrityError);
    }
    let (iv, ciphertext) = blob.split_at(IV_LEN);

    let mut plain = Zeroizing::new(Vec::with_capacity(ciphertext.len()));
    let mut prev: &[u8] = iv;
    for chunk in ciphertext.chunks_exact(BLOCK_LEN) {
        let mut block = Block::clone_from_slice(chunk);
        cipher.decrypt_block(&mut block);
        for i in 0..BLOCK_LEN {
            plain.push(block[i] ^ prev[i]);
        }
        prev = chunk;
    }

    let pad = plain[plain.len() - 1] as usize;
    if pad == 0 || pad > BLOCK_LEN || pad > plain.len() {
        return Err(StegoError::IntegrityError);
    }
    if !plain[plain.len() - pad..].iter().all(|&b| b as usize == pad) {
        return Err(StegoError::IntegrityError);
    }
    Ok(plain[..plain.len() - pad].to_vec())
}
