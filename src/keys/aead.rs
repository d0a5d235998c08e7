//! AES-256-GCM seal/open primitives
//!
//! Shared by the key manager (root-key sealing of the key blob) and the
//! field encryption engine (category-key envelopes). Output layout is
//! `nonce ‖ ciphertext+tag` with a fresh 96-bit random nonce per call.

use crate::domain::{CustodiaError, Result};
use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use rand::RngCore;

/// Nonce length in bytes (96 bits, as required by GCM)
pub const NONCE_LEN: usize = 12;

/// Symmetric key length in bytes (AES-256)
pub const KEY_LEN: usize = 32;

/// Seal plaintext under a 32-byte key
///
/// Returns `nonce ‖ ciphertext+tag`.
pub fn seal(key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|_| CustodiaError::Crypto("invalid key length for AES-256-GCM".to_string()))?;

    let mut nonce_bytes = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|_| CustodiaError::Crypto("AES-GCM encryption failed".to_string()))?;

    let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Open `nonce ‖ ciphertext+tag` under a 32-byte key
///
/// # Errors
///
/// Returns [`CustodiaError::AuthenticationFailure`] when the tag does not
/// verify; corrupted plaintext is never returned.
pub fn open(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    if data.len() <= NONCE_LEN {
        return Err(CustodiaError::Serialization(
            "sealed payload shorter than nonce".to_string(),
        ));
    }

    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|_| CustodiaError::Crypto("invalid key length for AES-256-GCM".to_string()))?;

    let (nonce_bytes, ciphertext) = data.split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);

    cipher.decrypt(nonce, ciphertext).map_err(|_| {
        CustodiaError::AuthenticationFailure("integrity tag mismatch".to_string())
    })
}

/// Generate a fresh random 32-byte key
pub fn random_key() -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    rand::thread_rng().fill_bytes(&mut key);
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_open_round_trip() {
        let key = random_key();
        let sealed = seal(&key, b"plaintext payload").unwrap();
        let opened = open(&key, &sealed).unwrap();
        assert_eq!(opened, b"plaintext payload");
    }

    #[test]
    fn test_fresh_nonce_per_seal() {
        let key = random_key();
        let a = seal(&key, b"same input").unwrap();
        let b = seal(&key, b"same input").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_tampered_ciphertext_fails_authentication() {
        let key = random_key();
        let mut sealed = seal(&key, b"payload").unwrap();
        // Flip one bit in the ciphertext region
        let last = sealed.len() - 1;
        sealed[last] ^= 0x01;
        let result = open(&key, &sealed);
        assert!(matches!(
            result,
            Err(crate::domain::CustodiaError::AuthenticationFailure(_))
        ));
    }

    #[test]
    fn test_tampered_nonce_fails_authentication() {
        let key = random_key();
        let mut sealed = seal(&key, b"payload").unwrap();
        sealed[0] ^= 0xFF;
        assert!(open(&key, &sealed).is_err());
    }

    #[test]
    fn test_wrong_key_fails_authentication() {
        let sealed = seal(&random_key(), b"payload").unwrap();
        let result = open(&random_key(), &sealed);
        assert!(matches!(
            result,
            Err(crate::domain::CustodiaError::AuthenticationFailure(_))
        ));
    }

    #[test]
    fn test_truncated_payload_is_serialization_error() {
        let key = random_key();
        let result = open(&key, &[0u8; 8]);
        assert!(matches!(
            result,
            Err(crate::domain::CustodiaError::Serialization(_))
        ));
    }
}
