//! Encryption/decryption using SHA-256 + AES-256-GCM
//!
//! This module implements passphrase-based encryption using:
//! - a single SHA-256 hash of the passphrase as the 32-byte AES key
//! - AES-256-GCM with empty associated data for authenticated encryption
//!
//! Key derivation is unsalted and has no work factor, so the same
//! passphrase always yields the same key. Nonces are 12 random bytes per
//! encryption; the sealed output is ciphertext followed by a 16-byte tag.

use crate::error::{EncError, ErrorCategory, ErrorKind, Result};
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use rand::{CryptoRng, RngCore};
use sha2::{Digest, Sha256};
use std::fmt;
use zeroize::Zeroizing;

/// Length of nonce in bytes
pub const NONCE_LEN: usize = 12;

/// Length of derived key in bytes (selects AES-256)
pub const KEY_LEN: usize = 32;

/// Length of the GCM authentication tag in bytes
pub const TAG_LEN: usize = 16;

/// A 32-byte AES key derived from a passphrase. Wiped on drop.
pub struct DerivedKey(Zeroizing<[u8; KEY_LEN]>);

impl DerivedKey {
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DerivedKey(<redacted>)")
    }
}

/// Derive the AES-256 key for a passphrase: SHA-256 over its raw bytes.
pub fn derive_key(passphrase: &[u8]) -> DerivedKey {
    let digest = Sha256::digest(passphrase);
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    key.copy_from_slice(&digest);
    DerivedKey(key)
}

/// Draw a fresh nonce from a cryptographically secure random source.
pub fn generate_nonce<R: RngCore + CryptoRng>(rng: &mut R) -> [u8; NONCE_LEN] {
    let mut nonce = [0u8; NONCE_LEN];
    rng.fill_bytes(&mut nonce);
    nonce
}

fn cipher(key: &DerivedKey) -> Aes256Gcm {
    Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()))
}

/// Seal plaintext under `key` and `nonce`, returning ciphertext followed by the tag.
///
/// The caller must never reuse a nonce with the same key.
pub fn seal(key: &DerivedKey, nonce: &[u8; NONCE_LEN], plaintext: &[u8]) -> Result<Vec<u8>> {
    cipher(key)
        .encrypt(Nonce::from_slice(nonce), plaintext)
        .map_err(|e| {
            EncError::with_kind(
                ErrorCategory::Internal,
                ErrorKind::CipherFailure,
                format!("encryption failed: {}", e),
            )
        })
}

/// Open sealed bytes (ciphertext followed by the tag). Nothing is returned
/// unless the tag verifies.
pub fn open(key: &DerivedKey, nonce: &[u8; NONCE_LEN], sealed: &[u8]) -> Result<Vec<u8>> {
    cipher(key)
        .decrypt(Nonce::from_slice(nonce), sealed)
        .map_err(|_| {
            EncError::with_kind(
                ErrorCategory::User,
                ErrorKind::AuthenticationFailed,
                "corrupt input, tampered-with data, or bad passphrase",
            )
        })
}

/// Encrypt plaintext with a passphrase using a nonce drawn from `rng`
///
/// Returns the nonce and the sealed bytes.
pub fn encrypt<R: RngCore + CryptoRng>(
    passphrase: &[u8],
    plaintext: &[u8],
    rng: &mut R,
) -> Result<([u8; NONCE_LEN], Vec<u8>)> {
    let nonce = generate_nonce(rng);
    let sealed = encrypt_deterministic(passphrase, plaintext, &nonce)?;
    Ok((nonce, sealed))
}

/// Encrypt plaintext with a passphrase using the provided nonce
///
/// This function is ONLY for testing purposes to generate deterministic output.
/// NEVER use this in production - always use `encrypt()` which generates a random nonce.
pub fn encrypt_deterministic(
    passphrase: &[u8],
    plaintext: &[u8],
    nonce: &[u8; NONCE_LEN],
) -> Result<Vec<u8>> {
    let key = derive_key(passphrase);
    seal(&key, nonce, plaintext)
}

/// Decrypt sealed bytes with a passphrase
pub fn decrypt(passphrase: &[u8], nonce: &[u8; NONCE_LEN], sealed: &[u8]) -> Result<Vec<u8>> {
    let key = derive_key(passphrase);
    open(&key, nonce, sealed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    #[test]
    fn test_derive_key_is_sha256() {
        let key = derive_key(b"test");
        #[rustfmt::skip]
        let expected: [u8; KEY_LEN] = [
            0x9f, 0x86, 0xd0, 0x81, 0x88, 0x4c, 0x7d, 0x65,
            0x9a, 0x2f, 0xea, 0xa0, 0xc5, 0x5a, 0xd0, 0x15,
            0xa3, 0xbf, 0x4f, 0x1b, 0x2b, 0x0b, 0x82, 0x2c,
            0xd1, 0x5d, 0x6c, 0x15, 0xb0, 0xf0, 0x0a, 0x08,
        ];
        assert_eq!(key.as_bytes(), &expected);
    }

    #[test]
    fn test_derive_key_is_deterministic() {
        assert_eq!(derive_key(b"same").as_bytes(), derive_key(b"same").as_bytes());
        assert_ne!(derive_key(b"same").as_bytes(), derive_key(b"other").as_bytes());
    }

    #[test]
    fn test_derived_key_debug_is_redacted() {
        let key = derive_key(b"test");
        assert_eq!(format!("{:?}", key), "DerivedKey(<redacted>)");
    }

    #[test]
    fn test_empty_plaintext() {
        let (nonce, sealed) = encrypt(b"test", b"", &mut OsRng).unwrap();
        assert_eq!(sealed.len(), TAG_LEN);
        let decrypted = decrypt(b"test", &nonce, &sealed).unwrap();
        assert!(decrypted.is_empty());
    }

    #[test]
    fn test_sealed_length() {
        let plaintext = vec![0x42u8; 1000];
        let (_, sealed) = encrypt(b"test", &plaintext, &mut OsRng).unwrap();
        assert_eq!(sealed.len(), plaintext.len() + TAG_LEN);
    }

    #[test]
    fn test_nonce_uniqueness() {
        let plaintext = b"hello world";
        let (n1, s1) = encrypt(b"test", plaintext, &mut OsRng).unwrap();
        let (n2, s2) = encrypt(b"test", plaintext, &mut OsRng).unwrap();

        assert_ne!(n1, n2);
        assert_ne!(s1, s2);
        assert_eq!(decrypt(b"test", &n1, &s1).unwrap(), plaintext);
        assert_eq!(decrypt(b"test", &n2, &s2).unwrap(), plaintext);
    }

    #[test]
    fn test_deterministic_encryption() {
        let nonce = [2u8; NONCE_LEN];
        let ct1 = encrypt_deterministic(b"test", b"hello world", &nonce).unwrap();
        let ct2 = encrypt_deterministic(b"test", b"hello world", &nonce).unwrap();
        assert_eq!(ct1, ct2);
    }

    #[test]
    fn test_wrong_passphrase() {
        let (nonce, sealed) = encrypt(b"correct", b"secret data", &mut OsRng).unwrap();
        let err = decrypt(b"wrong", &nonce, &sealed).expect_err("expected authentication failure");
        assert_eq!(err.kind, Some(ErrorKind::AuthenticationFailed));
        assert!(
            err.to_string()
                .contains("corrupt input, tampered-with data, or bad passphrase")
        );
    }

    #[test]
    fn test_wrong_nonce() {
        let (mut nonce, sealed) = encrypt(b"test", b"secret data", &mut OsRng).unwrap();
        nonce[0] ^= 0x01;
        let err = decrypt(b"test", &nonce, &sealed).expect_err("expected authentication failure");
        assert_eq!(err.kind, Some(ErrorKind::AuthenticationFailed));
    }

    #[test]
    fn test_every_bit_flip_is_detected() {
        let (nonce, sealed) = encrypt(b"test", b"tamper me", &mut OsRng).unwrap();
        for byte in 0..sealed.len() {
            for bit in 0..8 {
                let mut tampered = sealed.clone();
                tampered[byte] ^= 1 << bit;
                let err = decrypt(b"test", &nonce, &tampered)
                    .expect_err("tampered data must not decrypt");
                assert_eq!(err.kind, Some(ErrorKind::AuthenticationFailed));
            }
        }
    }

    #[test]
    fn test_missing_tag_bytes() {
        let (nonce, sealed) = encrypt(b"test", b"hello", &mut OsRng).unwrap();
        let err = decrypt(b"test", &nonce, &sealed[..sealed.len() - 1])
            .expect_err("expected authentication failure");
        assert_eq!(err.kind, Some(ErrorKind::AuthenticationFailed));

        let err = decrypt(b"test", &nonce, &[]).expect_err("expected authentication failure");
        assert_eq!(err.kind, Some(ErrorKind::AuthenticationFailed));
    }

    #[test]
    fn test_all_byte_values() {
        let plaintext: Vec<u8> = (0..=255).collect();
        let (nonce, sealed) = encrypt(b"test", &plaintext, &mut OsRng).unwrap();
        assert_eq!(decrypt(b"test", &nonce, &sealed).unwrap(), plaintext);
    }

    #[test]
    fn test_large_plaintext() {
        let plaintext = vec![0x42u8; 128 * 1024]; // 128KB
        let (nonce, sealed) = encrypt(b"test", &plaintext, &mut OsRng).unwrap();
        assert_eq!(decrypt(b"test", &nonce, &sealed).unwrap(), plaintext);
    }

    #[test]
    fn test_known_ciphertext() {
        // Produced independently with AES-256-GCM keyed by SHA-256("test").
        let nonce = [0x24u8; NONCE_LEN];
        let sealed = encrypt_deterministic(b"test", b"test payload", &nonce).unwrap();

        #[rustfmt::skip]
        let expected: Vec<u8> = vec![
            0xfc, 0xf6, 0x05, 0x5b, 0xd1, 0xba, 0x07, 0x69,
            0x31, 0xa9, 0xa3, 0xd5, 0x9c, 0x1b, 0x2f, 0xd9,
            0x74, 0x95, 0xc8, 0x5d, 0xd1, 0xea, 0x06, 0x09,
            0xd6, 0x16, 0x34, 0x3b,
        ];
        assert_eq!(sealed, expected);

        let decrypted = decrypt(b"test", &nonce, &sealed).unwrap();
        assert_eq!(decrypted, b"test payload");
    }
}
