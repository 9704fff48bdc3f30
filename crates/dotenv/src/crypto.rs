//! Cryptographic primitives behind the envelope codec.
//!
//! Responsibilities:
//! - Define the [`CryptoProvider`] capability the envelope codec calls
//!   through (random bytes, password hashing, authenticated encryption).
//! - Provide [`SodiumCrypto`], the default provider: Argon2id key derivation
//!   and XSalsa20-Poly1305 secretbox semantics.
//!
//! Does NOT handle:
//! - Envelope framing (see `envelope.rs`).
//! - Passphrase resolution (see `loader.rs`).
//!
//! Invariants:
//! - Derived keys are zeroized when dropped.
//! - `open` failures surface as `Decrypt` without distinguishing a wrong key
//!   from tampered data.

use argon2::{Algorithm, Argon2, Params, Version};
use crypto_secretbox::aead::{Aead, KeyInit};
use crypto_secretbox::{Nonce, XSalsa20Poly1305};
use rand::Rng;
use secrecy::{ExposeSecret, SecretString};
use zeroize::Zeroize;

use crate::constants::{KEY_LEN, NONCE_LEN, PWHASH_LANES, PWHASH_MEM_KIB, PWHASH_OPS, SALT_LEN};
use crate::error::{DotenvError, Result};

/// A derived 32-byte symmetric key, zeroized on drop.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct DerivedKey([u8; KEY_LEN]);

impl DerivedKey {
    /// Wrap raw key bytes.
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Borrow the key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

/// Capability the envelope codec consumes.
///
/// Tests substitute a deterministic stand-in to validate framing
/// independently of cryptographic strength.
pub trait CryptoProvider {
    /// Fill `buf` with random bytes.
    fn fill_random(&self, buf: &mut [u8]);

    /// Derive a symmetric key from a passphrase and salt.
    fn pwhash(&self, passphrase: &SecretString, salt: &[u8; SALT_LEN]) -> Result<DerivedKey>;

    /// Encrypt and authenticate `plaintext`. The tag is carried inside the
    /// returned ciphertext as defined by the cipher.
    fn seal(&self, plaintext: &[u8], nonce: &[u8; NONCE_LEN], key: &DerivedKey) -> Result<Vec<u8>>;

    /// Verify and decrypt `ciphertext`.
    fn open(
        &self,
        ciphertext: &[u8],
        nonce: &[u8; NONCE_LEN],
        key: &DerivedKey,
    ) -> Result<Vec<u8>>;
}

/// Default provider: Argon2id + XSalsa20-Poly1305.
#[derive(Debug, Default, Clone, Copy)]
pub struct SodiumCrypto;

impl SodiumCrypto {
    fn argon2(&self) -> Result<Argon2<'static>> {
        let params = Params::new(PWHASH_MEM_KIB, PWHASH_OPS, PWHASH_LANES, Some(KEY_LEN))
            .map_err(|e| DotenvError::CryptoInit(e.to_string()))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

impl CryptoProvider for SodiumCrypto {
    fn fill_random(&self, buf: &mut [u8]) {
        rand::rng().fill(buf);
    }

    fn pwhash(&self, passphrase: &SecretString, salt: &[u8; SALT_LEN]) -> Result<DerivedKey> {
        let mut key = [0u8; KEY_LEN];
        self.argon2()?
            .hash_password_into(passphrase.expose_secret().as_bytes(), salt, &mut key)
            .map_err(|e| DotenvError::CryptoInit(e.to_string()))?;
        Ok(DerivedKey(key))
    }

    fn seal(&self, plaintext: &[u8], nonce: &[u8; NONCE_LEN], key: &DerivedKey) -> Result<Vec<u8>> {
        let cipher = XSalsa20Poly1305::new(key.as_bytes().into());
        cipher
            .encrypt(Nonce::from_slice(nonce), plaintext)
            .map_err(|_| DotenvError::Decrypt {
                reason: "encryption failed",
            })
    }

    fn open(
        &self,
        ciphertext: &[u8],
        nonce: &[u8; NONCE_LEN],
        key: &DerivedKey,
    ) -> Result<Vec<u8>> {
        let cipher = XSalsa20Poly1305::new(key.as_bytes().into());
        cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| DotenvError::Decrypt {
                reason: "wrong key or tampered data",
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_random_is_not_constant() {
        let crypto = SodiumCrypto;
        let mut a = [0u8; NONCE_LEN];
        let mut b = [0u8; NONCE_LEN];
        crypto.fill_random(&mut a);
        crypto.fill_random(&mut b);
        assert_ne!(a, b);
    }

    #[test]
    fn test_seal_open_roundtrip() {
        let crypto = SodiumCrypto;
        let key = DerivedKey::from_bytes([42u8; KEY_LEN]);
        let nonce = [7u8; NONCE_LEN];
        let plaintext = b"APP_KEY=secret";

        let ciphertext = crypto.seal(plaintext, &nonce, &key).unwrap();
        assert_eq!(ciphertext.len(), plaintext.len() + crate::constants::TAG_LEN);

        let decrypted = crypto.open(&ciphertext, &nonce, &key).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_open_rejects_wrong_key() {
        let crypto = SodiumCrypto;
        let key = DerivedKey::from_bytes([1u8; KEY_LEN]);
        let other = DerivedKey::from_bytes([2u8; KEY_LEN]);
        let nonce = [0u8; NONCE_LEN];

        let ciphertext = crypto.seal(b"payload", &nonce, &key).unwrap();
        let err = crypto.open(&ciphertext, &nonce, &other).unwrap_err();
        assert_eq!(err.code(), 4);
    }

    #[test]
    fn test_open_rejects_tampered_ciphertext() {
        let crypto = SodiumCrypto;
        let key = DerivedKey::from_bytes([1u8; KEY_LEN]);
        let nonce = [0u8; NONCE_LEN];

        let mut ciphertext = crypto.seal(b"payload", &nonce, &key).unwrap();
        ciphertext[0] ^= 0xFF;
        assert!(crypto.open(&ciphertext, &nonce, &key).is_err());
    }
}
