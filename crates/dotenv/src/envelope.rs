//! Authenticated-encryption envelope around dotenv file contents.
//!
//! Responsibilities:
//! - Detect the envelope by its magic bytes (`is_enveloped`).
//! - Frame plaintext into the versioned wire format (`wrap`).
//! - Validate framing and decrypt (`unwrap`).
//!
//! Does NOT handle:
//! - Passphrase resolution (see `loader.rs`).
//! - The cryptographic primitives themselves (see `crypto.rs`).
//!
//! Invariants:
//! - Wire layout is magic(8) + version(1) + reserved(3) + salt(16) +
//!   nonce(24) + ciphertext, byte-for-byte.
//! - No partial output is ever produced from a malformed envelope.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use secrecy::{ExposeSecret, SecretString};

use crate::constants::{
    ENVELOPE_HEADER_LEN, ENVELOPE_MAGIC, ENVELOPE_VERSION, NONCE_LEN, NONCE_OFFSET, RESERVED_LEN,
    SALT_LEN, SALT_OFFSET,
};
use crate::crypto::CryptoProvider;
use crate::error::{DotenvError, Result};

/// True iff `bytes` starts with a complete envelope header carrying the
/// magic. Used by the loader to auto-detect encrypted files.
pub fn is_enveloped(bytes: &[u8]) -> bool {
    bytes.len() >= ENVELOPE_HEADER_LEN && bytes[..ENVELOPE_MAGIC.len()] == ENVELOPE_MAGIC[..]
}

/// Probe a file on disk for the envelope magic without reading the body.
pub fn is_enveloped_file(path: impl AsRef<Path>) -> Result<bool> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => DotenvError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => DotenvError::FileRead {
            path: path.to_path_buf(),
            source: e,
        },
    })?;
    let mut header = Vec::with_capacity(ENVELOPE_HEADER_LEN);
    file.take(ENVELOPE_HEADER_LEN as u64)
        .read_to_end(&mut header)
        .map_err(|e| DotenvError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
    Ok(is_enveloped(&header))
}

/// Encrypt `plaintext` into a framed envelope.
///
/// Generates a fresh random salt and nonce, derives the key from the
/// passphrase, and emits the framed ciphertext.
pub fn wrap<C: CryptoProvider>(
    plaintext: &[u8],
    passphrase: &SecretString,
    crypto: &C,
) -> Result<Vec<u8>> {
    if passphrase.expose_secret().is_empty() {
        return Err(DotenvError::KeyInvalid);
    }

    let mut salt = [0u8; SALT_LEN];
    crypto.fill_random(&mut salt);
    let mut nonce = [0u8; NONCE_LEN];
    crypto.fill_random(&mut nonce);

    let key = crypto.pwhash(passphrase, &salt)?;
    let ciphertext = crypto.seal(plaintext, &nonce, &key)?;

    let mut out = Vec::with_capacity(ENVELOPE_HEADER_LEN + ciphertext.len());
    out.extend_from_slice(ENVELOPE_MAGIC);
    out.push(ENVELOPE_VERSION);
    out.extend_from_slice(&[0u8; RESERVED_LEN]);
    out.extend_from_slice(&salt);
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Validate envelope framing and decrypt the payload.
///
/// Reserved header bytes are ignored on read. The error message for an
/// authentication failure deliberately does not distinguish a wrong key
/// from tampered data.
pub fn unwrap<C: CryptoProvider>(
    bytes: &[u8],
    passphrase: &SecretString,
    crypto: &C,
) -> Result<Vec<u8>> {
    if passphrase.expose_secret().is_empty() {
        return Err(DotenvError::KeyInvalid);
    }
    if !is_enveloped(bytes) {
        return Err(DotenvError::Decrypt {
            reason: "data is not encrypted",
        });
    }
    let version = bytes[ENVELOPE_MAGIC.len()];
    if version != ENVELOPE_VERSION {
        return Err(DotenvError::Decrypt {
            reason: "unsupported encryption format version",
        });
    }

    let mut salt = [0u8; SALT_LEN];
    salt.copy_from_slice(&bytes[SALT_OFFSET..SALT_OFFSET + SALT_LEN]);
    let mut nonce = [0u8; NONCE_LEN];
    nonce.copy_from_slice(&bytes[NONCE_OFFSET..NONCE_OFFSET + NONCE_LEN]);

    let key = crypto.pwhash(passphrase, &salt)?;
    crypto.open(&bytes[ENVELOPE_HEADER_LEN..], &nonce, &key)
}
