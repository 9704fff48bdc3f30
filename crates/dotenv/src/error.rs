//! Error types for dotenv loading.
//!
//! Responsibilities:
//! - Define error variants for every failure mode of the load pipeline.
//! - Expose the stable numeric code attached to each variant.
//!
//! Invariants:
//! - Numeric codes are part of the public surface and never change meaning.
//! - Error messages never include raw dotenv line contents, only positions.
//! - Decryption failures do not distinguish a wrong key from tampered data.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DotenvError>;

/// Errors raised while loading a dotenv file.
#[derive(Debug, Error)]
pub enum DotenvError {
    /// The input path does not exist or is not a regular file.
    #[error("File not found: {path}")]
    FileNotFound {
        /// The offending path.
        path: PathBuf,
    },

    /// An I/O failure occurred while reading the input.
    #[error("Failed to read {path}: {source}")]
    FileRead {
        /// The path being read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The parser rejected the input.
    ///
    /// Positions are 1-based and point at the offending character.
    #[error("Parse error at line {line}, column {column}: {message}")]
    Parse {
        /// Line of the offending character.
        line: usize,
        /// Column of the offending character.
        column: usize,
        /// What the parser expected.
        message: &'static str,
    },

    /// Envelope framing or authentication failure.
    #[error("Decryption failed: {reason}")]
    Decrypt {
        /// Why decryption was rejected.
        reason: &'static str,
    },

    /// The input is enveloped but no passphrase was found via any source.
    #[error("File is encrypted but no decryption key was provided")]
    KeyRequired,

    /// An empty passphrase was supplied.
    #[error("Decryption key must not be empty")]
    KeyInvalid,

    /// Reserved: opportunistic JSON decoding never raises this.
    #[error("Invalid JSON value: {0}")]
    JsonParse(String),

    /// The cryptographic primitives failed to initialize.
    #[error("Crypto initialization failed: {0}")]
    CryptoInit(String),
}

impl DotenvError {
    /// The stable numeric code for this error kind.
    ///
    /// Code 7 is reserved and unused at this layer.
    pub fn code(&self) -> u8 {
        match self {
            Self::FileNotFound { .. } => 1,
            Self::FileRead { .. } => 2,
            Self::Parse { .. } => 3,
            Self::Decrypt { .. } => 4,
            Self::KeyRequired => 5,
            Self::KeyInvalid => 6,
            Self::JsonParse(_) => 8,
            Self::CryptoInit(_) => 9,
        }
    }
}
