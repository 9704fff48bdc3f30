//! Wire-format constants and key-derivation parameters.
//!
//! The envelope layout is fixed and interoperable: any implementation that
//! follows the same magic, version, salt/nonce sizes, Argon2id parameters,
//! and XSalsa20-Poly1305 construction can read files written here.

/// Magic bytes at the start of every encrypted envelope.
pub const ENVELOPE_MAGIC: &[u8; 8] = b"SFDOTENV";

/// Current envelope format version.
pub const ENVELOPE_VERSION: u8 = 0x01;

/// Reserved header bytes, written as zero and ignored on read.
pub const RESERVED_LEN: usize = 3;

/// Size of the Argon2id salt in bytes.
pub const SALT_LEN: usize = 16;

/// Size of the XSalsa20-Poly1305 nonce in bytes.
pub const NONCE_LEN: usize = 24;

/// Size of the Poly1305 authentication tag in bytes.
pub const TAG_LEN: usize = 16;

/// Size of the derived symmetric key in bytes.
pub const KEY_LEN: usize = 32;

/// Size of the envelope header in bytes.
/// Layout: magic(8) + version(1) + reserved(3) + salt(16) + nonce(24) = 52
pub const ENVELOPE_HEADER_LEN: usize = 52;

/// Minimum total length of a well-formed envelope (header + tag).
pub const ENVELOPE_MIN_LEN: usize = ENVELOPE_HEADER_LEN + TAG_LEN;

/// Byte offset of the salt within the envelope header.
pub const SALT_OFFSET: usize = 12;

/// Byte offset of the nonce within the envelope header.
pub const NONCE_OFFSET: usize = SALT_OFFSET + SALT_LEN;

// Argon2id parameters at moderate cost (3 passes over 256 MiB, one lane).

/// Argon2id pass count.
pub const PWHASH_OPS: u32 = 3;

/// Argon2id memory cost in KiB.
pub const PWHASH_MEM_KIB: u32 = 262_144;

/// Argon2id lane count.
pub const PWHASH_LANES: u32 = 1;

/// Primary environment variable consulted for the passphrase.
pub const KEY_ENV_PRIMARY: &str = "SIGNALFORGE_DOTENV_KEY";

/// Fallback environment variable consulted for the passphrase.
pub const KEY_ENV_FALLBACK: &str = "DOTENV_PRIVATE_KEY";
