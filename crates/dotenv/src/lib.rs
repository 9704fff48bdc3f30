//! Dotenv loading for SignalForge applications.
//!
//! This crate parses dotenv files with a single-pass state machine, expands
//! shell-style variable references in file order, opportunistically decodes
//! JSON-shaped values, and publishes the results to the host environment.
//! Files may be stored in an authenticated-encryption envelope (Argon2id +
//! XSalsa20-Poly1305) detected by its magic bytes and unwrapped before
//! parsing.
//!
//! ```no_run
//! use signalforge_dotenv::{LoadOptions, load};
//!
//! let values = load(".env", &LoadOptions::default())?;
//! if let Some(name) = values.get("APP_NAME") {
//!     println!("loaded {}", name.to_env_string());
//! }
//! # Ok::<(), signalforge_dotenv::DotenvError>(())
//! ```

#![cfg_attr(not(test), warn(clippy::unwrap_used))]

pub mod constants;
pub mod crypto;
pub mod env;
pub mod envelope;
pub mod error;
pub mod expand;
pub mod loader;
pub mod parser;
pub mod postprocess;

pub use crypto::{CryptoProvider, DerivedKey, SodiumCrypto};
pub use env::{EnvAdapter, MemoryEnv, ProcessEnv, is_valid_key};
pub use envelope::{is_enveloped, is_enveloped_file};
pub use error::{DotenvError, Result};
pub use expand::{EnvView, expand};
pub use loader::{LoadOptions, load, load_bytes_with, load_with};
pub use parser::{ParsedEntry, parse};
pub use postprocess::{EnvValues, FinalValue, post_process};
