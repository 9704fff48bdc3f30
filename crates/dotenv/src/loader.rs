//! Top-level load pipeline.
//!
//! Responsibilities:
//! - Read the input file and auto-detect the encryption envelope.
//! - Resolve the decryption passphrase from options and the environment.
//! - Drive decrypt → parse → post-process → publish as one synchronous call.
//!
//! Does NOT handle:
//! - Grammar details (see `parser.rs`) or expansion (see `expand.rs`).
//!
//! Invariants / Assumptions:
//! - A load runs to completion before returning; resources are scoped to
//!   the call and released on all exit paths.
//! - The environment snapshot is taken once, before post-processing.
//! - Callers serialize concurrent loads themselves.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use secrecy::{ExposeSecret, SecretString};

use crate::constants::{KEY_ENV_FALLBACK, KEY_ENV_PRIMARY};
use crate::crypto::{CryptoProvider, SodiumCrypto};
use crate::env::{EnvAdapter, ProcessEnv, publish};
use crate::envelope::{is_enveloped, unwrap};
use crate::error::{DotenvError, Result};
use crate::parser::parse;
use crate::postprocess::{EnvValues, post_process};

/// Options controlling a single load.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Force treating the input as enveloped (`Some(true)`), as plaintext
    /// (`Some(false)`), or auto-detect via the magic (`None`).
    pub encrypted: Option<bool>,
    /// Direct passphrase, consulted before any environment variable.
    pub key: Option<SecretString>,
    /// Name of an environment variable to read the passphrase from.
    pub key_env: Option<String>,
    /// Overwrite existing environment entries when publishing.
    pub override_existing: bool,
    /// Publish results to the process-environment surface.
    pub export: bool,
    /// Also publish structured results to the per-request scratch surface.
    pub export_server: bool,
    /// Enable opportunistic JSON decoding of container-shaped values.
    pub arrays: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            encrypted: None,
            key: None,
            key_env: None,
            override_existing: false,
            export: true,
            export_server: false,
            arrays: true,
        }
    }
}

impl LoadOptions {
    /// Options with all defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Force or suppress envelope handling instead of auto-detecting.
    pub fn with_encrypted(mut self, encrypted: bool) -> Self {
        self.encrypted = Some(encrypted);
        self
    }

    /// Set the passphrase directly.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(SecretString::new(key.into().into()));
        self
    }

    /// Name an environment variable to read the passphrase from.
    pub fn with_key_env(mut self, name: impl Into<String>) -> Self {
        self.key_env = Some(name.into());
        self
    }

    /// Overwrite existing environment entries when publishing.
    pub fn with_override(mut self, override_existing: bool) -> Self {
        self.override_existing = override_existing;
        self
    }

    /// Publish results to the process environment (defaults to true).
    pub fn with_export(mut self, export: bool) -> Self {
        self.export = export;
        self
    }

    /// Also publish structured results to the scratch surface.
    pub fn with_export_server(mut self, export_server: bool) -> Self {
        self.export_server = export_server;
        self
    }

    /// Enable or disable opportunistic JSON decoding (defaults to true).
    pub fn with_arrays(mut self, arrays: bool) -> Self {
        self.arrays = arrays;
        self
    }
}

/// Load a dotenv file using the real process environment and crypto.
///
/// Returns the ordered results; publishing to the process environment is
/// governed by the options. To observe the scratch surface, use
/// [`load_with`] with your own [`ProcessEnv`].
pub fn load(path: impl AsRef<Path>, options: &LoadOptions) -> Result<EnvValues> {
    let mut env = ProcessEnv::new();
    load_with(path, options, &mut env, &SodiumCrypto)
}

/// Load a dotenv file through an injected adapter and crypto provider.
pub fn load_with<C: CryptoProvider>(
    path: impl AsRef<Path>,
    options: &LoadOptions,
    adapter: &mut dyn EnvAdapter,
    crypto: &C,
) -> Result<EnvValues> {
    let path = path.as_ref();
    let metadata = fs::metadata(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => DotenvError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => DotenvError::FileRead {
            path: path.to_path_buf(),
            source: e,
        },
    })?;
    if !metadata.is_file() {
        return Err(DotenvError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let bytes = fs::read(path).map_err(|e| DotenvError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    load_bytes_with(&bytes, options, adapter, crypto)
}

/// Run the load pipeline over an in-memory buffer.
///
/// This is the seam the file loader rests on; callers embedding their
/// configuration can use it directly.
pub fn load_bytes_with<C: CryptoProvider>(
    bytes: &[u8],
    options: &LoadOptions,
    adapter: &mut dyn EnvAdapter,
    crypto: &C,
) -> Result<EnvValues> {
    let snapshot = adapter.snapshot();
    let enveloped = options.encrypted.unwrap_or_else(|| is_enveloped(bytes));
    tracing::debug!(enveloped, "loading dotenv buffer");

    let plaintext;
    let content = if enveloped {
        let passphrase =
            resolve_passphrase(options, &snapshot).ok_or(DotenvError::KeyRequired)?;
        plaintext = unwrap(bytes, &passphrase, crypto)?;
        &plaintext[..]
    } else {
        bytes
    };

    let text = String::from_utf8_lossy(content);
    let entries = parse(&text)?;
    tracing::debug!(entries = entries.len(), "parsed dotenv buffer");

    let values = post_process(entries, snapshot, options.arrays);
    if options.export || options.export_server {
        publish(adapter, &values, options);
    }
    Ok(values)
}

/// Resolve the passphrase: direct option, then the named environment
/// variable, then the well-known variables. The first non-empty hit wins.
fn resolve_passphrase(
    options: &LoadOptions,
    snapshot: &HashMap<String, String>,
) -> Option<SecretString> {
    if let Some(key) = &options.key {
        if !key.expose_secret().is_empty() {
            return Some(key.clone());
        }
    }
    options
        .key_env
        .iter()
        .map(String::as_str)
        .chain([KEY_ENV_PRIMARY, KEY_ENV_FALLBACK])
        .find_map(|name| {
            snapshot
                .get(name)
                .filter(|v| !v.is_empty())
                .map(|v| SecretString::new(v.clone().into()))
        })
}
