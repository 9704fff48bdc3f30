//! Environment adapter boundary.
//!
//! Responsibilities:
//! - Define the contract the core consumes to read existing variables and
//!   publish results ([`EnvAdapter`]).
//! - Provide [`ProcessEnv`] (the real process environment plus an owned
//!   per-request scratch map) and [`MemoryEnv`] (an in-memory stand-in).
//! - Publish load results with override/export semantics.
//!
//! Does NOT handle:
//! - Expansion or JSON decoding (see `postprocess.rs`).
//!
//! Invariants / Assumptions:
//! - The snapshot is taken once per load; concurrent mutation of the
//!   process environment is not guarded against.
//! - Keys failing `[A-Za-z_][A-Za-z0-9_]*` are skipped, never an error.

use std::collections::HashMap;

use crate::loader::LoadOptions;
use crate::postprocess::{EnvValues, FinalValue};

/// Contract between the core and the host's environment surfaces.
pub trait EnvAdapter {
    /// Snapshot the current process-environment surface.
    fn snapshot(&self) -> HashMap<String, String>;

    /// True if `key` exists in any observed surface.
    fn contains(&self, key: &str) -> bool;

    /// Publish a stringified value to the process-environment surface.
    fn set_process(&mut self, key: &str, value: &str);

    /// Publish a structured value to the per-request scratch surface.
    fn set_scratch(&mut self, key: &str, value: FinalValue);
}

/// Adapter over the real process environment.
#[derive(Debug, Default)]
pub struct ProcessEnv {
    scratch: HashMap<String, FinalValue>,
}

impl ProcessEnv {
    /// A fresh adapter with an empty scratch surface.
    pub fn new() -> Self {
        Self::default()
    }

    /// The per-request scratch surface populated by `export_server`.
    pub fn scratch(&self) -> &HashMap<String, FinalValue> {
        &self.scratch
    }
}

impl EnvAdapter for ProcessEnv {
    fn snapshot(&self) -> HashMap<String, String> {
        std::env::vars().collect()
    }

    fn contains(&self, key: &str) -> bool {
        std::env::var_os(key).is_some() || self.scratch.contains_key(key)
    }

    fn set_process(&mut self, key: &str, value: &str) {
        // SAFETY: the caller serializes loads; see the concurrency contract
        // on `load`.
        unsafe {
            std::env::set_var(key, value);
        }
    }

    fn set_scratch(&mut self, key: &str, value: FinalValue) {
        self.scratch.insert(key.to_string(), value);
    }
}

/// In-memory adapter for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryEnv {
    vars: HashMap<String, String>,
    scratch: HashMap<String, FinalValue>,
}

impl MemoryEnv {
    /// An empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a variable into the simulated process environment.
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    /// The simulated process-environment surface.
    pub fn vars(&self) -> &HashMap<String, String> {
        &self.vars
    }

    /// The per-request scratch surface.
    pub fn scratch(&self) -> &HashMap<String, FinalValue> {
        &self.scratch
    }
}

impl EnvAdapter for MemoryEnv {
    fn snapshot(&self) -> HashMap<String, String> {
        self.vars.clone()
    }

    fn contains(&self, key: &str) -> bool {
        self.vars.contains_key(key) || self.scratch.contains_key(key)
    }

    fn set_process(&mut self, key: &str, value: &str) {
        self.vars.insert(key.to_string(), value.to_string());
    }

    fn set_scratch(&mut self, key: &str, value: FinalValue) {
        self.scratch.insert(key.to_string(), value);
    }
}

/// True iff `key` matches `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_valid_key(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Publish load results to the adapter's surfaces.
///
/// With `override` disabled, a key that already exists in any observed
/// surface is a handled no-op. Invalid keys are skipped.
pub(crate) fn publish(adapter: &mut dyn EnvAdapter, values: &EnvValues, options: &LoadOptions) {
    for (key, value) in values.iter() {
        if !is_valid_key(key) {
            tracing::warn!(key, "skipping invalid environment key");
            continue;
        }
        if !options.override_existing && adapter.contains(key) {
            continue;
        }
        if options.export {
            adapter.set_process(key, &value.to_env_string());
        }
        if options.export_server {
            adapter.set_scratch(key, value.clone());
        }
    }
}
