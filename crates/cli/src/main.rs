//! sf-dotenv - command-line interface for SignalForge dotenv files.
//!
//! Responsibilities:
//! - Inspect dotenv files (`get`, `check`) without touching the caller's
//!   environment.
//! - Wrap and unwrap the encrypted envelope (`encrypt`, `decrypt`).
//!
//! Does NOT handle:
//! - Parsing, expansion, or envelope internals (see `signalforge-dotenv`).
//!
//! Invariants / Assumptions:
//! - `get` and `check` never publish to the process environment.
//! - Exit codes mirror the library's stable error codes.

mod args;
mod error;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use args::{Cli, Commands};
use clap::Parser;
use secrecy::SecretString;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use signalforge_dotenv::envelope::{unwrap, wrap};
use signalforge_dotenv::{
    DotenvError, LoadOptions, SodiumCrypto, is_enveloped, load, parse,
};

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("Error: {err:#}");
        std::process::exit(error::exit_code(&err));
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Get {
            ref name,
            json,
            no_arrays,
        } => cmd_get(&cli, name.as_deref(), json, no_arrays),
        Commands::Encrypt { ref output } => cmd_encrypt(&cli, output.clone()),
        Commands::Decrypt { ref output } => cmd_decrypt(&cli, output.clone()),
        Commands::Check => cmd_check(&cli),
    }
}

/// The passphrase from `--key` or the well-known environment variables.
/// The first non-empty hit wins; empty sources are skipped.
fn passphrase(cli: &Cli) -> Option<SecretString> {
    [cli.key.clone(), std::env::var("DOTENV_PRIVATE_KEY").ok()]
        .into_iter()
        .flatten()
        .find(|k| !k.is_empty())
        .map(|k| SecretString::new(k.into()))
}

fn load_options(cli: &Cli, arrays: bool) -> LoadOptions {
    let mut options = LoadOptions::default().with_export(false).with_arrays(arrays);
    if let Some(key) = &cli.key {
        if !key.is_empty() {
            options = options.with_key(key.clone());
        }
    }
    options
}

fn cmd_get(cli: &Cli, key: Option<&str>, json: bool, no_arrays: bool) -> Result<()> {
    let values = load(&cli.file, &load_options(cli, !no_arrays))?;

    match key {
        Some(key) => {
            let Some(value) = values.get(key) else {
                bail!("key '{}' not found in {}", key, cli.file.display());
            };
            if json {
                println!("{}", serde_json::to_string(value)?);
            } else {
                println!("{}", value.to_env_string());
            }
        }
        None => {
            if json {
                let mut map = serde_json::Map::new();
                for (key, value) in values.iter() {
                    map.insert(key.to_string(), serde_json::to_value(value)?);
                }
                println!("{}", serde_json::to_string_pretty(&map)?);
            } else {
                for (key, value) in values.iter() {
                    println!("{}={}", key, value.to_env_string());
                }
            }
        }
    }
    Ok(())
}

fn cmd_encrypt(cli: &Cli, output: Option<PathBuf>) -> Result<()> {
    let bytes = read_input(&cli.file)?;
    if is_enveloped(&bytes) {
        bail!("{} is already encrypted", cli.file.display());
    }
    // Reject files that would not load before sealing them.
    parse(&String::from_utf8_lossy(&bytes))?;

    let key = passphrase(cli).ok_or(DotenvError::KeyRequired)?;
    let framed = wrap(&bytes, &key, &SodiumCrypto)?;

    let target = output.unwrap_or_else(|| cli.file.clone());
    fs::write(&target, framed)
        .with_context(|| format!("failed to write {}", target.display()))?;
    println!("Encrypted {} -> {}", cli.file.display(), target.display());
    Ok(())
}

fn cmd_decrypt(cli: &Cli, output: Option<PathBuf>) -> Result<()> {
    let bytes = read_input(&cli.file)?;
    let key = passphrase(cli).ok_or(DotenvError::KeyRequired)?;
    let plaintext = unwrap(&bytes, &key, &SodiumCrypto)?;

    let target = output.unwrap_or_else(|| cli.file.clone());
    fs::write(&target, plaintext)
        .with_context(|| format!("failed to write {}", target.display()))?;
    println!("Decrypted {} -> {}", cli.file.display(), target.display());
    Ok(())
}

fn cmd_check(cli: &Cli) -> Result<()> {
    let bytes = read_input(&cli.file)?;
    let plaintext = if is_enveloped(&bytes) {
        let key = passphrase(cli).ok_or(DotenvError::KeyRequired)?;
        unwrap(&bytes, &key, &SodiumCrypto)?
    } else {
        bytes
    };
    let entries = parse(&String::from_utf8_lossy(&plaintext))?;
    println!("{}: OK ({} entries)", cli.file.display(), entries.len());
    Ok(())
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    if !path.is_file() {
        return Err(DotenvError::FileNotFound {
            path: path.to_path_buf(),
        }
        .into());
    }
    fs::read(path).map_err(|e| {
        DotenvError::FileRead {
            path: path.to_path_buf(),
            source: e,
        }
        .into()
    })
}
