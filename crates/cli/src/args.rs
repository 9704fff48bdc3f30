//! CLI argument definitions.
//!
//! Responsibilities:
//! - Define the `sf-dotenv` command structure with clap derive macros.
//!
//! Non-responsibilities:
//! - Command execution (see `main.rs`).

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sf-dotenv")]
#[command(about = "Load, inspect, and encrypt SignalForge dotenv files", long_about = None)]
#[command(version)]
#[command(
    after_help = "Examples:\n  sf-dotenv get APP_NAME\n  sf-dotenv get --json\n  sf-dotenv -f config/.env check\n  sf-dotenv encrypt --key mypassphrase\n  sf-dotenv decrypt --output .env.plain\n"
)]
pub struct Cli {
    /// Path to the dotenv file
    #[arg(short, long, global = true, default_value = ".env", value_name = "FILE")]
    pub file: PathBuf,

    /// Passphrase for encrypted files
    #[arg(
        short,
        long,
        global = true,
        env = "SIGNALFORGE_DOTENV_KEY",
        hide_env_values = true
    )]
    pub key: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print one value, or every value, from the file
    Get {
        /// Key to look up; prints all entries when omitted
        #[arg(value_name = "KEY")]
        name: Option<String>,

        /// Emit JSON instead of KEY=value lines
        #[arg(long)]
        json: bool,

        /// Keep container-shaped values as plain strings
        #[arg(long)]
        no_arrays: bool,
    },

    /// Encrypt a plaintext dotenv file in place
    Encrypt {
        /// Write the envelope here instead of overwriting the input
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Decrypt an enveloped dotenv file in place
    Decrypt {
        /// Write the plaintext here instead of overwriting the input
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Validate dotenv syntax without publishing anything
    Check,
}
