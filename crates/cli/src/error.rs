//! CLI exit codes for scripting and automation.
//!
//! Exit codes mirror the library's stable numeric error codes (1-9), so
//! scripts can distinguish a parse failure (3) from a wrong key (4) or a
//! missing key (5) without scraping stderr.

use signalforge_dotenv::DotenvError;

/// Map a failure to its process exit code.
///
/// Library errors carry their own stable code; anything else is a general
/// error.
pub fn exit_code(error: &anyhow::Error) -> i32 {
    match error.downcast_ref::<DotenvError>() {
        Some(err) => i32::from(err.code()),
        None => 1,
    }
}
