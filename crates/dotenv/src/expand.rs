//! Shell-style variable expansion.
//!
//! Resolves `$NAME`, `${NAME}`, `${NAME:-DEFAULT}`, `${NAME:+ALTERNATE}`,
//! and `${NAME-DEFAULT}` against an [`EnvView`]. Expansion is a single
//! pass: substituted text is never re-scanned, command substitution and
//! arithmetic are not evaluated.

use std::collections::HashMap;

/// Read-only lookup the expander consults: already-expanded entries layered
/// over a process-environment snapshot, with entries winning on collision.
#[derive(Debug, Clone, Default)]
pub struct EnvView {
    vars: HashMap<String, String>,
}

impl EnvView {
    /// An empty view.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a view from an environment snapshot.
    pub fn from_snapshot(vars: HashMap<String, String>) -> Self {
        Self { vars }
    }

    /// Look up a variable.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Record an expanded entry so later lookups see it.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }
}

/// Braced-reference operator, first match wins scanning left to right.
enum BraceOp {
    /// `:-` substitute the default when unset or empty.
    DefaultIfUnsetOrEmpty,
    /// `:+` substitute the alternate when set and non-empty.
    AlternateIfSet,
    /// `-` substitute the default only when unset.
    DefaultIfUnset,
}

/// Expand all variable references in `input` against `view`.
///
/// Lookup misses substitute the empty string. A `$` not followed by an
/// identifier or a matched brace is literal.
pub fn expand(input: &str, view: &EnvView) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        if let Some(inner) = after.strip_prefix('{') {
            match inner.find('}') {
                Some(end) => {
                    out.push_str(&resolve_braced(&inner[..end], view));
                    rest = &inner[end + 1..];
                }
                None => {
                    // Unmatched `${`: the `$` is literal and scanning
                    // continues from the brace.
                    out.push('$');
                    rest = after;
                }
            }
        } else {
            let len = after
                .bytes()
                .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
                .count();
            if len == 0 {
                out.push('$');
                rest = after;
            } else {
                out.push_str(view.get(&after[..len]).unwrap_or_default());
                rest = &after[len..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn resolve_braced(region: &str, view: &EnvView) -> String {
    let bytes = region.as_bytes();
    let mut found: Option<(usize, usize, BraceOp)> = None;
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b':' if bytes.get(i + 1) == Some(&b'-') => {
                found = Some((i, 2, BraceOp::DefaultIfUnsetOrEmpty));
                break;
            }
            b':' if bytes.get(i + 1) == Some(&b'+') => {
                found = Some((i, 2, BraceOp::AlternateIfSet));
                break;
            }
            b'-' => {
                found = Some((i, 1, BraceOp::DefaultIfUnset));
                break;
            }
            _ => {}
        }
    }
    match found {
        None => view.get(region).unwrap_or_default().to_string(),
        Some((at, op_len, op)) => {
            let name = &region[..at];
            // The remainder is flat text; nested braces and further
            // expansion are not supported inside the word.
            let word = &region[at + op_len..];
            let value = view.get(name);
            match op {
                BraceOp::DefaultIfUnsetOrEmpty => match value {
                    Some(v) if !v.is_empty() => v.to_string(),
                    _ => word.to_string(),
                },
                BraceOp::AlternateIfSet => match value {
                    Some(v) if !v.is_empty() => word.to_string(),
                    _ => String::new(),
                },
                BraceOp::DefaultIfUnset => match value {
                    Some(v) => v.to_string(),
                    None => word.to_string(),
                },
            }
        }
    }
}
