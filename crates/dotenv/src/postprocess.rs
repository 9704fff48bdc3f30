//! Post-processing of parsed entries.
//!
//! Responsibilities:
//! - Drive parser output through the expander in file order, threading each
//!   expansion back into the [`EnvView`] so later entries see earlier ones.
//! - Opportunistically decode JSON-shaped values into containers.
//! - Collect results into an insertion-ordered map with last-writer-wins on
//!   duplicate keys.
//!
//! Does NOT handle:
//! - Publishing to environment surfaces (see `env.rs`).
//!
//! Invariants:
//! - Entries are expanded strictly in source order.
//! - JSON decode failure is silent; the expanded string stands.

use std::collections::HashMap;

use serde::Serialize;

use crate::expand::{EnvView, expand};
use crate::parser::ParsedEntry;

/// The post-processed value of a key.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FinalValue {
    /// The expanded string.
    Str(String),
    /// A JSON container (array or object) decoded from the expanded string.
    Json(serde_json::Value),
}

impl FinalValue {
    /// The string form, if this value is a plain string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            Self::Json(_) => None,
        }
    }

    /// The decoded container, if this value is one.
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Str(_) => None,
            Self::Json(v) => Some(v),
        }
    }

    /// Stringified form for the process-environment surface.
    ///
    /// Containers re-serialize compactly; `serde_json` leaves slashes and
    /// non-ASCII characters unescaped.
    pub fn to_env_string(&self) -> String {
        match self {
            Self::Str(s) => s.clone(),
            Self::Json(v) => serde_json::to_string(v).unwrap_or_default(),
        }
    }
}

/// Insertion-ordered map of key to [`FinalValue`].
///
/// Duplicate inserts overwrite the value but keep the key's original
/// position, so iteration order reflects first appearance in the file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvValues {
    keys: Vec<String>,
    values: HashMap<String, FinalValue>,
}

impl EnvValues {
    /// An empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a value.
    pub fn insert(&mut self, key: impl Into<String>, value: FinalValue) {
        let key = key.into();
        if !self.values.contains_key(&key) {
            self.keys.push(key.clone());
        }
        self.values.insert(key, value);
    }

    /// Look up a value.
    pub fn get(&self, key: &str) -> Option<&FinalValue> {
        self.values.get(key)
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FinalValue)> {
        self.keys
            .iter()
            .filter_map(|k| self.values.get(k).map(|v| (k.as_str(), v)))
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// True when no entries are present.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Expand and decode parsed entries in file order.
///
/// The view starts as the process-environment snapshot; each expansion is
/// threaded back in so later entries compose over earlier ones without a
/// fixed-point iteration. References to keys defined only later resolve
/// through the snapshot or to empty.
pub fn post_process(
    entries: Vec<ParsedEntry>,
    snapshot: HashMap<String, String>,
    arrays: bool,
) -> EnvValues {
    let mut view = EnvView::from_snapshot(snapshot);
    let mut out = EnvValues::new();
    for entry in entries {
        let expanded = expand(&entry.value, &view);
        view.set(entry.key.clone(), expanded.clone());
        let value = if arrays {
            decode_container(&expanded).unwrap_or(FinalValue::Str(expanded))
        } else {
            FinalValue::Str(expanded)
        };
        out.insert(entry.key, value);
    }
    out
}

/// Decode `expanded` as JSON when it looks like a container.
///
/// Only attempted when the first non-whitespace character is `[` or `{`;
/// only arrays and objects are accepted. Failure is silent.
fn decode_container(expanded: &str) -> Option<FinalValue> {
    match expanded.trim_start().chars().next() {
        Some('[') | Some('{') => {}
        _ => return None,
    }
    match serde_json::from_str::<serde_json::Value>(expanded) {
        Ok(value @ (serde_json::Value::Array(_) | serde_json::Value::Object(_))) => {
            Some(FinalValue::Json(value))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entries(pairs: &[(&str, &str)]) -> Vec<ParsedEntry> {
        pairs
            .iter()
            .map(|(k, v)| ParsedEntry {
                key: k.to_string(),
                value: v.to_string(),
            })
            .collect()
    }

    fn no_env() -> HashMap<String, String> {
        HashMap::new()
    }

    #[test]
    fn test_expansion_sees_earlier_entries() {
        let out = post_process(
            entries(&[
                ("BASE", "https://example.com"),
                ("API", "${BASE}/api"),
                ("FALLBACK", "${MISSING:-8080}"),
                ("ALT", "${BASE:+ok}"),
                ("BARE", "$BASE"),
            ]),
            no_env(),
            true,
        );
        assert_eq!(out.get("API").unwrap().as_str(), Some("https://example.com/api"));
        assert_eq!(out.get("FALLBACK").unwrap().as_str(), Some("8080"));
        assert_eq!(out.get("ALT").unwrap().as_str(), Some("ok"));
        assert_eq!(out.get("BARE").unwrap().as_str(), Some("https://example.com"));
    }

    #[test]
    fn test_later_keys_are_not_visible_earlier() {
        let out = post_process(entries(&[("FIRST", "$LATER"), ("LATER", "x")]), no_env(), true);
        assert_eq!(out.get("FIRST").unwrap().as_str(), Some(""));
        assert_eq!(out.get("LATER").unwrap().as_str(), Some("x"));
    }

    #[test]
    fn test_snapshot_is_visible() {
        let mut snapshot = HashMap::new();
        snapshot.insert("HOME_DIR".to_string(), "/home/app".to_string());
        let out = post_process(entries(&[("CACHE", "$HOME_DIR/cache")]), snapshot, true);
        assert_eq!(out.get("CACHE").unwrap().as_str(), Some("/home/app/cache"));
    }

    #[test]
    fn test_entries_shadow_snapshot() {
        let mut snapshot = HashMap::new();
        snapshot.insert("NAME".to_string(), "from-env".to_string());
        let out = post_process(
            entries(&[("NAME", "from-file"), ("REF", "$NAME")]),
            snapshot,
            true,
        );
        assert_eq!(out.get("REF").unwrap().as_str(), Some("from-file"));
    }

    #[test]
    fn test_duplicate_keys_last_writer_wins() {
        let out = post_process(
            entries(&[("A", "1"), ("B", "$A"), ("A", "2"), ("C", "$A")]),
            no_env(),
            true,
        );
        assert_eq!(out.get("A").unwrap().as_str(), Some("2"));
        assert_eq!(out.get("B").unwrap().as_str(), Some("1"));
        assert_eq!(out.get("C").unwrap().as_str(), Some("2"));
        assert_eq!(out.len(), 3);
        let keys: Vec<&str> = out.keys().collect();
        assert_eq!(keys, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_json_containers_are_decoded() {
        let out = post_process(
            entries(&[
                ("ARR", "[\"one\",\"two\"]"),
                ("OBJ", "{\"k\":1}"),
                ("STR", "not json"),
            ]),
            no_env(),
            true,
        );
        assert_eq!(out.get("ARR").unwrap().as_json(), Some(&json!(["one", "two"])));
        assert_eq!(out.get("OBJ").unwrap().as_json(), Some(&json!({"k": 1})));
        assert_eq!(out.get("STR").unwrap().as_str(), Some("not json"));
    }

    #[test]
    fn test_arrays_disabled_keeps_strings() {
        let out = post_process(
            entries(&[("ARR", "[\"one\",\"two\"]"), ("OBJ", "{\"k\":1}")]),
            no_env(),
            false,
        );
        assert_eq!(out.get("ARR").unwrap().as_str(), Some("[\"one\",\"two\"]"));
        assert_eq!(out.get("OBJ").unwrap().as_str(), Some("{\"k\":1}"));
    }

    #[test]
    fn test_invalid_json_is_kept_as_string() {
        let out = post_process(
            entries(&[("BROKEN", "[1, 2"), ("ALSO", "{not json}")]),
            no_env(),
            true,
        );
        assert_eq!(out.get("BROKEN").unwrap().as_str(), Some("[1, 2"));
        assert_eq!(out.get("ALSO").unwrap().as_str(), Some("{not json}"));
    }

    #[test]
    fn test_scalar_json_is_not_decoded() {
        // Only container-shaped values are candidates at all.
        let out = post_process(
            entries(&[("NUM", "42"), ("BOOL", "true"), ("QUOTED", "\"text\"")]),
            no_env(),
            true,
        );
        assert_eq!(out.get("NUM").unwrap().as_str(), Some("42"));
        assert_eq!(out.get("BOOL").unwrap().as_str(), Some("true"));
        assert_eq!(out.get("QUOTED").unwrap().as_str(), Some("\"text\""));
    }

    #[test]
    fn test_json_decode_applies_after_expansion() {
        let out = post_process(
            entries(&[("ITEM", "\"one\""), ("ARR", "[${ITEM:-}]")]),
            no_env(),
            true,
        );
        assert_eq!(out.get("ARR").unwrap().as_json(), Some(&json!(["one"])));
    }

    #[test]
    fn test_leading_whitespace_before_container() {
        let out = post_process(entries(&[("ARR", "  [1,2]")]), no_env(), true);
        assert_eq!(out.get("ARR").unwrap().as_json(), Some(&json!([1, 2])));
    }

    #[test]
    fn test_to_env_string_reserializes_compactly() {
        let value = FinalValue::Json(json!({"url": "https://example.com/päth", "n": [1, 2]}));
        let s = value.to_env_string();
        assert!(s.contains("https://example.com/päth"));
        assert!(!s.contains("\\/"));
        assert!(!s.contains("\\u"));
    }

    #[test]
    fn test_iteration_preserves_file_order() {
        let out = post_process(
            entries(&[("Z", "1"), ("A", "2"), ("M", "3")]),
            no_env(),
            true,
        );
        let keys: Vec<&str> = out.keys().collect();
        assert_eq!(keys, vec!["Z", "A", "M"]);
    }
}
