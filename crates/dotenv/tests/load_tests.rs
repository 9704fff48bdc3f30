//! End-to-end load scenarios.
//!
//! Responsibilities:
//! - Exercise the full pipeline (file → envelope → parser → post-processor
//!   → publish) through the public API.
//! - Cover encrypted files with the real crypto provider.
//!
//! Invariants / Assumptions:
//! - Tests touching the real process environment are `#[serial]` and clean
//!   up after themselves.

use std::fs;

use serial_test::serial;
use tempfile::TempDir;

use signalforge_dotenv::envelope::{unwrap, wrap};
use signalforge_dotenv::{
    DotenvError, LoadOptions, MemoryEnv, SodiumCrypto, is_enveloped, is_enveloped_file, load,
    load_with,
};

fn secret(s: &str) -> secrecy::SecretString {
    secrecy::SecretString::new(s.to_string().into())
}

fn write_env(dir: &TempDir, contents: &[u8]) -> std::path::PathBuf {
    let path = dir.path().join(".env");
    fs::write(&path, contents).unwrap();
    path
}

fn load_quiet(path: &std::path::Path, options: LoadOptions) -> signalforge_dotenv::EnvValues {
    let mut env = MemoryEnv::new();
    load_with(path, &options.with_export(false), &mut env, &SodiumCrypto).unwrap()
}

#[test]
fn test_basic_file() {
    let dir = TempDir::new().unwrap();
    let path = write_env(
        &dir,
        b"APP_NAME=MyApp\nDEBUG=false\nEMPTY_VAR=\nGREETING=\"Hello, World!\"\nSINGLE='literal $NO_EXPAND'",
    );
    let values = load_quiet(&path, LoadOptions::default());

    assert_eq!(values.get("APP_NAME").unwrap().as_str(), Some("MyApp"));
    assert_eq!(values.get("DEBUG").unwrap().as_str(), Some("false"));
    assert_eq!(values.get("EMPTY_VAR").unwrap().as_str(), Some(""));
    assert_eq!(values.get("GREETING").unwrap().as_str(), Some("Hello, World!"));
    assert_eq!(
        values.get("SINGLE").unwrap().as_str(),
        Some("literal $NO_EXPAND")
    );
    let keys: Vec<&str> = values.keys().collect();
    assert_eq!(
        keys,
        vec!["APP_NAME", "DEBUG", "EMPTY_VAR", "GREETING", "SINGLE"]
    );
}

#[test]
fn test_expansion_in_file_order() {
    let dir = TempDir::new().unwrap();
    let path = write_env(
        &dir,
        b"BASE=https://example.com\nAPI=${BASE}/api\nFALLBACK=${MISSING:-8080}\nALT=${BASE:+ok}\nBARE=$BASE",
    );
    let values = load_quiet(&path, LoadOptions::default());

    assert_eq!(
        values.get("API").unwrap().as_str(),
        Some("https://example.com/api")
    );
    assert_eq!(values.get("FALLBACK").unwrap().as_str(), Some("8080"));
    assert_eq!(values.get("ALT").unwrap().as_str(), Some("ok"));
    assert_eq!(
        values.get("BARE").unwrap().as_str(),
        Some("https://example.com")
    );
}

#[test]
fn test_json_decoding_toggle() {
    let dir = TempDir::new().unwrap();
    let path = write_env(&dir, b"ARR=[\"one\",\"two\"]\nOBJ={\"k\":1}\nSTR=not json");

    let decoded = load_quiet(&path, LoadOptions::default());
    assert_eq!(
        decoded.get("ARR").unwrap().as_json(),
        Some(&serde_json::json!(["one", "two"]))
    );
    assert_eq!(
        decoded.get("OBJ").unwrap().as_json(),
        Some(&serde_json::json!({"k": 1}))
    );
    assert_eq!(decoded.get("STR").unwrap().as_str(), Some("not json"));

    let plain = load_quiet(&path, LoadOptions::default().with_arrays(false));
    assert_eq!(plain.get("ARR").unwrap().as_str(), Some("[\"one\",\"two\"]"));
    assert_eq!(plain.get("OBJ").unwrap().as_str(), Some("{\"k\":1}"));
    assert_eq!(plain.get("STR").unwrap().as_str(), Some("not json"));
}

#[test]
fn test_multiline_and_escapes() {
    let dir = TempDir::new().unwrap();
    let path = write_env(
        &dir,
        b"ML=\"line1\\nline2\\nline3\"\nESC=\"tab:\\there\"\nQ=\"say \\\"hi\\\"\"",
    );
    let values = load_quiet(&path, LoadOptions::default());

    let ml = values.get("ML").unwrap().as_str().unwrap();
    assert_eq!(ml.matches('\n').count(), 2);
    assert_eq!(ml.lines().count(), 3);
    assert_eq!(values.get("ESC").unwrap().as_str(), Some("tab:\there"));
    assert_eq!(values.get("Q").unwrap().as_str(), Some("say \"hi\""));
}

#[test]
fn test_inline_comments() {
    let dir = TempDir::new().unwrap();
    let path = write_env(&dir, b"VAL=hello # trailing\nHASH=hello#middle");
    let values = load_quiet(&path, LoadOptions::default());

    assert_eq!(values.get("VAL").unwrap().as_str(), Some("hello"));
    assert_eq!(values.get("HASH").unwrap().as_str(), Some("hello#middle"));
}

#[test]
fn test_parse_error_reports_position() {
    let dir = TempDir::new().unwrap();
    let path = write_env(&dir, b"123BAD=value");
    let mut env = MemoryEnv::new();
    let err = load_with(&path, &LoadOptions::default(), &mut env, &SodiumCrypto).unwrap_err();

    match err {
        DotenvError::Parse { line, column, .. } => {
            assert_eq!(line, 1);
            assert_eq!(column, 1);
        }
        other => panic!("expected Parse, got {other}"),
    }
}

#[test]
fn test_unterminated_string_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_env(&dir, b"KEY=\"unterminated");
    let mut env = MemoryEnv::new();
    let err = load_with(&path, &LoadOptions::default(), &mut env, &SodiumCrypto).unwrap_err();

    assert_eq!(err.code(), 3);
    assert!(err.to_string().contains("Unterminated"));
}

#[test]
fn test_encrypted_roundtrip_through_files() {
    let crypto = SodiumCrypto;
    let framed = wrap(b"APP_KEY=secret", &secret("pw"), &crypto).unwrap();
    assert!(is_enveloped(&framed));

    let dir = TempDir::new().unwrap();
    let path = write_env(&dir, &framed);
    assert!(is_enveloped_file(&path).unwrap());

    // Auto-detected envelope, key supplied directly.
    let values = load_quiet(&path, LoadOptions::default().with_key("pw"));
    assert_eq!(values.get("APP_KEY").unwrap().as_str(), Some("secret"));

    // Direct unwrap returns the exact plaintext.
    assert_eq!(unwrap(&framed, &secret("pw"), &crypto).unwrap(), b"APP_KEY=secret");

    // A wrong key fails closed.
    let mut env = MemoryEnv::new();
    let err = load_with(
        &path,
        &LoadOptions::default().with_export(false).with_key("wrong"),
        &mut env,
        &SodiumCrypto,
    )
    .unwrap_err();
    assert_eq!(err.code(), 4);
}

#[test]
fn test_encrypted_file_without_key() {
    let framed = wrap(b"A=1", &secret("pw"), &SodiumCrypto).unwrap();
    let dir = TempDir::new().unwrap();
    let path = write_env(&dir, &framed);

    let mut env = MemoryEnv::new();
    let err = load_with(&path, &LoadOptions::default(), &mut env, &SodiumCrypto).unwrap_err();
    assert!(matches!(err, DotenvError::KeyRequired));
    assert_eq!(err.code(), 5);
}

#[test]
fn test_key_from_adapter_environment() {
    let framed = wrap(b"A=1", &secret("env-pw"), &SodiumCrypto).unwrap();
    let dir = TempDir::new().unwrap();
    let path = write_env(&dir, &framed);

    let mut env = MemoryEnv::new().with_var("SIGNALFORGE_DOTENV_KEY", "env-pw");
    let values = load_with(
        &path,
        &LoadOptions::default().with_export(false),
        &mut env,
        &SodiumCrypto,
    )
    .unwrap();
    assert_eq!(values.get("A").unwrap().as_str(), Some("1"));
}

#[test]
fn test_plaintext_file_is_not_detected_as_envelope() {
    let dir = TempDir::new().unwrap();
    let path = write_env(&dir, b"APP_NAME=MyApp");
    assert!(!is_enveloped_file(&path).unwrap());
}

#[test]
fn test_missing_file() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.env");
    let mut env = MemoryEnv::new();
    let err = load_with(&missing, &LoadOptions::default(), &mut env, &SodiumCrypto).unwrap_err();
    assert_eq!(err.code(), 1);
}

#[test]
#[serial]
fn test_load_publishes_to_process_environment() {
    let dir = TempDir::new().unwrap();
    let path = write_env(&dir, b"SF_TEST_PUBLISHED=from-file");
    unsafe {
        std::env::remove_var("SF_TEST_PUBLISHED");
    }

    load(&path, &LoadOptions::default()).unwrap();
    assert_eq!(
        std::env::var("SF_TEST_PUBLISHED").as_deref(),
        Ok("from-file")
    );

    unsafe {
        std::env::remove_var("SF_TEST_PUBLISHED");
    }
}

#[test]
#[serial]
fn test_load_does_not_override_by_default() {
    let dir = TempDir::new().unwrap();
    let path = write_env(&dir, b"SF_TEST_EXISTING=from-file");

    temp_env::with_vars([("SF_TEST_EXISTING", Some("original"))], || {
        load(&path, &LoadOptions::default()).unwrap();
        assert_eq!(
            std::env::var("SF_TEST_EXISTING").as_deref(),
            Ok("original")
        );

        load(&path, &LoadOptions::default().with_override(true)).unwrap();
        assert_eq!(
            std::env::var("SF_TEST_EXISTING").as_deref(),
            Ok("from-file")
        );
    });
}

#[test]
#[serial]
fn test_process_env_snapshot_feeds_expansion() {
    let dir = TempDir::new().unwrap();
    let path = write_env(&dir, b"URL=https://${SF_TEST_HOST}/api");

    temp_env::with_vars([("SF_TEST_HOST", Some("db.internal"))], || {
        let values = load(&path, &LoadOptions::default().with_export(false)).unwrap();
        assert_eq!(
            values.get("URL").unwrap().as_str(),
            Some("https://db.internal/api")
        );
    });
}
