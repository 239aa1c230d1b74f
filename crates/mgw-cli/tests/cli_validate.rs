//! Integration test: run the `mgw` binary end to end and check its output
//! lines and exit codes.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn mgw(args: &[&str], dir: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_mgw"))
        .args(args)
        .current_dir(dir)
        .env_remove("MGW_CONFIG")
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn fixtures_dir() -> PathBuf {
    let mut dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    dir.pop(); // crates
    dir.join("mgw-schema/tests/fixtures")
}

#[test]
fn test_validate_passing_documents() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("route.yaml"),
        "id: r1\nuris: [\"/test\"]\nvars:\n  - [\"http_a\", \"!\", \"==\", \"av\"]\nupstream_id: u1\n",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("route.json"),
        r#"{"name": "r2", "uri": "/a", "upstream_id": "u1"}"#,
    )
    .unwrap();

    let out = mgw(
        &["validate", "--gateway-version", "3.2", "--resource", "route", "route.yaml", "route.json"],
        dir.path(),
    );
    assert_eq!(out.status.code(), Some(0), "{}", stdout(&out));
    let text = stdout(&out);
    assert!(text.contains("PASS route.yaml (r1)"), "{text}");
    assert!(text.contains("PASS route.json (r2)"), "{text}");
    assert!(text.contains("route: 2/2 passed"), "{text}");
}

#[test]
fn test_validate_unknown_field_by_sink() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("consumer.json"),
        r#"{"username": "jack", "test_field": "x"}"#,
    )
    .unwrap();

    let strict = mgw(&["validate", "--path", "main.consumer", "consumer.json"], dir.path());
    assert_eq!(strict.status.code(), Some(1));
    let text = stdout(&strict);
    assert!(text.starts_with("FAIL consumer.json (jack): "), "{text}");
    assert!(text.contains("test_field"), "{text}");

    let draft = mgw(
        &["validate", "--sink", "draft", "--path", "main.consumer", "consumer.json"],
        dir.path(),
    );
    assert_eq!(draft.status.code(), Some(0), "{}", stdout(&draft));
}

#[test]
fn test_validate_fixture_directory() {
    let fixtures = fixtures_dir().join("runtime_store");
    let out = mgw(
        &["validate", "--gateway-version", "3.13", "--resource", "upstream", "upstream.json"],
        &fixtures,
    );
    assert_eq!(out.status.code(), Some(0), "{}", stdout(&out));
}

#[test]
fn test_validate_operational_errors() {
    let dir = tempfile::tempdir().unwrap();

    let missing = mgw(&["validate", "--resource", "route", "missing.json"], dir.path());
    assert_eq!(missing.status.code(), Some(2));
    assert!(stdout(&missing).starts_with("ERROR missing.json: "));

    std::fs::write(dir.path().join("r.json"), "{}").unwrap();
    let bad_path = mgw(&["validate", "--path", "main.nothing", "r.json"], dir.path());
    assert_eq!(bad_path.status.code(), Some(2));

    let bad_version = mgw(
        &["validate", "--gateway-version", "2.0", "--resource", "route", "r.json"],
        dir.path(),
    );
    assert_eq!(bad_version.status.code(), Some(2));
}

#[test]
fn test_config_file_and_flag_precedence() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("mgw.yaml"), "gateway_version: 3.2\nsink: draft\n").unwrap();
    std::fs::write(
        dir.path().join("consumer.json"),
        r#"{"username": "jack", "test_field": "x"}"#,
    )
    .unwrap();

    let from_file = mgw(
        &["validate", "--config", "mgw.yaml", "--resource", "consumer", "consumer.json"],
        dir.path(),
    );
    assert_eq!(from_file.status.code(), Some(0), "{}", stdout(&from_file));

    let overridden = mgw(
        &[
            "validate",
            "--config",
            "mgw.yaml",
            "--sink",
            "runtime",
            "--resource",
            "consumer",
            "consumer.json",
        ],
        dir.path(),
    );
    assert_eq!(overridden.status.code(), Some(1));

    std::fs::write(dir.path().join("broken.yaml"), "gateway_version: [").unwrap();
    let broken = mgw(
        &["validate", "--config", "broken.yaml", "--resource", "consumer", "consumer.json"],
        dir.path(),
    );
    assert_eq!(broken.status.code(), Some(2));
}

#[test]
fn test_versions_and_schema() {
    let dir = tempfile::tempdir().unwrap();

    let versions = mgw(&["versions"], dir.path());
    assert_eq!(versions.status.code(), Some(0));
    assert_eq!(stdout(&versions), "3.2\n3.3\n3.11\n3.13\n");

    let schema = mgw(&["schema", "--gateway-version", "3.11", "--resource", "ssl"], dir.path());
    assert_eq!(schema.status.code(), Some(0));
    let value: serde_json::Value = serde_json::from_str(&stdout(&schema)).unwrap();
    assert_eq!(value["additionalProperties"], serde_json::Value::Bool(false));
}

#[test]
fn test_schema_dir_limits_versions() {
    let dir = tempfile::tempdir().unwrap();
    let schemas = dir.path().join("schemas");
    std::fs::create_dir(&schemas).unwrap();
    let mut packaged = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    packaged.pop();
    std::fs::copy(
        packaged.join("mgw-schema/schemas/apisix-3.11.json"),
        schemas.join("apisix-3.11.json"),
    )
    .unwrap();

    let versions = mgw(&["versions", "--schema-dir", "schemas"], dir.path());
    assert_eq!(stdout(&versions), "3.11\n");

    std::fs::write(dir.path().join("r.json"), r#"{"uri": "/a", "upstream_id": "u1"}"#).unwrap();
    let unsupported = mgw(
        &[
            "validate",
            "--schema-dir",
            "schemas",
            "--gateway-version",
            "3.2",
            "--resource",
            "route",
            "r.json",
        ],
        dir.path(),
    );
    assert_eq!(unsupported.status.code(), Some(2));
}
