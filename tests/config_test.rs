//! Integration tests for Settings config loading with layered merge semantics.
//!
//! Merge Semantics:
//! - Defaults → Global file: REPLACE per field that the file sets
//! - Any → Env vars: REPLACE (explicit user override)
//!
//! Note: These tests point `load_from` at temp files, so the real global
//! config is never read.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use famtree::application::ApplicationError;
use famtree::config::Settings;

#[test]
fn given_config_file_with_some_fields_when_load_then_others_keep_defaults() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("famtree.toml");
    fs::write(
        &path,
        r#"
members_file = "/srv/kin/roster.toml"
show_dates = false
"#,
    )
    .unwrap();

    // Act
    let settings = Settings::load_from(Some(&path)).expect("load settings");

    // Assert
    assert_eq!(settings.members_file, PathBuf::from("/srv/kin/roster.toml"));
    assert!(!settings.show_dates);
    assert!(settings.strict, "strict should keep its default");
    assert_eq!(settings.date_format, "%Y-%m-%d");
}

#[test]
fn given_missing_config_file_when_load_then_defaults() {
    let dir = TempDir::new().unwrap();

    let settings = Settings::load_from(Some(&dir.path().join("absent.toml"))).unwrap();

    assert_eq!(settings, Settings::load_from(None).unwrap());
}

#[test]
fn given_malformed_config_file_when_load_then_config_error() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("famtree.toml");
    fs::write(&path, "strict = [not a bool").unwrap();

    // Act
    let result = Settings::load_from(Some(&path));

    // Assert
    match result {
        Err(ApplicationError::Config { message }) => {
            assert!(message.contains("famtree.toml"), "{message}")
        }
        other => panic!("expected config error, got {other:?}"),
    }
}

#[test]
fn given_template_when_parsed_then_it_is_valid_toml() {
    let template = Settings::template();
    let parsed: Result<toml::Table, _> = toml::from_str(&template);
    assert!(parsed.is_ok(), "{parsed:?}");
}
