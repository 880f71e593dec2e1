// SPDX-FileCopyrightText: 2026 Plinth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Plinth configuration system.

use std::io::Write;

use plinth_config::diagnostic::{ConfigError, suggest_key};
use plinth_config::model::PlinthConfig;
use plinth_config::{
    load_and_validate_json_str, load_and_validate_path, load_and_validate_str,
    load_config_from_json_str, load_config_from_str,
};
use plinth_core::CategoryType;

/// Valid TOML with several category slices deserializes successfully.
#[test]
fn valid_toml_deserializes_into_plinth_config() {
    let toml = r#"
environment = "staging"

[storage.plugins.s3]
bucket = "media"
region = "eu-west-1"

[api.plugins.graphql]
endpoint = "https://example.test/graphql"
auth_mode = "api_key"

[analytics.plugins.pinpoint]
flush_interval_secs = 30
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.environment, "staging");
    assert_eq!(
        config.categories(),
        vec![CategoryType::Analytics, CategoryType::Api, CategoryType::Storage]
    );

    let s3 = config.slice(CategoryType::Storage).unwrap().plugin("s3").unwrap();
    assert_eq!(s3["bucket"], "media");
    assert_eq!(s3["region"], "eu-west-1");

    let pinpoint = config
        .slice(CategoryType::Analytics)
        .unwrap()
        .plugin("pinpoint")
        .unwrap();
    assert_eq!(pinpoint["flush_interval_secs"], 30);
}

/// Empty TOML produces the default configuration.
#[test]
fn empty_toml_yields_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");
    assert_eq!(config, PlinthConfig::default());
}

/// A misspelled category is rejected and a suggestion offered.
#[test]
fn unknown_category_produces_suggestion() {
    let toml = r#"
[storge.plugins.s3]
bucket = "media"
"#;
    let errors = load_and_validate_str(toml).expect_err("should reject unknown category");
    let unknown = errors
        .iter()
        .find_map(|e| match e {
            ConfigError::UnknownKey {
                key, suggestion, ..
            } => Some((key.clone(), suggestion.clone())),
            _ => None,
        })
        .expect("should produce UnknownKey");
    assert_eq!(unknown.0, "storge");
    assert_eq!(unknown.1.as_deref(), Some("storage"));
}

/// A category slice only knows the `plugins` key.
#[test]
fn unknown_key_inside_category_is_rejected() {
    let toml = r#"
[api]
plugin = { graphql = {} }
"#;
    let errors = load_and_validate_str(toml).expect_err("should reject unknown key");
    assert!(errors.iter().any(|e| matches!(
        e,
        ConfigError::UnknownKey { key, suggestion, .. }
            if key == "plugin" && suggestion.as_deref() == Some("plugins")
    )));
}

/// Wrong value types surface as InvalidType.
#[test]
fn invalid_type_for_environment() {
    let errors = load_and_validate_str("environment = 3\n").expect_err("number is not a string");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { key, .. } if key == "environment"))
    );
}

/// Semantic validation runs after a successful load.
#[test]
fn plugin_slice_must_be_a_table() {
    let toml = r#"
[auth.plugins]
cognito = "pool-id"
"#;
    let errors = load_and_validate_str(toml).expect_err("string slice should fail validation");
    assert!(errors.iter().any(|e| matches!(
        e,
        ConfigError::Validation { message } if message.contains("auth.plugins.cognito")
    )));
}

/// The JSON document form carries the same shape.
#[test]
fn json_document_loads() {
    let json = r#"{
        "environment": "prod",
        "hub": { "plugins": { "bus": { "capacity": 64 } } },
        "logging": { "plugins": { "tracing": { "min_level": "debug" } } }
    }"#;
    let config = load_config_from_json_str(json).expect("valid JSON should deserialize");
    assert_eq!(config.environment, "prod");
    assert_eq!(
        config.slice(CategoryType::Hub).unwrap().plugin("bus").unwrap()["capacity"],
        64
    );
    assert!(load_and_validate_json_str(json).is_ok());
}

/// JSON documents get the same unknown-key diagnostics.
#[test]
fn json_unknown_key_is_reported() {
    let errors = load_and_validate_json_str(r#"{ "enviroment": "prod" }"#)
        .expect_err("misspelled key should fail");
    assert!(errors.iter().any(|e| matches!(
        e,
        ConfigError::UnknownKey { suggestion, .. } if suggestion.as_deref() == Some("environment")
    )));
}

/// Files are read by extension.
#[test]
fn load_from_toml_and_json_paths() {
    let dir = tempfile::tempdir().unwrap();

    let toml_path = dir.path().join("plinth.toml");
    let mut file = std::fs::File::create(&toml_path).unwrap();
    writeln!(file, "environment = \"from-toml\"").unwrap();
    let config = load_and_validate_path(&toml_path).expect("toml file should load");
    assert_eq!(config.environment, "from-toml");

    let json_path = dir.path().join("plinthconfiguration.json");
    std::fs::write(&json_path, r#"{ "environment": "from-json" }"#).unwrap();
    let config = load_and_validate_path(&json_path).expect("json file should load");
    assert_eq!(config.environment, "from-json");
}

/// A missing explicit file is an error, not silent defaults.
#[test]
fn missing_path_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let errors = load_and_validate_path(&dir.path().join("absent.toml"))
        .expect_err("missing file should fail");
    assert!(matches!(&errors[0], ConfigError::Other(m) if m.contains("does not exist")));
}

#[test]
fn suggest_key_matches_category_typos() {
    let valid = PlinthConfig::valid_keys();
    assert_eq!(suggest_key("analitics", &valid), Some("analytics".to_string()));
    assert_eq!(suggest_key("loging", &valid), Some("logging".to_string()));
    assert_eq!(suggest_key("qqqq", &valid), None);
}
