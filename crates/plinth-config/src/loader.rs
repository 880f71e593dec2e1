// SPDX-FileCopyrightText: 2026 Plinth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./plinth.toml` > `~/.config/plinth/plinth.toml` > `/etc/plinth/plinth.toml`,
//! an optional `./plinthconfiguration.json` document, and environment variable
//! overrides via the `PLINTH_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized, Toml},
};

use crate::model::PlinthConfig;

pub const SYSTEM_CONFIG_PATH: &str = "/etc/plinth/plinth.toml";
pub const LOCAL_CONFIG_PATH: &str = "plinth.toml";
pub const LOCAL_JSON_CONFIG_PATH: &str = "plinthconfiguration.json";

/// User config path under the XDG config directory, if one exists.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("plinth/plinth.toml"))
}

/// Load configuration from the standard hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/plinth/plinth.toml` (system-wide)
/// 3. `~/.config/plinth/plinth.toml` (user XDG config)
/// 4. `./plinth.toml` (local directory)
/// 5. `./plinthconfiguration.json` (generated backend document)
/// 6. `PLINTH_*` environment variables
pub fn load_config() -> Result<PlinthConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no file lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<PlinthConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PlinthConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a JSON document only (no file lookup, no env).
pub fn load_config_from_json_str(json_content: &str) -> Result<PlinthConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PlinthConfig::default()))
        .merge(Json::string(json_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
///
/// Files ending in `.json` are read as JSON, everything else as TOML.
pub fn load_config_from_path(path: &Path) -> Result<PlinthConfig, figment::Error> {
    let figment = Figment::new().merge(Serialized::defaults(PlinthConfig::default()));
    let figment = if is_json(path) {
        figment.merge(Json::file(path))
    } else {
        figment.merge(Toml::file(path))
    };
    figment.merge(env_provider()).extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(PlinthConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_PATH))
        .merge(Json::file(LOCAL_JSON_CONFIG_PATH))
        .merge(env_provider())
}

pub(crate) fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}

/// Environment variable provider.
///
/// Nesting uses a double underscore so plugin keys and fields may contain
/// single underscores: `PLINTH_STORAGE__PLUGINS__S3__BUCKET` maps to
/// `storage.plugins.s3.bucket`. `PLINTH_LOG` belongs to the log filter.
fn env_provider() -> Env {
    Env::prefixed("PLINTH_").ignore(&["log"]).split("__")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_extension_detection() {
        assert!(is_json(Path::new("plinthconfiguration.json")));
        assert!(is_json(Path::new("/tmp/A.JSON")));
        assert!(!is_json(Path::new("plinth.toml")));
        assert!(!is_json(Path::new("plinth")));
    }

    #[test]
    fn env_overrides_nest_on_double_underscore() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("PLINTH_ENVIRONMENT", "prod");
            jail.set_env("PLINTH_STORAGE__PLUGINS__S3__BUCKET", "media");
            jail.set_env("PLINTH_LOG", "debug");
            jail.create_file("plinth.toml", "[storage.plugins.s3]\nregion = \"eu-west-1\"\n")?;

            let config = load_config_from_path(Path::new("plinth.toml"))?;
            assert_eq!(config.environment, "prod");
            let s3 = config
                .slice(plinth_core::CategoryType::Storage)
                .and_then(|s| s.plugin("s3"))
                .cloned()
                .unwrap_or_default();
            assert_eq!(s3["bucket"], "media");
            assert_eq!(s3["region"], "eu-west-1");
            Ok(())
        });
    }

    #[test]
    fn standard_hierarchy_merges_toml_and_json() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("plinth.toml", "environment = \"local\"\n[api.plugins.graphql]\nendpoint = \"a\"\n")?;
            jail.create_file(
                "plinthconfiguration.json",
                r#"{ "api": { "plugins": { "graphql": { "endpoint": "b" } } } }"#,
            )?;
            let config = load_config()?;
            assert_eq!(config.environment, "local");
            let endpoint = config
                .slice(plinth_core::CategoryType::Api)
                .and_then(|s| s.plugin("graphql"))
                .map(|v| v["endpoint"].clone());
            assert_eq!(endpoint, Some(serde_json::json!("b")));
            Ok(())
        });
    }
}
