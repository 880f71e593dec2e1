// SPDX-FileCopyrightText: 2026 Plinth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Plinth category framework.
//!
//! A configuration document holds one optional slice per category; each
//! slice maps plugin keys to that plugin's own settings. Documents are read
//! from TOML or JSON with strict validation (`deny_unknown_fields`), merged
//! across the XDG file hierarchy with environment variable overrides, and
//! reported through miette diagnostics with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use plinth_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("environment: {}", config.environment);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::Path;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_json_str, load_config_from_path, load_config_from_str};
pub use model::{CategoryConfig, PlinthConfig};

/// Load configuration from the standard hierarchy and validate it.
///
/// On a figment error, the errors are converted into diagnostics with
/// typo suggestions; otherwise post-deserialization validation runs.
pub fn load_and_validate() -> Result<PlinthConfig, Vec<ConfigError>> {
    match loader::load_config() {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = collect_sources();
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Load configuration from a TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<PlinthConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_str(toml_content), "<inline>", toml_content)
}

/// Load configuration from a JSON document and validate it.
pub fn load_and_validate_json_str(json_content: &str) -> Result<PlinthConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_json_str(json_content), "<inline>", json_content)
}

/// Load configuration from one file (plus env overrides) and validate it.
pub fn load_and_validate_path(path: &Path) -> Result<PlinthConfig, Vec<ConfigError>> {
    if !path.exists() {
        return Err(vec![ConfigError::Other(format!(
            "configuration file {} does not exist",
            path.display()
        ))]);
    }
    match loader::load_config_from_path(path) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = std::fs::read_to_string(path)
                .map(|content| vec![(path.display().to_string(), content)])
                .unwrap_or_default();
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

#[allow(clippy::result_large_err)]
fn finish(
    loaded: Result<PlinthConfig, figment::Error>,
    name: &str,
    content: &str,
) -> Result<PlinthConfig, Vec<ConfigError>> {
    match loaded {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = vec![(name.to_string(), content.to_string())];
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Collect source file contents for error span resolution.
fn collect_sources() -> Vec<(String, String)> {
    let mut sources = Vec::new();

    for local in [loader::LOCAL_CONFIG_PATH, loader::LOCAL_JSON_CONFIG_PATH] {
        if let Ok(content) = std::fs::read_to_string(local) {
            let path = std::env::current_dir()
                .map(|d| d.join(local).display().to_string())
                .unwrap_or_else(|_| local.to_string());
            sources.push((path, content));
        }
    }

    if let Some(path) = loader::user_config_path()
        && let Ok(content) = std::fs::read_to_string(&path)
    {
        sources.push((path.display().to_string(), content));
    }

    let system_path = Path::new(loader::SYSTEM_CONFIG_PATH);
    if let Ok(content) = std::fs::read_to_string(system_path) {
        sources.push((system_path.display().to_string(), content));
    }

    sources
}
