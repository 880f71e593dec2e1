// SPDX-FileCopyrightText: 2026 Plinth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that serde attributes cannot express:
//! a named environment, well-formed plugin keys, and object-shaped plugin
//! slices.

use std::collections::HashMap;

use plinth_core::CategoryType;

use crate::diagnostic::ConfigError;
use crate::model::PlinthConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &PlinthConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.environment.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "environment must not be empty".to_string(),
        });
    }

    for category in CategoryType::ALL {
        let Some(slice) = config.slice(category) else {
            continue;
        };
        let section = category.config_key();
        let mut seen: HashMap<String, &str> = HashMap::new();

        for (key, value) in &slice.plugins {
            if key.trim().is_empty() {
                errors.push(ConfigError::Validation {
                    message: format!("{section}.plugins contains an empty plugin key"),
                });
                continue;
            }

            if let Some(previous) = seen.insert(key.to_lowercase(), key.as_str()) {
                errors.push(ConfigError::Validation {
                    message: format!(
                        "{section}.plugins has keys `{previous}` and `{key}` that differ only by case"
                    ),
                });
            }

            if !value.is_object() {
                errors.push(ConfigError::Validation {
                    message: format!(
                        "{section}.plugins.{key} must be a table, got {}",
                        json_type_name(value)
                    ),
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "a table",
    }
}
