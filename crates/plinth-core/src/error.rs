// SPDX-FileCopyrightText: 2026 Plinth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Plinth category framework.

use thiserror::Error;

use crate::types::{CategoryType, OperationId};

/// The primary error type used across the registry, plugin contract, and
/// operation protocol.
///
/// Registry-level variants are returned synchronously by the call that
/// detected them. [`OperationFailed`](PlinthError::OperationFailed) only ever
/// reaches a caller through an operation's outcome or a subscription's
/// failure event.
#[derive(Debug, Error)]
pub enum PlinthError {
    /// `configure` was called on a context that is already configured.
    #[error("already configured; call reset() before configuring again")]
    AlreadyConfigured,

    /// No plugin is registered for the category (or for the requested key).
    #[error("no plugin registered for {category}{}", fmt_key(.key.as_deref()))]
    NoSuchPlugin {
        category: CategoryType,
        key: Option<String>,
    },

    /// The plugin's declared category does not match where it was registered,
    /// or the category is not part of this context's catalog.
    #[error("plugin `{key}` declares category {declared}: {}", fmt_target(.target))]
    MismatchedCategory {
        key: String,
        declared: CategoryType,
        /// Registration target, `None` when the category is unsupported.
        target: Option<CategoryType>,
    },

    /// A plugin rejected its configuration, or registration is not accepted.
    #[error("plugin configuration error for {category}{}: {message}", fmt_key(.key.as_deref()))]
    PluginConfiguration {
        category: CategoryType,
        key: Option<String>,
        message: String,
    },

    /// The plugin's native client was requested before it was configured.
    #[error("plugin `{key}` ({category}) is not configured")]
    NotConfigured { category: CategoryType, key: String },

    /// A category-specific failure delivered through an operation's failure channel.
    #[error("{category} operation {operation} failed: {message}")]
    OperationFailed {
        category: CategoryType,
        operation: OperationId,
        /// Echo of the request that failed.
        request: serde_json::Value,
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A lifecycle call that is not valid in the operation's current state.
    #[error("cannot {action} operation {operation} while {state}")]
    InvalidTransition {
        operation: OperationId,
        state: String,
        action: &'static str,
    },

    /// The configuration document could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PlinthError {
    /// Shorthand for a plugin rejecting its configuration slice.
    pub fn plugin_configuration(
        category: CategoryType,
        key: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        PlinthError::PluginConfiguration {
            category,
            key: Some(key.into()),
            message: message.into(),
        }
    }

    /// The category an error concerns, when it carries one.
    pub fn category(&self) -> Option<CategoryType> {
        match self {
            PlinthError::NoSuchPlugin { category, .. }
            | PlinthError::PluginConfiguration { category, .. }
            | PlinthError::NotConfigured { category, .. }
            | PlinthError::OperationFailed { category, .. } => Some(*category),
            PlinthError::MismatchedCategory { declared, .. } => Some(*declared),
            _ => None,
        }
    }
}

fn fmt_key(key: Option<&str>) -> String {
    key.map(|k| format!(" (key `{k}`)")).unwrap_or_default()
}

fn fmt_target(target: &Option<CategoryType>) -> String {
    match target {
        Some(target) => format!("registered as {target}"),
        None => "category is not in the catalog".to_string(),
    }
}
