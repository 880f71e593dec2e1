// SPDX-FileCopyrightText: 2026 Plinth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base plugin contract every category implementation satisfies.

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::PlinthError;
use crate::types::CategoryType;

/// The base trait for all Plinth plugins.
///
/// A plugin is bound to exactly one category and identified by a key that is
/// unique within that category. Configuration happens at most once per
/// registry lifecycle and is synchronous.
#[async_trait]
pub trait Plugin: Send + Sync + 'static {
    /// Key identifying this plugin within its category (e.g. `awsS3StoragePlugin`).
    fn plugin_key(&self) -> &str;

    /// The category this plugin implements.
    fn category(&self) -> CategoryType;

    /// Returns the semantic version of this plugin.
    fn version(&self) -> semver::Version;

    /// Applies this plugin's configuration.
    ///
    /// Receives `Value::Null` when the category slice has no entry for the
    /// plugin's key. Rejects missing or malformed input with
    /// [`PlinthError::PluginConfiguration`].
    fn configure(&self, config: &serde_json::Value) -> Result<(), PlinthError>;

    /// Returns the underlying native client.
    ///
    /// Fails with [`PlinthError::NotConfigured`] before a successful `configure`.
    fn escape_hatch(&self) -> Result<Arc<dyn Any + Send + Sync>, PlinthError>;

    /// Releases the native client. Called when the plugin leaves the registry
    /// through an explicit shutdown.
    async fn shutdown(&self) -> Result<(), PlinthError> {
        Ok(())
    }
}

/// Fetches a plugin's escape hatch as its concrete native client type.
pub fn escape_hatch_as<T, P>(plugin: &P) -> Result<Arc<T>, PlinthError>
where
    T: Any + Send + Sync,
    P: Plugin + ?Sized,
{
    plugin
        .escape_hatch()?
        .downcast::<T>()
        .map_err(|_| PlinthError::PluginConfiguration {
            category: plugin.category(),
            key: Some(plugin.plugin_key().to_string()),
            message: format!(
                "escape hatch is not a `{}`",
                std::any::type_name::<T>()
            ),
        })
}
