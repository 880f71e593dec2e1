// SPDX-FileCopyrightText: 2026 Plinth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Logging category contract and the built-in `tracing` implementation.

use std::any::Any;
use std::sync::{Arc, OnceLock};

use serde::Deserialize;

use crate::error::PlinthError;
use crate::traits::plugin::Plugin;
use crate::types::{CategoryType, LogLevel, LogRecord};

/// Plugin contract for the Logging category.
pub trait LoggingPlugin: Plugin {
    fn log(&self, record: LogRecord);
}

/// Settings accepted by [`TracingLoggingPlugin`]; also its escape hatch.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingSettings {
    /// Namespace used for records that carry none.
    #[serde(default)]
    pub default_namespace: Option<String>,

    /// Records below this level are discarded.
    #[serde(default)]
    pub min_level: LogLevel,
}

/// Logging plugin that forwards records to `tracing`.
#[derive(Debug, Default)]
pub struct TracingLoggingPlugin {
    settings: OnceLock<Arc<LoggingSettings>>,
}

impl TracingLoggingPlugin {
    pub const KEY: &'static str = "tracing";

    pub fn new() -> Self {
        Self::default()
    }

    fn settings(&self) -> LoggingSettings {
        self.settings
            .get()
            .map(|s| s.as_ref().clone())
            .unwrap_or_default()
    }
}

impl Plugin for TracingLoggingPlugin {
    fn plugin_key(&self) -> &str {
        Self::KEY
    }

    fn category(&self) -> CategoryType {
        CategoryType::Logging
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn configure(&self, config: &serde_json::Value) -> Result<(), PlinthError> {
        let settings = if config.is_null() {
            LoggingSettings::default()
        } else {
            LoggingSettings::deserialize(config).map_err(|e| {
                PlinthError::plugin_configuration(CategoryType::Logging, Self::KEY, e.to_string())
            })?
        };
        self.settings.set(Arc::new(settings)).map_err(|_| {
            PlinthError::plugin_configuration(CategoryType::Logging, Self::KEY, "already configured")
        })
    }

    fn escape_hatch(&self) -> Result<Arc<dyn Any + Send + Sync>, PlinthError> {
        let settings = self.settings.get().ok_or_else(|| PlinthError::NotConfigured {
            category: CategoryType::Logging,
            key: Self::KEY.to_string(),
        })?;
        Ok(Arc::clone(settings) as Arc<dyn Any + Send + Sync>)
    }
}

impl LoggingPlugin for TracingLoggingPlugin {
    fn log(&self, record: LogRecord) {
        let settings = self.settings();
        if record.level < settings.min_level {
            return;
        }
        let namespace = record
            .namespace
            .or(settings.default_namespace)
            .unwrap_or_else(|| "app".to_string());
        let message = record.message;
        match record.level {
            LogLevel::Trace => tracing::trace!(%namespace, "{message}"),
            LogLevel::Debug => tracing::debug!(%namespace, "{message}"),
            LogLevel::Info => tracing::info!(%namespace, "{message}"),
            LogLevel::Warn => tracing::warn!(%namespace, "{message}"),
            LogLevel::Error => tracing::error!(%namespace, "{message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::*;
    use crate::traits::plugin::escape_hatch_as;

    #[test]
    fn escape_hatch_fails_before_configure() {
        let plugin = TracingLoggingPlugin::new();
        assert!(matches!(
            plugin.escape_hatch(),
            Err(PlinthError::NotConfigured { category: CategoryType::Logging, .. })
        ));
    }

    #[test]
    fn configure_accepts_null_and_exposes_settings() {
        let plugin = TracingLoggingPlugin::new();
        plugin.configure(&serde_json::Value::Null).unwrap();
        let settings = escape_hatch_as::<LoggingSettings, _>(&plugin).unwrap();
        assert_eq!(*settings, LoggingSettings::default());
    }

    #[test]
    fn configure_rejects_unknown_fields() {
        let plugin = TracingLoggingPlugin::new();
        let err = plugin
            .configure(&serde_json::json!({"min_levle": "warn"}))
            .unwrap_err();
        assert!(matches!(err, PlinthError::PluginConfiguration { .. }));
        assert!(plugin.escape_hatch().is_err());
    }

    #[test]
    fn escape_hatch_as_wrong_type_fails() {
        let plugin = TracingLoggingPlugin::new();
        plugin.configure(&serde_json::Value::Null).unwrap();
        assert!(matches!(
            escape_hatch_as::<String, _>(&plugin),
            Err(PlinthError::PluginConfiguration { .. })
        ));
    }

    #[test]
    #[traced_test]
    fn log_respects_min_level_and_namespace() {
        let plugin = TracingLoggingPlugin::new();
        plugin
            .configure(&serde_json::json!({"default_namespace": "checkout", "min_level": "warn"}))
            .unwrap();

        plugin.log(LogRecord::new(LogLevel::Info, "quiet message"));
        plugin.log(LogRecord::new(LogLevel::Error, "payment declined"));

        assert!(!logs_contain("quiet message"));
        assert!(logs_contain("payment declined"));
        assert!(logs_contain("checkout"));
    }
}
