// SPDX-FileCopyrightText: 2026 Plinth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The [`Plinth`] context: one registry, its configure-once lifecycle, and
//! typed access to the active plugin of each category.

use std::sync::Arc;

use plinth_bus::BusHubPlugin;
use plinth_config::{ConfigError, PlinthConfig};
use plinth_core::types::{
    AnalyticsEvent, AuthSession, GraphQlRequest, GraphQlResponse, LogRecord, SignInRequest,
    StorageRemoveRequest, StorageRemoveResult, StorageUploadFileRequest, StorageUploadFileResult,
};
use plinth_core::{
    AnalyticsPlugin, ApiPlugin, AuthPlugin, CategoryPlugin, CategoryType, HubEvent, HubPayload,
    HubPlugin, HubSubscription, LoggingPlugin, Operation, PlinthError, StoragePlugin,
    Subscription, TracingLoggingPlugin,
};
use plinth_plugin::{CategoryCatalog, CategoryRegistry, ConfigureReport};
use tracing::{info, warn};

/// An explicit, constructible Plinth context.
///
/// Each context owns its own registry and configured latch; two contexts
/// never share plugins or state. Configure once with
/// [`configure`](Plinth::configure), and use [`reset`](Plinth::reset) to
/// start over.
#[derive(Debug, Default)]
pub struct Plinth {
    registry: CategoryRegistry,
}

impl Plinth {
    /// A context accepting plugins for all six categories.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog(catalog: CategoryCatalog) -> Self {
        Self {
            registry: CategoryRegistry::new(catalog),
        }
    }

    /// Registers the plugins that ship with Plinth: the `tracing` logging
    /// plugin and the `bus` hub plugin.
    pub fn with_builtin_plugins(self) -> Result<Self, PlinthError> {
        self.add_plugin(CategoryPlugin::Logging(Arc::new(TracingLoggingPlugin::new())))?;
        self.add_plugin(CategoryPlugin::Hub(Arc::new(BusHubPlugin::new())))?;
        Ok(self)
    }

    pub fn registry(&self) -> &CategoryRegistry {
        &self.registry
    }

    pub fn add_plugin(&self, plugin: CategoryPlugin) -> Result<(), PlinthError> {
        self.registry.add_plugin(plugin)
    }

    pub fn remove_plugin(&self, category: CategoryType, key: &str) -> Option<CategoryPlugin> {
        self.registry.remove_plugin(category, key)
    }

    pub fn get_plugin(
        &self,
        category: CategoryType,
        key: Option<&str>,
    ) -> Result<CategoryPlugin, PlinthError> {
        self.registry.get_plugin(category, key)
    }

    pub fn is_configured(&self) -> bool {
        self.registry.is_configured()
    }

    /// Configures every registered plugin from `config`.
    ///
    /// Fails with `AlreadyConfigured` on every call after the first. Per-plugin
    /// failures are reported in the returned [`ConfigureReport`] and published
    /// to the hub as `ConfigurationFailed`; successes as `PluginConfigured`.
    pub fn configure(&self, config: &PlinthConfig) -> Result<ConfigureReport, PlinthError> {
        info!(environment = %config.environment, "configuring plinth");
        let report = self.registry.configure(config)?;

        if let Some(hub) = self.hub_sink() {
            for (category, plugin_key) in &report.configured {
                hub.publish(HubEvent::new(HubPayload::PluginConfigured {
                    category: *category,
                    plugin_key: plugin_key.clone(),
                }));
            }
            for failure in &report.failures {
                hub.publish(HubEvent::new(HubPayload::ConfigurationFailed {
                    category: failure.category,
                    plugin_key: Some(failure.plugin_key.clone()),
                    message: failure.error.to_string(),
                }));
            }
        }

        if !report.is_success() {
            warn!(failures = report.failures.len(), "configuration finished with failures");
        }
        Ok(report)
    }

    /// Loads, validates and applies a TOML configuration document.
    pub fn configure_from_str(&self, toml: &str) -> Result<ConfigureReport, PlinthError> {
        let config = plinth_config::load_and_validate_str(toml).map_err(config_error)?;
        self.configure(&config)
    }

    /// Loads, validates and applies a JSON configuration document.
    pub fn configure_from_json_str(&self, json: &str) -> Result<ConfigureReport, PlinthError> {
        let config = plinth_config::load_and_validate_json_str(json).map_err(config_error)?;
        self.configure(&config)
    }

    /// Clears every plugin binding and the configured latch.
    ///
    /// In-flight operations are not touched; coordinate with them first.
    /// Returns the plugins that were bound.
    pub fn reset(&self) -> Vec<CategoryPlugin> {
        self.registry.reset()
    }

    /// Resets the context and shuts down every plugin that was bound.
    ///
    /// All plugins are shut down even if one fails; the first error is
    /// returned.
    pub async fn shutdown(&self) -> Result<(), PlinthError> {
        let mut first_error = None;
        for plugin in self.reset() {
            if let Err(err) = plugin.shutdown().await {
                warn!(
                    category = %plugin.target(),
                    plugin_key = plugin.plugin_key(),
                    error = %err,
                    "plugin shutdown failed"
                );
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    // --- typed category access ---

    pub fn storage(&self) -> Result<Arc<dyn StoragePlugin>, PlinthError> {
        self.storage_plugin(None)
    }

    pub fn storage_plugin(&self, key: Option<&str>) -> Result<Arc<dyn StoragePlugin>, PlinthError> {
        let plugin = self.get_plugin(CategoryType::Storage, key)?;
        plugin.as_storage().cloned().ok_or_else(|| wrong_variant(&plugin))
    }

    pub fn api(&self) -> Result<Arc<dyn ApiPlugin>, PlinthError> {
        self.api_plugin(None)
    }

    pub fn api_plugin(&self, key: Option<&str>) -> Result<Arc<dyn ApiPlugin>, PlinthError> {
        let plugin = self.get_plugin(CategoryType::Api, key)?;
        plugin.as_api().cloned().ok_or_else(|| wrong_variant(&plugin))
    }

    pub fn auth(&self) -> Result<Arc<dyn AuthPlugin>, PlinthError> {
        let plugin = self.get_plugin(CategoryType::Auth, None)?;
        plugin.as_auth().cloned().ok_or_else(|| wrong_variant(&plugin))
    }

    pub fn analytics(&self) -> Result<Arc<dyn AnalyticsPlugin>, PlinthError> {
        let plugin = self.get_plugin(CategoryType::Analytics, None)?;
        plugin.as_analytics().cloned().ok_or_else(|| wrong_variant(&plugin))
    }

    pub fn logging(&self) -> Result<Arc<dyn LoggingPlugin>, PlinthError> {
        let plugin = self.get_plugin(CategoryType::Logging, None)?;
        plugin.as_logging().cloned().ok_or_else(|| wrong_variant(&plugin))
    }

    pub fn hub(&self) -> Result<Arc<dyn HubPlugin>, PlinthError> {
        let plugin = self.get_plugin(CategoryType::Hub, None)?;
        plugin.as_hub().cloned().ok_or_else(|| wrong_variant(&plugin))
    }

    /// Subscribes to the active hub.
    pub fn listen(&self) -> Result<HubSubscription, PlinthError> {
        Ok(self.hub()?.subscribe())
    }

    fn hub_sink(&self) -> Option<Arc<dyn HubPlugin>> {
        self.hub().ok()
    }

    // --- category operations routed through the active plugin ---
    //
    // Each returned operation has the active hub attached, so its terminal
    // transition is published there.

    pub fn upload_file(
        &self,
        request: StorageUploadFileRequest,
    ) -> Result<Operation<StorageUploadFileResult>, PlinthError> {
        Ok(self.attach(self.storage()?.upload_file(request)))
    }

    pub fn remove(
        &self,
        request: StorageRemoveRequest,
    ) -> Result<Operation<StorageRemoveResult>, PlinthError> {
        Ok(self.attach(self.storage()?.remove(request)))
    }

    pub fn query(&self, request: GraphQlRequest) -> Result<Operation<GraphQlResponse>, PlinthError> {
        Ok(self.attach(self.api()?.query(request)))
    }

    pub fn mutate(&self, request: GraphQlRequest) -> Result<Operation<GraphQlResponse>, PlinthError> {
        Ok(self.attach(self.api()?.mutate(request)))
    }

    pub fn subscribe(
        &self,
        request: GraphQlRequest,
    ) -> Result<Subscription<GraphQlResponse>, PlinthError> {
        let subscription = self.api()?.subscribe(request);
        Ok(match self.hub_sink() {
            Some(hub) => subscription.with_hub(hub),
            None => subscription,
        })
    }

    pub fn sign_in(&self, request: SignInRequest) -> Result<Operation<AuthSession>, PlinthError> {
        Ok(self.attach(self.auth()?.sign_in(request)))
    }

    pub fn sign_out(&self) -> Result<Operation<()>, PlinthError> {
        Ok(self.attach(self.auth()?.sign_out()))
    }

    pub fn record_event(&self, event: AnalyticsEvent) -> Result<(), PlinthError> {
        self.analytics()?.record_event(event)
    }

    pub fn flush_events(&self) -> Result<Operation<usize>, PlinthError> {
        Ok(self.attach(self.analytics()?.flush()))
    }

    pub fn log(&self, record: LogRecord) -> Result<(), PlinthError> {
        self.logging()?.log(record);
        Ok(())
    }

    fn attach<T: Send + 'static>(&self, operation: Operation<T>) -> Operation<T> {
        match self.hub_sink() {
            Some(hub) => operation.with_hub(hub),
            None => operation,
        }
    }
}

fn wrong_variant(plugin: &CategoryPlugin) -> PlinthError {
    PlinthError::Internal(format!(
        "plugin `{}` is bound under {} with the wrong variant",
        plugin.plugin_key(),
        plugin.target()
    ))
}

fn config_error(errors: Vec<ConfigError>) -> PlinthError {
    let message = errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    PlinthError::Config(message)
}

#[cfg(test)]
mod tests {
    use plinth_bus::EventBus;
    use plinth_core::escape_hatch_as;
    use plinth_core::traits::LoggingSettings;
    use plinth_core::types::LogLevel;

    use super::*;

    #[test]
    fn contexts_are_independent() {
        let a = Plinth::new().with_builtin_plugins().unwrap();
        let b = Plinth::new();
        a.configure(&PlinthConfig::default()).unwrap();
        assert!(a.is_configured());
        assert!(!b.is_configured());
        assert!(b.hub().is_err());
    }

    #[test]
    fn missing_category_is_no_such_plugin() {
        let plinth = Plinth::new();
        let err = plinth.storage().err().unwrap();
        assert!(matches!(
            err,
            PlinthError::NoSuchPlugin { category: CategoryType::Storage, key: None }
        ));
    }

    #[test]
    fn configure_from_str_reaches_builtins() {
        let plinth = Plinth::new().with_builtin_plugins().unwrap();
        let report = plinth
            .configure_from_str(
                r#"
[logging.plugins.tracing]
min_level = "warn"

[hub.plugins.bus]
trace_events = true
"#,
            )
            .unwrap();
        assert!(report.is_success());
        assert_eq!(report.configured.len(), 2);

        let logging = plinth.get_plugin(CategoryType::Logging, None).unwrap();
        let settings = logging
            .escape_hatch()
            .unwrap()
            .downcast::<LoggingSettings>()
            .unwrap();
        assert_eq!(settings.min_level, LogLevel::Warn);

        let hub = plinth.hub().unwrap();
        let bus: Arc<EventBus> = escape_hatch_as(&*hub).unwrap();
        assert_eq!(bus.capacity(), plinth_bus::DEFAULT_CAPACITY);
    }

    #[test]
    fn invalid_document_is_a_config_error_and_leaves_latch_open() {
        let plinth = Plinth::new();
        let err = plinth.configure_from_str("[storge]\n").unwrap_err();
        assert!(matches!(err, PlinthError::Config(ref m) if m.contains("storge")));
        assert!(!plinth.is_configured());
    }

    #[test]
    fn configure_publishes_lifecycle_to_hub() {
        let plinth = Plinth::new().with_builtin_plugins().unwrap();
        let mut events = plinth.listen().unwrap();
        plinth
            .configure_from_json_str(r#"{ "logging": { "plugins": { "tracing": { "min_level": 3 } } } }"#)
            .unwrap();

        let event = events.try_recv().unwrap();
        assert!(matches!(
            event.payload,
            HubPayload::ConfigurationFailed { category: CategoryType::Logging, .. }
        ));
        assert!(events.try_recv().is_none());
    }

    #[tokio::test]
    async fn shutdown_resets_the_context() {
        let plinth = Plinth::new().with_builtin_plugins().unwrap();
        plinth.configure(&PlinthConfig::default()).unwrap();
        plinth.shutdown().await.unwrap();
        assert!(!plinth.is_configured());
        assert!(plinth.logging().is_err());
    }
}
