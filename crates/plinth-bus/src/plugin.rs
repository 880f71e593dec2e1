// SPDX-FileCopyrightText: 2026 Plinth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::any::Any;
use std::sync::{Arc, OnceLock};

use plinth_core::{CategoryType, HubEvent, HubPlugin, HubSubscription, PlinthError, Plugin};
use serde::Deserialize;
use tracing::info;

use crate::EventBus;

/// Settings accepted by [`BusHubPlugin`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BusSettings {
    /// Log every published event at `info` instead of `debug`.
    #[serde(default)]
    pub trace_events: bool,
}

/// Hub plugin backed by an in-process [`EventBus`].
///
/// Publishing and subscribing work from construction on, so lifecycle
/// events emitted while other categories configure are not lost. The
/// escape hatch (the bus itself) is available once configured.
#[derive(Debug)]
pub struct BusHubPlugin {
    bus: Arc<EventBus>,
    settings: OnceLock<BusSettings>,
}

impl BusHubPlugin {
    pub const KEY: &'static str = "bus";

    pub fn new() -> Self {
        Self::with_capacity(crate::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bus: Arc::new(EventBus::new(capacity)),
            settings: OnceLock::new(),
        }
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }
}

impl Default for BusHubPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for BusHubPlugin {
    fn plugin_key(&self) -> &str {
        Self::KEY
    }

    fn category(&self) -> CategoryType {
        CategoryType::Hub
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn configure(&self, config: &serde_json::Value) -> Result<(), PlinthError> {
        let settings = if config.is_null() {
            BusSettings::default()
        } else {
            BusSettings::deserialize(config).map_err(|e| {
                PlinthError::plugin_configuration(CategoryType::Hub, Self::KEY, e.to_string())
            })?
        };
        self.settings.set(settings).map_err(|_| {
            PlinthError::plugin_configuration(CategoryType::Hub, Self::KEY, "already configured")
        })
    }

    fn escape_hatch(&self) -> Result<Arc<dyn Any + Send + Sync>, PlinthError> {
        if self.settings.get().is_none() {
            return Err(PlinthError::NotConfigured {
                category: CategoryType::Hub,
                key: Self::KEY.to_string(),
            });
        }
        Ok(Arc::clone(&self.bus) as Arc<dyn Any + Send + Sync>)
    }
}

impl HubPlugin for BusHubPlugin {
    fn publish(&self, event: HubEvent) {
        if self.settings.get().is_some_and(|s| s.trace_events) {
            info!(event_id = %event.id, payload = ?event.payload, "hub event");
        }
        self.bus.publish(event);
    }

    fn subscribe(&self) -> HubSubscription {
        self.bus.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use plinth_core::{HubPayload, escape_hatch_as};
    use serde_json::json;

    use super::*;

    #[test]
    fn escape_hatch_requires_configure() {
        let plugin = BusHubPlugin::new();
        assert!(matches!(
            plugin.escape_hatch(),
            Err(PlinthError::NotConfigured { category: CategoryType::Hub, .. })
        ));

        plugin.configure(&serde_json::Value::Null).unwrap();
        let bus: Arc<EventBus> = escape_hatch_as(&plugin).unwrap();
        assert_eq!(bus.capacity(), crate::DEFAULT_CAPACITY);
    }

    #[test]
    fn configure_rejects_unknown_settings_and_second_call() {
        let plugin = BusHubPlugin::with_capacity(4);
        let err = plugin.configure(&json!({"capacity": 4})).unwrap_err();
        assert!(matches!(err, PlinthError::PluginConfiguration { .. }));

        plugin.configure(&json!({"trace_events": true})).unwrap();
        assert!(plugin.configure(&json!({})).is_err());
    }

    #[tokio::test]
    async fn publish_reaches_subscribers_before_configure() {
        let plugin = BusHubPlugin::new();
        let mut sub = plugin.subscribe();
        plugin.publish(HubEvent::new(HubPayload::Custom {
            channel: "ui".into(),
            payload: json!({"tap": 1}),
        }));
        let event = sub.recv().await.unwrap();
        assert!(matches!(event.payload, HubPayload::Custom { ref channel, .. } if channel == "ui"));
    }
}
