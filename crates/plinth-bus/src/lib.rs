// SPDX-FileCopyrightText: 2026 Plinth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Broadcast event bus and the built-in Hub plugin.
//!
//! [`EventBus`] fans every [`HubEvent`] out to all current subscribers over a
//! bounded `tokio::sync::broadcast` channel. Publishing never blocks; a slow
//! subscriber skips the events that were overwritten while it lagged.
//! [`BusHubPlugin`] exposes the bus as the Hub category plugin.

mod plugin;

use plinth_core::{HubEvent, HubSubscription};
use tokio::sync::broadcast;
use tracing::debug;

pub use plugin::{BusHubPlugin, BusSettings};

/// Default number of events a subscriber may fall behind before lagging.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Bounded fan-out channel for hub events.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<HubEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a bus buffering up to `capacity` events per subscriber.
    ///
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, _) = broadcast::channel(capacity);
        debug!(capacity, "event bus created");
        Self { sender, capacity }
    }

    /// Publishes an event to every current subscriber.
    ///
    /// Returns how many subscribers will see it.
    pub fn publish(&self, event: HubEvent) -> usize {
        let kind = event_kind(&event);
        match self.sender.send(event) {
            Ok(count) => {
                debug!(event = kind, subscribers = count, "hub event published");
                count
            }
            Err(_) => {
                debug!(event = kind, "hub event published with no subscribers");
                0
            }
        }
    }

    /// Subscribes to every event published from now on.
    pub fn subscribe(&self) -> HubSubscription {
        HubSubscription::new(self.sender.subscribe())
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

fn event_kind(event: &HubEvent) -> &'static str {
    use plinth_core::HubPayload;

    match &event.payload {
        HubPayload::PluginConfigured { .. } => "plugin_configured",
        HubPayload::ConfigurationFailed { .. } => "configuration_failed",
        HubPayload::SubscriptionEstablished { .. } => "subscription_established",
        HubPayload::OperationTerminal { .. } => "operation_terminal",
        HubPayload::Custom { .. } => "custom",
    }
}

#[cfg(test)]
mod tests {
    use plinth_core::{CategoryType, HubPayload};

    use super::*;

    fn configured(key: &str) -> HubEvent {
        HubEvent::new(HubPayload::PluginConfigured {
            category: CategoryType::Storage,
            plugin_key: key.into(),
        })
    }

    #[test]
    fn publish_without_subscribers_returns_zero() {
        let bus = EventBus::default();
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(bus.publish(configured("s3")), 0);
    }

    #[test]
    fn zero_capacity_is_raised() {
        assert_eq!(EventBus::new(0).capacity(), 1);
    }

    #[tokio::test]
    async fn every_subscriber_receives_each_event() {
        let bus = EventBus::new(8);
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();
        assert_eq!(bus.publish(configured("s3")), 2);

        for sub in [&mut a, &mut b] {
            let event = sub.recv().await.unwrap();
            assert!(matches!(
                event.payload,
                HubPayload::PluginConfigured { ref plugin_key, .. } if plugin_key == "s3"
            ));
        }
    }

    #[tokio::test]
    async fn lagging_subscriber_skips_to_newest() {
        let bus = EventBus::new(2);
        let mut sub = bus.subscribe();
        for key in ["a", "b", "c", "d"] {
            bus.publish(configured(key));
        }
        let event = sub.recv().await.unwrap();
        assert!(matches!(
            event.payload,
            HubPayload::PluginConfigured { ref plugin_key, .. } if plugin_key == "c"
        ));
    }

    #[tokio::test]
    async fn category_filter_drops_other_categories() {
        let bus = EventBus::default();
        let mut sub = bus.subscribe().for_category(CategoryType::Api);
        bus.publish(configured("s3"));
        bus.publish(HubEvent::new(HubPayload::PluginConfigured {
            category: CategoryType::Api,
            plugin_key: "graphql".into(),
        }));
        let event = sub.recv().await.unwrap();
        assert_eq!(event.category(), Some(CategoryType::Api));
        assert!(sub.try_recv().is_none());
    }

    #[test]
    fn dropped_bus_closes_subscriptions() {
        let bus = EventBus::default();
        let mut sub = bus.subscribe();
        drop(bus);
        assert!(tokio_test::block_on(sub.recv()).is_none());
    }
}
