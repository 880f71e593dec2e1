// SPDX-FileCopyrightText: 2026 Plinth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hub category contract: the system notification channel.

use tokio::sync::broadcast;
use tracing::warn;

use crate::traits::plugin::Plugin;
use crate::types::{CategoryType, HubEvent};

/// Plugin contract for the Hub category.
///
/// The registry and the operation protocol publish lifecycle events here;
/// applications may publish their own `Custom` events as well.
pub trait HubPlugin: Plugin {
    /// Publishes an event to all current subscribers. Never blocks.
    fn publish(&self, event: HubEvent);

    /// Subscribes to every event published from now on.
    fn subscribe(&self) -> HubSubscription;
}

/// Receiving end of a Hub subscription.
pub struct HubSubscription {
    receiver: broadcast::Receiver<HubEvent>,
    category: Option<CategoryType>,
}

impl HubSubscription {
    pub fn new(receiver: broadcast::Receiver<HubEvent>) -> Self {
        Self {
            receiver,
            category: None,
        }
    }

    /// Only yield events concerning `category`.
    pub fn for_category(mut self, category: CategoryType) -> Self {
        self.category = Some(category);
        self
    }

    fn wanted(&self, event: &HubEvent) -> bool {
        self.category.is_none() || event.category() == self.category
    }

    /// Waits for the next event. `None` once the hub is gone.
    ///
    /// A subscriber that falls behind skips the overwritten events.
    pub async fn recv(&mut self) -> Option<HubEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.wanted(&event) => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "hub subscriber lagged behind");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Returns an already-published event without waiting.
    pub fn try_recv(&mut self) -> Option<HubEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if self.wanted(&event) => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "hub subscriber lagged behind");
                }
                Err(_) => return None,
            }
        }
    }
}
