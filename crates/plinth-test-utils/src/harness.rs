// SPDX-FileCopyrightText: 2026 Plinth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles a configured [`Plinth`] context with the four
//! mock category plugins and a bus-backed hub, and keeps a hub subscription
//! that was opened before configuration so tests can assert on every
//! lifecycle event.

use std::sync::Arc;
use std::time::Duration;

use plinth::{
    AnalyticsPlugin, ApiPlugin, AuthPlugin, CategoryPlugin, ConfigureReport, HubEvent, HubPlugin,
    HubSubscription, PlinthError, Plinth, StoragePlugin,
};
use plinth_bus::BusHubPlugin;

use crate::mock_analytics::MockAnalyticsPlugin;
use crate::mock_api::MockApiPlugin;
use crate::mock_auth::MockAuthPlugin;
use crate::mock_storage::MockStoragePlugin;

/// Configuration document matching the default mocks.
pub const DEFAULT_CONFIG: &str = r#"
environment = "test"

[storage.plugins.mock-storage]
bucket = "test-bucket"
region = "local"

[api.plugins.mock-api]
endpoint = "https://api.test/graphql"

[auth.plugins.mock-auth]
users = { alice = "wonderland" }

[analytics.plugins.mock-analytics]
app_id = "test-app"

[hub.plugins.bus]
trace_events = true
"#;

enum Document {
    Toml(String),
    Json(String),
}

/// Builder for creating test environments with configurable mocks.
pub struct TestHarnessBuilder {
    storage: MockStoragePlugin,
    api: MockApiPlugin,
    auth: MockAuthPlugin,
    analytics: MockAnalyticsPlugin,
    document: Document,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            storage: MockStoragePlugin::new(),
            api: MockApiPlugin::new(),
            auth: MockAuthPlugin::new(),
            analytics: MockAnalyticsPlugin::new(),
            document: Document::Toml(DEFAULT_CONFIG.to_string()),
        }
    }

    pub fn with_storage(mut self, storage: MockStoragePlugin) -> Self {
        self.storage = storage;
        self
    }

    pub fn with_api(mut self, api: MockApiPlugin) -> Self {
        self.api = api;
        self
    }

    pub fn with_auth(mut self, auth: MockAuthPlugin) -> Self {
        self.auth = auth;
        self
    }

    pub fn with_analytics(mut self, analytics: MockAnalyticsPlugin) -> Self {
        self.analytics = analytics;
        self
    }

    /// Replaces [`DEFAULT_CONFIG`] with a TOML document.
    pub fn with_config(mut self, toml: impl Into<String>) -> Self {
        self.document = Document::Toml(toml.into());
        self
    }

    pub fn with_json_config(mut self, json: impl Into<String>) -> Self {
        self.document = Document::Json(json.into());
        self
    }

    /// Registers every mock, subscribes to the hub, then configures.
    ///
    /// Per-plugin configuration failures do not fail the build; inspect
    /// [`TestHarness::report`].
    pub fn build(self) -> Result<TestHarness, PlinthError> {
        let storage = Arc::new(self.storage);
        let api = Arc::new(self.api);
        let auth = Arc::new(self.auth);
        let analytics = Arc::new(self.analytics);
        let hub = Arc::new(BusHubPlugin::new());

        let plinth = Plinth::new();
        plinth.add_plugin(CategoryPlugin::Storage(Arc::clone(&storage) as Arc<dyn StoragePlugin>))?;
        plinth.add_plugin(CategoryPlugin::Api(Arc::clone(&api) as Arc<dyn ApiPlugin>))?;
        plinth.add_plugin(CategoryPlugin::Auth(Arc::clone(&auth) as Arc<dyn AuthPlugin>))?;
        plinth.add_plugin(CategoryPlugin::Analytics(
            Arc::clone(&analytics) as Arc<dyn AnalyticsPlugin>
        ))?;
        plinth.add_plugin(CategoryPlugin::Hub(Arc::clone(&hub) as Arc<dyn HubPlugin>))?;

        let events = hub.subscribe();
        let report = match &self.document {
            Document::Toml(toml) => plinth.configure_from_str(toml)?,
            Document::Json(json) => plinth.configure_from_json_str(json)?,
        };

        Ok(TestHarness {
            plinth,
            storage,
            api,
            auth,
            analytics,
            hub,
            events,
            report,
        })
    }
}

/// A configured context wired to mock plugins.
pub struct TestHarness {
    pub plinth: Plinth,
    pub storage: Arc<MockStoragePlugin>,
    pub api: Arc<MockApiPlugin>,
    pub auth: Arc<MockAuthPlugin>,
    pub analytics: Arc<MockAnalyticsPlugin>,
    pub hub: Arc<BusHubPlugin>,
    events: HubSubscription,
    report: ConfigureReport,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// The result of the configure call made by `build`.
    pub fn report(&self) -> &ConfigureReport {
        &self.report
    }

    /// Every hub event already published, oldest first.
    pub fn drain_events(&mut self) -> Vec<HubEvent> {
        std::iter::from_fn(|| self.events.try_recv()).collect()
    }

    /// Waits up to `timeout` for the next hub event.
    pub async fn next_event(&mut self, timeout: Duration) -> Option<HubEvent> {
        tokio::time::timeout(timeout, self.events.recv())
            .await
            .ok()
            .flatten()
    }

    /// Waits until an event matching `predicate` arrives, skipping others.
    pub async fn wait_for<F>(&mut self, timeout: Duration, mut predicate: F) -> Option<HubEvent>
    where
        F: FnMut(&HubEvent) -> bool,
    {
        let search = async {
            while let Some(event) = self.events.recv().await {
                if predicate(&event) {
                    return Some(event);
                }
            }
            None
        };
        tokio::time::timeout(timeout, search).await.ok().flatten()
    }
}
