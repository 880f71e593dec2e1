// SPDX-FileCopyrightText: 2026 Plinth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin contract and per-category behavior traits.
//!
//! Every category trait extends [`Plugin`]. A plugin enters a registry
//! wrapped in [`CategoryPlugin`], whose variant is the registration target.

pub mod analytics;
pub mod api;
pub mod auth;
pub mod hub;
pub mod logging;
pub mod plugin;
pub mod storage;

use std::any::Any;
use std::sync::Arc;

pub use analytics::AnalyticsPlugin;
pub use api::ApiPlugin;
pub use auth::AuthPlugin;
pub use hub::{HubPlugin, HubSubscription};
pub use logging::{LoggingPlugin, LoggingSettings, TracingLoggingPlugin};
pub use plugin::{Plugin, escape_hatch_as};
pub use storage::StoragePlugin;

use crate::error::PlinthError;
use crate::types::CategoryType;

/// A plugin tagged with the category it is being registered under.
#[derive(Clone)]
pub enum CategoryPlugin {
    Analytics(Arc<dyn AnalyticsPlugin>),
    Api(Arc<dyn ApiPlugin>),
    Auth(Arc<dyn AuthPlugin>),
    Hub(Arc<dyn HubPlugin>),
    Logging(Arc<dyn LoggingPlugin>),
    Storage(Arc<dyn StoragePlugin>),
}

macro_rules! with_plugin {
    ($self:expr, $p:ident => $body:expr) => {
        match $self {
            CategoryPlugin::Analytics($p) => $body,
            CategoryPlugin::Api($p) => $body,
            CategoryPlugin::Auth($p) => $body,
            CategoryPlugin::Hub($p) => $body,
            CategoryPlugin::Logging($p) => $body,
            CategoryPlugin::Storage($p) => $body,
        }
    };
}

impl CategoryPlugin {
    /// The category this plugin is being registered under.
    pub fn target(&self) -> CategoryType {
        match self {
            CategoryPlugin::Analytics(_) => CategoryType::Analytics,
            CategoryPlugin::Api(_) => CategoryType::Api,
            CategoryPlugin::Auth(_) => CategoryType::Auth,
            CategoryPlugin::Hub(_) => CategoryType::Hub,
            CategoryPlugin::Logging(_) => CategoryType::Logging,
            CategoryPlugin::Storage(_) => CategoryType::Storage,
        }
    }

    /// The category the plugin itself declares.
    pub fn declared(&self) -> CategoryType {
        with_plugin!(self, p => p.category())
    }

    pub fn plugin_key(&self) -> &str {
        with_plugin!(self, p => p.plugin_key())
    }

    pub fn version(&self) -> semver::Version {
        with_plugin!(self, p => p.version())
    }

    pub fn configure(&self, config: &serde_json::Value) -> Result<(), PlinthError> {
        with_plugin!(self, p => p.configure(config))
    }

    pub fn escape_hatch(&self) -> Result<Arc<dyn Any + Send + Sync>, PlinthError> {
        with_plugin!(self, p => p.escape_hatch())
    }

    pub async fn shutdown(&self) -> Result<(), PlinthError> {
        with_plugin!(self, p => p.shutdown().await)
    }

    pub fn as_analytics(&self) -> Option<&Arc<dyn AnalyticsPlugin>> {
        match self {
            CategoryPlugin::Analytics(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_api(&self) -> Option<&Arc<dyn ApiPlugin>> {
        match self {
            CategoryPlugin::Api(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_auth(&self) -> Option<&Arc<dyn AuthPlugin>> {
        match self {
            CategoryPlugin::Auth(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_hub(&self) -> Option<&Arc<dyn HubPlugin>> {
        match self {
            CategoryPlugin::Hub(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_logging(&self) -> Option<&Arc<dyn LoggingPlugin>> {
        match self {
            CategoryPlugin::Logging(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_storage(&self) -> Option<&Arc<dyn StoragePlugin>> {
        match self {
            CategoryPlugin::Storage(p) => Some(p),
            _ => None,
        }
    }
}

impl std::fmt::Debug for CategoryPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CategoryPlugin")
            .field("target", &self.target())
            .field("declared", &self.declared())
            .field("key", &self.plugin_key())
            .finish()
    }
}
