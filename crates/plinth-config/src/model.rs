// SPDX-FileCopyrightText: 2026 Plinth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model: one optional slice per category.
//!
//! Structs use `#[serde(deny_unknown_fields)]` so a misspelled category key
//! is rejected at load time instead of silently leaving a category
//! unconfigured.

use std::collections::BTreeMap;

use plinth_core::CategoryType;
use serde::{Deserialize, Serialize};

/// Top-level Plinth configuration document.
///
/// Read-only once loaded. A category without a slice is skipped by
/// `configure`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PlinthConfig {
    /// Name of the backend environment this document describes.
    #[serde(default = "default_environment")]
    pub environment: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analytics: Option<CategoryConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api: Option<CategoryConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<CategoryConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hub: Option<CategoryConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<CategoryConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<CategoryConfig>,
}

impl Default for PlinthConfig {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            analytics: None,
            api: None,
            auth: None,
            hub: None,
            logging: None,
            storage: None,
        }
    }
}

pub const DEFAULT_ENVIRONMENT: &str = "default";

fn default_environment() -> String {
    DEFAULT_ENVIRONMENT.to_string()
}

impl PlinthConfig {
    /// The configuration slice for `category`, if the document has one.
    pub fn slice(&self, category: CategoryType) -> Option<&CategoryConfig> {
        match category {
            CategoryType::Analytics => self.analytics.as_ref(),
            CategoryType::Api => self.api.as_ref(),
            CategoryType::Auth => self.auth.as_ref(),
            CategoryType::Hub => self.hub.as_ref(),
            CategoryType::Logging => self.logging.as_ref(),
            CategoryType::Storage => self.storage.as_ref(),
        }
    }

    fn slice_mut(&mut self, category: CategoryType) -> &mut Option<CategoryConfig> {
        match category {
            CategoryType::Analytics => &mut self.analytics,
            CategoryType::Api => &mut self.api,
            CategoryType::Auth => &mut self.auth,
            CategoryType::Hub => &mut self.hub,
            CategoryType::Logging => &mut self.logging,
            CategoryType::Storage => &mut self.storage,
        }
    }

    /// Categories that have a slice, in catalog order.
    pub fn categories(&self) -> Vec<CategoryType> {
        CategoryType::ALL
            .into_iter()
            .filter(|c| self.slice(*c).is_some())
            .collect()
    }

    /// Sets (or replaces) the slice for `category`.
    pub fn with_slice(mut self, category: CategoryType, slice: CategoryConfig) -> Self {
        *self.slice_mut(category) = Some(slice);
        self
    }

    /// Valid top-level keys, for diagnostics.
    pub fn valid_keys() -> Vec<&'static str> {
        let mut keys = vec!["environment"];
        keys.extend(CategoryType::ALL.iter().map(|c| c.config_key()));
        keys
    }
}

/// One category's slice: plugin configurations keyed by plugin key.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryConfig {
    #[serde(default)]
    pub plugins: BTreeMap<String, serde_json::Value>,
}

impl CategoryConfig {
    /// The configuration for one plugin key.
    pub fn plugin(&self, key: &str) -> Option<&serde_json::Value> {
        self.plugins.get(key)
    }

    pub fn with_plugin(mut self, key: impl Into<String>, config: serde_json::Value) -> Self {
        self.plugins.insert(key.into(), config);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_has_no_slices() {
        let config = PlinthConfig::default();
        assert_eq!(config.environment, "default");
        assert!(config.categories().is_empty());
        for category in CategoryType::ALL {
            assert!(config.slice(category).is_none());
        }
    }

    #[test]
    fn with_slice_is_visible_through_slice() {
        let config = PlinthConfig::default().with_slice(
            CategoryType::Storage,
            CategoryConfig::default().with_plugin("s3", serde_json::json!({"bucket": "b"})),
        );
        assert_eq!(config.categories(), vec![CategoryType::Storage]);
        let slice = config.slice(CategoryType::Storage).unwrap();
        assert_eq!(slice.plugin("s3").unwrap()["bucket"], "b");
        assert!(slice.plugin("other").is_none());
    }

    #[test]
    fn json_document_deserializes_into_slices() {
        let json = r#"{
            "environment": "staging",
            "api": { "plugins": { "graphql": { "endpoint": "https://example.test/graphql" } } },
            "auth": { "plugins": {} }
        }"#;
        let config: PlinthConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.environment, "staging");
        assert_eq!(config.categories(), vec![CategoryType::Api, CategoryType::Auth]);
        assert!(config.slice(CategoryType::Auth).unwrap().plugins.is_empty());
    }

    #[test]
    fn unknown_category_key_is_rejected() {
        let json = r#"{ "datastore": { "plugins": {} } }"#;
        assert!(serde_json::from_str::<PlinthConfig>(json).is_err());
    }

    #[test]
    fn valid_keys_cover_every_category() {
        let keys = PlinthConfig::valid_keys();
        assert_eq!(keys.len(), 7);
        assert!(keys.contains(&"storage"));
        assert!(keys.contains(&"environment"));
    }
}
