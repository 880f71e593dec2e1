// SPDX-FileCopyrightText: 2026 Plinth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared configure bookkeeping for the mock plugins.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use plinth_core::{CategoryType, PlinthError};
use serde::de::DeserializeOwned;

/// Records configure calls and holds the settings of a mock plugin.
#[derive(Debug)]
pub struct ConfigureRecorder<S> {
    category: CategoryType,
    key: String,
    calls: AtomicUsize,
    settings: OnceLock<Arc<S>>,
    reject: Option<String>,
}

impl<S: DeserializeOwned> ConfigureRecorder<S> {
    pub fn new(category: CategoryType, key: impl Into<String>) -> Self {
        Self {
            category,
            key: key.into(),
            calls: AtomicUsize::new(0),
            settings: OnceLock::new(),
            reject: None,
        }
    }

    /// Makes every configure call fail with `message`.
    pub fn rejecting(mut self, message: impl Into<String>) -> Self {
        self.reject = Some(message.into());
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Parses and stores the settings. `null` is a missing configuration.
    pub fn configure(&self, config: &serde_json::Value) -> Result<(), PlinthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.reject {
            return Err(self.error(message.clone()));
        }
        if config.is_null() {
            return Err(self.error("configuration is missing"));
        }
        let settings = S::deserialize(config).map_err(|e| self.error(e.to_string()))?;
        self.settings
            .set(Arc::new(settings))
            .map_err(|_| self.error("already configured"))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn settings(&self) -> Option<Arc<S>> {
        self.settings.get().cloned()
    }

    /// The settings, or `NotConfigured`.
    pub fn require(&self) -> Result<Arc<S>, PlinthError> {
        self.settings().ok_or_else(|| PlinthError::NotConfigured {
            category: self.category,
            key: self.key.clone(),
        })
    }

    fn error(&self, message: impl Into<String>) -> PlinthError {
        PlinthError::plugin_configuration(self.category, self.key.clone(), message)
    }
}
