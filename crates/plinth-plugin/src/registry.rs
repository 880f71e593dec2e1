// SPDX-FileCopyrightText: 2026 Plinth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Category registry: plugin bindings and the one-shot configure latch.
//!
//! Every mutation goes through a single `std::sync::Mutex`. `configure`
//! claims the latch and seals the categories it is about to configure while
//! holding the lock, then runs plugin `configure` calls with the lock
//! released so a plugin may call back into the registry. A generation counter
//! discards results from a configure run that a `reset` has overtaken.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use plinth_config::PlinthConfig;
use plinth_core::{CategoryPlugin, CategoryType, PlinthError};
use tracing::{debug, info, warn};

use crate::catalog::CategoryCatalog;

/// Plugin keys are compared ignoring ASCII case everywhere a key is matched.
fn same_key(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

/// Configuration progress of one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryStatus {
    /// Accepting plugins.
    Open,
    /// A configure run is applying this category's slice.
    Configuring,
    /// The active plugin accepted its configuration.
    Configured,
    /// The active plugin rejected its configuration.
    Failed,
}

#[derive(Debug)]
struct CategorySlot {
    plugins: Vec<CategoryPlugin>,
    status: CategoryStatus,
}

impl Default for CategorySlot {
    fn default() -> Self {
        Self {
            plugins: Vec::new(),
            status: CategoryStatus::Open,
        }
    }
}

#[derive(Debug, Default)]
struct RegistryState {
    slots: BTreeMap<CategoryType, CategorySlot>,
    configured: bool,
    generation: u64,
}

/// One plugin that rejected its configuration slice.
#[derive(Debug)]
pub struct CategoryFailure {
    pub category: CategoryType,
    pub plugin_key: String,
    pub error: PlinthError,
}

/// Outcome of a winning `configure` call.
#[derive(Debug, Default)]
pub struct ConfigureReport {
    /// `(category, plugin key)` pairs that accepted their configuration.
    pub configured: Vec<(CategoryType, String)>,
    /// Categories with no slice or no registered plugin.
    pub skipped: Vec<CategoryType>,
    pub failures: Vec<CategoryFailure>,
}

impl ConfigureReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Converts the report into a plain result carrying the first failure.
    pub fn into_result(self) -> Result<Vec<(CategoryType, String)>, PlinthError> {
        match self.failures.into_iter().next() {
            Some(failure) => Err(failure.error),
            None => Ok(self.configured),
        }
    }
}

/// Registry of plugins bound to categories.
pub struct CategoryRegistry {
    catalog: CategoryCatalog,
    state: Mutex<RegistryState>,
}

impl CategoryRegistry {
    pub fn new(catalog: CategoryCatalog) -> Self {
        Self {
            catalog,
            state: Mutex::new(RegistryState::default()),
        }
    }

    pub fn catalog(&self) -> &CategoryCatalog {
        &self.catalog
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Binds a plugin to the category it is tagged with.
    ///
    /// Fails with `MismatchedCategory` when the catalog does not support the
    /// plugin's declared category or the tag disagrees with it, and with
    /// `PluginConfiguration` when the category refuses registration, is
    /// already configured, or already holds a plugin with the same key.
    /// The registry is unchanged on failure.
    pub fn add_plugin(&self, plugin: CategoryPlugin) -> Result<(), PlinthError> {
        self.catalog.admit(&plugin)?;

        let category = plugin.target();
        let key = plugin.plugin_key().to_string();
        if key.trim().is_empty() {
            return Err(PlinthError::plugin_configuration(
                category,
                key,
                "plugin key must not be empty",
            ));
        }

        let mut state = self.lock();
        let slot = state.slots.entry(category).or_default();

        if slot.status != CategoryStatus::Open {
            return Err(PlinthError::plugin_configuration(
                category,
                key,
                "category is already configured; call reset() before adding plugins",
            ));
        }

        if slot.plugins.iter().any(|p| same_key(p.plugin_key(), &key)) {
            return Err(PlinthError::plugin_configuration(
                category,
                key,
                "a plugin with this key is already registered",
            ));
        }

        slot.plugins.push(plugin);
        info!(%category, plugin_key = %key, plugins = slot.plugins.len(), "plugin added");
        Ok(())
    }

    /// Removes a binding, returning it. Absent bindings are a no-op.
    pub fn remove_plugin(&self, category: CategoryType, key: &str) -> Option<CategoryPlugin> {
        let mut state = self.lock();
        let slot = state.slots.get_mut(&category)?;
        let index = slot.plugins.iter().position(|p| same_key(p.plugin_key(), key))?;
        let removed = slot.plugins.remove(index);
        info!(%category, plugin_key = %key, "plugin removed");
        Some(removed)
    }

    /// Looks up a plugin. Without a key, returns the first plugin registered
    /// for the category.
    pub fn get_plugin(
        &self,
        category: CategoryType,
        key: Option<&str>,
    ) -> Result<CategoryPlugin, PlinthError> {
        let state = self.lock();
        let plugins = state.slots.get(&category).map(|s| s.plugins.as_slice()).unwrap_or(&[]);
        let found = match key {
            Some(key) => plugins.iter().find(|p| same_key(p.plugin_key(), key)),
            None => plugins.first(),
        };
        found.cloned().ok_or_else(|| PlinthError::NoSuchPlugin {
            category,
            key: key.map(str::to_string),
        })
    }

    /// All plugins of a category, in registration order.
    pub fn plugins(&self, category: CategoryType) -> Vec<CategoryPlugin> {
        self.lock()
            .slots
            .get(&category)
            .map(|s| s.plugins.clone())
            .unwrap_or_default()
    }

    /// All plugins across categories.
    pub fn all_plugins(&self) -> Vec<CategoryPlugin> {
        self.lock()
            .slots
            .values()
            .flat_map(|s| s.plugins.iter().cloned())
            .collect()
    }

    pub fn is_configured(&self) -> bool {
        self.lock().configured
    }

    pub fn is_category_configured(&self, category: CategoryType) -> bool {
        self.status(category) == CategoryStatus::Configured
    }

    pub fn status(&self, category: CategoryType) -> CategoryStatus {
        self.lock()
            .slots
            .get(&category)
            .map(|s| s.status)
            .unwrap_or(CategoryStatus::Open)
    }

    /// Applies a configuration document to the registered plugins.
    ///
    /// Only the first call after construction or `reset` proceeds; every
    /// other call fails with `AlreadyConfigured`. Each category present in
    /// `config` with at least one plugin has its active plugin (the first
    /// registered) configured with that plugin's entry from the slice
    /// (`null` when the slice has none). The other plugins of the category
    /// stay unconfigured. Failures are collected per category and do not
    /// roll back categories that succeeded.
    pub fn configure(&self, config: &PlinthConfig) -> Result<ConfigureReport, PlinthError> {
        let mut report = ConfigureReport::default();
        let mut work = Vec::new();

        let generation = {
            let mut state = self.lock();
            if state.configured {
                debug!("configure rejected: already configured");
                return Err(PlinthError::AlreadyConfigured);
            }
            state.configured = true;

            for category in CategoryType::ALL {
                let Some(slice) = config.slice(category) else {
                    report.skipped.push(category);
                    continue;
                };
                let Some(slot) = state.slots.get_mut(&category) else {
                    debug!(%category, "no plugin registered; slice skipped");
                    report.skipped.push(category);
                    continue;
                };
                let Some(active) = slot.plugins.first().cloned() else {
                    debug!(%category, "no plugin registered; slice skipped");
                    report.skipped.push(category);
                    continue;
                };
                if slot.plugins.len() > 1 {
                    debug!(
                        %category,
                        active = active.plugin_key(),
                        standby = slot.plugins.len() - 1,
                        "configuring active plugin only"
                    );
                }
                slot.status = CategoryStatus::Configuring;
                work.push((category, active, slice.clone()));
            }
            state.generation
        };

        let mut outcomes = Vec::with_capacity(work.len());
        for (category, plugin, slice) in work {
            let key = plugin.plugin_key().to_string();
            let plugin_config = slice
                .plugins
                .iter()
                .find(|(entry, _)| same_key(entry, &key))
                .map(|(_, value)| value.clone())
                .unwrap_or(serde_json::Value::Null);
            let ok = match plugin.configure(&plugin_config) {
                Ok(()) => {
                    info!(%category, plugin_key = %key, "plugin configured");
                    report.configured.push((category, key));
                    true
                }
                Err(error) => {
                    warn!(%category, plugin_key = %key, error = %error, "plugin configuration failed");
                    report.failures.push(CategoryFailure {
                        category,
                        plugin_key: key,
                        error,
                    });
                    false
                }
            };
            outcomes.push((category, ok));
        }

        let mut state = self.lock();
        if state.generation == generation {
            for (category, ok) in outcomes {
                if let Some(slot) = state.slots.get_mut(&category) {
                    slot.status = if ok {
                        CategoryStatus::Configured
                    } else {
                        CategoryStatus::Failed
                    };
                }
            }
        } else {
            debug!("registry reset during configure; statuses discarded");
        }

        info!(
            configured = report.configured.len(),
            skipped = report.skipped.len(),
            failures = report.failures.len(),
            "configure finished"
        );
        Ok(report)
    }

    /// Clears every binding and the configured latch in one step.
    ///
    /// Returns the removed plugins so the caller can shut them down.
    pub fn reset(&self) -> Vec<CategoryPlugin> {
        let mut state = self.lock();
        let generation = state.generation.wrapping_add(1);
        let old = std::mem::take(&mut *state);
        state.generation = generation;
        drop(state);

        let removed: Vec<CategoryPlugin> = old
            .slots
            .into_values()
            .flat_map(|s| s.plugins)
            .collect();
        info!(removed = removed.len(), "registry reset");
        removed
    }
}

impl Default for CategoryRegistry {
    fn default() -> Self {
        Self::new(CategoryCatalog::standard())
    }
}

impl std::fmt::Debug for CategoryRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("CategoryRegistry")
            .field("catalog", &self.catalog)
            .field("configured", &state.configured)
            .field("slots", &state.slots)
            .finish()
    }
}
