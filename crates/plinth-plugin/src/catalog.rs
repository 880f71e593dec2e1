// SPDX-FileCopyrightText: 2026 Plinth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Category catalog.
//!
//! Maps each supported [`CategoryType`] to the handler that decides whether a
//! plugin may be registered under it. A category absent from the catalog is
//! unsupported; registering a plugin for it fails with `MismatchedCategory`.

use std::collections::BTreeMap;
use std::sync::Arc;

use plinth_core::{CategoryPlugin, CategoryType, PlinthError};

/// Registration handler for one category.
pub trait CategoryHandler: Send + Sync {
    /// The category this handler serves.
    fn category(&self) -> CategoryType;

    /// One-line description, used by catalog listings.
    fn description(&self) -> &str;

    /// Whether this handler currently accepts plugins.
    fn accepts_plugins(&self) -> bool {
        true
    }

    /// Checks that `plugin` may be registered under this category.
    fn accept(&self, plugin: &CategoryPlugin) -> Result<(), PlinthError>;
}

/// Handler that accepts any plugin for its category.
#[derive(Debug, Clone)]
pub struct StandardCategory {
    category: CategoryType,
    description: String,
}

impl StandardCategory {
    pub fn new(category: CategoryType) -> Self {
        Self {
            category,
            description: default_description(category).to_string(),
        }
    }

    pub fn with_description(category: CategoryType, description: impl Into<String>) -> Self {
        Self {
            category,
            description: description.into(),
        }
    }
}

impl CategoryHandler for StandardCategory {
    fn category(&self) -> CategoryType {
        self.category
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn accept(&self, _plugin: &CategoryPlugin) -> Result<(), PlinthError> {
        Ok(())
    }
}

/// Handler for a category that is recognized but not open for registration.
#[derive(Debug, Clone)]
pub struct ReservedCategory {
    category: CategoryType,
    reason: String,
}

impl ReservedCategory {
    pub fn new(category: CategoryType, reason: impl Into<String>) -> Self {
        Self {
            category,
            reason: reason.into(),
        }
    }
}

impl CategoryHandler for ReservedCategory {
    fn category(&self) -> CategoryType {
        self.category
    }

    fn description(&self) -> &str {
        &self.reason
    }

    fn accepts_plugins(&self) -> bool {
        false
    }

    fn accept(&self, plugin: &CategoryPlugin) -> Result<(), PlinthError> {
        Err(PlinthError::plugin_configuration(
            self.category,
            plugin.plugin_key(),
            format!("category does not accept plugins: {}", self.reason),
        ))
    }
}

fn default_description(category: CategoryType) -> &'static str {
    match category {
        CategoryType::Analytics => "Usage event recording and batched delivery",
        CategoryType::Api => "GraphQL queries, mutations and live subscriptions",
        CategoryType::Auth => "User sign-in, sign-out and session state",
        CategoryType::Hub => "In-process event publication between categories",
        CategoryType::Logging => "Leveled, namespaced log records",
        CategoryType::Storage => "File upload and removal against object storage",
    }
}

/// Table of category handlers.
#[derive(Clone, Default)]
pub struct CategoryCatalog {
    handlers: BTreeMap<CategoryType, Arc<dyn CategoryHandler>>,
}

impl CategoryCatalog {
    /// An empty catalog: every category is unsupported.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Catalog with a [`StandardCategory`] for all six categories.
    pub fn standard() -> Self {
        CategoryType::ALL
            .into_iter()
            .fold(Self::empty(), |catalog, c| catalog.with(StandardCategory::new(c)))
    }

    /// Adds (or replaces) the handler for its category.
    pub fn with(mut self, handler: impl CategoryHandler + 'static) -> Self {
        self.handlers.insert(handler.category(), Arc::new(handler));
        self
    }

    /// Removes a category, making it unsupported.
    pub fn without(mut self, category: CategoryType) -> Self {
        self.handlers.remove(&category);
        self
    }

    pub fn handler(&self, category: CategoryType) -> Option<&Arc<dyn CategoryHandler>> {
        self.handlers.get(&category)
    }

    pub fn supports(&self, category: CategoryType) -> bool {
        self.handlers.contains_key(&category)
    }

    /// Supported categories, in catalog order.
    pub fn categories(&self) -> Vec<CategoryType> {
        self.handlers.keys().copied().collect()
    }

    /// Runs the registration checks for `plugin`.
    ///
    /// The plugin's declared category must be in the catalog and must equal
    /// the category it is being registered under; then the handler decides.
    pub fn admit(&self, plugin: &CategoryPlugin) -> Result<(), PlinthError> {
        let declared = plugin.declared();
        let target = plugin.target();

        let Some(handler) = self.handler(declared) else {
            return Err(PlinthError::MismatchedCategory {
                key: plugin.plugin_key().to_string(),
                declared,
                target: None,
            });
        };

        if declared != target {
            return Err(PlinthError::MismatchedCategory {
                key: plugin.plugin_key().to_string(),
                declared,
                target: Some(target),
            });
        }

        handler.accept(plugin)
    }
}

impl std::fmt::Debug for CategoryCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.handlers.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_catalog_has_all_categories() {
        let catalog = CategoryCatalog::standard();
        assert_eq!(catalog.categories(), CategoryType::ALL.to_vec());
        for category in CategoryType::ALL {
            let handler = catalog.handler(category).unwrap();
            assert_eq!(handler.category(), category);
            assert!(handler.accepts_plugins());
            assert!(!handler.description().is_empty());
        }
    }

    #[test]
    fn without_makes_category_unsupported() {
        let catalog = CategoryCatalog::standard().without(CategoryType::Analytics);
        assert!(!catalog.supports(CategoryType::Analytics));
        assert_eq!(catalog.categories().len(), 5);
    }

    #[test]
    fn reserved_category_is_listed_but_closed() {
        let catalog = CategoryCatalog::standard()
            .with(ReservedCategory::new(CategoryType::Hub, "hub is provided by the context"));
        let handler = catalog.handler(CategoryType::Hub).unwrap();
        assert!(!handler.accepts_plugins());
        assert_eq!(handler.description(), "hub is provided by the context");
    }

    #[test]
    fn empty_catalog_supports_nothing() {
        let catalog = CategoryCatalog::empty();
        for category in CategoryType::ALL {
            assert!(!catalog.supports(category));
        }
    }
}
