// SPDX-FileCopyrightText: 2026 Plinth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plinth: a backend-agnostic category framework.
//!
//! Application code talks to six categories of backend functionality
//! (storage, API, auth, analytics, logging and hub) through a [`Plinth`]
//! context. Concrete backends plug in per category, are configured once
//! from a single configuration document, and deliver their work as
//! cancelable operations and subscriptions.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use plinth::{CategoryPlugin, Plinth};
//! use plinth::bus::BusHubPlugin;
//!
//! let plinth = Plinth::new();
//! plinth.add_plugin(CategoryPlugin::Hub(Arc::new(BusHubPlugin::new())))?;
//! plinth.configure_from_str("[hub.plugins.bus]\n")?;
//! # Ok::<(), plinth::PlinthError>(())
//! ```

pub mod context;

pub use context::Plinth;

pub use plinth_bus as bus;
pub use plinth_config as config;
pub use plinth_core::*;
pub use plinth_plugin::{
    CategoryCatalog, CategoryFailure, CategoryHandler, CategoryRegistry, CategoryStatus,
    ConfigureReport, ReservedCategory, StandardCategory,
};
