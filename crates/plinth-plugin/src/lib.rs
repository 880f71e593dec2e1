// SPDX-FileCopyrightText: 2026 Plinth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Category catalog and plugin registry.
//!
//! The catalog decides which categories accept plugins; the registry holds
//! the plugins bound to each category and applies a configuration document
//! to them exactly once until reset.

pub mod catalog;
pub mod registry;

pub use catalog::{CategoryCatalog, CategoryHandler, ReservedCategory, StandardCategory};
pub use registry::{CategoryFailure, CategoryRegistry, CategoryStatus, ConfigureReport};
