// SPDX-FileCopyrightText: 2026 Plinth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Plinth integration tests.
//!
//! Provides mock category plugins and a harness for fast, deterministic
//! tests without real backends.
//!
//! # Components
//!
//! - [`MockStoragePlugin`] - In-memory object store with resumable chunked uploads
//! - [`MockApiPlugin`] - Queued GraphQL responses and scripted subscriptions
//! - [`MockAuthPlugin`] - Fixed user table with session tracking
//! - [`MockAnalyticsPlugin`] - Buffered events delivered on flush
//! - [`TestHarness`] - A configured context wired to all of the above

pub mod harness;
pub mod mock_analytics;
pub mod mock_api;
pub mod mock_auth;
pub mod mock_storage;
pub mod recorder;

pub use harness::{DEFAULT_CONFIG, TestHarness, TestHarnessBuilder};
pub use mock_analytics::{MockAnalyticsPlugin, MockAnalyticsSettings, MockAnalyticsSink};
pub use mock_api::{MockApiPlugin, MockApiSettings, MockGraphQlClient, ScriptedSubscription, StreamEnd};
pub use mock_auth::{MockAuthPlugin, MockAuthSettings};
pub use mock_storage::{MockObjectStore, MockStoragePlugin, MockStorageSettings};
pub use recorder::ConfigureRecorder;
