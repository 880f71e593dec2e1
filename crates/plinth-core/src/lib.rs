// SPDX-FileCopyrightText: 2026 Plinth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Plinth category framework.
//!
//! This crate provides the Category Type Catalog, the plugin contract every
//! backend implementation satisfies, the shared error type, and the
//! asynchronous operation and subscription protocol that category
//! operations are delivered through.

pub mod error;
pub mod operation;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::PlinthError;
pub use operation::{
    EmitError, Operation, OperationContext, OperationHandle, OperationOutcome, OperationState,
    Subscription, SubscriptionEmitter, SubscriptionEvent, SubscriptionHandle,
    SubscriptionListener, SubscriptionState,
};
pub use types::{CategoryType, HubEvent, HubPayload, OperationId, SubscriptionId, TerminalState};

pub use traits::{
    AnalyticsPlugin, ApiPlugin, AuthPlugin, CategoryPlugin, HubPlugin, HubSubscription,
    LoggingPlugin, Plugin, StoragePlugin, TracingLoggingPlugin, escape_hatch_as,
};
