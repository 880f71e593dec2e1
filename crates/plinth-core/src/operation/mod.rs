// SPDX-FileCopyrightText: 2026 Plinth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Asynchronous operation protocol shared by every category.
//!
//! One-shot and resumable work is modelled by [`Operation`]; long-lived
//! server-pushed streams by [`Subscription`]. Both guarantee at most one
//! terminal transition per instance, and both serialize state changes with
//! result delivery so a `cancel()` and an in-flight result never both win.

mod subscription;
mod task;

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::warn;

use crate::types::CategoryType;

pub use subscription::{
    EmitError, Subscription, SubscriptionEmitter, SubscriptionEvent, SubscriptionHandle,
    SubscriptionListener, SubscriptionState,
};
pub use task::{Operation, OperationContext, OperationHandle, OperationOutcome, OperationState};

/// Locks a state slot, recovering the data if a previous holder panicked.
///
/// State slots are only mutated by short, non-panicking transitions, so the
/// data behind a poisoned lock is still consistent.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Serializes a request for echoing in failures and events.
///
/// A request that cannot be represented as JSON is echoed as `null`.
pub(crate) fn request_echo<R>(category: CategoryType, request: &R) -> serde_json::Value
where
    R: Serialize + ?Sized,
{
    serde_json::to_value(request).unwrap_or_else(|err| {
        warn!(%category, error = %err, "request cannot be echoed; failures will carry null");
        serde_json::Value::Null
    })
}
