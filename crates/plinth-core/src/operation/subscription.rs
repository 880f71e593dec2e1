// SPDX-FileCopyrightText: 2026 Plinth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subscription state machine for long-lived, server-pushed streams.
//!
//! `Connecting -> Established -> Streaming -> {Completed, Failed, Canceled}`.
//!
//! `Established` is the streaming phase before the first message: a channel
//! that closes or breaks before delivering anything moves from there
//! straight to `Completed` or `Failed`. `Failed` is also reachable from
//! `Connecting` (handshake rejected).
//!
//! The plugin drives a [`SubscriptionEmitter`]; the caller consumes the
//! paired [`Subscription`] as a stream of [`SubscriptionEvent`]s. Every
//! emit validates the transition and enqueues the event under the same lock
//! the caller's `cancel()` and `poll_next()` take, which gives per-instance
//! linearizability: nothing is observed after a cancel returns, and after a
//! terminal event every later emit is rejected.

use std::pin::Pin;
use std::sync::{Arc, Mutex, OnceLock};
use std::task::{Context, Poll};

use futures::Stream;
use serde::Serialize;
use strum::Display;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::lock;
use crate::error::PlinthError;
use crate::traits::HubPlugin;
use crate::types::{
    CategoryType, HubEvent, HubPayload, OperationId, SubscriptionId, TerminalState,
};

/// States of a [`Subscription`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum SubscriptionState {
    /// Handshake outstanding.
    Connecting,
    /// Handshake succeeded, no message streamed yet.
    Established,
    /// At least one message streamed.
    Streaming,
    Completed,
    Failed,
    Canceled,
}

impl SubscriptionState {
    pub fn is_terminal(self) -> bool {
        self.terminal().is_some()
    }

    pub fn terminal(self) -> Option<TerminalState> {
        match self {
            SubscriptionState::Completed => Some(TerminalState::Completed),
            SubscriptionState::Failed => Some(TerminalState::Failed),
            SubscriptionState::Canceled => Some(TerminalState::Canceled),
            _ => None,
        }
    }
}

/// One notification delivered to the subscriber, in generation order.
#[derive(Debug)]
pub enum SubscriptionEvent<T> {
    /// Fires exactly once, before any `Next`.
    Established(SubscriptionId),
    /// One message from the backend. Application-level errors inside the
    /// message do not end the subscription.
    Next(T),
    Completed,
    Failed(PlinthError),
}

impl<T> SubscriptionEvent<T> {
    fn name(&self) -> &'static str {
        match self {
            SubscriptionEvent::Established(_) => "established",
            SubscriptionEvent::Next(_) => "next",
            SubscriptionEvent::Completed => "completed",
            SubscriptionEvent::Failed(_) => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SubscriptionEvent::Completed | SubscriptionEvent::Failed(_))
    }
}

/// Why an emitted notification was not delivered.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmitError {
    /// The subscription already reached a terminal state; the event was dropped.
    #[error("subscription {operation} is {state}; {event} dropped")]
    Closed {
        operation: OperationId,
        state: SubscriptionState,
        event: &'static str,
    },

    /// The event is not valid in the current state (e.g. `next` before `established`).
    #[error("subscription {operation} cannot emit {event} while {state}")]
    OutOfOrder {
        operation: OperationId,
        state: SubscriptionState,
        event: &'static str,
    },
}

struct Slot<T> {
    state: SubscriptionState,
    sender: Option<mpsc::UnboundedSender<SubscriptionEvent<T>>>,
    subscription: Option<SubscriptionId>,
}

struct Shared<T> {
    id: OperationId,
    category: CategoryType,
    request: serde_json::Value,
    token: CancellationToken,
    hub: OnceLock<Arc<dyn HubPlugin>>,
    slot: Mutex<Slot<T>>,
}

impl<T> Shared<T> {
    fn state(&self) -> SubscriptionState {
        lock(&self.slot).state
    }

    fn emit(&self, event: SubscriptionEvent<T>) -> Result<(), EmitError> {
        let name = event.name();
        let established = match &event {
            SubscriptionEvent::Established(id) => Some(id.clone()),
            _ => None,
        };

        let to = {
            let mut slot = lock(&self.slot);
            let from = slot.state;
            let to = match (&event, from) {
                (_, state) if state.is_terminal() => {
                    return Err(EmitError::Closed {
                        operation: self.id,
                        state,
                        event: name,
                    });
                }
                (SubscriptionEvent::Established(_), SubscriptionState::Connecting) => {
                    SubscriptionState::Established
                }
                (
                    SubscriptionEvent::Next(_),
                    SubscriptionState::Established | SubscriptionState::Streaming,
                ) => SubscriptionState::Streaming,
                (
                    SubscriptionEvent::Completed,
                    SubscriptionState::Established | SubscriptionState::Streaming,
                ) => SubscriptionState::Completed,
                (SubscriptionEvent::Failed(_), _) => SubscriptionState::Failed,
                (_, state) => {
                    return Err(EmitError::OutOfOrder {
                        operation: self.id,
                        state,
                        event: name,
                    });
                }
            };

            let delivered = slot
                .sender
                .as_ref()
                .is_some_and(|sender| sender.send(event).is_ok());
            if !delivered {
                slot.state = SubscriptionState::Canceled;
                slot.sender = None;
                drop(slot);
                debug!(operation = %self.id, "subscriber gone, canceling subscription");
                self.token.cancel();
                self.publish_terminal(TerminalState::Canceled);
                return Err(EmitError::Closed {
                    operation: self.id,
                    state: SubscriptionState::Canceled,
                    event: name,
                });
            }

            slot.state = to;
            if let Some(id) = &established {
                slot.subscription = Some(id.clone());
            }
            if to.is_terminal() {
                slot.sender = None;
            }
            to
        };

        if let Some(subscription) = established {
            debug!(operation = %self.id, category = %self.category, %subscription, "subscription established");
            if let Some(hub) = self.hub.get() {
                hub.publish(HubEvent::new(HubPayload::SubscriptionEstablished {
                    category: self.category,
                    operation: self.id,
                    subscription,
                }));
            }
        }
        if let Some(terminal) = to.terminal() {
            debug!(operation = %self.id, category = %self.category, state = %terminal, "subscription finished");
            self.token.cancel();
            self.publish_terminal(terminal);
        }
        Ok(())
    }

    fn cancel(&self) -> bool {
        {
            let mut slot = lock(&self.slot);
            if slot.state.is_terminal() {
                return false;
            }
            slot.state = SubscriptionState::Canceled;
            // Buffered notifications go with the sender's channel.
            slot.sender = None;
        }
        self.token.cancel();
        debug!(operation = %self.id, category = %self.category, "subscription canceled");
        self.publish_terminal(TerminalState::Canceled);
        true
    }

    fn complete(&self) -> Result<(), PlinthError> {
        self.emit(SubscriptionEvent::Completed)
            .map_err(|err| PlinthError::InvalidTransition {
                operation: self.id,
                state: match err {
                    EmitError::Closed { state, .. } | EmitError::OutOfOrder { state, .. } => {
                        state.to_string()
                    }
                },
                action: "complete",
            })
    }

    fn failure(&self, message: String) -> PlinthError {
        PlinthError::OperationFailed {
            category: self.category,
            operation: self.id,
            request: self.request.clone(),
            message,
            source: None,
        }
    }

    fn publish_terminal(&self, state: TerminalState) {
        if let Some(hub) = self.hub.get() {
            hub.publish(HubEvent::new(HubPayload::OperationTerminal {
                category: self.category,
                operation: self.id,
                state,
            }));
        }
    }
}

/// Caller side of a live subscription.
///
/// Implements [`Stream`]; the stream ends after the terminal event, or
/// immediately once canceled. Dropping it cancels the subscription.
pub struct Subscription<T> {
    shared: Arc<Shared<T>>,
    receiver: mpsc::UnboundedReceiver<SubscriptionEvent<T>>,
}

// Neither field is structurally pinned.
impl<T> Unpin for Subscription<T> {}

impl<T> Subscription<T> {
    /// Opens a subscription in `Connecting` and returns the plugin-side
    /// emitter together with the caller-side stream.
    pub fn channel<R>(category: CategoryType, request: &R) -> (SubscriptionEmitter<T>, Subscription<T>)
    where
        R: Serialize + ?Sized,
    {
        let (sender, receiver) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            id: OperationId::new(),
            category,
            request: super::request_echo(category, request),
            token: CancellationToken::new(),
            hub: OnceLock::new(),
            slot: Mutex::new(Slot {
                state: SubscriptionState::Connecting,
                sender: Some(sender),
                subscription: None,
            }),
        });
        debug!(operation = %shared.id, %category, "subscription connecting");
        (
            SubscriptionEmitter {
                shared: Arc::clone(&shared),
            },
            Subscription { shared, receiver },
        )
    }

    /// Publishes establishment and the terminal transition to `hub`.
    pub fn with_hub(self, hub: Arc<dyn HubPlugin>) -> Self {
        let _ = self.shared.hub.set(hub);
        self
    }

    pub fn id(&self) -> OperationId {
        self.shared.id
    }

    pub fn category(&self) -> CategoryType {
        self.shared.category
    }

    pub fn state(&self) -> SubscriptionState {
        self.shared.state()
    }

    pub fn handle(&self) -> SubscriptionHandle<T> {
        SubscriptionHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Cancels from any non-terminal state. Returns `false` if already terminal.
    ///
    /// Pending notifications are discarded; no Completed or Failed event follows.
    pub fn cancel(&self) -> bool {
        self.shared.cancel()
    }

    /// Gracefully ends an established subscription from the caller side.
    pub fn complete(&self) -> Result<(), PlinthError> {
        self.shared.complete()
    }

    /// Waits for the next notification. `None` once the stream has ended.
    pub async fn recv(&mut self) -> Option<SubscriptionEvent<T>> {
        std::future::poll_fn(|cx| Pin::new(&mut *self).poll_next(cx)).await
    }

    /// Drives the subscription on the runtime, delivering each notification
    /// to `listener`.
    pub fn spawn_listener<L>(mut self, mut listener: L) -> Result<SubscriptionHandle<T>, PlinthError>
    where
        T: Send + 'static,
        L: SubscriptionListener<T>,
    {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
            PlinthError::Internal("subscriptions must be driven inside a tokio runtime".into())
        })?;
        let handle = self.handle();
        runtime.spawn(async move {
            while let Some(event) = self.recv().await {
                match event {
                    SubscriptionEvent::Established(id) => listener.on_established(id),
                    SubscriptionEvent::Next(item) => listener.on_next(item),
                    SubscriptionEvent::Completed => listener.on_complete(),
                    SubscriptionEvent::Failed(err) => listener.on_failure(err),
                }
            }
        });
        Ok(handle)
    }
}

impl<T> Stream for Subscription<T> {
    type Item = SubscriptionEvent<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let slot = lock(&this.shared.slot);
        if slot.state == SubscriptionState::Canceled {
            return Poll::Ready(None);
        }
        let polled = this.receiver.poll_recv(cx);
        drop(slot);
        polled
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        if self.shared.cancel() {
            debug!(operation = %self.shared.id, "subscription dropped while open");
        }
    }
}

impl<T> std::fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.shared.id)
            .field("category", &self.shared.category)
            .field("state", &self.shared.state())
            .finish()
    }
}

/// Plugin side of a subscription: reports handshake, messages, and the end
/// of the stream.
///
/// Dropping an emitter that has not reached a terminal state fails the
/// subscription, so a crashed transport never leaves a caller waiting.
pub struct SubscriptionEmitter<T> {
    shared: Arc<Shared<T>>,
}

impl<T> SubscriptionEmitter<T> {
    pub fn id(&self) -> OperationId {
        self.shared.id
    }

    pub fn category(&self) -> CategoryType {
        self.shared.category
    }

    pub fn request(&self) -> &serde_json::Value {
        &self.shared.request
    }

    pub fn state(&self) -> SubscriptionState {
        self.shared.state()
    }

    /// Cancelled once the subscription is terminal for any reason; transports
    /// select on it to release their channel.
    pub fn cancellation(&self) -> CancellationToken {
        self.shared.token.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.shared.state().is_terminal()
    }

    pub fn established(&self, subscription: SubscriptionId) -> Result<(), EmitError> {
        self.shared.emit(SubscriptionEvent::Established(subscription))
    }

    pub fn next(&self, item: T) -> Result<(), EmitError> {
        self.shared.emit(SubscriptionEvent::Next(item))
    }

    pub fn complete(&self) -> Result<(), EmitError> {
        self.shared.emit(SubscriptionEvent::Completed)
    }

    pub fn fail(&self, error: PlinthError) -> Result<(), EmitError> {
        self.shared.emit(SubscriptionEvent::Failed(error))
    }

    /// Builds a transport failure for this subscription, echoing its request.
    pub fn failure(&self, message: impl Into<String>) -> PlinthError {
        self.shared.failure(message.into())
    }
}

impl<T> Drop for SubscriptionEmitter<T> {
    fn drop(&mut self) {
        if !self.shared.state().is_terminal() {
            let err = self
                .shared
                .failure("subscription transport closed without a terminal event".into());
            if self.shared.emit(SubscriptionEvent::Failed(err)).is_ok() {
                warn!(operation = %self.shared.id, "subscription emitter dropped while open");
            }
        }
    }
}

/// Cloneable caller-side control over a [`Subscription`].
pub struct SubscriptionHandle<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for SubscriptionHandle<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> SubscriptionHandle<T> {
    pub fn id(&self) -> OperationId {
        self.shared.id
    }

    pub fn state(&self) -> SubscriptionState {
        self.shared.state()
    }

    /// The backend channel id, once established.
    pub fn subscription_id(&self) -> Option<SubscriptionId> {
        lock(&self.shared.slot).subscription.clone()
    }

    pub fn cancel(&self) -> bool {
        self.shared.cancel()
    }

    pub fn complete(&self) -> Result<(), PlinthError> {
        self.shared.complete()
    }
}

/// Callback-style consumer for [`Subscription::spawn_listener`].
pub trait SubscriptionListener<T>: Send + 'static {
    fn on_established(&mut self, _subscription: SubscriptionId) {}

    fn on_next(&mut self, item: T);

    fn on_failure(&mut self, _error: PlinthError) {}

    fn on_complete(&mut self) {}
}
