// SPDX-FileCopyrightText: 2026 Plinth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-shot and resumable operations.
//!
//! Lifecycle: `Created -> Started (<-> Paused) -> {Completed, Failed, Canceled}`.
//! The work runs on the tokio runtime; `start()` only schedules it. The
//! result travels over a oneshot channel whose sender lives in the same
//! lock-protected slot as the state, so the terminal transition and the
//! delivery decision happen atomically.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::{Arc, Mutex, OnceLock};

use futures::FutureExt;
use serde::Serialize;
use strum::Display;
use tokio::sync::{oneshot, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::lock;
use crate::error::PlinthError;
use crate::traits::HubPlugin;
use crate::types::{CategoryType, HubEvent, HubPayload, OperationId, TerminalState};

/// States of an [`Operation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum OperationState {
    /// Built but not yet scheduled.
    Created,
    /// Work is scheduled or running.
    Started,
    /// A resumable operation was paused by its caller.
    Paused,
    Completed,
    Failed,
    Canceled,
}

impl OperationState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OperationState::Completed | OperationState::Failed | OperationState::Canceled
        )
    }
}

/// How an operation ended, as observed by its caller.
#[derive(Debug)]
pub enum OperationOutcome<T> {
    Succeeded(T),
    Failed(PlinthError),
    /// Canceled before a result was delivered. Neither callback fires.
    Canceled,
}

impl<T> OperationOutcome<T> {
    pub fn terminal_state(&self) -> TerminalState {
        match self {
            OperationOutcome::Succeeded(_) => TerminalState::Completed,
            OperationOutcome::Failed(_) => TerminalState::Failed,
            OperationOutcome::Canceled => TerminalState::Canceled,
        }
    }

    /// `None` when canceled, otherwise the delivered result.
    pub fn into_result(self) -> Option<Result<T, PlinthError>> {
        match self {
            OperationOutcome::Succeeded(value) => Some(Ok(value)),
            OperationOutcome::Failed(err) => Some(Err(err)),
            OperationOutcome::Canceled => None,
        }
    }
}

type WorkFuture<T> = Pin<Box<dyn Future<Output = Result<T, PlinthError>> + Send>>;
type Work<T> = Box<dyn FnOnce(OperationContext) -> WorkFuture<T> + Send>;

struct Slot<T> {
    state: OperationState,
    sender: Option<oneshot::Sender<Result<T, PlinthError>>>,
}

struct Inner<T> {
    id: OperationId,
    category: CategoryType,
    request: serde_json::Value,
    resumable: bool,
    token: CancellationToken,
    paused: watch::Sender<bool>,
    hub: OnceLock<Arc<dyn HubPlugin>>,
    slot: Mutex<Slot<T>>,
}

impl<T> Inner<T> {
    fn state(&self) -> OperationState {
        lock(&self.slot).state
    }

    fn invalid(&self, state: OperationState, action: &'static str) -> PlinthError {
        PlinthError::InvalidTransition {
            operation: self.id,
            state: state.to_string(),
            action,
        }
    }

    fn finish(&self, result: Result<T, PlinthError>) {
        let terminal = {
            let mut slot = lock(&self.slot);
            if !matches!(slot.state, OperationState::Started | OperationState::Paused) {
                debug!(operation = %self.id, state = %slot.state, "dropping late operation result");
                return;
            }
            let (state, terminal) = match &result {
                Ok(_) => (OperationState::Completed, TerminalState::Completed),
                Err(_) => (OperationState::Failed, TerminalState::Failed),
            };
            slot.state = state;
            if let Some(sender) = slot.sender.take() {
                // An error here only means the caller stopped listening.
                let _ = sender.send(result);
            }
            terminal
        };
        debug!(operation = %self.id, category = %self.category, state = %terminal, "operation finished");
        self.publish(terminal);
    }

    /// Converts a panic in the work into this operation's failure.
    fn panicked(&self, panic: Box<dyn Any + Send>) -> PlinthError {
        let reason = panic
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        warn!(operation = %self.id, category = %self.category, %reason, "operation work panicked");
        PlinthError::OperationFailed {
            category: self.category,
            operation: self.id,
            request: self.request.clone(),
            message: format!("operation work panicked: {reason}"),
            source: None,
        }
    }

    fn cancel(&self) -> Result<(), PlinthError> {
        {
            let mut slot = lock(&self.slot);
            match slot.state {
                OperationState::Started | OperationState::Paused => {}
                OperationState::Created => return Err(self.invalid(slot.state, "cancel")),
                _ => return Ok(()),
            }
            slot.state = OperationState::Canceled;
            // Dropping the sender is what the caller observes as cancellation.
            slot.sender.take();
        }
        self.token.cancel();
        debug!(operation = %self.id, category = %self.category, "operation canceled");
        self.publish(TerminalState::Canceled);
        Ok(())
    }

    fn pause(&self) -> Result<(), PlinthError> {
        let mut slot = lock(&self.slot);
        match slot.state {
            OperationState::Started if self.resumable => {
                slot.state = OperationState::Paused;
                self.paused.send_replace(true);
                debug!(operation = %self.id, "operation paused");
                Ok(())
            }
            OperationState::Paused => Ok(()),
            state => Err(self.invalid(state, "pause")),
        }
    }

    fn resume(&self) -> Result<(), PlinthError> {
        let mut slot = lock(&self.slot);
        match slot.state {
            OperationState::Paused => {
                slot.state = OperationState::Started;
                self.paused.send_replace(false);
                debug!(operation = %self.id, "operation resumed");
                Ok(())
            }
            state => Err(self.invalid(state, "resume")),
        }
    }

    fn publish(&self, state: TerminalState) {
        if let Some(hub) = self.hub.get() {
            hub.publish(HubEvent::new(HubPayload::OperationTerminal {
                category: self.category,
                operation: self.id,
                state,
            }));
        }
    }
}

/// A trackable, cancelable unit of asynchronous category work.
///
/// Built by a plugin around a work closure; the caller starts it and awaits
/// [`outcome`](Operation::outcome), or hands callbacks to
/// [`spawn_with`](Operation::spawn_with).
pub struct Operation<T> {
    inner: Arc<Inner<T>>,
    work: Mutex<Option<Work<T>>>,
    receiver: oneshot::Receiver<Result<T, PlinthError>>,
}

impl<T: Send + 'static> Operation<T> {
    /// Creates a one-shot operation. A second `start()` is rejected.
    pub fn new<R, F, Fut>(category: CategoryType, request: &R, work: F) -> Self
    where
        R: Serialize + ?Sized,
        F: FnOnce(OperationContext) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, PlinthError>> + Send + 'static,
    {
        Self::build(category, request, false, work)
    }

    /// Creates a resumable operation that supports `pause()`/`resume()` and
    /// treats repeated `start()` calls as no-ops.
    pub fn resumable<R, F, Fut>(category: CategoryType, request: &R, work: F) -> Self
    where
        R: Serialize + ?Sized,
        F: FnOnce(OperationContext) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, PlinthError>> + Send + 'static,
    {
        Self::build(category, request, true, work)
    }

    /// Creates an operation whose result is already known.
    pub fn from_result<R>(category: CategoryType, request: &R, result: Result<T, PlinthError>) -> Self
    where
        R: Serialize + ?Sized,
    {
        Self::new(category, request, move |_| async move { result })
    }

    fn build<R, F, Fut>(category: CategoryType, request: &R, resumable: bool, work: F) -> Self
    where
        R: Serialize + ?Sized,
        F: FnOnce(OperationContext) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, PlinthError>> + Send + 'static,
    {
        let (sender, receiver) = oneshot::channel();
        let (paused, _) = watch::channel(false);
        let inner = Arc::new(Inner {
            id: OperationId::new(),
            category,
            request: super::request_echo(category, request),
            resumable,
            token: CancellationToken::new(),
            paused,
            hub: OnceLock::new(),
            slot: Mutex::new(Slot {
                state: OperationState::Created,
                sender: Some(sender),
            }),
        });
        let work: Work<T> = Box::new(move |ctx| -> WorkFuture<T> { Box::pin(work(ctx)) });
        Self {
            inner,
            work: Mutex::new(Some(work)),
            receiver,
        }
    }

    /// Publishes this operation's terminal transition to `hub`.
    pub fn with_hub(self, hub: Arc<dyn HubPlugin>) -> Self {
        // Only the first hub sticks.
        let _ = self.inner.hub.set(hub);
        self
    }

    pub fn id(&self) -> OperationId {
        self.inner.id
    }

    pub fn category(&self) -> CategoryType {
        self.inner.category
    }

    pub fn state(&self) -> OperationState {
        self.inner.state()
    }

    pub fn is_resumable(&self) -> bool {
        self.inner.resumable
    }

    /// A cloneable control handle for use from other tasks.
    pub fn handle(&self) -> OperationHandle<T> {
        OperationHandle {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Schedules the work and returns immediately.
    ///
    /// Must be called inside a tokio runtime. Work failures are never
    /// returned here; they arrive through [`outcome`](Operation::outcome).
    pub fn start(&self) -> Result<(), PlinthError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
            PlinthError::Internal("operations must be started inside a tokio runtime".into())
        })?;

        let work = {
            let mut slot = lock(&self.inner.slot);
            match slot.state {
                OperationState::Created => {}
                state if self.inner.resumable => {
                    debug!(operation = %self.inner.id, %state, "start ignored for resumable operation");
                    return Ok(());
                }
                state => return Err(self.inner.invalid(state, "start")),
            }
            let work = lock(&self.work).take().ok_or_else(|| {
                PlinthError::Internal(format!("operation {} has no work", self.inner.id))
            })?;
            slot.state = OperationState::Started;
            work
        };

        let ctx = OperationContext {
            id: self.inner.id,
            category: self.inner.category,
            request: self.inner.request.clone(),
            token: self.inner.token.clone(),
            paused: self.inner.paused.subscribe(),
        };
        let inner = Arc::clone(&self.inner);
        debug!(operation = %inner.id, category = %inner.category, "operation started");

        runtime.spawn(async move {
            let token = inner.token.clone();
            let fut = AssertUnwindSafe(async move { work(ctx).await }).catch_unwind();
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    debug!(operation = %inner.id, "operation work released after cancel");
                }
                caught = fut => {
                    let result = caught.unwrap_or_else(|panic| Err(inner.panicked(panic)));
                    inner.finish(result);
                }
            }
        });
        Ok(())
    }

    pub fn cancel(&self) -> Result<(), PlinthError> {
        self.inner.cancel()
    }

    pub fn pause(&self) -> Result<(), PlinthError> {
        self.inner.pause()
    }

    pub fn resume(&self) -> Result<(), PlinthError> {
        self.inner.resume()
    }

    /// Waits for the terminal result, starting the operation if needed.
    pub async fn outcome(self) -> OperationOutcome<T> {
        if self.state() == OperationState::Created
            && let Err(err) = self.start()
        {
            return OperationOutcome::Failed(err);
        }
        match self.receiver.await {
            Ok(Ok(value)) => OperationOutcome::Succeeded(value),
            Ok(Err(err)) => OperationOutcome::Failed(err),
            Err(_) => OperationOutcome::Canceled,
        }
    }

    /// Starts the operation and delivers its result to exactly one of the
    /// callbacks. A canceled operation fires neither.
    pub fn spawn_with<S, F>(self, on_success: S, on_failure: F) -> Result<OperationHandle<T>, PlinthError>
    where
        S: FnOnce(T) + Send + 'static,
        F: FnOnce(PlinthError) + Send + 'static,
    {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
            PlinthError::Internal("operations must be started inside a tokio runtime".into())
        })?;
        if self.state() == OperationState::Created {
            self.start()?;
        }
        let handle = self.handle();
        runtime.spawn(async move {
            match self.outcome().await {
                OperationOutcome::Succeeded(value) => on_success(value),
                OperationOutcome::Failed(err) => on_failure(err),
                OperationOutcome::Canceled => {}
            }
        });
        Ok(handle)
    }
}

impl<T> std::fmt::Debug for Operation<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Operation")
            .field("id", &self.inner.id)
            .field("category", &self.inner.category)
            .field("state", &self.inner.state())
            .field("resumable", &self.inner.resumable)
            .finish()
    }
}

/// Cloneable control over a running [`Operation`].
pub struct OperationHandle<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for OperationHandle<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> OperationHandle<T> {
    pub fn id(&self) -> OperationId {
        self.inner.id
    }

    pub fn category(&self) -> CategoryType {
        self.inner.category
    }

    pub fn request(&self) -> &serde_json::Value {
        &self.inner.request
    }

    pub fn state(&self) -> OperationState {
        self.inner.state()
    }

    /// Cancels from `Started` or `Paused`. A no-op once terminal.
    pub fn cancel(&self) -> Result<(), PlinthError> {
        self.inner.cancel()
    }

    pub fn pause(&self) -> Result<(), PlinthError> {
        self.inner.pause()
    }

    pub fn resume(&self) -> Result<(), PlinthError> {
        self.inner.resume()
    }
}

/// What the work closure sees of its operation.
pub struct OperationContext {
    id: OperationId,
    category: CategoryType,
    request: serde_json::Value,
    token: CancellationToken,
    paused: watch::Receiver<bool>,
}

impl OperationContext {
    pub fn id(&self) -> OperationId {
        self.id
    }

    pub fn category(&self) -> CategoryType {
        self.category
    }

    /// Echo of the request this operation was built from.
    pub fn request(&self) -> &serde_json::Value {
        &self.request
    }

    /// Token cancelled when the caller cancels this operation.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_canceled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Cooperative yield point: waits while the operation is paused and
    /// errors once it has been canceled.
    pub async fn checkpoint(&mut self) -> Result<(), PlinthError> {
        loop {
            if self.token.is_cancelled() {
                return Err(self.fail("canceled"));
            }
            if !*self.paused.borrow_and_update() {
                return Ok(());
            }
            tokio::select! {
                _ = self.token.cancelled() => {}
                changed = self.paused.changed() => {
                    if changed.is_err() {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Builds the failure this operation reports, echoing its request.
    pub fn fail(&self, message: impl Into<String>) -> PlinthError {
        PlinthError::OperationFailed {
            category: self.category,
            operation: self.id,
            request: self.request.clone(),
            message: message.into(),
            source: None,
        }
    }

    pub fn fail_with(
        &self,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> PlinthError {
        PlinthError::OperationFailed {
            category: self.category,
            operation: self.id,
            request: self.request.clone(),
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    struct ReleaseGuard(Arc<AtomicBool>);

    impl Drop for ReleaseGuard {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    fn echo(value: u32) -> Operation<u32> {
        Operation::new(CategoryType::Api, &value, move |_| async move { Ok(value) })
    }

    #[tokio::test]
    async fn one_shot_delivers_success_once() {
        let op = echo(7);
        assert_eq!(op.state(), OperationState::Created);
        op.start().unwrap();
        let handle = op.handle();

        match op.outcome().await {
            OperationOutcome::Succeeded(v) => assert_eq!(v, 7),
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(handle.state(), OperationState::Completed);
    }

    #[tokio::test]
    async fn failure_arrives_through_outcome_not_start() {
        let op: Operation<u32> = Operation::new(CategoryType::Storage, "photo.png", |ctx| async move {
            Err(ctx.fail("bucket missing"))
        });
        assert!(op.start().is_ok());
        let handle = op.handle();

        match op.outcome().await {
            OperationOutcome::Failed(PlinthError::OperationFailed { request, message, .. }) => {
                assert_eq!(request, serde_json::json!("photo.png"));
                assert_eq!(message, "bucket missing");
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(handle.state(), OperationState::Failed);
    }

    #[tokio::test]
    async fn second_start_is_rejected_for_one_shot() {
        let op = echo(1);
        op.start().unwrap();
        let err = op.start().unwrap_err();
        assert!(matches!(err, PlinthError::InvalidTransition { action: "start", .. }));
    }

    #[tokio::test]
    async fn second_start_is_a_no_op_for_resumable() {
        let op: Operation<u32> =
            Operation::resumable(CategoryType::Storage, &(), |_| async { Ok(3) });
        op.start().unwrap();
        op.start().unwrap();
        assert!(matches!(op.outcome().await, OperationOutcome::Succeeded(3)));
    }

    #[tokio::test]
    async fn cancel_releases_work_and_suppresses_result() {
        let released = Arc::new(AtomicBool::new(false));
        let guard_flag = Arc::clone(&released);
        let op: Operation<u32> = Operation::new(CategoryType::Storage, &(), move |_| async move {
            let _guard = ReleaseGuard(guard_flag);
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(1)
        });
        op.start().unwrap();
        tokio::task::yield_now().await;
        op.cancel().unwrap();

        let handle = op.handle();
        assert!(matches!(op.outcome().await, OperationOutcome::Canceled));
        assert_eq!(handle.state(), OperationState::Canceled);

        for _ in 0..50 {
            if released.load(Ordering::SeqCst) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(released.load(Ordering::SeqCst), "work future must be dropped");
    }

    #[tokio::test]
    async fn cancel_after_completion_is_a_no_op() {
        let op = echo(5);
        let handle = op.handle();
        op.start().unwrap();
        while !handle.state().is_terminal() {
            tokio::task::yield_now().await;
        }
        handle.cancel().unwrap();
        assert_eq!(handle.state(), OperationState::Completed);
        assert!(matches!(op.outcome().await, OperationOutcome::Succeeded(5)));
    }

    #[tokio::test]
    async fn cancel_before_start_is_rejected() {
        let op = echo(1);
        assert!(matches!(
            op.cancel(),
            Err(PlinthError::InvalidTransition { action: "cancel", .. })
        ));
        assert_eq!(op.state(), OperationState::Created);
    }

    #[tokio::test]
    async fn pause_holds_work_at_checkpoint_until_resume() {
        let (gate_tx, gate_rx) = oneshot::channel::<()>();
        let op: Operation<u32> =
            Operation::resumable(CategoryType::Storage, &(), move |mut ctx| async move {
                let _ = gate_rx.await;
                ctx.checkpoint().await?;
                Ok(42)
            });
        let handle = op.handle();
        op.start().unwrap();
        handle.pause().unwrap();
        assert_eq!(handle.state(), OperationState::Paused);

        gate_tx.send(()).unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(handle.state(), OperationState::Paused);

        handle.resume().unwrap();
        assert!(matches!(op.outcome().await, OperationOutcome::Succeeded(42)));
    }

    #[tokio::test]
    async fn cancel_while_paused_is_terminal() {
        let op: Operation<u32> =
            Operation::resumable(CategoryType::Storage, &(), |mut ctx| async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                ctx.checkpoint().await?;
                Ok(1)
            });
        op.start().unwrap();
        op.pause().unwrap();
        op.cancel().unwrap();
        assert!(matches!(op.outcome().await, OperationOutcome::Canceled));
    }

    #[tokio::test]
    async fn resume_requires_prior_pause_and_one_shot_cannot_pause() {
        let resumable: Operation<u32> = Operation::resumable(CategoryType::Storage, &(), |_| async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(1)
        });
        resumable.start().unwrap();
        assert!(matches!(
            resumable.resume(),
            Err(PlinthError::InvalidTransition { action: "resume", .. })
        ));

        let one_shot: Operation<u32> = Operation::new(CategoryType::Api, &(), |_| async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(1)
        });
        one_shot.start().unwrap();
        assert!(matches!(
            one_shot.pause(),
            Err(PlinthError::InvalidTransition { action: "pause", .. })
        ));
    }

    #[tokio::test]
    async fn spawn_with_fires_exactly_one_callback() {
        let successes = Arc::new(AtomicUsize::new(0));
        let failures = Arc::new(AtomicUsize::new(0));
        let (done_tx, done_rx) = oneshot::channel();

        let s = Arc::clone(&successes);
        let f = Arc::clone(&failures);
        echo(9)
            .spawn_with(
                move |v| {
                    assert_eq!(v, 9);
                    s.fetch_add(1, Ordering::SeqCst);
                    let _ = done_tx.send(());
                },
                move |_| {
                    f.fetch_add(1, Ordering::SeqCst);
                },
            )
            .unwrap();

        done_rx.await.unwrap();
        assert_eq!(successes.load(Ordering::SeqCst), 1);
        assert_eq!(failures.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn canceled_spawn_with_fires_no_callback() {
        let fired = Arc::new(AtomicUsize::new(0));
        let (a, b) = (Arc::clone(&fired), Arc::clone(&fired));
        let op: Operation<u32> = Operation::new(CategoryType::Api, &(), |_| async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(1)
        });
        let handle = op
            .spawn_with(
                move |_| {
                    a.fetch_add(1, Ordering::SeqCst);
                },
                move |_| {
                    b.fetch_add(1, Ordering::SeqCst);
                },
            )
            .unwrap();
        handle.cancel().unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(handle.state(), OperationState::Canceled);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn cancel_and_completion_never_both_win() {
        for i in 0..200u32 {
            let op = echo(i);
            let handle = op.handle();
            op.start().unwrap();
            let canceler = tokio::spawn({
                let handle = handle.clone();
                async move { handle.cancel() }
            });
            let outcome = op.outcome().await;
            canceler.await.unwrap().unwrap();
            match outcome {
                OperationOutcome::Succeeded(v) => {
                    assert_eq!(v, i);
                    assert_eq!(handle.state(), OperationState::Completed);
                }
                OperationOutcome::Canceled => assert_eq!(handle.state(), OperationState::Canceled),
                OperationOutcome::Failed(err) => panic!("unexpected failure {err}"),
            }
        }
    }

    #[tokio::test]
    async fn panicking_work_is_delivered_as_failure() {
        let op: Operation<u32> = Operation::new(CategoryType::Api, "query { me }", |_| async {
            let missing: Option<u32> = None;
            Ok(missing.expect("plugin bug"))
        });
        let handle = op.handle();

        let outcome = tokio::time::timeout(Duration::from_secs(2), op.outcome())
            .await
            .expect("outcome must resolve");
        match outcome {
            OperationOutcome::Failed(PlinthError::OperationFailed { request, message, .. }) => {
                assert_eq!(request, serde_json::json!("query { me }"));
                assert!(message.contains("plugin bug"));
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(handle.state(), OperationState::Failed);
    }

    #[tokio::test]
    async fn panicking_work_fires_the_failure_callback() {
        let (tx, rx) = oneshot::channel();
        let op: Operation<u32> = Operation::new(CategoryType::Storage, &(), |_| async {
            let code = 7;
            let missing: Option<u32> = None;
            Ok(missing.unwrap_or_else(|| panic!("formatted bug {code}")))
        });
        op.spawn_with(|_| unreachable!("success must not fire"), move |err| {
            let _ = tx.send(err.to_string());
        })
        .unwrap();

        let message = tokio::time::timeout(Duration::from_secs(2), rx)
            .await
            .expect("failure callback must fire")
            .unwrap();
        assert!(message.contains("formatted bug"));
    }

    #[test]
    fn start_outside_runtime_fails_predictably() {
        let op = echo(1);
        assert!(matches!(op.start(), Err(PlinthError::Internal(_))));
        assert_eq!(op.state(), OperationState::Created);
    }
}
