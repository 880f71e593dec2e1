// SPDX-FileCopyrightText: 2026 Plinth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock GraphQL API plugin with scripted responses and subscriptions.

use std::any::Any;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use plinth_core::types::{GraphQlRequest, GraphQlResponse};
use plinth_core::{
    ApiPlugin, CategoryType, Operation, PlinthError, Plugin, Subscription, SubscriptionEmitter,
    SubscriptionId,
};
use serde::Deserialize;
use tracing::debug;

use crate::recorder::ConfigureRecorder;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MockApiSettings {
    pub endpoint: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

/// How a scripted subscription behaves once opened.
#[derive(Debug, Clone)]
pub enum ScriptedSubscription {
    /// The handshake is rejected; no establishment is ever reported.
    HandshakeFailure(String),
    /// Establish, deliver `messages` one per `interval`, then `end`.
    Stream {
        messages: Vec<GraphQlResponse>,
        interval: Duration,
        end: StreamEnd,
    },
}

impl ScriptedSubscription {
    /// Establish, deliver `messages` back to back, then stay open.
    pub fn open(messages: Vec<GraphQlResponse>) -> Self {
        ScriptedSubscription::Stream {
            messages,
            interval: Duration::ZERO,
            end: StreamEnd::Hold,
        }
    }
}

#[derive(Debug, Clone)]
pub enum StreamEnd {
    Complete,
    Fail(String),
    /// Stay open until the caller ends the subscription.
    Hold,
}

/// The mock's "native client": a log of every request sent.
#[derive(Debug, Default)]
pub struct MockGraphQlClient {
    requests: Mutex<Vec<GraphQlRequest>>,
}

impl MockGraphQlClient {
    pub fn requests(&self) -> Vec<GraphQlRequest> {
        lock(&self.requests).clone()
    }

    fn record(&self, request: &GraphQlRequest) {
        lock(&self.requests).push(request.clone());
    }
}

/// A mock GraphQL backend for testing.
///
/// Queries and mutations pop queued responses (echoing the document when
/// the queue is empty); subscriptions pop queued scripts.
#[derive(Debug)]
pub struct MockApiPlugin {
    recorder: ConfigureRecorder<MockApiSettings>,
    client: Arc<MockGraphQlClient>,
    responses: Mutex<VecDeque<Result<GraphQlResponse, String>>>,
    scripts: Mutex<VecDeque<ScriptedSubscription>>,
}

impl MockApiPlugin {
    pub const KEY: &'static str = "mock-api";

    pub fn new() -> Self {
        Self::with_key(Self::KEY)
    }

    pub fn with_key(key: &str) -> Self {
        Self {
            recorder: ConfigureRecorder::new(CategoryType::Api, key),
            client: Arc::new(MockGraphQlClient::default()),
            responses: Mutex::new(VecDeque::new()),
            scripts: Mutex::new(VecDeque::new()),
        }
    }

    pub fn with_response(self, response: GraphQlResponse) -> Self {
        lock(&self.responses).push_back(Ok(response));
        self
    }

    /// Queues a transport failure for the next query or mutation.
    pub fn with_error(self, message: impl Into<String>) -> Self {
        lock(&self.responses).push_back(Err(message.into()));
        self
    }

    pub fn with_subscription(self, script: ScriptedSubscription) -> Self {
        lock(&self.scripts).push_back(script);
        self
    }

    pub fn configure_calls(&self) -> usize {
        self.recorder.calls()
    }

    pub fn client(&self) -> &Arc<MockGraphQlClient> {
        &self.client
    }

    fn execute(&self, request: GraphQlRequest) -> Operation<GraphQlResponse> {
        self.client.record(&request);
        let settings = self.recorder.require();
        let queued = lock(&self.responses).pop_front();
        let echo = request.clone();

        Operation::new(CategoryType::Api, &echo, move |ctx| async move {
            settings?;
            match queued {
                Some(Ok(response)) => Ok(response),
                Some(Err(message)) => Err(ctx.fail(message)),
                None => Ok(GraphQlResponse::data(serde_json::json!({ "echo": request.document }))),
            }
        })
    }
}

impl Default for MockApiPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for MockApiPlugin {
    fn plugin_key(&self) -> &str {
        self.recorder.key()
    }

    fn category(&self) -> CategoryType {
        CategoryType::Api
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn configure(&self, config: &serde_json::Value) -> Result<(), PlinthError> {
        self.recorder.configure(config)
    }

    fn escape_hatch(&self) -> Result<Arc<dyn Any + Send + Sync>, PlinthError> {
        self.recorder.require()?;
        Ok(Arc::clone(&self.client) as Arc<dyn Any + Send + Sync>)
    }
}

impl ApiPlugin for MockApiPlugin {
    fn query(&self, request: GraphQlRequest) -> Operation<GraphQlResponse> {
        self.execute(request)
    }

    fn mutate(&self, request: GraphQlRequest) -> Operation<GraphQlResponse> {
        self.execute(request)
    }

    fn subscribe(&self, request: GraphQlRequest) -> Subscription<GraphQlResponse> {
        self.client.record(&request);
        let (emitter, subscription) = Subscription::channel(CategoryType::Api, &request);
        let script = lock(&self.scripts)
            .pop_front()
            .unwrap_or_else(|| ScriptedSubscription::open(Vec::new()));

        if let Err(err) = self.recorder.require() {
            let _ = emitter.fail(err);
            return subscription;
        }

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(drive(emitter, script));
            }
            Err(_) => {
                let err = PlinthError::Internal("subscriptions need a tokio runtime".into());
                let _ = emitter.fail(err);
            }
        }
        subscription
    }
}

async fn drive(emitter: SubscriptionEmitter<GraphQlResponse>, script: ScriptedSubscription) {
    let token = emitter.cancellation();
    match script {
        ScriptedSubscription::HandshakeFailure(message) => {
            let err = emitter.failure(message);
            let _ = emitter.fail(err);
        }
        ScriptedSubscription::Stream {
            messages,
            interval,
            end,
        } => {
            let id = SubscriptionId(uuid::Uuid::new_v4().to_string());
            if emitter.established(id).is_err() {
                return;
            }
            for message in messages {
                tokio::select! {
                    _ = token.cancelled() => return,
                    _ = tokio::time::sleep(interval) => {}
                }
                if emitter.next(message).is_err() {
                    debug!(operation = %emitter.id(), "mock subscription closed by caller");
                    return;
                }
            }
            match end {
                StreamEnd::Complete => {
                    let _ = emitter.complete();
                }
                StreamEnd::Fail(message) => {
                    let err = emitter.failure(message);
                    let _ = emitter.fail(err);
                }
                StreamEnd::Hold => token.cancelled().await,
            }
        }
    }
}
