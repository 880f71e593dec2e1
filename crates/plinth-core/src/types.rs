// SPDX-FileCopyrightText: 2026 Plinth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across the category contracts and the operation protocol.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Identifies a functional domain of backend-agnostic operations.
///
/// The set is fixed at build time; which of these a given context accepts
/// plugins for is decided by its category catalog.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum CategoryType {
    Analytics,
    Api,
    Auth,
    Hub,
    Logging,
    Storage,
}

impl CategoryType {
    /// Every category, in configuration order.
    pub const ALL: [CategoryType; 6] = [
        CategoryType::Analytics,
        CategoryType::Api,
        CategoryType::Auth,
        CategoryType::Hub,
        CategoryType::Logging,
        CategoryType::Storage,
    ];

    /// The key under which this category's slice lives in a configuration document.
    pub fn config_key(self) -> &'static str {
        match self {
            CategoryType::Analytics => "analytics",
            CategoryType::Api => "api",
            CategoryType::Auth => "auth",
            CategoryType::Hub => "hub",
            CategoryType::Logging => "logging",
            CategoryType::Storage => "storage",
        }
    }

    /// Reverse of [`config_key`](Self::config_key).
    pub fn from_config_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.config_key() == key)
    }
}

/// Unique identifier for one operation or subscription invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationId(pub uuid::Uuid);

impl OperationId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for OperationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for OperationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Backend identifier of an open subscription channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub String);

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The terminal state an operation or subscription ended in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TerminalState {
    Completed,
    Failed,
    Canceled,
}

// --- Hub event types ---

/// A system notification published on the Hub category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubEvent {
    pub id: uuid::Uuid,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub payload: HubPayload,
}

impl HubEvent {
    /// Stamp a payload with a fresh id and the current time.
    pub fn new(payload: HubPayload) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            timestamp: chrono::Utc::now(),
            payload,
        }
    }

    /// The category the event concerns, if any.
    pub fn category(&self) -> Option<CategoryType> {
        match &self.payload {
            HubPayload::PluginConfigured { category, .. }
            | HubPayload::ConfigurationFailed { category, .. }
            | HubPayload::SubscriptionEstablished { category, .. }
            | HubPayload::OperationTerminal { category, .. } => Some(*category),
            HubPayload::Custom { .. } => None,
        }
    }
}

/// Payload of a [`HubEvent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HubPayload {
    PluginConfigured {
        category: CategoryType,
        plugin_key: String,
    },
    ConfigurationFailed {
        category: CategoryType,
        plugin_key: Option<String>,
        message: String,
    },
    SubscriptionEstablished {
        category: CategoryType,
        operation: OperationId,
        subscription: SubscriptionId,
    },
    OperationTerminal {
        category: CategoryType,
        operation: OperationId,
        state: TerminalState,
    },
    /// Application-defined event on a named channel.
    Custom {
        channel: String,
        payload: serde_json::Value,
    },
}

// --- Storage types ---

/// Visibility of a stored object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum StorageAccessLevel {
    #[default]
    Public,
    Protected,
    Private,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageUploadFileRequest {
    pub key: String,
    pub local: PathBuf,
    #[serde(default)]
    pub access_level: StorageAccessLevel,
    #[serde(default)]
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageUploadFileResult {
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageRemoveRequest {
    pub key: String,
    #[serde(default)]
    pub access_level: StorageAccessLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageRemoveResult {
    pub key: String,
}

// --- API (GraphQL) types ---

/// A GraphQL document plus variables, optionally targeted at a named API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQlRequest {
    #[serde(default)]
    pub api_name: Option<String>,
    pub document: String,
    #[serde(default)]
    pub variables: BTreeMap<String, serde_json::Value>,
}

impl GraphQlRequest {
    pub fn new(document: impl Into<String>) -> Self {
        Self {
            api_name: None,
            document: document.into(),
            variables: BTreeMap::new(),
        }
    }

    pub fn with_api(mut self, api_name: impl Into<String>) -> Self {
        self.api_name = Some(api_name.into());
        self
    }

    pub fn variable(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.variables.insert(name.into(), value);
        self
    }
}

/// One GraphQL response. Application-level errors travel inside `errors`
/// and never terminate a subscription on their own.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphQlResponse {
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

impl GraphQlResponse {
    pub fn data(data: serde_json::Value) -> Self {
        Self {
            data: Some(data),
            errors: Vec::new(),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQlError {
    pub message: String,
    #[serde(default)]
    pub path: Vec<String>,
}

// --- Auth types ---

#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct SignInRequest {
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
}

impl std::fmt::Debug for SignInRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignInRequest")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub username: String,
    pub signed_in: bool,
}

// --- Analytics types ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    pub name: String,
    #[serde(default)]
    pub properties: BTreeMap<String, serde_json::Value>,
}

impl AnalyticsEvent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: BTreeMap::new(),
        }
    }

    pub fn property(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.properties.insert(name.into(), value);
        self
    }
}

// --- Logging types ---

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub level: LogLevel,
    #[serde(default)]
    pub namespace: Option<String>,
    pub message: String,
}

impl LogRecord {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            namespace: None,
            message: message.into(),
        }
    }
}
