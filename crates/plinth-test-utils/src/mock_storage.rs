// SPDX-FileCopyrightText: 2026 Plinth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock storage plugin backed by an in-memory object map.
//!
//! Uploads are resumable operations that move through a configurable number
//! of chunks, checkpointing between them so tests can pause, resume and
//! cancel mid-transfer.

use std::any::Any;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use plinth_core::types::{
    StorageRemoveRequest, StorageRemoveResult, StorageUploadFileRequest, StorageUploadFileResult,
};
use plinth_core::{CategoryType, Operation, PlinthError, Plugin, StoragePlugin};
use serde::Deserialize;
use tracing::debug;

use crate::recorder::ConfigureRecorder;

/// Settings accepted by [`MockStoragePlugin`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MockStorageSettings {
    pub bucket: String,
    #[serde(default)]
    pub region: Option<String>,
}

/// The mock's "native client": the objects it holds.
#[derive(Debug, Default)]
pub struct MockObjectStore {
    objects: Mutex<BTreeMap<String, PathBuf>>,
}

impl MockObjectStore {
    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, PathBuf>> {
        self.objects.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A mock storage backend for testing.
#[derive(Debug)]
pub struct MockStoragePlugin {
    recorder: ConfigureRecorder<MockStorageSettings>,
    store: Arc<MockObjectStore>,
    chunks: usize,
    chunk_delay: Duration,
    failing_keys: Vec<String>,
    shut_down: AtomicBool,
}

impl MockStoragePlugin {
    pub const KEY: &'static str = "mock-storage";

    pub fn new() -> Self {
        Self::with_key(Self::KEY)
    }

    pub fn with_key(key: &str) -> Self {
        Self {
            recorder: ConfigureRecorder::new(CategoryType::Storage, key),
            store: Arc::new(MockObjectStore::default()),
            chunks: 1,
            chunk_delay: Duration::ZERO,
            failing_keys: Vec::new(),
            shut_down: AtomicBool::new(false),
        }
    }

    /// Splits every upload into `chunks` steps of `delay` each.
    pub fn with_transfer(mut self, chunks: usize, delay: Duration) -> Self {
        self.chunks = chunks;
        self.chunk_delay = delay;
        self
    }

    /// Uploads to `key` fail after transferring.
    pub fn failing_on(mut self, key: impl Into<String>) -> Self {
        self.failing_keys.push(key.into());
        self
    }

    /// Every configure call is rejected.
    pub fn rejecting_configuration(mut self, message: &str) -> Self {
        self.recorder = self.recorder.rejecting(message);
        self
    }

    pub fn configure_calls(&self) -> usize {
        self.recorder.calls()
    }

    pub fn settings(&self) -> Option<Arc<MockStorageSettings>> {
        self.recorder.settings()
    }

    pub fn store(&self) -> &Arc<MockObjectStore> {
        &self.store
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }
}

impl Default for MockStoragePlugin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Plugin for MockStoragePlugin {
    fn plugin_key(&self) -> &str {
        self.recorder.key()
    }

    fn category(&self) -> CategoryType {
        CategoryType::Storage
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn configure(&self, config: &serde_json::Value) -> Result<(), PlinthError> {
        self.recorder.configure(config)
    }

    fn escape_hatch(&self) -> Result<Arc<dyn Any + Send + Sync>, PlinthError> {
        self.recorder.require()?;
        Ok(Arc::clone(&self.store) as Arc<dyn Any + Send + Sync>)
    }

    async fn shutdown(&self) -> Result<(), PlinthError> {
        self.store.lock().clear();
        self.shut_down.store(true, Ordering::SeqCst);
        Ok(())
    }
}

impl StoragePlugin for MockStoragePlugin {
    fn upload_file(&self, request: StorageUploadFileRequest) -> Operation<StorageUploadFileResult> {
        let settings = self.recorder.require();
        let store = Arc::clone(&self.store);
        let chunks = self.chunks;
        let delay = self.chunk_delay;
        let fail = self.failing_keys.contains(&request.key);
        let echo = request.clone();

        Operation::resumable(CategoryType::Storage, &echo, move |mut ctx| async move {
            let settings = settings?;
            for chunk in 0..chunks {
                ctx.checkpoint().await?;
                tokio::time::sleep(delay).await;
                debug!(key = %request.key, chunk, bucket = %settings.bucket, "mock chunk uploaded");
            }
            ctx.checkpoint().await?;
            if fail {
                return Err(ctx.fail("simulated upload failure"));
            }
            store.lock().insert(request.key.clone(), request.local.clone());
            Ok(StorageUploadFileResult { key: request.key })
        })
    }

    fn remove(&self, request: StorageRemoveRequest) -> Operation<StorageRemoveResult> {
        let settings = self.recorder.require();
        let store = Arc::clone(&self.store);
        let echo = request.clone();

        Operation::new(CategoryType::Storage, &echo, move |ctx| async move {
            settings?;
            match store.lock().remove(&request.key) {
                Some(_) => Ok(StorageRemoveResult { key: request.key }),
                None => Err(ctx.fail(format!("no object stored under `{}`", request.key))),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use plinth_core::OperationOutcome;
    use plinth_core::types::StorageAccessLevel;
    use serde_json::json;

    use super::*;

    fn configured(plugin: MockStoragePlugin) -> MockStoragePlugin {
        plugin.configure(&json!({"bucket": "b"})).unwrap();
        plugin
    }

    fn upload(key: &str) -> StorageUploadFileRequest {
        StorageUploadFileRequest {
            key: key.into(),
            local: PathBuf::from("/tmp/photo.png"),
            access_level: StorageAccessLevel::default(),
            content_type: None,
        }
    }

    #[tokio::test]
    async fn upload_stores_the_object() {
        let plugin = configured(MockStoragePlugin::new().with_transfer(3, Duration::ZERO));
        let outcome = plugin.upload_file(upload("photo.png")).outcome().await;

        assert!(matches!(outcome, OperationOutcome::Succeeded(ref r) if r.key == "photo.png"));
        assert!(plugin.store().contains("photo.png"));
    }

    #[tokio::test]
    async fn unconfigured_upload_fails() {
        let plugin = MockStoragePlugin::new();
        let outcome = plugin.upload_file(upload("photo.png")).outcome().await;
        assert!(matches!(outcome, OperationOutcome::Failed(PlinthError::NotConfigured { .. })));
        assert!(plugin.escape_hatch().is_err());
    }

    #[tokio::test]
    async fn failing_key_reports_failure_and_stores_nothing() {
        let plugin = configured(MockStoragePlugin::new().failing_on("bad.png"));
        let outcome = plugin.upload_file(upload("bad.png")).outcome().await;

        let OperationOutcome::Failed(err) = outcome else {
            panic!("expected failure");
        };
        assert!(err.to_string().contains("simulated upload failure"));
        assert!(!plugin.store().contains("bad.png"));
    }

    #[tokio::test]
    async fn remove_missing_object_fails() {
        let plugin = configured(MockStoragePlugin::new());
        let request = StorageRemoveRequest {
            key: "ghost".into(),
            access_level: StorageAccessLevel::default(),
        };
        assert!(matches!(plugin.remove(request).outcome().await, OperationOutcome::Failed(_)));
    }

    #[test]
    fn escape_hatch_is_the_object_store() {
        let plugin = configured(MockStoragePlugin::with_key("photos"));
        assert_eq!(plugin.plugin_key(), "photos");
        let store = plinth_core::escape_hatch_as::<MockObjectStore, _>(&plugin).unwrap();
        assert!(Arc::ptr_eq(&store, plugin.store()));
    }
}
