// SPDX-FileCopyrightText: 2026 Plinth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock analytics plugin that buffers events until flushed.

use std::any::Any;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use plinth_core::types::AnalyticsEvent;
use plinth_core::{AnalyticsPlugin, CategoryType, Operation, PlinthError, Plugin};
use serde::Deserialize;

use crate::recorder::ConfigureRecorder;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MockAnalyticsSettings {
    #[serde(default)]
    pub app_id: Option<String>,
    /// Events delivered per flush; the rest stay buffered.
    #[serde(default = "default_batch")]
    pub max_batch: usize,
}

fn default_batch() -> usize {
    100
}

/// The mock's "native client": buffered and delivered events.
#[derive(Debug, Default)]
pub struct MockAnalyticsSink {
    buffered: Mutex<Vec<AnalyticsEvent>>,
    delivered: Mutex<Vec<AnalyticsEvent>>,
}

impl MockAnalyticsSink {
    pub fn buffered(&self) -> Vec<AnalyticsEvent> {
        guard(&self.buffered).clone()
    }

    pub fn delivered(&self) -> Vec<AnalyticsEvent> {
        guard(&self.delivered).clone()
    }
}

fn guard<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A mock analytics backend for testing.
#[derive(Debug)]
pub struct MockAnalyticsPlugin {
    recorder: ConfigureRecorder<MockAnalyticsSettings>,
    sink: Arc<MockAnalyticsSink>,
}

impl MockAnalyticsPlugin {
    pub const KEY: &'static str = "mock-analytics";

    pub fn new() -> Self {
        Self {
            recorder: ConfigureRecorder::new(CategoryType::Analytics, Self::KEY),
            sink: Arc::new(MockAnalyticsSink::default()),
        }
    }

    pub fn sink(&self) -> &Arc<MockAnalyticsSink> {
        &self.sink
    }
}

impl Default for MockAnalyticsPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for MockAnalyticsPlugin {
    fn plugin_key(&self) -> &str {
        self.recorder.key()
    }

    fn category(&self) -> CategoryType {
        CategoryType::Analytics
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn configure(&self, config: &serde_json::Value) -> Result<(), PlinthError> {
        self.recorder.configure(config)
    }

    fn escape_hatch(&self) -> Result<Arc<dyn Any + Send + Sync>, PlinthError> {
        self.recorder.require()?;
        Ok(Arc::clone(&self.sink) as Arc<dyn Any + Send + Sync>)
    }
}

impl AnalyticsPlugin for MockAnalyticsPlugin {
    fn record_event(&self, event: AnalyticsEvent) -> Result<(), PlinthError> {
        self.recorder.require()?;
        guard(&self.sink.buffered).push(event);
        Ok(())
    }

    fn flush(&self) -> Operation<usize> {
        let settings = self.recorder.require();
        let sink = Arc::clone(&self.sink);

        Operation::new(CategoryType::Analytics, &(), move |_| async move {
            let settings = settings?;
            let batch: Vec<AnalyticsEvent> = {
                let mut buffered = guard(&sink.buffered);
                let take = settings.max_batch.min(buffered.len());
                buffered.drain(..take).collect()
            };
            let count = batch.len();
            guard(&sink.delivered).extend(batch);
            Ok(count)
        })
    }
}

#[cfg(test)]
mod tests {
    use plinth_core::OperationOutcome;
    use serde_json::json;

    use super::*;

    #[test]
    fn recording_before_configure_is_rejected() {
        let plugin = MockAnalyticsPlugin::new();
        let err = plugin.record_event(AnalyticsEvent::new("open")).unwrap_err();
        assert!(matches!(err, PlinthError::NotConfigured { .. }));
        assert!(plugin.sink().buffered().is_empty());
    }

    #[tokio::test]
    async fn flush_delivers_at_most_one_batch() {
        let plugin = MockAnalyticsPlugin::new();
        plugin.configure(&json!({"max_batch": 2})).unwrap();
        for name in ["a", "b", "c"] {
            plugin.record_event(AnalyticsEvent::new(name)).unwrap();
        }

        assert!(matches!(plugin.flush().outcome().await, OperationOutcome::Succeeded(2)));
        assert_eq!(plugin.sink().delivered().len(), 2);
        assert_eq!(plugin.sink().buffered()[0].name, "c");

        assert!(matches!(plugin.flush().outcome().await, OperationOutcome::Succeeded(1)));
        assert!(matches!(plugin.flush().outcome().await, OperationOutcome::Succeeded(0)));
    }
}
