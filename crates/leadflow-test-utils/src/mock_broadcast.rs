// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock broadcast adapters for deterministic testing.
//!
//! `CapturingBroadcast` records every publish for assertion; the turn
//! pipeline runs detached from its caller, so tests poll the captured
//! events via `wait_for`. `FailingBroadcast` always errors, for verifying
//! the fire-and-forget publish contract.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use leadflow_core::types::{AdapterType, HealthStatus};
use leadflow_core::{BroadcastAdapter, LeadflowError, PluginAdapter};

/// One captured publish.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedRecord {
    pub channel: String,
    pub event: String,
    pub payload: serde_json::Value,
}

/// A broadcast adapter that records every publish.
#[derive(Default)]
pub struct CapturingBroadcast {
    records: Mutex<Vec<PublishedRecord>>,
}

impl CapturingBroadcast {
    pub fn new() -> Self {
        Self::default()
    }

    /// All publishes so far, in publish order.
    pub fn published(&self) -> Vec<PublishedRecord> {
        self.records.lock().expect("records lock poisoned").clone()
    }

    /// Number of publishes so far.
    pub fn count(&self) -> usize {
        self.records.lock().expect("records lock poisoned").len()
    }

    /// Drop all captured records.
    pub fn clear(&self) {
        self.records.lock().expect("records lock poisoned").clear();
    }

    /// Polls until a record matching the predicate is captured, or returns
    /// `None` on timeout.
    pub async fn wait_for(
        &self,
        timeout: Duration,
        pred: impl Fn(&PublishedRecord) -> bool,
    ) -> Option<PublishedRecord> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Some(record) = self.published().into_iter().find(&pred) {
                return Some(record);
            }
            if tokio::time::Instant::now() >= deadline {
                return None;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

#[async_trait]
impl PluginAdapter for CapturingBroadcast {
    fn name(&self) -> &str {
        "mock-broadcast"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Broadcast
    }

    async fn health_check(&self) -> Result<HealthStatus, LeadflowError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), LeadflowError> {
        Ok(())
    }
}

#[async_trait]
impl BroadcastAdapter for CapturingBroadcast {
    async fn publish(
        &self,
        channel: &str,
        event: &str,
        payload: serde_json::Value,
    ) -> Result<(), LeadflowError> {
        self.records
            .lock()
            .expect("records lock poisoned")
            .push(PublishedRecord {
                channel: channel.to_string(),
                event: event.to_string(),
                payload,
            });
        Ok(())
    }
}

/// A broadcast adapter whose every publish fails.
#[derive(Default)]
pub struct FailingBroadcast;

impl FailingBroadcast {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PluginAdapter for FailingBroadcast {
    fn name(&self) -> &str {
        "failing-broadcast"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Broadcast
    }

    async fn health_check(&self) -> Result<HealthStatus, LeadflowError> {
        Ok(HealthStatus::Unhealthy("always fails".into()))
    }

    async fn shutdown(&self) -> Result<(), LeadflowError> {
        Ok(())
    }
}

#[async_trait]
impl BroadcastAdapter for FailingBroadcast {
    async fn publish(
        &self,
        _channel: &str,
        _event: &str,
        _payload: serde_json::Value,
    ) -> Result<(), LeadflowError> {
        Err(LeadflowError::Broadcast {
            message: "transport unavailable".into(),
            source: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn capturing_broadcast_records_in_order() {
        let broadcast = CapturingBroadcast::new();
        broadcast
            .publish("ch", "turn_chunk", serde_json::json!({"chunk": "a"}))
            .await
            .unwrap();
        broadcast
            .publish("ch", "turn_chunk", serde_json::json!({"chunk": "b"}))
            .await
            .unwrap();

        let records = broadcast.published();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].payload["chunk"], "a");
        assert_eq!(records[1].payload["chunk"], "b");
    }

    #[tokio::test]
    async fn wait_for_finds_later_publishes() {
        let broadcast = std::sync::Arc::new(CapturingBroadcast::new());
        let publisher = std::sync::Arc::clone(&broadcast);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            publisher
                .publish("ch", "turn_chunk", serde_json::json!({"done": true}))
                .await
                .unwrap();
        });

        let found = broadcast
            .wait_for(Duration::from_secs(2), |r| r.payload["done"] == true)
            .await;
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn wait_for_times_out_when_nothing_matches() {
        let broadcast = CapturingBroadcast::new();
        let found = broadcast
            .wait_for(Duration::from_millis(50), |_| true)
            .await;
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn failing_broadcast_always_errors() {
        let broadcast = FailingBroadcast::new();
        let result = broadcast
            .publish("ch", "turn_chunk", serde_json::json!({}))
            .await;
        assert!(result.is_err());
    }
}
