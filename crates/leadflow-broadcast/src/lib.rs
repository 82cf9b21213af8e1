// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process realtime fan-out hub implementing [`BroadcastAdapter`].
//!
//! Each conversation gets a caller-named channel; subscribers (WebSocket
//! connections in the gateway) hold a `broadcast::Receiver` for that
//! channel. Publishing is fire-and-forget: a channel with no subscribers
//! drops the event, a slow subscriber observes `Lagged` on its receiver,
//! and neither condition ever raises back into the turn state machine.

use async_trait::async_trait;
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

use leadflow_core::{
    AdapterType, BroadcastAdapter, HealthStatus, LeadflowError, PluginAdapter,
};

/// One event as delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishedEvent {
    /// Event name (`turn_chunk`, `turn_stream_error`).
    pub event: String,
    /// Event payload.
    pub data: serde_json::Value,
}

/// In-process broadcast hub keyed by caller-supplied channel names.
///
/// Channel entries are created lazily from either the publishing or the
/// subscribing side. Senders are kept for the process lifetime; a channel
/// with no live receivers simply drops published events.
pub struct BroadcastHub {
    channels: DashMap<String, broadcast::Sender<PublishedEvent>>,
    capacity: usize,
}

impl BroadcastHub {
    /// Create a hub whose per-channel buffers hold `capacity` events.
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Subscribe to a channel, creating it if it does not exist yet.
    pub fn subscribe(&self, channel: &str) -> broadcast::Receiver<PublishedEvent> {
        self.sender(channel).subscribe()
    }

    /// Number of live subscribers on a channel.
    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.channels
            .get(channel)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }

    fn sender(&self, channel: &str) -> broadcast::Sender<PublishedEvent> {
        self.channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl PluginAdapter for BroadcastHub {
    fn name(&self) -> &str {
        "hub"
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
        // Dropping the senders disconnects every subscriber.
        self.channels.clear();
        Ok(())
    }
}

#[async_trait]
impl BroadcastAdapter for BroadcastHub {
    async fn publish(
        &self,
        channel: &str,
        event: &str,
        payload: serde_json::Value,
    ) -> Result<(), LeadflowError> {
        let sender = self.sender(channel);
        let published = PublishedEvent {
            event: event.to_string(),
            data: payload,
        };
        match sender.send(published) {
            Ok(receivers) => {
                debug!(channel, event, receivers, "event published");
            }
            Err(_) => {
                // No subscribers; the event is dropped per the best-effort contract.
                debug!(channel, event, "no subscribers on channel");
            }
        }
        Ok(())
    }
}
