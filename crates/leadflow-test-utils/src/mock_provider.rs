// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock token-stream provider for deterministic testing.
//!
//! `MockProvider` implements `ProviderAdapter` with pre-scripted fragment
//! sequences, enabling fast, CI-runnable tests without external API calls.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::{stream, StreamExt};
use tokio::sync::Mutex;

use leadflow_core::types::{AdapterType, ChatMessage, HealthStatus};
use leadflow_core::{
    LeadflowError, PluginAdapter, ProviderAdapter, TokenFragment, TokenStream,
};

/// One scripted turn: the fragments to stream and optional failure modes.
#[derive(Debug, Clone, Default)]
pub struct MockTurn {
    pub fragments: Vec<String>,
    /// When set, the stream yields this error after the fragments.
    pub trailing_error: Option<String>,
    /// When set, each item is delayed by this duration.
    pub delay: Option<Duration>,
}

impl MockTurn {
    /// A turn that streams the given fragments and ends normally.
    pub fn fragments(fragments: &[&str]) -> Self {
        Self {
            fragments: fragments.iter().map(|f| f.to_string()).collect(),
            ..Default::default()
        }
    }

    /// A turn whose stream fails immediately with the given message.
    pub fn stream_error(message: &str) -> Self {
        Self {
            trailing_error: Some(message.to_string()),
            ..Default::default()
        }
    }

    /// Adds a trailing stream error after the fragments.
    pub fn with_error(mut self, message: &str) -> Self {
        self.trailing_error = Some(message.to_string());
        self
    }

    /// Delays each streamed item, to keep a turn in flight during a test.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// A mock provider that streams pre-scripted turns.
///
/// Turns are popped from a FIFO queue. When the queue is empty, a default
/// single-fragment "mock reply" turn is streamed.
pub struct MockProvider {
    turns: Arc<Mutex<VecDeque<MockTurn>>>,
}

impl MockProvider {
    /// Create a new mock provider with an empty turn queue.
    pub fn new() -> Self {
        Self {
            turns: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    /// Create a mock provider pre-loaded with the given turns.
    pub fn with_turns(turns: Vec<MockTurn>) -> Self {
        Self {
            turns: Arc::new(Mutex::new(VecDeque::from(turns))),
        }
    }

    /// Add a turn to the end of the queue.
    pub async fn add_turn(&self, turn: MockTurn) {
        self.turns.lock().await.push_back(turn);
    }

    /// Pop the next turn, or return the default.
    async fn next_turn(&self) -> MockTurn {
        self.turns
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| MockTurn::fragments(&["mock reply"]))
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockProvider {
    fn name(&self) -> &str {
        "mock-provider"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, LeadflowError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), LeadflowError> {
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for MockProvider {
    async fn stream_turn(
        &self,
        _history: &[ChatMessage],
    ) -> Result<TokenStream, LeadflowError> {
        let turn = self.next_turn().await;

        let mut items: Vec<Result<TokenFragment, LeadflowError>> = turn
            .fragments
            .iter()
            .map(|f| Ok(TokenFragment { text: f.clone() }))
            .collect();
        if let Some(message) = turn.trailing_error {
            items.push(Err(LeadflowError::Provider {
                message,
                source: None,
            }));
        }

        let delay = turn.delay;
        let paced = stream::iter(items).then(move |item| async move {
            if let Some(d) = delay {
                tokio::time::sleep(d).await;
            }
            item
        });

        Ok(Box::pin(paced))
    }
}
