// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turn orchestration: lead resolution, the synchronous phase of a turn,
//! and launching the streaming pipeline.
//!
//! The orchestrator owns a per-lead mutual-exclusion map so that at most
//! one turn streams against a lead at a time. Acquisition is try-lock: a
//! second concurrent turn on the same lead fails fast with `TurnInProgress`
//! rather than blocking the synchronous caller on another turn's model
//! completion.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use leadflow_core::types::{ChatMessage, Lead, LeadId, Sender, TurnRequest};
use leadflow_core::{
    BroadcastAdapter, LeadflowError, ProviderAdapter, StorageAdapter,
};

use crate::turn::TurnRunner;

/// Synchronous result of accepting a turn: the lead the turn runs against.
/// All further updates arrive via the broadcast channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReceipt {
    pub lead_id: String,
}

/// Wires lead resolution, persistence, the model stream, and fan-out
/// together for each inbound user message.
///
/// All collaborators are injected explicitly; the orchestrator holds no
/// process-global state.
pub struct TurnOrchestrator {
    storage: Arc<dyn StorageAdapter + Send + Sync>,
    provider: Arc<dyn ProviderAdapter + Send + Sync>,
    broadcast: Arc<dyn BroadcastAdapter + Send + Sync>,
    /// One lock per lead id; holders are in-flight turns.
    turn_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl TurnOrchestrator {
    pub fn new(
        storage: Arc<dyn StorageAdapter + Send + Sync>,
        provider: Arc<dyn ProviderAdapter + Send + Sync>,
        broadcast: Arc<dyn BroadcastAdapter + Send + Sync>,
    ) -> Self {
        Self {
            storage,
            provider,
            broadcast,
            turn_locks: DashMap::new(),
        }
    }

    /// Accepts one turn: resolves or creates the lead, appends the user
    /// message synchronously, launches the streaming pipeline, and returns
    /// the lead id immediately.
    ///
    /// Everything up to the spawn is the synchronous phase; its failures
    /// (`InvalidLeadId`, `LeadNotFound`, `MissingEmail`, `TurnInProgress`,
    /// storage errors) return to the caller as typed errors with no
    /// broadcast activity. After the spawn, errors travel only through the
    /// broadcast channel.
    pub async fn handle_turn(&self, request: TurnRequest) -> Result<TurnReceipt, LeadflowError> {
        let mut lead = self.resolve_lead(&request).await?;
        let lead_id = lead.id.to_string();

        let lock = self
            .turn_locks
            .entry(lead_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = lock
            .try_lock_owned()
            .map_err(|_| LeadflowError::TurnInProgress(lead_id.clone()))?;

        // The user's own message must land before any model call; failure
        // here aborts the turn.
        let user_message = ChatMessage::now(Sender::User, request.message.clone());
        self.storage
            .append_message(lead.id.as_str(), &user_message)
            .await?;
        lead.chat_history.push(user_message);

        debug!(lead_id = %lead.id, channel = %request.channel_id, "user message persisted");

        let storage = Arc::clone(&self.storage);
        let provider = Arc::clone(&self.provider);
        let broadcast = Arc::clone(&self.broadcast);
        let channel_id = request.channel_id.clone();

        tokio::spawn(async move {
            // The guard lives for the duration of the streaming pipeline.
            let _guard = guard;

            let stream = provider.stream_turn(&lead.chat_history).await;
            let runner = TurnRunner::new(lead, channel_id, storage, broadcast);
            let phase = match stream {
                Ok(stream) => runner.run(stream).await,
                Err(e) => runner.abort(e).await,
            };
            debug!(phase = %phase, "turn pipeline finished");
        });

        Ok(TurnReceipt { lead_id })
    }

    /// Load an existing lead or create a new one from the request identity.
    async fn resolve_lead(&self, request: &TurnRequest) -> Result<Lead, LeadflowError> {
        match &request.lead_id {
            Some(raw_id) => {
                let id = LeadId::parse(raw_id)?;
                self.storage
                    .get_lead(id.as_str())
                    .await?
                    .ok_or_else(|| {
                        warn!(lead_id = raw_id, "turn request for unknown lead");
                        LeadflowError::LeadNotFound(raw_id.clone())
                    })
            }
            None => {
                let email = request
                    .email
                    .as_deref()
                    .map(str::trim)
                    .filter(|e| !e.is_empty())
                    .ok_or(LeadflowError::MissingEmail)?;

                let lead = Lead::new(email.to_string());
                self.storage.create_lead(&lead).await?;
                info!(lead_id = %lead.id, email, "new lead created");
                Ok(lead)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use leadflow_core::types::events;
    use leadflow_test_utils::{CapturingBroadcast, MockTurn, TestHarness};

    fn new_conversation(message: &str, channel: &str) -> TurnRequest {
        TurnRequest {
            lead_id: None,
            email: Some("visitor@example.com".into()),
            message: message.into(),
            channel_id: channel.into(),
        }
    }

    async fn wait_for_terminal(broadcast: &CapturingBroadcast, channel: &str) {
        broadcast
            .wait_for(Duration::from_secs(2), |r| {
                r.channel == channel
                    && (r.payload["done"] == true || r.event == events::TURN_STREAM_ERROR)
            })
            .await
            .expect("turn should reach a terminal event");
    }

    #[tokio::test]
    async fn new_conversation_creates_lead_and_returns_id() {
        let harness = TestHarness::new().await;
        harness
            .provider
            .add_turn(MockTurn::fragments(&["Hello!"]))
            .await;

        let receipt = harness
            .orchestrator
            .handle_turn(new_conversation("hi", "ch-1"))
            .await
            .unwrap();

        // The returned id is a valid identifier referencing the stored lead.
        let lead = harness
            .storage
            .get_lead(&receipt.lead_id)
            .await
            .unwrap()
            .expect("lead should exist");
        assert_eq!(lead.email, "visitor@example.com");
        assert_eq!(lead.qualification, leadflow_core::Qualification::Weak);
        assert_eq!(lead.status, "pending");

        wait_for_terminal(&harness.broadcast, "ch-1").await;
    }

    #[tokio::test]
    async fn user_message_is_persisted_before_returning() {
        let harness = TestHarness::new().await;
        harness
            .provider
            .add_turn(MockTurn::fragments(&["reply"]))
            .await;

        let receipt = harness
            .orchestrator
            .handle_turn(new_conversation("first question", "ch-1"))
            .await
            .unwrap();

        let lead = harness
            .storage
            .get_lead(&receipt.lead_id)
            .await
            .unwrap()
            .unwrap();
        assert!(lead
            .chat_history
            .iter()
            .any(|m| m.sender == Sender::User && m.text == "first question"));

        wait_for_terminal(&harness.broadcast, "ch-1").await;
    }

    #[tokio::test]
    async fn second_call_with_returned_id_continues_the_conversation() {
        let harness = TestHarness::new().await;
        harness
            .provider
            .add_turn(MockTurn::fragments(&["what do you need?"]))
            .await;
        harness
            .provider
            .add_turn(MockTurn::fragments(&["great, book here: link#"]))
            .await;

        let receipt = harness
            .orchestrator
            .handle_turn(new_conversation("hi", "ch-1"))
            .await
            .unwrap();
        wait_for_terminal(&harness.broadcast, "ch-1").await;
        // The lead lock releases when the spawned pipeline task exits,
        // shortly after the terminal event; give it a beat.
        tokio::time::sleep(Duration::from_millis(50)).await;
        harness.broadcast.clear();

        let second = TurnRequest {
            lead_id: Some(receipt.lead_id.clone()),
            email: None,
            message: "an app for my school".into(),
            channel_id: "ch-1".into(),
        };
        let receipt2 = harness.orchestrator.handle_turn(second).await.unwrap();
        assert_eq!(receipt.lead_id, receipt2.lead_id);
        wait_for_terminal(&harness.broadcast, "ch-1").await;

        let lead = harness
            .storage
            .get_lead(&receipt.lead_id)
            .await
            .unwrap()
            .unwrap();
        // Two user messages and two ai replies, in order.
        assert_eq!(lead.chat_history.len(), 4);
        assert_eq!(lead.qualification, leadflow_core::Qualification::Hot);
        assert_eq!(lead.status, "completed");
    }

    #[tokio::test]
    async fn malformed_lead_id_is_rejected_synchronously() {
        let harness = TestHarness::new().await;

        let request = TurnRequest {
            lead_id: Some("definitely-not-a-uuid".into()),
            email: None,
            message: "hi".into(),
            channel_id: "ch-1".into(),
        };
        let err = harness.orchestrator.handle_turn(request).await.unwrap_err();
        assert!(matches!(err, LeadflowError::InvalidLeadId(_)));
        assert_eq!(harness.broadcast.count(), 0);
    }

    #[tokio::test]
    async fn unknown_lead_id_yields_not_found_with_no_side_effects() {
        let harness = TestHarness::new().await;

        let request = TurnRequest {
            lead_id: Some(uuid::Uuid::new_v4().to_string()),
            email: None,
            message: "hi".into(),
            channel_id: "ch-1".into(),
        };
        let err = harness.orchestrator.handle_turn(request).await.unwrap_err();
        assert!(matches!(err, LeadflowError::LeadNotFound(_)));

        // No broadcast activity, no persistence.
        assert_eq!(harness.broadcast.count(), 0);
        let all = harness
            .storage
            .list_leads(&leadflow_core::types::LeadFilter {
                limit: 10,
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(all.is_empty());
    }

    #[tokio::test]
    async fn missing_email_is_rejected_for_new_conversations() {
        let harness = TestHarness::new().await;

        let request = TurnRequest {
            lead_id: None,
            email: Some("   ".into()),
            message: "hi".into(),
            channel_id: "ch-1".into(),
        };
        let err = harness.orchestrator.handle_turn(request).await.unwrap_err();
        assert!(matches!(err, LeadflowError::MissingEmail));
    }

    #[tokio::test]
    async fn concurrent_turn_on_same_lead_is_refused() {
        let harness = TestHarness::new().await;
        // A slow turn that holds the lead lock while streaming.
        harness
            .provider
            .add_turn(MockTurn::fragments(&["thinking..."]).with_delay(Duration::from_millis(300)))
            .await;

        let receipt = harness
            .orchestrator
            .handle_turn(new_conversation("hi", "ch-1"))
            .await
            .unwrap();

        let second = TurnRequest {
            lead_id: Some(receipt.lead_id.clone()),
            email: None,
            message: "are you there?".into(),
            channel_id: "ch-1".into(),
        };
        let err = harness.orchestrator.handle_turn(second).await.unwrap_err();
        assert!(matches!(err, LeadflowError::TurnInProgress(_)));

        wait_for_terminal(&harness.broadcast, "ch-1").await;
    }

    #[tokio::test]
    async fn provider_failure_surfaces_as_stream_error_broadcast() {
        let harness = TestHarness::new().await;
        harness
            .provider
            .add_turn(MockTurn::stream_error("model unavailable"))
            .await;

        // The synchronous phase still succeeds; the failure arrives on the
        // broadcast channel.
        harness
            .orchestrator
            .handle_turn(new_conversation("hi", "ch-err"))
            .await
            .unwrap();

        let event = harness
            .broadcast
            .wait_for(Duration::from_secs(2), |r| {
                r.event == events::TURN_STREAM_ERROR
            })
            .await
            .unwrap();
        assert!(event.payload["detail"]
            .as_str()
            .unwrap()
            .contains("model unavailable"));
    }
}
