// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-turn state machine driving one token stream to completion.
//!
//! Each turn moves through: AwaitingStream -> Streaming -> Finalizing ->
//! Done, or ends in Failed on a stream-level error. The runner consumes
//! itself, so a turn structurally cannot emit more than one terminal event:
//! subscribers may rely on exactly one `done:true` (or one stream-error
//! event) per turn to clear their "generating" indicator.
//!
//! Persistence is batched: nothing is written while streaming; the single
//! whole-document save happens at finalize. A finalize save failure keeps
//! the in-memory mutation, still publishes the terminal event, and reports
//! the failure on its `error` field -- broadcast completion is favored over
//! strict consistency there.

use std::sync::Arc;

use futures::StreamExt;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use leadflow_core::types::{
    events, ChatMessage, Lead, Sender, TurnChunkEvent, TurnStreamErrorEvent,
    STATUS_COMPLETED,
};
use leadflow_core::{
    BroadcastAdapter, LeadflowError, Qualification, StorageAdapter, TokenStream, TurnOutcome,
};

use crate::accumulator::TurnAccumulator;
use crate::demux::split_marker;

/// States in the turn FSM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    /// Stream opened, no fragment received yet.
    AwaitingStream,
    /// Fragments flowing; chunks broadcast, nothing persisted.
    Streaming,
    /// Stream ended; committing the turn.
    Finalizing,
    /// Terminal: turn committed and completion event published.
    Done,
    /// Terminal: the token stream errored; nothing was committed.
    Failed,
}

impl std::fmt::Display for TurnPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TurnPhase::AwaitingStream => write!(f, "awaiting_stream"),
            TurnPhase::Streaming => write!(f, "streaming"),
            TurnPhase::Finalizing => write!(f, "finalizing"),
            TurnPhase::Done => write!(f, "done"),
            TurnPhase::Failed => write!(f, "failed"),
        }
    }
}

/// Drives one turn's token stream through demultiplexing, accumulation,
/// fan-out, and the single finalize-time commit.
pub struct TurnRunner {
    lead: Lead,
    channel_id: String,
    storage: Arc<dyn StorageAdapter + Send + Sync>,
    broadcast: Arc<dyn BroadcastAdapter + Send + Sync>,
    phase: TurnPhase,
}

impl TurnRunner {
    pub fn new(
        lead: Lead,
        channel_id: String,
        storage: Arc<dyn StorageAdapter + Send + Sync>,
        broadcast: Arc<dyn BroadcastAdapter + Send + Sync>,
    ) -> Self {
        Self {
            lead,
            channel_id,
            storage,
            broadcast,
            phase: TurnPhase::AwaitingStream,
        }
    }

    /// Consumes the stream to completion and returns the terminal phase.
    pub async fn run(mut self, mut stream: TokenStream) -> TurnPhase {
        let mut accumulator = TurnAccumulator::new();
        let mut outcome = TurnOutcome::None;

        while let Some(item) = stream.next().await {
            match item {
                Ok(fragment) => {
                    if self.phase == TurnPhase::AwaitingStream {
                        self.phase = TurnPhase::Streaming;
                    }

                    let (visible, detected) = split_marker(&fragment.text);
                    if detected != TurnOutcome::None {
                        // Last marker observed wins if several ever appear.
                        outcome = detected;
                        debug!(
                            lead_id = %self.lead.id,
                            outcome = ?detected,
                            "qualification marker detected"
                        );
                    }

                    // Suppress empty leftovers (e.g. a fragment that was only
                    // the marker) while still keeping the recorded outcome.
                    if !visible.trim().is_empty() {
                        accumulator.push(&visible);
                        self.publish_json(events::TURN_CHUNK, &TurnChunkEvent::chunk(&visible))
                            .await;
                    }
                }
                Err(e) => return self.fail(e).await,
            }
        }

        self.finalize(accumulator, outcome).await
    }

    /// Ends the turn as failed before any fragment could be consumed,
    /// e.g. when opening the stream itself errored.
    pub async fn abort(self, error: LeadflowError) -> TurnPhase {
        self.fail(error).await
    }

    /// Commits the accumulated reply and qualification, then publishes the
    /// single terminal event.
    async fn finalize(mut self, accumulator: TurnAccumulator, outcome: TurnOutcome) -> TurnPhase {
        self.phase = TurnPhase::Finalizing;

        let reply = accumulator.finish();
        let mut dirty = false;

        // Empty replies are never persisted, even when an outcome was detected.
        if !reply.is_empty() {
            self.lead
                .chat_history
                .push(ChatMessage::now(Sender::Ai, reply.clone()));
            dirty = true;
        }

        match outcome {
            TurnOutcome::Strong => {
                self.lead.qualification = Qualification::Hot;
                self.lead.status = STATUS_COMPLETED.to_string();
                dirty = true;
            }
            TurnOutcome::Weak => {
                self.lead.qualification = Qualification::Weak;
                self.lead.status = STATUS_COMPLETED.to_string();
                dirty = true;
            }
            TurnOutcome::None => {}
        }

        let mut save_error = None;
        if dirty {
            self.lead.updated_at = chrono::Utc::now().to_rfc3339();
            match self.storage.save_lead(&self.lead).await {
                Ok(()) => {
                    info!(
                        lead_id = %self.lead.id,
                        qualification = %self.lead.qualification,
                        status = %self.lead.status,
                        reply_persisted = !reply.is_empty(),
                        "turn committed"
                    );
                }
                Err(e) => {
                    // The in-memory mutation stands and the terminal event
                    // still fires; the failure rides on its error field.
                    error!(lead_id = %self.lead.id, error = %e, "failed to save lead after turn");
                    save_error = Some(format!("failed to save lead updates: {e}"));
                }
            }
        } else {
            debug!(lead_id = %self.lead.id, "turn produced no lead updates");
        }

        self.publish_json(
            events::TURN_CHUNK,
            &TurnChunkEvent::terminal(outcome, save_error),
        )
        .await;

        self.phase = TurnPhase::Done;
        self.phase
    }

    /// Stream-level failure: no history append, no qualification mutation,
    /// one error event, terminal.
    async fn fail(mut self, err: LeadflowError) -> TurnPhase {
        error!(lead_id = %self.lead.id, error = %err, "token stream failed");
        self.publish_json(
            events::TURN_STREAM_ERROR,
            &TurnStreamErrorEvent {
                message: "model streaming failed".to_string(),
                detail: err.to_string(),
            },
        )
        .await;
        self.phase = TurnPhase::Failed;
        self.phase
    }

    /// Fire-and-forget publish; delivery problems are logged, never raised.
    async fn publish_json<T: Serialize>(&self, event_name: &str, payload: &T) {
        let value = match serde_json::to_value(payload) {
            Ok(v) => v,
            Err(e) => {
                warn!(event = event_name, error = %e, "failed to serialize broadcast payload");
                return;
            }
        };
        if let Err(e) = self
            .broadcast
            .publish(&self.channel_id, event_name, value)
            .await
        {
            warn!(
                channel = %self.channel_id,
                event = event_name,
                error = %e,
                "broadcast publish failed"
            );
        }
    }
}
