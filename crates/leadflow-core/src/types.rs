// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across adapter traits and the Leadflow engine.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::LeadflowError;

/// Unique identifier for a lead, assigned at creation and immutable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeadId(pub String);

impl LeadId {
    /// Generates a fresh random lead id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Validates a caller-supplied id string.
    ///
    /// Lead ids are UUIDs; anything that does not parse as one is rejected
    /// before a storage lookup is attempted.
    pub fn parse(raw: &str) -> Result<Self, LeadflowError> {
        uuid::Uuid::parse_str(raw)
            .map(|_| Self(raw.to_string()))
            .map_err(|_| LeadflowError::InvalidLeadId(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LeadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who authored a chat message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Ai,
}

/// Closed set of sales-value classifications for a lead.
///
/// Mutated only at turn finalization, never mid-stream.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Qualification {
    NotRelevant,
    Weak,
    Hot,
    VeryBigPotential,
}

impl Default for Qualification {
    fn default() -> Self {
        Qualification::Weak
    }
}

/// Qualification signal detected in the model's output stream for one turn.
///
/// Ephemeral: derived from the trailing marker character, consumed at
/// finalization, never persisted. When more than one marker is observed in
/// a single turn the last one wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnOutcome {
    #[default]
    None,
    Strong,
    Weak,
}

impl TurnOutcome {
    /// Wire label carried on the terminal broadcast event
    /// (`"STRONG"`, `"WEAK"`, or absent for no outcome).
    pub fn status_label(self) -> Option<&'static str> {
        match self {
            TurnOutcome::None => None,
            TurnOutcome::Strong => Some("STRONG"),
            TurnOutcome::Weak => Some("WEAK"),
        }
    }
}

/// One chat turn contribution, owned by exactly one lead's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Storage identity; makes re-saving a history row idempotent.
    pub id: String,
    pub sender: Sender,
    pub text: String,
    /// RFC 3339, assigned when the message is appended.
    pub timestamp: String,
}

impl ChatMessage {
    /// Creates a message stamped with the current time.
    pub fn now(sender: Sender, text: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            sender,
            text,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// A conversation subject: identity, qualification state, and history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: LeadId,
    pub email: String,
    pub qualification: Qualification,
    /// Free-form label; "pending" until a qualification outcome completes
    /// the conversation.
    pub status: String,
    /// Append-only, insertion order = chronological order.
    pub chat_history: Vec<ChatMessage>,
    pub created_at: String,
    pub updated_at: String,
}

/// Initial status for a freshly created lead.
pub const STATUS_PENDING: &str = "pending";

/// Status once a STRONG or WEAK outcome has closed the conversation.
pub const STATUS_COMPLETED: &str = "completed";

impl Lead {
    /// Creates a new lead with default qualification and pending status.
    pub fn new(email: String) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: LeadId::generate(),
            email,
            qualification: Qualification::default(),
            status: STATUS_PENDING.to_string(),
            chat_history: Vec::new(),
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

/// An inbound conversation turn request, as received from the HTTP boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnRequest {
    /// Existing lead to continue; absent to start a new conversation.
    #[serde(default)]
    pub lead_id: Option<String>,
    /// Required when no lead id is supplied.
    #[serde(default)]
    pub email: Option<String>,
    pub message: String,
    /// Caller-supplied fan-out address; not persisted.
    pub channel_id: String,
}

/// Filter for the admin lead listing.
#[derive(Debug, Clone, Default)]
pub struct LeadFilter {
    pub status: Option<String>,
    pub qualification: Option<Qualification>,
    pub limit: i64,
    pub offset: i64,
}

/// Broadcast event names.
pub mod events {
    /// Per-fragment visible text and the single terminal completion event.
    pub const TURN_CHUNK: &str = "turn_chunk";
    /// Published when the token stream itself fails before completion.
    pub const TURN_STREAM_ERROR: &str = "turn_stream_error";
}

/// Payload for `turn_chunk` events, both streaming and terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnChunkEvent {
    pub chunk: String,
    pub done: bool,
    /// Present only on the terminal event: `"STRONG"`, `"WEAK"`, or null.
    /// `None` = field absent (chunk events), `Some(None)` = explicit null.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualification_status: Option<Option<String>>,
    /// Set when the finalize-time save failed; the turn still completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TurnChunkEvent {
    /// A streaming visible-text chunk.
    pub fn chunk(text: &str) -> Self {
        Self {
            chunk: text.to_string(),
            done: false,
            qualification_status: None,
            error: None,
        }
    }

    /// The one terminal event for a turn.
    pub fn terminal(outcome: TurnOutcome, error: Option<String>) -> Self {
        Self {
            chunk: String::new(),
            done: true,
            qualification_status: Some(outcome.status_label().map(String::from)),
            error,
        }
    }
}

/// Payload for `turn_stream_error` events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnStreamErrorEvent {
    pub message: String,
    pub detail: String,
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the type of adapter behind a trait object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Provider,
    Storage,
    Broadcast,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn lead_id_parse_accepts_uuids() {
        let id = LeadId::generate();
        assert!(LeadId::parse(id.as_str()).is_ok());
    }

    #[test]
    fn lead_id_parse_rejects_garbage() {
        let err = LeadId::parse("not-a-lead-id").unwrap_err();
        assert!(matches!(err, LeadflowError::InvalidLeadId(_)));
    }

    #[test]
    fn qualification_round_trips_through_strings() {
        for q in [
            Qualification::NotRelevant,
            Qualification::Weak,
            Qualification::Hot,
            Qualification::VeryBigPotential,
        ] {
            let s = q.to_string();
            assert_eq!(Qualification::from_str(&s).unwrap(), q);
        }
    }

    #[test]
    fn qualification_defaults_to_weak() {
        assert_eq!(Qualification::default(), Qualification::Weak);
    }

    #[test]
    fn new_lead_starts_pending_with_empty_history() {
        let lead = Lead::new("a@b.com".into());
        assert_eq!(lead.qualification, Qualification::Weak);
        assert_eq!(lead.status, STATUS_PENDING);
        assert!(lead.chat_history.is_empty());
    }

    #[test]
    fn outcome_status_labels() {
        assert_eq!(TurnOutcome::Strong.status_label(), Some("STRONG"));
        assert_eq!(TurnOutcome::Weak.status_label(), Some("WEAK"));
        assert_eq!(TurnOutcome::None.status_label(), None);
    }

    #[test]
    fn chunk_event_serializes_without_terminal_fields() {
        let json = serde_json::to_value(TurnChunkEvent::chunk("Hi")).unwrap();
        assert_eq!(json["chunk"], "Hi");
        assert_eq!(json["done"], false);
        assert!(json.get("qualificationStatus").is_none());
        assert!(json.get("error").is_none());
    }

    #[test]
    fn terminal_event_carries_explicit_null_status() {
        let json =
            serde_json::to_value(TurnChunkEvent::terminal(TurnOutcome::None, None)).unwrap();
        assert_eq!(json["done"], true);
        assert!(json["qualificationStatus"].is_null());

        let json =
            serde_json::to_value(TurnChunkEvent::terminal(TurnOutcome::Strong, None)).unwrap();
        assert_eq!(json["qualificationStatus"], "STRONG");
    }

    #[test]
    fn terminal_event_carries_save_error() {
        let event = TurnChunkEvent::terminal(
            TurnOutcome::Weak,
            Some("failed to save lead updates: disk full".into()),
        );
        let json = serde_json::to_value(event).unwrap();
        assert_eq!(json["qualificationStatus"], "WEAK");
        assert!(json["error"].as_str().unwrap().contains("disk full"));
    }

    #[test]
    fn turn_request_accepts_camel_case_wire_format() {
        let json = r#"{"leadId":"x","email":"a@b.com","message":"hi","channelId":"ch-1"}"#;
        let req: TurnRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.lead_id.as_deref(), Some("x"));
        assert_eq!(req.channel_id, "ch-1");
    }

    #[test]
    fn sender_round_trips() {
        assert_eq!(Sender::User.to_string(), "user");
        assert_eq!(Sender::from_str("ai").unwrap(), Sender::Ai);
    }
}
