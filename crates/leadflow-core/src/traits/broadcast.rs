// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Broadcast adapter trait for realtime fan-out to subscribers.

use async_trait::async_trait;

use crate::error::LeadflowError;
use crate::traits::adapter::PluginAdapter;

/// Adapter for conversation-scoped event fan-out.
///
/// Publishing is best-effort: implementations log delivery problems and
/// return `Ok` wherever possible, because the turn state machine treats
/// broadcast as fire-and-forget and persistence as the source of truth.
/// Within one turn, events published from the single turn task arrive in
/// publish order; no guarantee is made across turns.
#[async_trait]
pub trait BroadcastAdapter: PluginAdapter {
    /// Publishes a named event on a caller-supplied channel.
    async fn publish(
        &self,
        channel: &str,
        event: &str,
        payload: serde_json::Value,
    ) -> Result<(), LeadflowError>;
}
