// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for the lead document store.

use async_trait::async_trait;

use crate::error::LeadflowError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ChatMessage, Lead, LeadFilter};

/// Adapter for lead persistence.
///
/// The contract is a small document store: read-by-id, append-to-history,
/// and whole-document save. History is append-only; `save_lead` is the
/// single finalize-time commit for a turn and must be atomic.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), LeadflowError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), LeadflowError>;

    /// Persists a freshly created lead.
    async fn create_lead(&self, lead: &Lead) -> Result<(), LeadflowError>;

    /// Loads a lead with its full chat history, or `None` if unknown.
    async fn get_lead(&self, id: &str) -> Result<Option<Lead>, LeadflowError>;

    /// Appends one message to a lead's history.
    async fn append_message(
        &self,
        lead_id: &str,
        message: &ChatMessage,
    ) -> Result<(), LeadflowError>;

    /// Whole-document save: commits qualification, status, and any history
    /// entries not yet persisted, in one transaction.
    async fn save_lead(&self, lead: &Lead) -> Result<(), LeadflowError>;

    /// Lists leads matching the filter, newest first.
    async fn list_leads(&self, filter: &LeadFilter) -> Result<Vec<Lead>, LeadflowError>;
}
