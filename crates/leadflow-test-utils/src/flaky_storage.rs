// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage wrapper with switchable failure injection.
//!
//! Delegates to an inner adapter until a failure flag is flipped, for
//! exercising the pre-stream persistence error and the finalize-time
//! save-failure paths.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use leadflow_core::types::{AdapterType, ChatMessage, HealthStatus, Lead, LeadFilter};
use leadflow_core::{LeadflowError, PluginAdapter, StorageAdapter};

/// Wraps a real storage adapter and fails selected operations on demand.
pub struct FlakyStorage {
    inner: Arc<dyn StorageAdapter + Send + Sync>,
    fail_save: AtomicBool,
    fail_append: AtomicBool,
}

impl FlakyStorage {
    pub fn wrap(inner: Arc<dyn StorageAdapter + Send + Sync>) -> Self {
        Self {
            inner,
            fail_save: AtomicBool::new(false),
            fail_append: AtomicBool::new(false),
        }
    }

    /// Make `save_lead` fail from now on.
    pub fn set_fail_save(&self, fail: bool) {
        self.fail_save.store(fail, Ordering::SeqCst);
    }

    /// Make `append_message` fail from now on.
    pub fn set_fail_append(&self, fail: bool) {
        self.fail_append.store(fail, Ordering::SeqCst);
    }

    fn injected_error(op: &str) -> LeadflowError {
        LeadflowError::Storage {
            source: format!("injected {op} failure").into(),
        }
    }
}

#[async_trait]
impl PluginAdapter for FlakyStorage {
    fn name(&self) -> &str {
        "flaky-storage"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, LeadflowError> {
        self.inner.health_check().await
    }

    async fn shutdown(&self) -> Result<(), LeadflowError> {
        self.inner.shutdown().await
    }
}

#[async_trait]
impl StorageAdapter for FlakyStorage {
    async fn initialize(&self) -> Result<(), LeadflowError> {
        self.inner.initialize().await
    }

    async fn close(&self) -> Result<(), LeadflowError> {
        self.inner.close().await
    }

    async fn create_lead(&self, lead: &Lead) -> Result<(), LeadflowError> {
        self.inner.create_lead(lead).await
    }

    async fn get_lead(&self, id: &str) -> Result<Option<Lead>, LeadflowError> {
        self.inner.get_lead(id).await
    }

    async fn append_message(
        &self,
        lead_id: &str,
        message: &ChatMessage,
    ) -> Result<(), LeadflowError> {
        if self.fail_append.load(Ordering::SeqCst) {
            return Err(Self::injected_error("append"));
        }
        self.inner.append_message(lead_id, message).await
    }

    async fn save_lead(&self, lead: &Lead) -> Result<(), LeadflowError> {
        if self.fail_save.load(Ordering::SeqCst) {
            return Err(Self::injected_error("save"));
        }
        self.inner.save_lead(lead).await
    }

    async fn list_leads(&self, filter: &LeadFilter) -> Result<Vec<Lead>, LeadflowError> {
        self.inner.list_leads(filter).await
    }
}
