// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use leadflow_config::model::StorageConfig;
use leadflow_core::types::{ChatMessage, Lead, LeadFilter};
use leadflow_core::{
    AdapterType, HealthStatus, LeadflowError, PluginAdapter, StorageAdapter,
};

use crate::database::Database;
use crate::queries;

/// SQLite-backed lead store.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is lazily initialized on the first
/// call to [`StorageAdapter::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    ///
    /// The database connection is not opened until `initialize` is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Returns a reference to the underlying Database, or an error if not initialized.
    fn db(&self) -> Result<&Database, LeadflowError> {
        self.db.get().ok_or_else(|| LeadflowError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, LeadflowError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), LeadflowError> {
        if let Some(db) = self.db.get() {
            db.connection()
                .call(|conn| {
                    conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                    Ok(())
                })
                .await
                .map_err(crate::database::map_tr_err)?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), LeadflowError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| LeadflowError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), LeadflowError> {
        let db = self.db()?;
        // Checkpoint WAL before close.
        db.connection()
            .call(|conn| {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    async fn create_lead(&self, lead: &Lead) -> Result<(), LeadflowError> {
        queries::leads::create_lead(self.db()?, lead).await
    }

    async fn get_lead(&self, id: &str) -> Result<Option<Lead>, LeadflowError> {
        queries::leads::get_lead(self.db()?, id).await
    }

    async fn append_message(
        &self,
        lead_id: &str,
        message: &ChatMessage,
    ) -> Result<(), LeadflowError> {
        queries::messages::insert_message(self.db()?, lead_id, message).await
    }

    async fn save_lead(&self, lead: &Lead) -> Result<(), LeadflowError> {
        queries::leads::save_lead(self.db()?, lead).await
    }

    async fn list_leads(&self, filter: &LeadFilter) -> Result<Vec<Lead>, LeadflowError> {
        queries::leads::list_leads(self.db()?, filter).await
    }
}
