// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Full-pipeline test harness: temp SQLite storage, mock provider, and a
//! capturing broadcast wired into a real orchestrator.

use std::sync::Arc;

use leadflow_config::model::StorageConfig;
use leadflow_core::StorageAdapter;
use leadflow_engine::TurnOrchestrator;
use leadflow_storage::SqliteStorage;

use crate::mock_broadcast::CapturingBroadcast;
use crate::mock_provider::MockProvider;

/// A wired pipeline over throwaway storage.
///
/// The temp directory lives as long as the harness; dropping it removes
/// the database file.
pub struct TestHarness {
    pub orchestrator: TurnOrchestrator,
    pub storage: Arc<SqliteStorage>,
    pub provider: Arc<MockProvider>,
    pub broadcast: Arc<CapturingBroadcast>,
    _tmp: tempfile::TempDir,
}

impl TestHarness {
    /// Builds a harness with initialized storage and empty mock queues.
    pub async fn new() -> Self {
        let tmp = tempfile::tempdir().expect("failed to create temp dir");
        let db_path = tmp.path().join("harness.db");

        let storage = Arc::new(SqliteStorage::new(StorageConfig {
            database_path: db_path.to_str().expect("utf-8 temp path").to_string(),
            wal_mode: true,
        }));
        storage
            .initialize()
            .await
            .expect("harness storage should initialize");

        let provider = Arc::new(MockProvider::new());
        let broadcast = Arc::new(CapturingBroadcast::new());

        let orchestrator = TurnOrchestrator::new(
            storage.clone(),
            provider.clone(),
            broadcast.clone(),
        );

        Self {
            orchestrator,
            storage,
            provider,
            broadcast,
            _tmp: tmp,
        }
    }
}
