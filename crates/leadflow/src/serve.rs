// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `leadflow serve` command implementation.
//!
//! Starts the full Leadflow server: SQLite storage, the OpenAI streaming
//! provider, the in-process broadcast hub, the turn orchestrator, and the
//! HTTP/WebSocket gateway. Every resource is constructed here and passed
//! down explicitly; teardown runs in reverse order after the gateway stops.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use leadflow_broadcast::BroadcastHub;
use leadflow_config::LeadflowConfig;
use leadflow_core::{LeadflowError, PluginAdapter, StorageAdapter};
use leadflow_engine::TurnOrchestrator;
use leadflow_gateway::{AuthConfig, GatewayState, ServerConfig};
use leadflow_openai::OpenAiProvider;
use leadflow_storage::SqliteStorage;

/// Runs the `leadflow serve` command until interrupted.
pub async fn run_serve(config: LeadflowConfig) -> Result<(), LeadflowError> {
    init_tracing(&config.agent.log_level);

    info!("starting leadflow serve");

    // Storage first: everything downstream needs it.
    let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
    storage.initialize().await?;

    let provider = Arc::new(OpenAiProvider::new(&config).await?);
    let hub = Arc::new(BroadcastHub::new(config.gateway.channel_capacity));

    let orchestrator = Arc::new(TurnOrchestrator::new(
        storage.clone(),
        provider.clone(),
        hub.clone(),
    ));

    let state = GatewayState {
        orchestrator,
        storage: storage.clone() as Arc<dyn StorageAdapter + Send + Sync>,
        hub: hub.clone(),
        auth: AuthConfig {
            bearer_token: config.gateway.bearer_token.clone(),
        },
        start_time: std::time::Instant::now(),
    };

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "failed to listen for shutdown signal");
                return;
            }
            info!("shutdown signal received");
            cancel.cancel();
        });
    }

    let server_config = ServerConfig {
        host: config.gateway.host.clone(),
        port: config.gateway.port,
    };
    leadflow_gateway::start_server(&server_config, state, cancel).await?;

    // Teardown in reverse construction order.
    hub.shutdown().await?;
    provider.shutdown().await?;
    storage.close().await?;

    info!("leadflow stopped");
    Ok(())
}

/// Install the tracing subscriber; `RUST_LOG` wins over the config level.
fn init_tracing(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
