use crate::config::{ServerConfig, StorageBackend};
use anyhow::Result;
use rebac_engine::{Cancellation, EdgeStore, InMemoryEdgeStore, PostgresEdgeStore, RbacService};
use std::sync::Arc;
use tracing::info;

/// Shared state handed to every request handler
#[derive(Clone)]
pub struct RebacServer {
    /// Server configuration
    pub config: Arc<ServerConfig>,
    /// Access control vocabulary over the graph engine
    pub service: Arc<RbacService>,
    /// Fires on shutdown; in-flight traversals observe it
    shutdown: Cancellation,
}

impl RebacServer {
    pub fn new(config: ServerConfig, store: Arc<dyn EdgeStore>, shutdown: Cancellation) -> Self {
        let service = RbacService::with_config(store, config.engine.clone());
        Self {
            config: Arc::new(config),
            service: Arc::new(service),
            shutdown,
        }
    }

    /// Build the configured storage backend and wrap it
    pub async fn from_config(config: ServerConfig, shutdown: Cancellation) -> Result<Self> {
        let store: Arc<dyn EdgeStore> = match config.storage.backend {
            StorageBackend::Memory => {
                info!("Using in-memory edge store");
                Arc::new(InMemoryEdgeStore::new())
            }
            StorageBackend::Postgres => {
                info!("Connecting to PostgreSQL edge store");
                let store = PostgresEdgeStore::connect(
                    &config.storage.database_url,
                    config.storage.max_connections,
                )
                .await?;
                if config.storage.migrate {
                    store.migrate().await?;
                }
                Arc::new(store)
            }
        };

        Ok(Self::new(config, store, shutdown))
    }

    /// In-memory server with default configuration
    pub fn in_memory() -> Self {
        Self::new(
            ServerConfig::default(),
            Arc::new(InMemoryEdgeStore::new()),
            Cancellation::none(),
        )
    }

    pub fn cancellation(&self) -> &Cancellation {
        &self.shutdown
    }
}
