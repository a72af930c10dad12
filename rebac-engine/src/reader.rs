use crate::{
    cancel::Cancellation,
    error::{GraphError, Result},
    models::{Direction, Edge, QueryMode, Vertex},
    repository::EdgeStore,
};
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Traversal tuning shared by every engine operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Store lookups in flight at once while expanding one level
    pub fetch_concurrency: usize,
    /// Deadline for a whole operation; `None` disables it
    pub timeout_ms: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fetch_concurrency: 8,
            timeout_ms: None,
        }
    }
}

impl EngineConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// Issues the store round trips of a traversal, one per frontier vertex.
///
/// Every lookup races the caller's cancellation signal; the first error of a
/// level aborts the level.
pub struct LevelReader {
    store: Arc<dyn EdgeStore>,
    config: EngineConfig,
}

impl LevelReader {
    pub fn new(store: Arc<dyn EdgeStore>, config: EngineConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &Arc<dyn EdgeStore> {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// One pattern lookup
    pub async fn fetch(&self, cancel: &Cancellation, filter: Edge) -> Result<Vec<Edge>> {
        if cancel.is_cancelled() {
            return Err(GraphError::Cancelled);
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(GraphError::Cancelled),
            edges = self.store.get(&filter, QueryMode::Pattern) => edges,
        }
    }

    /// Adjacent edges of every frontier vertex, in frontier order
    pub async fn fetch_level(
        &self,
        cancel: &Cancellation,
        frontier: &[Vertex],
        direction: Direction,
    ) -> Result<Vec<Vec<Edge>>> {
        // Built eagerly so the stream holds plain futures, keeping it Send.
        let fetches: Vec<_> = frontier
            .iter()
            .map(|vertex| self.fetch(cancel, direction.filter_for(vertex)))
            .collect();

        stream::iter(fetches)
            .buffered(self.config.fetch_concurrency.max(1))
            .try_collect()
            .await
    }

    /// Apply the configured deadline to a whole operation
    pub async fn bounded<T>(&self, operation: impl Future<Output = Result<T>>) -> Result<T> {
        match self.config.timeout() {
            Some(limit) => match tokio::time::timeout(limit, operation).await {
                Ok(result) => result,
                Err(_) => {
                    warn!("Traversal exceeded deadline of {:?}", limit);
                    Err(GraphError::Timeout(limit))
                }
            },
            None => operation.await,
        }
    }
}
