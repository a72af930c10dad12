use crate::{
    error::{GraphError, Result},
    models::*,
};
use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

pub mod postgres;

pub use postgres::PostgresEdgeStore;

/// Storage interface for relation edges
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EdgeStore: Send + Sync {
    /// Liveness check
    async fn ping(&self) -> Result<()>;

    /// Read edges matching `filter`.
    ///
    /// In [`QueryMode::Exact`] the filter must identify exactly one logical
    /// edge: zero matches is [`GraphError::NotFound`], more than one is
    /// [`GraphError::DuplicateRecord`].
    async fn get(&self, filter: &Edge, mode: QueryMode) -> Result<Vec<Edge>>;

    /// Unconditional insert; uniqueness is not enforced
    async fn create(&self, edge: Edge) -> Result<()>;

    /// Pattern mode removes every match. Exact mode validates the filter the
    /// same way [`EdgeStore::get`] does and removes one edge.
    async fn delete(&self, filter: &Edge, mode: QueryMode) -> Result<()>;

    /// Remove every edge
    async fn clear_all(&self) -> Result<()>;
}

/// Checks the cardinality rule shared by exact get and exact delete
pub(crate) fn ensure_single(count: usize) -> Result<()> {
    match count {
        0 => Err(GraphError::NotFound),
        1 => Ok(()),
        _ => Err(GraphError::DuplicateRecord),
    }
}

/// In-memory edge store for testing and development
#[derive(Debug, Default)]
pub struct InMemoryEdgeStore {
    edges: RwLock<Vec<Edge>>,
}

impl InMemoryEdgeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_edges(edges: impl IntoIterator<Item = Edge>) -> Self {
        Self {
            edges: RwLock::new(edges.into_iter().collect()),
        }
    }

    pub fn len(&self) -> usize {
        self.edges.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.read().is_empty()
    }
}

#[async_trait]
impl EdgeStore for InMemoryEdgeStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn get(&self, filter: &Edge, mode: QueryMode) -> Result<Vec<Edge>> {
        let edges: Vec<Edge> = self
            .edges
            .read()
            .iter()
            .filter(|edge| edge.matches(filter, mode))
            .cloned()
            .collect();

        if mode == QueryMode::Exact {
            ensure_single(edges.len())?;
        }
        Ok(edges)
    }

    async fn create(&self, edge: Edge) -> Result<()> {
        debug!("Creating edge: {}", edge);
        self.edges.write().push(edge);
        Ok(())
    }

    async fn delete(&self, filter: &Edge, mode: QueryMode) -> Result<()> {
        let mut edges = self.edges.write();
        match mode {
            QueryMode::Pattern => {
                let before = edges.len();
                edges.retain(|edge| !edge.matches(filter, mode));
                debug!("Deleted {} edges matching {}", before.saturating_sub(edges.len()), filter);
            }
            QueryMode::Exact => {
                let mut positions = edges
                    .iter()
                    .enumerate()
                    .filter(|(_, edge)| edge.matches(filter, mode))
                    .map(|(idx, _)| idx);
                let first = positions.next();
                ensure_single(first.map_or(0, |_| 1 + positions.count()))?;
                if let Some(idx) = first {
                    edges.remove(idx);
                }
            }
        }
        Ok(())
    }

    async fn clear_all(&self) -> Result<()> {
        self.edges.write().clear();
        Ok(())
    }
}
