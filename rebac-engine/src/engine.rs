use crate::{
    cancel::Cancellation,
    check::ReachabilityChecker,
    condition::{CollectCondition, SearchCondition},
    error::Result,
    models::*,
    reader::{EngineConfig, LevelReader},
    repository::EdgeStore,
    search::{GraphSearcher, SearchScope},
    tree::{Tree, TreeBuilder},
};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Traversal engine over a relation graph held in an [`EdgeStore`].
///
/// Every operation reads the store level by level, never mutates it, and
/// honours both the caller's [`Cancellation`] and the configured deadline.
pub struct GraphEngine {
    reader: Arc<LevelReader>,
    checker: ReachabilityChecker,
    searcher: GraphSearcher,
    trees: TreeBuilder,
}

impl GraphEngine {
    pub fn new(store: Arc<dyn EdgeStore>) -> Self {
        Self::with_config(store, EngineConfig::default())
    }

    pub fn with_config(store: Arc<dyn EdgeStore>, config: EngineConfig) -> Self {
        let reader = Arc::new(LevelReader::new(store, config));
        Self {
            checker: ReachabilityChecker::new(reader.clone()),
            searcher: GraphSearcher::new(reader.clone()),
            trees: TreeBuilder::new(reader.clone()),
            reader,
        }
    }

    pub fn store(&self) -> &Arc<dyn EdgeStore> {
        self.reader.store()
    }

    pub fn config(&self) -> &EngineConfig {
        self.reader.config()
    }

    /// Whether `target` is reachable from `start` through an edge labelled
    /// `relation`. Intermediate vertices are expanded only while `search`
    /// allows it; the target edge itself is always tested.
    #[instrument(
        level = "debug",
        skip_all,
        fields(start = %start, target = %target, relation = %relation)
    )]
    pub async fn check(
        &self,
        cancel: &Cancellation,
        start: &Vertex,
        target: &Vertex,
        relation: &str,
        search: &SearchCondition,
    ) -> Result<bool> {
        let allowed = self
            .reader
            .bounded(self.checker.check(cancel, start, target, relation, search))
            .await?;
        debug!("Check result: {}", allowed);
        Ok(allowed)
    }

    /// Distinct vertices collected within `max_depth` levels of `start`,
    /// sorted by namespace then name.
    #[instrument(
        level = "debug",
        skip_all,
        fields(start = %start, direction = ?direction, max_depth = max_depth)
    )]
    pub async fn search_vertices(
        &self,
        cancel: &Cancellation,
        start: &Vertex,
        direction: Direction,
        search: &SearchCondition,
        collect: &CollectCondition,
        max_depth: usize,
    ) -> Result<Vec<Vertex>> {
        let scope = SearchScope {
            direction,
            search,
            collect,
            max_depth,
        };
        let vertices = self
            .reader
            .bounded(self.searcher.vertices(cancel, start, scope))
            .await?;
        debug!("Collected {} vertices", vertices.len());
        Ok(vertices)
    }

    /// Like [`GraphEngine::search_vertices`], but each hit carries the
    /// relation of the edge through which it was reached. A vertex reached
    /// through several relations yields one permission per relation.
    #[instrument(
        level = "debug",
        skip_all,
        fields(start = %start, direction = ?direction, max_depth = max_depth)
    )]
    pub async fn search_permissions(
        &self,
        cancel: &Cancellation,
        start: &Vertex,
        direction: Direction,
        search: &SearchCondition,
        collect: &CollectCondition,
        max_depth: usize,
    ) -> Result<Vec<Permission>> {
        let scope = SearchScope {
            direction,
            search,
            collect,
            max_depth,
        };
        let permissions = self
            .reader
            .bounded(self.searcher.permissions(cancel, start, scope))
            .await?;
        debug!("Collected {} permissions", permissions.len());
        Ok(permissions)
    }

    #[instrument(level = "debug", skip_all, fields(start = %start, max_depth = max_depth))]
    pub async fn get_tree(
        &self,
        cancel: &Cancellation,
        start: &Vertex,
        max_depth: usize,
    ) -> Result<Tree> {
        self.reader
            .bounded(self.trees.build(cancel, start, max_depth))
            .await
    }
}
