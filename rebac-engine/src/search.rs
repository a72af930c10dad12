use crate::{
    cancel::Cancellation,
    condition::{CollectCondition, SearchCondition},
    error::Result,
    models::*,
    reader::LevelReader,
};
use ahash::AHashSet;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

/// Pass as `max_depth` to traverse the whole reachable closure
pub const UNBOUNDED_DEPTH: usize = usize::MAX;

/// Level-bounded breadth-first enumeration of reachable vertices.
///
/// `search` decides whether a discovered vertex is expanded further,
/// `collect` whether it is reported. Both see the vertex together with the
/// relation of the edge that reached it.
pub struct GraphSearcher {
    reader: Arc<LevelReader>,
}

/// Query parameters shared by vertex and permission searches
#[derive(Debug, Clone, Copy)]
pub struct SearchScope<'a> {
    pub direction: Direction,
    pub search: &'a SearchCondition,
    pub collect: &'a CollectCondition,
    pub max_depth: usize,
}

impl GraphSearcher {
    pub fn new(reader: Arc<LevelReader>) -> Self {
        Self { reader }
    }

    pub async fn vertices(
        &self,
        cancel: &Cancellation,
        start: &Vertex,
        scope: SearchScope<'_>,
    ) -> Result<Vec<Vertex>> {
        self.traverse(cancel, start, scope, |_, neighbour| neighbour.clone())
            .await
    }

    pub async fn permissions(
        &self,
        cancel: &Cancellation,
        start: &Vertex,
        scope: SearchScope<'_>,
    ) -> Result<Vec<Permission>> {
        self.traverse(cancel, start, scope, |edge, neighbour| {
            Permission::new(&edge.relation, &neighbour.namespace, &neighbour.name)
        })
        .await
    }

    /// Expands exactly one level per iteration; vertices discovered while a
    /// level is processed belong to the next one. Stops once `max_depth`
    /// levels are expanded, leaving the remaining frontier uninspected.
    async fn traverse<T, F>(
        &self,
        cancel: &Cancellation,
        start: &Vertex,
        scope: SearchScope<'_>,
        project: F,
    ) -> Result<Vec<T>>
    where
        T: Ord,
        F: Fn(&Edge, &Vertex) -> T,
    {
        let mut visited = AHashSet::new();
        visited.insert(start.clone());
        let mut found = BTreeSet::new();
        let mut frontier = vec![start.clone()];
        let mut depth = 0usize;

        while !frontier.is_empty() && depth < scope.max_depth {
            let adjacency = self
                .reader
                .fetch_level(cancel, &frontier, scope.direction)
                .await?;

            let mut next = Vec::new();
            for edge in adjacency.into_iter().flatten() {
                let neighbour = scope.direction.far_end(&edge);
                if scope.collect.should_collect(&neighbour, &edge.relation) {
                    found.insert(project(&edge, &neighbour));
                }
                if !scope.search.should_stop(&neighbour, &edge.relation)
                    && visited.insert(neighbour.clone())
                {
                    next.push(neighbour);
                }
            }

            debug!(
                "Level {} expanded {} vertices, {} queued",
                depth,
                frontier.len(),
                next.len()
            );
            frontier = next;
            depth += 1;
        }

        Ok(found.into_iter().collect())
    }
}
