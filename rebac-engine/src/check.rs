use crate::{
    cancel::Cancellation,
    condition::SearchCondition,
    error::Result,
    models::*,
    reader::LevelReader,
};
use ahash::AHashSet;
use std::sync::Arc;
use tracing::debug;

/// Answers "can `start` reach `target` through an edge labelled `relation`".
///
/// The search is breadth-first over outgoing edges with no depth bound; the
/// visited set alone guarantees termination on cyclic graphs.
pub struct ReachabilityChecker {
    reader: Arc<LevelReader>,
}

impl ReachabilityChecker {
    pub fn new(reader: Arc<LevelReader>) -> Self {
        Self { reader }
    }

    pub async fn check(
        &self,
        cancel: &Cancellation,
        start: &Vertex,
        target: &Vertex,
        relation: &str,
        search: &SearchCondition,
    ) -> Result<bool> {
        let mut visited = AHashSet::new();
        visited.insert(start.clone());
        let mut frontier = vec![start.clone()];
        let mut levels = 0usize;

        while !frontier.is_empty() {
            let adjacency = self
                .reader
                .fetch_level(cancel, &frontier, Direction::Forward)
                .await?;

            let mut next = Vec::new();
            for edge in adjacency.into_iter().flatten() {
                let object = edge.object();
                if edge.relation == relation && object == *target {
                    debug!("Reached {} via {} after {} levels", target, relation, levels);
                    return Ok(true);
                }
                if !search.should_stop(&object, &edge.relation) && visited.insert(object.clone()) {
                    next.push(object);
                }
            }

            frontier = next;
            levels += 1;
        }

        debug!("{} not reachable via {} ({} vertices visited)", target, relation, visited.len());
        Ok(false)
    }
}
