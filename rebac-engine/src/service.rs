use crate::{
    cancel::Cancellation,
    condition::{CollectCondition, Compare, SearchCondition},
    engine::GraphEngine,
    error::{GraphError, Result},
    models::*,
    reader::EngineConfig,
    repository::EdgeStore,
    search::UNBOUNDED_DEPTH,
    tree::Tree,
};
use std::sync::Arc;
use tracing::{debug, info, instrument};

pub const USER_NAMESPACE: &str = "user";
pub const ROLE_NAMESPACE: &str = "role";

/// `user --member--> role`
pub const MEMBER_RELATION: &str = "member";
/// `parent role --parent--> child role`; members of the parent reach
/// everything the child grants
pub const PARENT_RELATION: &str = "parent";

/// Role-based access control expressed as relation edges.
///
/// Users join roles through `member` edges, roles nest through `parent`
/// edges, and any other edge out of a user or role is a grant on an object.
pub struct RbacService {
    engine: GraphEngine,
}

impl RbacService {
    pub fn new(store: Arc<dyn EdgeStore>) -> Self {
        Self::with_config(store, EngineConfig::default())
    }

    pub fn with_config(store: Arc<dyn EdgeStore>, config: EngineConfig) -> Self {
        Self {
            engine: GraphEngine::with_config(store, config),
        }
    }

    pub fn engine(&self) -> &GraphEngine {
        &self.engine
    }

    fn store(&self) -> &Arc<dyn EdgeStore> {
        self.engine.store()
    }

    pub async fn healthy(&self) -> Result<()> {
        self.store().ping().await
    }

    // =============================================================================
    // Edges
    // =============================================================================

    pub async fn get_edges(&self, filter: &Edge, mode: QueryMode) -> Result<Vec<Edge>> {
        self.store().get(filter, mode).await
    }

    pub async fn create_edge(&self, edge: Edge) -> Result<()> {
        info!("Creating edge: {}", edge);
        self.store().create(edge).await
    }

    pub async fn delete_edges(&self, filter: &Edge, mode: QueryMode) -> Result<()> {
        info!("Deleting edges matching {} ({:?})", filter, mode);
        self.store().delete(filter, mode).await
    }

    pub async fn clear_all(&self) -> Result<()> {
        info!("Clearing all edges");
        self.store().clear_all().await
    }

    /// Apply `operations` in order, stopping at the first failure. Steps
    /// already applied stay applied.
    pub async fn batch(&self, operations: Vec<Operation>) -> Result<()> {
        let total = operations.len();
        for (step, operation) in operations.into_iter().enumerate() {
            debug!("Batch step {}/{}: {:?} {}", step + 1, total, operation.action, operation.edge);
            match operation.action {
                Action::Create => self.store().create(operation.edge).await?,
                Action::Delete => {
                    self.store()
                        .delete(&operation.edge, QueryMode::Exact)
                        .await?
                }
                Action::CreateIfNotExists => {
                    match self.store().get(&operation.edge, QueryMode::Exact).await {
                        Ok(_) => {}
                        Err(GraphError::NotFound) => self.store().create(operation.edge).await?,
                        Err(e) => return Err(e),
                    }
                }
            }
        }
        info!("Applied batch of {} operations", total);
        Ok(())
    }

    // =============================================================================
    // Users
    // =============================================================================

    pub async fn delete_user(&self, name: &str) -> Result<()> {
        info!("Deleting user {}", name);
        self.store()
            .delete(&Edge::outgoing(&Vertex::user(name)), QueryMode::Pattern)
            .await
    }

    /// Every grant reachable from the user through roles, excluding the
    /// membership and inheritance edges themselves
    #[instrument(level = "debug", skip(self, cancel))]
    pub async fn user_permissions(
        &self,
        cancel: &Cancellation,
        name: &str,
    ) -> Result<Vec<Permission>> {
        self.grants_from(cancel, &Vertex::user(name)).await
    }

    /// Roles the user belongs to, directly or through inheritance
    #[instrument(level = "debug", skip(self, cancel))]
    pub async fn user_roles(&self, cancel: &Cancellation, name: &str) -> Result<Vec<String>> {
        let roles_only = Compare::namespaces(&[ROLE_NAMESPACE]);
        let roles = self
            .engine
            .search_vertices(
                cancel,
                &Vertex::user(name),
                Direction::Forward,
                &SearchCondition::within(roles_only.clone()),
                &CollectCondition::In(roles_only),
                UNBOUNDED_DEPTH,
            )
            .await?;
        Ok(roles.into_iter().map(|role| role.name).collect())
    }

    #[instrument(level = "debug", skip(self, cancel))]
    pub async fn user_check(
        &self,
        cancel: &Cancellation,
        name: &str,
        namespace: &str,
        relation: &str,
        object_name: &str,
    ) -> Result<bool> {
        self.engine
            .check(
                cancel,
                &Vertex::user(name),
                &Vertex::new(namespace, object_name),
                relation,
                &SearchCondition::unrestricted(),
            )
            .await
    }

    pub async fn user_add_permission(
        &self,
        name: &str,
        namespace: &str,
        relation: &str,
        object_name: &str,
    ) -> Result<()> {
        self.create_edge(Edge::new(
            &Vertex::user(name),
            relation,
            &Vertex::new(namespace, object_name),
        ))
        .await
    }

    pub async fn user_remove_permission(
        &self,
        name: &str,
        namespace: &str,
        relation: &str,
        object_name: &str,
    ) -> Result<()> {
        let edge = Edge::new(
            &Vertex::user(name),
            relation,
            &Vertex::new(namespace, object_name),
        );
        self.delete_edges(&edge, QueryMode::Exact).await
    }

    pub async fn user_add_role(&self, name: &str, role: &str) -> Result<()> {
        self.create_edge(Edge::new(
            &Vertex::user(name),
            MEMBER_RELATION,
            &Vertex::role(role),
        ))
        .await
    }

    pub async fn user_remove_role(&self, name: &str, role: &str) -> Result<()> {
        let edge = Edge::new(&Vertex::user(name), MEMBER_RELATION, &Vertex::role(role));
        self.delete_edges(&edge, QueryMode::Exact).await
    }

    // =============================================================================
    // Roles
    // =============================================================================

    /// Remove the role's grants, its memberships and its place in the
    /// hierarchy
    pub async fn delete_role(&self, name: &str) -> Result<()> {
        info!("Deleting role {}", name);
        let role = Vertex::role(name);
        self.store()
            .delete(&Edge::outgoing(&role), QueryMode::Pattern)
            .await?;
        self.store()
            .delete(&Edge::incoming(&role), QueryMode::Pattern)
            .await
    }

    /// Direct members only
    pub async fn role_users(&self, name: &str) -> Result<Vec<String>> {
        let filter = Edge {
            subject_ns: USER_NAMESPACE.to_string(),
            relation: MEMBER_RELATION.to_string(),
            ..Edge::incoming(&Vertex::role(name))
        };
        let edges = self.store().get(&filter, QueryMode::Pattern).await?;
        Ok(edges.into_iter().map(|edge| edge.subject_name).collect())
    }

    #[instrument(level = "debug", skip(self, cancel))]
    pub async fn role_permissions(
        &self,
        cancel: &Cancellation,
        name: &str,
    ) -> Result<Vec<Permission>> {
        self.grants_from(cancel, &Vertex::role(name)).await
    }

    pub async fn role_add_permission(
        &self,
        name: &str,
        namespace: &str,
        relation: &str,
        object_name: &str,
    ) -> Result<()> {
        self.create_edge(Edge::new(
            &Vertex::role(name),
            relation,
            &Vertex::new(namespace, object_name),
        ))
        .await
    }

    pub async fn role_remove_permission(
        &self,
        name: &str,
        namespace: &str,
        relation: &str,
        object_name: &str,
    ) -> Result<()> {
        let edge = Edge::new(
            &Vertex::role(name),
            relation,
            &Vertex::new(namespace, object_name),
        );
        self.delete_edges(&edge, QueryMode::Exact).await
    }

    /// Members of `parent` gain everything `child` grants
    pub async fn role_inherit(&self, parent: &str, child: &str) -> Result<()> {
        self.create_edge(Edge::new(
            &Vertex::role(parent),
            PARENT_RELATION,
            &Vertex::role(child),
        ))
        .await
    }

    pub async fn role_uninherit(&self, parent: &str, child: &str) -> Result<()> {
        let edge = Edge::new(&Vertex::role(parent), PARENT_RELATION, &Vertex::role(child));
        self.delete_edges(&edge, QueryMode::Exact).await
    }

    pub async fn role_children(&self, name: &str) -> Result<Vec<String>> {
        let filter = Edge {
            relation: PARENT_RELATION.to_string(),
            object_ns: ROLE_NAMESPACE.to_string(),
            ..Edge::outgoing(&Vertex::role(name))
        };
        let edges = self.store().get(&filter, QueryMode::Pattern).await?;
        Ok(edges.into_iter().map(|edge| edge.object_name).collect())
    }

    pub async fn role_parents(&self, name: &str) -> Result<Vec<String>> {
        let filter = Edge {
            subject_ns: ROLE_NAMESPACE.to_string(),
            relation: PARENT_RELATION.to_string(),
            ..Edge::incoming(&Vertex::role(name))
        };
        let edges = self.store().get(&filter, QueryMode::Pattern).await?;
        Ok(edges.into_iter().map(|edge| edge.subject_name).collect())
    }

    // =============================================================================
    // Objects
    // =============================================================================

    pub async fn delete_object(&self, namespace: &str, name: &str) -> Result<()> {
        info!("Deleting object {}:{}", namespace, name);
        self.store()
            .delete(&Edge::incoming(&Vertex::new(namespace, name)), QueryMode::Pattern)
            .await
    }

    /// Roles holding any grant on the object, directly or by inheritance
    pub async fn object_roles(
        &self,
        cancel: &Cancellation,
        namespace: &str,
        name: &str,
    ) -> Result<Vec<String>> {
        self.holders_of(cancel, &Vertex::new(namespace, name), ROLE_NAMESPACE)
            .await
    }

    /// Users holding any grant on the object, directly or through roles
    pub async fn object_users(
        &self,
        cancel: &Cancellation,
        namespace: &str,
        name: &str,
    ) -> Result<Vec<String>> {
        self.holders_of(cancel, &Vertex::new(namespace, name), USER_NAMESPACE)
            .await
    }

    // =============================================================================
    // Generic traversal
    // =============================================================================

    pub async fn check(
        &self,
        cancel: &Cancellation,
        start: &Vertex,
        target: &Vertex,
        relation: &str,
        search: &SearchCondition,
    ) -> Result<bool> {
        self.engine.check(cancel, start, target, relation, search).await
    }

    pub async fn search_vertices(
        &self,
        cancel: &Cancellation,
        start: &Vertex,
        direction: Direction,
        search: &SearchCondition,
        collect: &CollectCondition,
        max_depth: usize,
    ) -> Result<Vec<Vertex>> {
        self.engine
            .search_vertices(cancel, start, direction, search, collect, max_depth)
            .await
    }

    pub async fn search_permissions(
        &self,
        cancel: &Cancellation,
        start: &Vertex,
        direction: Direction,
        search: &SearchCondition,
        collect: &CollectCondition,
        max_depth: usize,
    ) -> Result<Vec<Permission>> {
        self.engine
            .search_permissions(cancel, start, direction, search, collect, max_depth)
            .await
    }

    pub async fn get_tree(
        &self,
        cancel: &Cancellation,
        start: &Vertex,
        max_depth: usize,
    ) -> Result<Tree> {
        self.engine.get_tree(cancel, start, max_depth).await
    }

    async fn grants_from(&self, cancel: &Cancellation, start: &Vertex) -> Result<Vec<Permission>> {
        self.engine
            .search_permissions(
                cancel,
                start,
                Direction::Forward,
                &SearchCondition::unrestricted(),
                &CollectCondition::NotIn(Compare::namespaces(&[ROLE_NAMESPACE, USER_NAMESPACE])),
                UNBOUNDED_DEPTH,
            )
            .await
    }

    async fn holders_of(
        &self,
        cancel: &Cancellation,
        object: &Vertex,
        namespace: &str,
    ) -> Result<Vec<String>> {
        let holders = self
            .engine
            .search_vertices(
                cancel,
                object,
                Direction::Backward,
                &SearchCondition::unrestricted(),
                &CollectCondition::In(Compare::namespaces(&[namespace])),
                UNBOUNDED_DEPTH,
            )
            .await?;
        Ok(holders.into_iter().map(|vertex| vertex.name).collect())
    }
}
