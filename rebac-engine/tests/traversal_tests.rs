//! Traversal tests for the graph engine
//!
//! Each test seeds an in-memory store with a small graph and asserts on one
//! traversal property: termination on cycles, reachability, depth bounds,
//! collection rules, deduplication, tree shape and cancellation.

use async_trait::async_trait;
use rebac_engine::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn v(namespace: &str, name: &str) -> Vertex {
    Vertex::new(namespace, name)
}

fn e(subject: &Vertex, relation: &str, object: &Vertex) -> Edge {
    Edge::new(subject, relation, object)
}

fn create_test_engine(edges: Vec<Edge>) -> GraphEngine {
    GraphEngine::new(Arc::new(InMemoryEdgeStore::with_edges(edges)))
}

async fn forward_vertices(engine: &GraphEngine, start: &Vertex, max_depth: usize) -> Vec<Vertex> {
    engine
        .search_vertices(
            &Cancellation::none(),
            start,
            Direction::Forward,
            &SearchCondition::unrestricted(),
            &CollectCondition::everything(),
            max_depth,
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn test_all_operations_terminate_on_cycles() {
    let a = v("n", "a");
    let b = v("n", "b");
    let engine = create_test_engine(vec![e(&a, "r", &a), e(&a, "r", &b), e(&b, "r", &a)]);
    let none = Cancellation::none();

    let missing = engine
        .check(&none, &a, &v("n", "z"), "r", &SearchCondition::unrestricted())
        .await
        .unwrap();
    assert!(!missing, "Unreachable target must be reported after the cycle is exhausted");

    // The self-loop reports the start vertex as its own neighbour
    let vertices = forward_vertices(&engine, &a, UNBOUNDED_DEPTH).await;
    assert_eq!(vertices, vec![a.clone(), b.clone()]);

    let permissions = engine
        .search_permissions(
            &none,
            &a,
            Direction::Backward,
            &SearchCondition::unrestricted(),
            &CollectCondition::everything(),
            UNBOUNDED_DEPTH,
        )
        .await
        .unwrap();
    assert_eq!(
        permissions,
        vec![Permission::new("r", "n", "a"), Permission::new("r", "n", "b")]
    );

    let tree = engine.get_tree(&none, &a, UNBOUNDED_DEPTH).await.unwrap();
    assert_eq!(tree.len(), 2, "Each vertex appears once in the tree");
    let b_id = tree.find(&b).unwrap();
    assert_eq!(tree.children(tree.root, "r"), vec![a.clone(), b.clone()]);
    assert_eq!(tree.children(b_id, "r"), vec![a]);
}

#[tokio::test]
async fn test_check_matches_final_hop_relation() {
    let alice = Vertex::user("alice");
    let editor = Vertex::role("editor");
    let superadmin = Vertex::role("superadmin");
    let engine = create_test_engine(vec![
        e(&alice, "member", &editor),
        e(&editor, "parent", &superadmin),
    ]);
    let none = Cancellation::none();
    let anywhere = SearchCondition::unrestricted();

    // Reached through `parent`, not through the `member` edge earlier on the path
    assert!(engine.check(&none, &alice, &superadmin, "parent", &anywhere).await.unwrap());
    assert!(!engine.check(&none, &alice, &superadmin, "member", &anywhere).await.unwrap());
    assert!(engine.check(&none, &alice, &editor, "member", &anywhere).await.unwrap());

    let reached = forward_vertices(&engine, &alice, UNBOUNDED_DEPTH).await;
    assert!(reached.contains(&superadmin));
}

#[tokio::test]
async fn test_check_respects_search_condition() {
    let alice = Vertex::user("alice");
    let group = v("group", "staff");
    let editor = Vertex::role("editor");
    let doc = v("doc", "report1");
    let engine = create_test_engine(vec![
        e(&alice, "member", &group),
        e(&group, "member", &editor),
        e(&editor, "edit", &doc),
    ]);
    let none = Cancellation::none();

    let roles_only = SearchCondition::within(Compare::namespaces(&["role"]));
    assert!(
        !engine.check(&none, &alice, &doc, "edit", &roles_only).await.unwrap(),
        "Expansion must stop at the group vertex"
    );

    // The final edge is tested even when its object would not be expanded
    assert!(engine.check(&none, &alice, &group, "member", &roles_only).await.unwrap());

    let groups_and_roles = SearchCondition::within(Compare::namespaces(&["group", "role"]));
    assert!(engine.check(&none, &alice, &doc, "edit", &groups_and_roles).await.unwrap());
}

#[tokio::test]
async fn test_search_depth_bound_on_chain() {
    let (a, b, c, d) = (v("n", "a"), v("n", "b"), v("n", "c"), v("n", "d"));
    let engine = create_test_engine(vec![e(&a, "r", &b), e(&b, "r", &c), e(&c, "r", &d)]);

    assert!(forward_vertices(&engine, &a, 0).await.is_empty());
    assert_eq!(forward_vertices(&engine, &a, 1).await, vec![b.clone()]);
    assert_eq!(forward_vertices(&engine, &a, 2).await, vec![b.clone(), c.clone()]);
    assert_eq!(forward_vertices(&engine, &a, UNBOUNDED_DEPTH).await, vec![b, c, d]);
}

#[tokio::test]
async fn test_collect_condition_is_or_of_ors() {
    let alice = Vertex::user("alice");
    let editor = Vertex::role("editor");
    let doc = v("doc", "report1");
    let folder = v("folder", "shared");
    let engine = create_test_engine(vec![
        e(&alice, "member", &editor),
        e(&editor, "edit", &doc),
        e(&editor, "view", &folder),
    ]);
    let none = Cancellation::none();

    let collect = CollectCondition::In(Compare {
        namespaces: vec!["role".to_string()],
        names: vec!["nothing-by-this-name".to_string()],
        relations: vec!["no-such-relation".to_string()],
    });
    let roles = engine
        .search_vertices(
            &none,
            &alice,
            Direction::Forward,
            &SearchCondition::unrestricted(),
            &collect,
            UNBOUNDED_DEPTH,
        )
        .await
        .unwrap();
    assert_eq!(roles, vec![editor.clone()]);

    // Namespace OR relation: the role by namespace, the folder by relation
    let collect = CollectCondition::In(Compare {
        namespaces: vec!["role".to_string()],
        relations: vec!["view".to_string()],
        ..Compare::default()
    });
    let mixed = engine
        .search_vertices(
            &none,
            &alice,
            Direction::Forward,
            &SearchCondition::unrestricted(),
            &collect,
            UNBOUNDED_DEPTH,
        )
        .await
        .unwrap();
    assert_eq!(mixed, vec![folder, editor]);
}

#[tokio::test]
async fn test_diamond_reports_shared_vertex_once() {
    let (a, b, c, d) = (v("n", "a"), v("n", "b"), v("n", "c"), v("n", "d"));
    let engine = create_test_engine(vec![
        e(&a, "r", &b),
        e(&a, "r", &c),
        e(&b, "r", &d),
        e(&c, "r", &d),
    ]);

    let vertices = forward_vertices(&engine, &a, 2).await;
    assert_eq!(vertices.iter().filter(|vertex| **vertex == d).count(), 1);
    assert_eq!(vertices, vec![b, c, d]);
}

#[tokio::test]
async fn test_user_permission_listing_end_to_end() {
    let alice = Vertex::user("alice");
    let editor = Vertex::role("editor");
    let engine = create_test_engine(vec![
        e(&alice, "member", &editor),
        e(&editor, "permission", &v("doc", "report1")),
    ]);

    let permissions = engine
        .search_permissions(
            &Cancellation::none(),
            &alice,
            Direction::Forward,
            &SearchCondition::unrestricted(),
            &CollectCondition::NotIn(Compare::namespaces(&["role", "user"])),
            UNBOUNDED_DEPTH,
        )
        .await
        .unwrap();

    assert_eq!(permissions, vec![Permission::new("permission", "doc", "report1")]);
}

#[tokio::test]
async fn test_permission_per_reaching_relation() {
    let editor = Vertex::role("editor");
    let doc = v("doc", "report1");
    let engine = create_test_engine(vec![e(&editor, "edit", &doc), e(&editor, "view", &doc)]);

    let permissions = engine
        .search_permissions(
            &Cancellation::none(),
            &editor,
            Direction::Forward,
            &SearchCondition::unrestricted(),
            &CollectCondition::everything(),
            UNBOUNDED_DEPTH,
        )
        .await
        .unwrap();

    assert_eq!(
        permissions,
        vec![
            Permission::new("edit", "doc", "report1"),
            Permission::new("view", "doc", "report1"),
        ]
    );
}

#[tokio::test]
async fn test_backward_search_finds_holders() {
    let alice = Vertex::user("alice");
    let bob = Vertex::user("bob");
    let editor = Vertex::role("editor");
    let doc = v("doc", "report1");
    let engine = create_test_engine(vec![
        e(&alice, "member", &editor),
        e(&editor, "edit", &doc),
        e(&bob, "view", &doc),
    ]);

    let users = engine
        .search_vertices(
            &Cancellation::none(),
            &doc,
            Direction::Backward,
            &SearchCondition::unrestricted(),
            &CollectCondition::In(Compare::namespaces(&["user"])),
            UNBOUNDED_DEPTH,
        )
        .await
        .unwrap();

    assert_eq!(users, vec![alice, bob]);
}

#[tokio::test]
async fn test_get_tree_shares_nodes_and_keeps_siblings() {
    let admin = Vertex::role("admin");
    let editor = Vertex::role("editor");
    let viewer = Vertex::role("viewer");
    let doc1 = v("doc", "d1");
    let doc2 = v("doc", "d2");
    let engine = create_test_engine(vec![
        e(&admin, "parent", &editor),
        e(&admin, "parent", &viewer),
        e(&editor, "parent", &viewer),
        e(&viewer, "view", &doc1),
        e(&viewer, "view", &doc2),
        e(&viewer, "view", &doc2),
    ]);

    let tree = engine
        .get_tree(&Cancellation::none(), &admin, UNBOUNDED_DEPTH)
        .await
        .unwrap();

    assert_eq!(tree.root_node().map(TreeNode::vertex), Some(admin.clone()));
    assert_eq!(tree.len(), 5);
    assert_eq!(tree.children(tree.root, "parent"), vec![editor.clone(), viewer.clone()]);

    // Viewer is reached from both admin and editor but materialized once
    let editor_id = tree.find(&editor).unwrap();
    let viewer_id = tree.find(&viewer).unwrap();
    let root_children = tree.root_node().unwrap().children.get("parent").unwrap();
    assert!(root_children.contains(&viewer_id));
    assert_eq!(
        tree.node(editor_id).unwrap().children.get("parent"),
        Some(&vec![viewer_id])
    );

    // Same relation to different objects keeps both; duplicates collapse
    assert_eq!(tree.children(viewer_id, "view"), vec![doc1, doc2]);
}

#[tokio::test]
async fn test_get_tree_depth_bound() {
    let (a, b, c) = (v("n", "a"), v("n", "b"), v("n", "c"));
    let engine = create_test_engine(vec![e(&a, "r", &b), e(&b, "r", &c)]);
    let none = Cancellation::none();

    let bare = engine.get_tree(&none, &a, 0).await.unwrap();
    assert_eq!(bare.len(), 1);

    let shallow = engine.get_tree(&none, &a, 1).await.unwrap();
    assert_eq!(shallow.len(), 2);
    let b_id = shallow.find(&b).unwrap();
    assert!(shallow.node(b_id).unwrap().children.is_empty());

    let full = engine.get_tree(&none, &a, UNBOUNDED_DEPTH).await.unwrap();
    assert_eq!(full.len(), 3);
}

#[tokio::test]
async fn test_get_tree_without_outgoing_edges_is_not_found() {
    let (a, b) = (v("n", "a"), v("n", "b"));
    let engine = create_test_engine(vec![e(&a, "r", &b)]);

    let result = engine
        .get_tree(&Cancellation::none(), &b, UNBOUNDED_DEPTH)
        .await;
    assert!(matches!(result, Err(GraphError::NotFound)));
}

/// Serves a fixed chain and stalls forever on the vertex named "stall"
struct StallingStore {
    inner: InMemoryEdgeStore,
    lookups: AtomicUsize,
}

#[async_trait]
impl EdgeStore for StallingStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn get(&self, filter: &Edge, mode: QueryMode) -> Result<Vec<Edge>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if filter.subject_name == "stall" {
            std::future::pending::<()>().await;
        }
        self.inner.get(filter, mode).await
    }

    async fn create(&self, edge: Edge) -> Result<()> {
        self.inner.create(edge).await
    }

    async fn delete(&self, filter: &Edge, mode: QueryMode) -> Result<()> {
        self.inner.delete(filter, mode).await
    }

    async fn clear_all(&self) -> Result<()> {
        self.inner.clear_all().await
    }
}

fn stalling_store() -> Arc<StallingStore> {
    let (a, stall) = (v("n", "a"), v("n", "stall"));
    Arc::new(StallingStore {
        inner: InMemoryEdgeStore::with_edges([e(&a, "r", &stall)]),
        lookups: AtomicUsize::new(0),
    })
}

#[tokio::test]
async fn test_cancellation_during_traversal() {
    let store = stalling_store();
    let engine = Arc::new(GraphEngine::new(store.clone()));
    let (handle, cancel) = Cancellation::new();

    let task = {
        let engine = engine.clone();
        tokio::spawn(async move {
            engine
                .search_vertices(
                    &cancel,
                    &Vertex::new("n", "a"),
                    Direction::Forward,
                    &SearchCondition::unrestricted(),
                    &CollectCondition::everything(),
                    UNBOUNDED_DEPTH,
                )
                .await
        })
    };

    while store.lookups.load(Ordering::SeqCst) < 2 {
        tokio::task::yield_now().await;
    }
    handle.cancel();

    let result = task.await.unwrap();
    assert!(matches!(result, Err(GraphError::Cancelled)), "got {:?}", result);
}

#[tokio::test]
async fn test_cancellation_before_start() {
    let engine = create_test_engine(vec![e(&v("n", "a"), "r", &v("n", "b"))]);
    let (handle, cancel) = Cancellation::new();
    handle.cancel();

    let result = engine
        .check(
            &cancel,
            &v("n", "a"),
            &v("n", "b"),
            "r",
            &SearchCondition::unrestricted(),
        )
        .await;
    assert!(matches!(result, Err(GraphError::Cancelled)));
}

#[tokio::test(start_paused = true)]
async fn test_deadline_surfaces_timeout() {
    let config = EngineConfig {
        timeout_ms: Some(250),
        ..EngineConfig::default()
    };
    let engine = GraphEngine::with_config(stalling_store(), config);

    let result = engine
        .check(
            &Cancellation::none(),
            &v("n", "a"),
            &v("n", "nowhere"),
            "r",
            &SearchCondition::unrestricted(),
        )
        .await;

    match result {
        Err(GraphError::Timeout(limit)) => assert_eq!(limit, Duration::from_millis(250)),
        other => panic!("expected timeout, got {:?}", other),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_operations_run_on_spawned_tasks() {
    let (a, b, c, d) = (v("n", "a"), v("n", "b"), v("n", "c"), v("n", "d"));
    let engine = Arc::new(create_test_engine(vec![
        e(&a, "r", &b),
        e(&a, "r", &c),
        e(&b, "r", &d),
        e(&c, "r", &d),
    ]));

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let engine = engine.clone();
        let (a, d) = (a.clone(), d.clone());
        tasks.push(tokio::spawn(async move {
            let cancel = Cancellation::none();
            let search = SearchCondition::unrestricted();
            let collect = CollectCondition::everything();

            let allowed = engine.check(&cancel, &a, &d, "r", &search).await?;
            let vertices = engine
                .search_vertices(
                    &cancel,
                    &a,
                    Direction::Forward,
                    &search,
                    &collect,
                    UNBOUNDED_DEPTH,
                )
                .await?;
            let permissions = engine
                .search_permissions(
                    &cancel,
                    &d,
                    Direction::Backward,
                    &search,
                    &collect,
                    UNBOUNDED_DEPTH,
                )
                .await?;
            let tree = engine.get_tree(&cancel, &a, UNBOUNDED_DEPTH).await?;
            Ok::<_, GraphError>((allowed, vertices.len(), permissions.len(), tree.len()))
        }));
    }

    for task in tasks {
        let (allowed, vertices, permissions, nodes) = task.await.unwrap().unwrap();
        assert!(allowed);
        assert_eq!(vertices, 3);
        assert_eq!(permissions, 3);
        assert_eq!(nodes, 4);
    }
}
