//! Relationship graph engine for relationship-based access control (ReBAC)
//!
//! Authorization facts are stored as directed, labelled edges between typed
//! vertices. Questions about access become traversals of that graph:
//! - **Check**: is a target vertex reachable through a given relation?
//! - **SearchVertices**: which vertices are reachable within a depth bound?
//! - **SearchPermissions**: the same, but tagged with the reaching relation
//! - **GetTree**: the outgoing structure below a vertex
//!
//! # Core Concepts
//!
//! - **Vertex**: a `namespace:name` pair, e.g. `user:alice` or `doc:report1`
//! - **Edge**: `subject --relation--> object`
//! - **SearchCondition**: which discovered vertices are expanded further
//! - **CollectCondition**: which discovered vertices are reported
//!
//! # Example
//!
//! ```rust
//! use rebac_engine::{
//!     Cancellation, Edge, GraphEngine, InMemoryEdgeStore, SearchCondition, Vertex,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = InMemoryEdgeStore::with_edges([
//!         Edge::new(&Vertex::user("alice"), "member", &Vertex::role("editor")),
//!         Edge::new(&Vertex::role("editor"), "edit", &Vertex::new("doc", "report1")),
//!     ]);
//!     let engine = GraphEngine::new(Arc::new(store));
//!
//!     let allowed = engine
//!         .check(
//!             &Cancellation::none(),
//!             &Vertex::user("alice"),
//!             &Vertex::new("doc", "report1"),
//!             "edit",
//!             &SearchCondition::unrestricted(),
//!         )
//!         .await?;
//!     assert!(allowed);
//!
//!     Ok(())
//! }
//! ```

pub mod cancel;
pub mod check;
pub mod condition;
pub mod engine;
pub mod error;
pub mod models;
pub mod reader;
pub mod repository;
pub mod search;
pub mod service;
pub mod tree;

pub use cancel::{CancelHandle, Cancellation};
pub use condition::{CollectCondition, Compare, SearchCondition};
pub use engine::GraphEngine;
pub use error::*;
pub use models::*;
pub use reader::EngineConfig;
pub use repository::{EdgeStore, InMemoryEdgeStore, PostgresEdgeStore};
pub use search::UNBOUNDED_DEPTH;
pub use service::RbacService;
pub use tree::{NodeId, Tree, TreeNode};
