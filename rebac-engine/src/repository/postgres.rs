//! PostgreSQL-backed edge store
//!
//! Edges live in a single `rebac_edges` table with one column per edge field.
//! The table carries no uniqueness constraint: duplicate edges are allowed
//! and surface as [`GraphError::DuplicateRecord`] on exact lookups.

use crate::{
    error::{GraphError, Result},
    models::*,
    repository::{ensure_single, EdgeStore},
};
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool, Row};
use tracing::{debug, info};

const SELECT_EDGES: &str =
    "SELECT subject_ns, subject_name, relation, object_ns, object_name FROM rebac_edges";

/// PostgreSQL-backed edge store
#[derive(Debug, Clone)]
pub struct PostgresEdgeStore {
    pool: PgPool,
}

impl PostgresEdgeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create with connection string
    pub async fn connect(connection_string: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(connection_string)
            .await
            .map_err(|e| GraphError::StorageError(format!("Failed to connect: {}", e)))?;

        Ok(Self::new(pool))
    }

    /// Create the edge table and its lookup indexes if they are missing
    pub async fn migrate(&self) -> Result<()> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS rebac_edges (
                subject_ns   TEXT NOT NULL,
                subject_name TEXT NOT NULL,
                relation     TEXT NOT NULL,
                object_ns    TEXT NOT NULL,
                object_name  TEXT NOT NULL
            )
            "#,
            "CREATE INDEX IF NOT EXISTS rebac_edges_subject_idx \
             ON rebac_edges (subject_ns, subject_name)",
            "CREATE INDEX IF NOT EXISTS rebac_edges_object_idx \
             ON rebac_edges (object_ns, object_name)",
        ];

        for statement in statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| GraphError::StorageError(format!("Failed to migrate: {}", e)))?;
        }

        info!("Edge table ready");
        Ok(())
    }
}

/// Builds the WHERE clause for a filter; returns the clause and its binds.
///
/// Exact mode compares every column, including empty ones. Pattern mode
/// skips empty fields.
fn where_clause(filter: &Edge, mode: QueryMode) -> (String, Vec<String>) {
    let columns = [
        ("subject_ns", &filter.subject_ns),
        ("subject_name", &filter.subject_name),
        ("relation", &filter.relation),
        ("object_ns", &filter.object_ns),
        ("object_name", &filter.object_name),
    ];

    let mut conditions = Vec::new();
    let mut binds = Vec::new();
    for (column, value) in columns {
        if mode == QueryMode::Pattern && value.is_empty() {
            continue;
        }
        binds.push(value.clone());
        conditions.push(format!("{} = ${}", column, binds.len()));
    }

    if conditions.is_empty() {
        (String::new(), binds)
    } else {
        (format!(" WHERE {}", conditions.join(" AND ")), binds)
    }
}

#[async_trait]
impl EdgeStore for PostgresEdgeStore {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| GraphError::StorageError(format!("Ping failed: {}", e)))?;
        Ok(())
    }

    async fn get(&self, filter: &Edge, mode: QueryMode) -> Result<Vec<Edge>> {
        debug!("Reading edges: filter={}, mode={:?}", filter, mode);

        let (clause, binds) = where_clause(filter, mode);
        let query = format!("{}{}", SELECT_EDGES, clause);

        let mut sqlx_query = sqlx::query(&query);
        for bind in binds {
            sqlx_query = sqlx_query.bind(bind);
        }

        let rows = sqlx_query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| GraphError::StorageError(format!("Failed to read edges: {}", e)))?;

        let edges: Vec<Edge> = rows
            .iter()
            .map(|row| Edge {
                subject_ns: row.get("subject_ns"),
                subject_name: row.get("subject_name"),
                relation: row.get("relation"),
                object_ns: row.get("object_ns"),
                object_name: row.get("object_name"),
            })
            .collect();

        if mode == QueryMode::Exact {
            ensure_single(edges.len())?;
        }

        debug!("Found {} edges", edges.len());
        Ok(edges)
    }

    async fn create(&self, edge: Edge) -> Result<()> {
        debug!("Writing edge to PostgreSQL: {}", edge);

        sqlx::query(
            r#"
            INSERT INTO rebac_edges (subject_ns, subject_name, relation, object_ns, object_name)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&edge.subject_ns)
        .bind(&edge.subject_name)
        .bind(&edge.relation)
        .bind(&edge.object_ns)
        .bind(&edge.object_name)
        .execute(&self.pool)
        .await
        .map_err(|e| GraphError::StorageError(format!("Failed to write edge: {}", e)))?;

        Ok(())
    }

    async fn delete(&self, filter: &Edge, mode: QueryMode) -> Result<()> {
        debug!("Deleting edges: filter={}, mode={:?}", filter, mode);

        let (clause, binds) = where_clause(filter, mode);
        let query = match mode {
            QueryMode::Pattern => format!("DELETE FROM rebac_edges{}", clause),
            QueryMode::Exact => {
                self.get(filter, QueryMode::Exact).await?;
                format!(
                    "DELETE FROM rebac_edges \
                     WHERE ctid IN (SELECT ctid FROM rebac_edges{} LIMIT 1)",
                    clause
                )
            }
        };

        let mut sqlx_query = sqlx::query(&query);
        for bind in binds {
            sqlx_query = sqlx_query.bind(bind);
        }

        let result = sqlx_query
            .execute(&self.pool)
            .await
            .map_err(|e| GraphError::StorageError(format!("Failed to delete edges: {}", e)))?;

        debug!("Deleted {} edges", result.rows_affected());
        Ok(())
    }

    async fn clear_all(&self) -> Result<()> {
        sqlx::query("DELETE FROM rebac_edges")
            .execute(&self.pool)
            .await
            .map_err(|e| GraphError::StorageError(format!("Failed to clear edges: {}", e)))?;

        info!("All edges cleared");
        Ok(())
    }
}
