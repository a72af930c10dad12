use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    Json,
};
use rebac_engine::{Edge, Operation, QueryMode};
use serde::{Deserialize, Serialize};

use crate::{
    error::{api_success, ApiError, ApiResponse, ApiResult},
    server::RebacServer,
};

/// Edge filter in a query string: any subset of the five edge fields plus
/// `mode=pattern|exact`
#[derive(Debug, Deserialize)]
pub struct EdgeQuery {
    #[serde(flatten)]
    pub filter: Edge,
    #[serde(default)]
    pub mode: QueryMode,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchRequest {
    pub operations: Vec<Operation>,
}

fn require_complete(edge: &Edge) -> ApiResult<()> {
    let fields = [
        ("subjectNs", &edge.subject_ns),
        ("subjectName", &edge.subject_name),
        ("relation", &edge.relation),
        ("objectNs", &edge.object_ns),
        ("objectName", &edge.object_name),
    ];
    for (field, value) in fields {
        super::require(field, value)?;
    }
    Ok(())
}

pub async fn get_edges(
    State(server): State<RebacServer>,
    query: Result<Query<EdgeQuery>, QueryRejection>,
) -> ApiResult<Json<ApiResponse<Vec<Edge>>>> {
    let Query(query) = query?;
    let edges = server.service.get_edges(&query.filter, query.mode).await?;
    Ok(Json(api_success(edges)))
}

pub async fn create_edge(
    State(server): State<RebacServer>,
    payload: Result<Json<Edge>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Json(edge) = payload?;
    require_complete(&edge)?;
    server.service.create_edge(edge).await?;
    Ok(StatusCode::CREATED)
}

/// An empty pattern would match every edge; that is what `/edges/all` is for
pub async fn delete_edges(
    State(server): State<RebacServer>,
    query: Result<Query<EdgeQuery>, QueryRejection>,
) -> ApiResult<StatusCode> {
    let Query(query) = query?;
    if query.filter == Edge::default() {
        return Err(ApiError::body_attribute(
            "empty edge filter; use DELETE /edges/all to remove every edge",
        ));
    }
    server.service.delete_edges(&query.filter, query.mode).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn clear_all(State(server): State<RebacServer>) -> ApiResult<StatusCode> {
    server.service.clear_all().await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn batch(
    State(server): State<RebacServer>,
    payload: Result<Json<BatchRequest>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Json(request) = payload?;
    for operation in &request.operations {
        require_complete(&operation.edge)?;
    }
    server.service.batch(request.operations).await?;
    Ok(StatusCode::NO_CONTENT)
}
