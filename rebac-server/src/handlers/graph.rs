use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use rebac_engine::{
    CollectCondition, Direction, Permission, SearchCondition, Tree, Vertex, UNBOUNDED_DEPTH,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{api_success, ApiResponse, ApiResult},
    server::RebacServer,
};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckRequest {
    pub start: Vertex,
    pub target: Vertex,
    pub relation: String,
    #[serde(default)]
    pub search_condition: SearchCondition,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CheckResponse {
    pub allowed: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub start: Vertex,
    #[serde(default = "forward")]
    pub direction: Direction,
    #[serde(default)]
    pub search_condition: SearchCondition,
    #[serde(default)]
    pub collect_condition: CollectCondition,
    /// Omitted means the whole reachable closure
    pub max_depth: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeRequest {
    pub start: Vertex,
    pub max_depth: Option<usize>,
}

fn forward() -> Direction {
    Direction::Forward
}

fn validate_vertex(field: &str, vertex: &Vertex) -> ApiResult<()> {
    super::require(&format!("{}.namespace", field), &vertex.namespace)?;
    super::require(&format!("{}.name", field), &vertex.name)
}

pub async fn check(
    State(server): State<RebacServer>,
    payload: Result<Json<CheckRequest>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<CheckResponse>>> {
    let Json(request) = payload?;
    validate_vertex("start", &request.start)?;
    validate_vertex("target", &request.target)?;
    super::require("relation", &request.relation)?;

    let allowed = server
        .service
        .check(
            server.cancellation(),
            &request.start,
            &request.target,
            &request.relation,
            &request.search_condition,
        )
        .await?;
    Ok(Json(api_success(CheckResponse { allowed })))
}

pub async fn search_vertices(
    State(server): State<RebacServer>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<Vec<Vertex>>>> {
    let Json(request) = payload?;
    validate_vertex("start", &request.start)?;

    let vertices = server
        .service
        .search_vertices(
            server.cancellation(),
            &request.start,
            request.direction,
            &request.search_condition,
            &request.collect_condition,
            request.max_depth.unwrap_or(UNBOUNDED_DEPTH),
        )
        .await?;
    Ok(Json(api_success(vertices)))
}

pub async fn search_permissions(
    State(server): State<RebacServer>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<Vec<Permission>>>> {
    let Json(request) = payload?;
    validate_vertex("start", &request.start)?;

    let permissions = server
        .service
        .search_permissions(
            server.cancellation(),
            &request.start,
            request.direction,
            &request.search_condition,
            &request.collect_condition,
            request.max_depth.unwrap_or(UNBOUNDED_DEPTH),
        )
        .await?;
    Ok(Json(api_success(permissions)))
}

pub async fn tree(
    State(server): State<RebacServer>,
    payload: Result<Json<TreeRequest>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<Tree>>> {
    let Json(request) = payload?;
    validate_vertex("start", &request.start)?;

    let tree = server
        .service
        .get_tree(
            server.cancellation(),
            &request.start,
            request.max_depth.unwrap_or(UNBOUNDED_DEPTH),
        )
        .await?;
    Ok(Json(api_success(tree)))
}
