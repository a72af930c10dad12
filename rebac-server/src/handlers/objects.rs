use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use super::require;
use crate::{
    error::{api_success, ApiResponse, ApiResult},
    server::RebacServer,
};

#[derive(Debug, Deserialize)]
pub struct ObjectQuery {
    pub ns: String,
    pub name: String,
}

impl ObjectQuery {
    fn validate(&self) -> ApiResult<()> {
        require("ns", &self.ns)?;
        require("name", &self.name)
    }
}

/// Removes every grant on the object; grants held by the object are kept
pub async fn delete_object(
    State(server): State<RebacServer>,
    query: Result<Query<ObjectQuery>, QueryRejection>,
) -> ApiResult<StatusCode> {
    let Query(query) = query?;
    query.validate()?;
    server.service.delete_object(&query.ns, &query.name).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_roles(
    State(server): State<RebacServer>,
    query: Result<Query<ObjectQuery>, QueryRejection>,
) -> ApiResult<Json<ApiResponse<Vec<String>>>> {
    let Query(query) = query?;
    query.validate()?;
    let roles = server
        .service
        .object_roles(server.cancellation(), &query.ns, &query.name)
        .await?;
    Ok(Json(api_success(roles)))
}

pub async fn get_users(
    State(server): State<RebacServer>,
    query: Result<Query<ObjectQuery>, QueryRejection>,
) -> ApiResult<Json<ApiResponse<Vec<String>>>> {
    let Query(query) = query?;
    query.validate()?;
    let users = server
        .service
        .object_users(server.cancellation(), &query.ns, &query.name)
        .await?;
    Ok(Json(api_success(users)))
}
