use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    Json,
};
use rebac_engine::Permission;
use serde::{Deserialize, Serialize};

use super::{require, GrantRequest, NameQuery};
use crate::{
    error::{api_success, ApiResponse, ApiResult},
    server::RebacServer,
};

/// `parent` inherits everything `child` grants
#[derive(Debug, Serialize, Deserialize)]
pub struct InheritRequest {
    pub parent: String,
    pub child: String,
}

impl InheritRequest {
    fn validate(&self) -> ApiResult<()> {
        require("parent", &self.parent)?;
        require("child", &self.child)
    }
}

pub async fn delete_role(
    State(server): State<RebacServer>,
    query: Result<Query<NameQuery>, QueryRejection>,
) -> ApiResult<StatusCode> {
    let Query(query) = query?;
    require("name", &query.name)?;
    server.service.delete_role(&query.name).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_users(
    State(server): State<RebacServer>,
    query: Result<Query<NameQuery>, QueryRejection>,
) -> ApiResult<Json<ApiResponse<Vec<String>>>> {
    let Query(query) = query?;
    require("name", &query.name)?;
    let users = server.service.role_users(&query.name).await?;
    Ok(Json(api_success(users)))
}

pub async fn get_permissions(
    State(server): State<RebacServer>,
    query: Result<Query<NameQuery>, QueryRejection>,
) -> ApiResult<Json<ApiResponse<Vec<Permission>>>> {
    let Query(query) = query?;
    require("name", &query.name)?;
    let permissions = server
        .service
        .role_permissions(server.cancellation(), &query.name)
        .await?;
    Ok(Json(api_success(permissions)))
}

pub async fn add_permission(
    State(server): State<RebacServer>,
    payload: Result<Json<GrantRequest>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Json(grant) = payload?;
    grant.validate()?;
    server
        .service
        .role_add_permission(&grant.name, &grant.object_ns, &grant.relation, &grant.object_name)
        .await?;
    Ok(StatusCode::CREATED)
}

pub async fn remove_permission(
    State(server): State<RebacServer>,
    payload: Result<Json<GrantRequest>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Json(grant) = payload?;
    grant.validate()?;
    server
        .service
        .role_remove_permission(&grant.name, &grant.object_ns, &grant.relation, &grant.object_name)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn inherit(
    State(server): State<RebacServer>,
    payload: Result<Json<InheritRequest>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Json(request) = payload?;
    request.validate()?;
    server
        .service
        .role_inherit(&request.parent, &request.child)
        .await?;
    Ok(StatusCode::CREATED)
}

pub async fn uninherit(
    State(server): State<RebacServer>,
    payload: Result<Json<InheritRequest>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Json(request) = payload?;
    request.validate()?;
    server
        .service
        .role_uninherit(&request.parent, &request.child)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_children(
    State(server): State<RebacServer>,
    query: Result<Query<NameQuery>, QueryRejection>,
) -> ApiResult<Json<ApiResponse<Vec<String>>>> {
    let Query(query) = query?;
    require("name", &query.name)?;
    let children = server.service.role_children(&query.name).await?;
    Ok(Json(api_success(children)))
}

pub async fn get_parents(
    State(server): State<RebacServer>,
    query: Result<Query<NameQuery>, QueryRejection>,
) -> ApiResult<Json<ApiResponse<Vec<String>>>> {
    let Query(query) = query?;
    require("name", &query.name)?;
    let parents = server.service.role_parents(&query.name).await?;
    Ok(Json(api_success(parents)))
}
