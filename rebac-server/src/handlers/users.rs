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
    handlers::graph::CheckResponse,
    server::RebacServer,
};

#[derive(Debug, Serialize, Deserialize)]
pub struct UserRoleRequest {
    pub name: String,
    pub role: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCheckQuery {
    pub name: String,
    pub relation: String,
    pub object_ns: String,
    pub object_name: String,
}

pub async fn delete_user(
    State(server): State<RebacServer>,
    query: Result<Query<NameQuery>, QueryRejection>,
) -> ApiResult<StatusCode> {
    let Query(query) = query?;
    require("name", &query.name)?;
    server.service.delete_user(&query.name).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_permissions(
    State(server): State<RebacServer>,
    query: Result<Query<NameQuery>, QueryRejection>,
) -> ApiResult<Json<ApiResponse<Vec<Permission>>>> {
    let Query(query) = query?;
    require("name", &query.name)?;
    let permissions = server
        .service
        .user_permissions(server.cancellation(), &query.name)
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
        .user_add_permission(&grant.name, &grant.object_ns, &grant.relation, &grant.object_name)
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
        .user_remove_permission(&grant.name, &grant.object_ns, &grant.relation, &grant.object_name)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_roles(
    State(server): State<RebacServer>,
    query: Result<Query<NameQuery>, QueryRejection>,
) -> ApiResult<Json<ApiResponse<Vec<String>>>> {
    let Query(query) = query?;
    require("name", &query.name)?;
    let roles = server
        .service
        .user_roles(server.cancellation(), &query.name)
        .await?;
    Ok(Json(api_success(roles)))
}

pub async fn add_role(
    State(server): State<RebacServer>,
    payload: Result<Json<UserRoleRequest>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Json(request) = payload?;
    require("name", &request.name)?;
    require("role", &request.role)?;
    server.service.user_add_role(&request.name, &request.role).await?;
    Ok(StatusCode::CREATED)
}

pub async fn remove_role(
    State(server): State<RebacServer>,
    payload: Result<Json<UserRoleRequest>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Json(request) = payload?;
    require("name", &request.name)?;
    require("role", &request.role)?;
    server
        .service
        .user_remove_role(&request.name, &request.role)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// 200 when allowed, 403 otherwise; the body carries the verdict either way
pub async fn check(
    State(server): State<RebacServer>,
    query: Result<Query<UserCheckQuery>, QueryRejection>,
) -> ApiResult<(StatusCode, Json<CheckResponse>)> {
    let Query(query) = query?;
    require("name", &query.name)?;
    require("relation", &query.relation)?;
    require("objectNs", &query.object_ns)?;
    require("objectName", &query.object_name)?;

    let allowed = server
        .service
        .user_check(
            server.cancellation(),
            &query.name,
            &query.object_ns,
            &query.relation,
            &query.object_name,
        )
        .await?;

    let status = if allowed {
        StatusCode::OK
    } else {
        StatusCode::FORBIDDEN
    };
    Ok((status, Json(CheckResponse { allowed })))
}
