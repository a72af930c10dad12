use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ApiError, ApiResult},
    server::RebacServer,
};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub msg: String,
    pub version: String,
}

/// Liveness: answers whenever the process is serving requests
pub async fn ping() -> Json<HealthResponse> {
    Json(HealthResponse {
        msg: "pong".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Readiness: the edge store must answer too
pub async fn healthy(State(server): State<RebacServer>) -> ApiResult<Json<HealthResponse>> {
    server
        .service
        .healthy()
        .await
        .map_err(|e| ApiError::ServiceUnavailable {
            message: e.to_string(),
        })?;

    Ok(Json(HealthResponse {
        msg: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}
