use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use rebac_engine::GraphError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};
use uuid::Uuid;

/// Standard API error response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Error type/code
    pub error_type: String,
    /// Human-readable error message
    pub message: String,
    /// Timestamp when error occurred
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Suggested actions for resolving the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
}

/// Standard API success response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

/// Main API error enum
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing, empty or malformed request attributes
    #[error("Invalid request: {message}")]
    BodyAttribute { message: String },

    #[error("Service unavailable: {message}")]
    ServiceUnavailable { message: String },

    #[error(transparent)]
    Graph(#[from] GraphError),
}

impl ApiError {
    pub fn body_attribute(message: impl Into<String>) -> Self {
        Self::BodyAttribute {
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BodyAttribute { .. } => StatusCode::BAD_REQUEST,
            ApiError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Graph(graph_err) => match graph_err {
                GraphError::NotFound => StatusCode::NOT_FOUND,
                GraphError::DuplicateRecord => StatusCode::CONFLICT,
                GraphError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
                GraphError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
                GraphError::StorageError(_) => StatusCode::SERVICE_UNAVAILABLE,
            },
        }
    }

    /// Get the error type string
    pub fn error_type(&self) -> &'static str {
        match self {
            ApiError::BodyAttribute { .. } => "body_attribute_error",
            ApiError::ServiceUnavailable { .. } => "service_unavailable",
            ApiError::Graph(graph_err) => match graph_err {
                GraphError::NotFound => "not_found",
                GraphError::DuplicateRecord => "duplicate_record",
                GraphError::Cancelled => "cancelled",
                GraphError::Timeout(_) => "timeout",
                GraphError::StorageError(_) => "storage_error",
            },
        }
    }

    /// Get suggested actions for resolving the error
    pub fn suggestions(&self) -> Option<Vec<String>> {
        match self {
            ApiError::BodyAttribute { .. } => Some(vec![
                "Check the request for missing or empty fields".to_string(),
            ]),
            ApiError::Graph(GraphError::DuplicateRecord) => Some(vec![
                "The edge is stored more than once; delete it in pattern mode".to_string(),
            ]),
            ApiError::Graph(GraphError::Timeout(_)) => Some(vec![
                "Narrow the search condition or lower maxDepth".to_string(),
            ]),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error_id = Uuid::new_v4().to_string();
        let status_code = self.status_code();

        // Client mistakes are not server errors
        if status_code.is_server_error() {
            error!(
                error_id = %error_id,
                error_type = %self.error_type(),
                status_code = %status_code.as_u16(),
                error = %self,
                "API error occurred"
            );
        } else {
            warn!(
                error_id = %error_id,
                error_type = %self.error_type(),
                status_code = %status_code.as_u16(),
                error = %self,
                "Request rejected"
            );
        }

        let error_response = ApiErrorResponse {
            error_id,
            error_type: self.error_type().to_string(),
            message: self.to_string(),
            timestamp: chrono::Utc::now(),
            suggestions: self.suggestions(),
        };

        (status_code, Json(error_response)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::body_attribute(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::body_attribute(rejection.body_text())
    }
}

/// Helper function to create successful API responses
pub fn api_success<T>(data: T) -> ApiResponse<T> {
    ApiResponse {
        success: true,
        data,
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
