pub mod edges;
pub mod graph;
pub mod health;
pub mod objects;
pub mod roles;
pub mod users;

use crate::error::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};

/// `?name=` selector shared by user and role endpoints
#[derive(Debug, Deserialize)]
pub struct NameQuery {
    pub name: String,
}

/// A direct grant held by a user or role on an object
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantRequest {
    pub name: String,
    pub relation: String,
    pub object_ns: String,
    pub object_name: String,
}

impl GrantRequest {
    fn validate(&self) -> ApiResult<()> {
        require("name", &self.name)?;
        require("relation", &self.relation)?;
        require("objectNs", &self.object_ns)?;
        require("objectName", &self.object_name)
    }
}

/// Reject empty or whitespace-only request fields
pub(crate) fn require(field: &str, value: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::body_attribute(format!("`{}` must not be empty", field)));
    }
    Ok(())
}
