//! HTTP API for the relationship-based access control engine
//!
//! Exposes raw edge management, the generic graph traversals and a
//! user/role/object vocabulary on top of them.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;

// Re-export commonly used types
pub use config::ServerConfig;
pub use error::*;
pub use server::RebacServer;

use axum::{middleware::from_fn, Router};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Create the main application router with all routes and middleware
pub fn create_app(server: RebacServer) -> Router {
    let cors = middleware::create_cors_layer(&server.config.allowed_origins);

    routes::create_routes()
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(from_fn(middleware::request_timing_middleware)),
        )
        .with_state(server)
}
