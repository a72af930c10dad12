use axum::{
    routing::{delete, get, post},
    Router,
};
use crate::{
    handlers::{edges, graph, health, objects, roles, users},
    server::RebacServer,
};

/// Create health check routes
pub fn health_routes() -> Router<RebacServer> {
    Router::new()
        .route("/ping", get(health::ping))
        .route("/healthy", get(health::healthy))
}

/// Raw edge access
pub fn edge_routes() -> Router<RebacServer> {
    Router::new()
        .route(
            "/edges",
            get(edges::get_edges)
                .post(edges::create_edge)
                .delete(edges::delete_edges),
        )
        .route("/edges/all", delete(edges::clear_all))
        .route("/edges/batch", post(edges::batch))
}

/// Generic traversal queries
pub fn graph_routes() -> Router<RebacServer> {
    Router::new()
        .route("/graph/check", post(graph::check))
        .route("/graph/search/vertices", post(graph::search_vertices))
        .route("/graph/search/permissions", post(graph::search_permissions))
        .route("/graph/tree", post(graph::tree))
}

pub fn user_routes() -> Router<RebacServer> {
    Router::new()
        .route("/user", delete(users::delete_user))
        .route(
            "/user/permission",
            get(users::get_permissions)
                .post(users::add_permission)
                .delete(users::remove_permission),
        )
        .route(
            "/user/role",
            get(users::get_roles)
                .post(users::add_role)
                .delete(users::remove_role),
        )
        .route("/user/check", get(users::check))
}

pub fn role_routes() -> Router<RebacServer> {
    Router::new()
        .route("/role", delete(roles::delete_role))
        .route("/role/user", get(roles::get_users))
        .route(
            "/role/permission",
            get(roles::get_permissions)
                .post(roles::add_permission)
                .delete(roles::remove_permission),
        )
        .route("/role/inherit", post(roles::inherit).delete(roles::uninherit))
        .route("/role/child", get(roles::get_children))
        .route("/role/parent", get(roles::get_parents))
}

pub fn object_routes() -> Router<RebacServer> {
    Router::new()
        .route("/object", delete(objects::delete_object))
        .route("/object/role", get(objects::get_roles))
        .route("/object/user", get(objects::get_users))
}

/// Create all routes
pub fn create_routes() -> Router<RebacServer> {
    Router::new()
        .merge(health_routes())
        .merge(edge_routes())
        .merge(graph_routes())
        .merge(user_routes())
        .merge(role_routes())
        .merge(object_routes())
}
