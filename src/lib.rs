use crate::persistence::ExternalConnectivity;
use crate::token::TokenService;
use axum::Router;
use axum::extract::{FromRef, State};
use std::sync::Arc;

pub mod api;
pub mod app_env;
pub mod client;
pub mod db;
pub mod domain;
pub mod dto;
pub mod external_connections;
pub mod logging;
pub mod patch;
pub mod persistence;
pub mod routing_utils;
pub mod token;


/// Contains the set of clients and services every request handler shares
pub struct SharedData {
    pub ext_cxn: ExternalConnectivity,
    pub tokens: TokenService,
}

/// Type alias for extracting the app's shared state in a handler
pub type AppState = State<Arc<SharedData>>;

impl FromRef<Arc<SharedData>> for TokenService {
    fn from_ref(shared: &Arc<SharedData>) -> TokenService {
        shared.tokens.clone()
    }
}

/// Assembles the complete application router: the REST API under `/api`, the rendered
/// OpenAPI documentation, and the HTTP tracing layer wrapped around all of it.
pub fn app_router(shared_data: Arc<SharedData>) -> Router {
    let api_routes = Router::new()
        .merge(api::health_routes())
        .nest("/auth", api::auth::auth_routes())
        .nest("/tasks", api::task::task_routes());

    let app = Router::new()
        .nest("/api", api_routes)
        .merge(api::swagger_main::build_documentation())
        .with_state(shared_data);

    logging::attach_tracing_http(app)
}
