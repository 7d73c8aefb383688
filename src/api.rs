use crate::dto::HealthStatus;
use crate::routing_utils::{AuthErrorResponse, Json};
use crate::token::TokenService;
use crate::{SharedData, dto};
use axum::Router;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::header;
use axum::http::request::Parts;
use axum::routing::get;
use std::sync::Arc;
use utoipa::OpenApi;

pub mod auth;
pub mod swagger_main;
pub mod task;

#[cfg(test)]
pub mod test_util;

/// Extractor which rejects requests that don't carry a valid bearer token and hands
/// the verified user's ID to handlers that accept it.
///
/// Requests without a usable `Authorization: Bearer` header are turned away with a 401
/// before any handler logic runs; requests whose token fails verification get a 403.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Authenticated(pub i32);

#[axum::async_trait]
impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
    TokenService: FromRef<S>,
{
    type Rejection = AuthErrorResponse;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|header_value| header_value.to_str().ok());
        let Some(token) = auth_header.and_then(|header_value| header_value.strip_prefix("Bearer "))
        else {
            return Err(AuthErrorResponse::TokenRequired);
        };

        let token_service = TokenService::from_ref(state);
        let identity = token_service
            .verify(token)
            .map_err(|_| AuthErrorResponse::InvalidToken)?;

        Ok(Authenticated(identity.user_id))
    }
}

#[derive(OpenApi)]
#[openapi(paths(health_check))]
/// Defines the OpenAPI documentation for the health API
pub struct HealthApi;
/// Constant used to group health endpoints in OpenAPI documentation
pub const HEALTH_API_GROUP: &str = "Health";

/// Builds a router for the health probe
pub fn health_routes() -> Router<Arc<SharedData>> {
    Router::new().route("/health", get(health_check))
}

#[utoipa::path(
    get,
    path = "/api/health",
    tag = HEALTH_API_GROUP,
    responses(
        (status = 200, description = "The service is up and able to serve requests", body = HealthStatus),
    ),
)]
/// Reports whether the service is up
async fn health_check() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_owned(),
        message: "Task management API is running".to_owned(),
    })
}
