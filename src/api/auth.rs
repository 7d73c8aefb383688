use crate::dto::auth::{Login, Session, Signup};
use crate::external_connections::ExternalConnectivity;
use crate::routing_utils::{BasicErrorResponse, GenericErrorResponse, Json, ValidationErrorResponse};
use crate::token::TokenService;
use crate::{AppState, SharedData, domain, dto, persistence};
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{ErrorResponse, IntoResponse, Response};
use axum::routing::post;
use std::sync::Arc;
use tracing::{error, info};
use utoipa::OpenApi;
use validator::Validate;

#[derive(OpenApi)]
#[openapi(paths(signup, login))]
/// Defines the OpenAPI documentation for the authentication API
pub struct AuthApi;
/// Constant used to group authentication endpoints in OpenAPI documentation
pub const AUTH_API_GROUP: &str = "Authentication";

/// Builds a router for the signup and login routes
pub fn auth_routes() -> Router<Arc<SharedData>> {
    Router::new()
        .route(
            "/signup",
            post(
                |State(app_state): AppState, Json(new_account): Json<Signup>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let auth_service = domain::auth::AuthService {
                        hash_cost: bcrypt::DEFAULT_COST,
                    };

                    signup(new_account, &app_state.tokens, &mut ext_cxn, &auth_service).await
                },
            ),
        )
        .route(
            "/login",
            post(
                |State(app_state): AppState, Json(credentials): Json<Login>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let auth_service = domain::auth::AuthService {
                        hash_cost: bcrypt::DEFAULT_COST,
                    };

                    login(credentials, &app_state.tokens, &mut ext_cxn, &auth_service).await
                },
            ),
        )
}

/// Response type for signup requests that reuse an email some account already registered
struct EmailInUseResponse;

impl IntoResponse for EmailInUseResponse {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_REQUEST,
            Json(BasicErrorResponse {
                error_code: "user_already_exists".into(),
                error_description: "An account with that email is already registered.".into(),
                extra_info: None,
            }),
        )
            .into_response()
    }
}

/// Response type for sign-in attempts with an unknown email or a wrong password.
/// Both cases produce this same response so the API doesn't reveal which emails
/// have accounts.
struct BadCredentialsResponse;

impl IntoResponse for BadCredentialsResponse {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(BasicErrorResponse {
                error_code: "invalid_credentials".into(),
                error_description: "The email or password was incorrect.".into(),
                extra_info: None,
            }),
        )
            .into_response()
    }
}

/// Signs a session token for a freshly verified identity and packages it with
/// the user's data
fn start_session(
    tokens: &TokenService,
    identity: domain::auth::UserIdentity,
) -> Result<Session, ErrorResponse> {
    let token = match tokens.issue(identity.id, &identity.email) {
        Ok(token) => token,
        Err(sign_err) => {
            error!("Could not sign a session token: {sign_err}");
            return Err(GenericErrorResponse(sign_err).into());
        }
    };

    Ok(Session {
        token,
        user: identity.into(),
    })
}

#[utoipa::path(
    post,
    path = "/api/auth/signup",
    tag = AUTH_API_GROUP,
    request_body = Signup,
    responses(
        (status = 201, description = "Account created, session started", body = Session),
        (status = 400, response = dto::err_resps::BasicError400),
        (status = 500, response = dto::err_resps::BasicError500),
    ),
)]
/// Registers a new account and immediately signs the new user in
async fn signup(
    new_account: Signup,
    tokens: &TokenService,
    ext_cxn: &mut impl ExternalConnectivity,
    auth_service: &impl domain::auth::driving_ports::AuthPort,
) -> Result<(StatusCode, Json<Session>), ErrorResponse> {
    info!("Signup requested by {new_account}");
    new_account
        .validate()
        .map_err(ValidationErrorResponse::from)?;

    let domain_account = domain::auth::NewAccount::from(new_account);
    let cred_write = persistence::db_credential_driven_ports::DbCredentialWriter {};

    let register_result = auth_service
        .register(&domain_account, &mut *ext_cxn, &cred_write)
        .await;
    let identity = match register_result {
        Ok(identity) => identity,
        Err(domain::auth::driving_ports::RegisterError::EmailInUse) => {
            return Err(EmailInUseResponse.into());
        }
        Err(domain::auth::driving_ports::RegisterError::PortError(port_err)) => {
            error!("Signup failure: {port_err}");
            return Err(GenericErrorResponse(port_err).into());
        }
    };

    let session = start_session(tokens, identity)?;
    Ok((StatusCode::CREATED, Json(session)))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = AUTH_API_GROUP,
    request_body = Login,
    responses(
        (status = 200, description = "Signed in, session started", body = Session),
        (status = 401, response = dto::err_resps::BasicError401),
        (status = 500, response = dto::err_resps::BasicError500),
    ),
)]
/// Signs a user in with their email and password
async fn login(
    credentials: Login,
    tokens: &TokenService,
    ext_cxn: &mut impl ExternalConnectivity,
    auth_service: &impl domain::auth::driving_ports::AuthPort,
) -> Result<Json<Session>, ErrorResponse> {
    info!("Sign-in requested for {}", credentials.email);
    let cred_read = persistence::db_credential_driven_ports::DbCredentialReader {};

    let authenticate_result = auth_service
        .authenticate(
            &credentials.email,
            &credentials.password,
            &mut *ext_cxn,
            &cred_read,
        )
        .await;
    let identity = match authenticate_result {
        Ok(identity) => identity,
        Err(domain::auth::driving_ports::AuthenticateError::BadCredentials) => {
            return Err(BadCredentialsResponse.into());
        }
        Err(domain::auth::driving_ports::AuthenticateError::PortError(port_err)) => {
            error!("Sign-in failure: {port_err}");
            return Err(GenericErrorResponse(port_err).into());
        }
    };

    let session = start_session(tokens, identity)?;
    Ok(Json(session))
}
