use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

pub mod auth;
pub mod task;

/// DTO reported by the health endpoint
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, Debug))]
pub struct HealthStatus {
    #[schema(example = "ok")]
    pub status: String,
    #[schema(example = "Task management API is running")]
    pub message: String,
}

/// Client-side view of the API's error envelope. `extra_info` is deliberately left out
/// because its shape varies by failure; callers only branch on the code and description.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub error_code: String,
    pub error_description: String,
}

/// Reusable OpenAPI definitions for the error responses endpoints share
pub mod err_resps {
    use serde::Serialize;
    use utoipa::ToResponse;

    #[derive(Serialize, ToResponse)]
    #[response(
        description = "The request body failed validation or referenced data in an invalid state",
        example = json!({
            "error_code": "invalid_input",
            "error_description": "Submitted data was invalid.",
            "extra_info": null
        })
    )]
    pub struct BasicError400 {
        error_code: String,
        error_description: String,
        extra_info: Option<String>,
    }

    #[derive(Serialize, ToResponse)]
    #[response(
        description = "The endpoint requires a bearer token that wasn't provided",
        example = json!({
            "error_code": "token_required",
            "error_description": "Authentication token required.",
            "extra_info": null
        })
    )]
    pub struct BasicError401 {
        error_code: String,
        error_description: String,
        extra_info: Option<String>,
    }

    #[derive(Serialize, ToResponse)]
    #[response(
        description = "The provided bearer token was rejected",
        example = json!({
            "error_code": "invalid_token",
            "error_description": "Invalid or expired token.",
            "extra_info": null
        })
    )]
    pub struct BasicError403 {
        error_code: String,
        error_description: String,
        extra_info: Option<String>,
    }

    #[derive(Serialize, ToResponse)]
    #[response(
        description = "The requested entity could not be located",
        example = json!({
            "error_code": "not_found",
            "error_description": "The requested entity could not be found.",
            "extra_info": null
        })
    )]
    pub struct BasicError404 {
        error_code: String,
        error_description: String,
        extra_info: Option<String>,
    }

    #[derive(Serialize, ToResponse)]
    #[response(
        description = "Something unexpected went wrong inside the server",
        example = json!({
            "error_code": "internal_error",
            "error_description": "Could not access data to complete your request",
            "extra_info": null
        })
    )]
    pub struct BasicError500 {
        error_code: String,
        error_description: String,
        extra_info: Option<String>,
    }
}

/// Registers OpenAPI schemas and responses for the DTOs shared across the API
#[derive(OpenApi)]
#[openapi(components(
    schemas(
        HealthStatus,
        auth::Signup,
        auth::Login,
        auth::Session,
        auth::UserData,
        task::Task,
        task::NewTask,
        task::UpdateTask,
        crate::domain::task::Priority,
        crate::domain::task::TaskStatus,
    ),
    responses(
        err_resps::BasicError400,
        err_resps::BasicError401,
        err_resps::BasicError403,
        err_resps::BasicError404,
        err_resps::BasicError500,
        crate::routing_utils::BasicErrorResponse,
    )
))]
pub struct OpenApiSchemas;
