use crate::api::Authenticated;
use crate::dto::task::{NewTask, Task, UpdateTask};
use crate::external_connections::ExternalConnectivity;
use crate::routing_utils::{
    GenericErrorResponse, Json, NotFoundErrorResponse, ValidationErrorResponse,
};
use crate::{AppState, SharedData, domain, dto, persistence};
use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::ErrorResponse;
use axum::routing::{delete, get, patch, post};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::OpenApi;
use validator::Validate;

#[derive(OpenApi)]
#[openapi(paths(list_tasks, create_task, update_task, delete_task))]
/// Defines the OpenAPI documentation for the task API
pub struct TaskApi;
/// Constant used to group task endpoints in OpenAPI documentation
pub const TASK_API_GROUP: &str = "Tasks";

/// Builds a router for the task routes. Every route requires a bearer token and
/// only ever touches tasks owned by the verified user.
pub fn task_routes() -> Router<Arc<SharedData>> {
    Router::new()
        .route(
            "/",
            get(
                |State(app_state): AppState, Authenticated(user_id): Authenticated| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let task_service = domain::task::TaskService {};

                    list_tasks(user_id, &mut ext_cxn, &task_service).await
                },
            ),
        )
        .route(
            "/",
            post(
                |State(app_state): AppState,
                 Authenticated(user_id): Authenticated,
                 Json(new_task): Json<NewTask>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let task_service = domain::task::TaskService {};

                    create_task(user_id, new_task, &mut ext_cxn, &task_service).await
                },
            ),
        )
        .route(
            "/:task_id",
            patch(
                |State(app_state): AppState,
                 Authenticated(user_id): Authenticated,
                 Path(task_id): Path<i32>,
                 Json(update): Json<UpdateTask>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let task_service = domain::task::TaskService {};

                    update_task(user_id, task_id, update, &mut ext_cxn, &task_service).await
                },
            ),
        )
        .route(
            "/:task_id",
            delete(
                |State(app_state): AppState,
                 Authenticated(user_id): Authenticated,
                 Path(task_id): Path<i32>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let task_service = domain::task::TaskService {};

                    delete_task(user_id, task_id, &mut ext_cxn, &task_service).await
                },
            ),
        )
}

#[utoipa::path(
    get,
    path = "/api/tasks",
    tag = TASK_API_GROUP,
    security(("bearer_token" = [])),
    responses(
        (status = 200, description = "The signed-in user's tasks, newest first", body = Vec<Task>),
        (status = 401, response = dto::err_resps::BasicError401),
        (status = 403, response = dto::err_resps::BasicError403),
        (status = 500, response = dto::err_resps::BasicError500),
    ),
)]
/// Lists every task owned by the signed-in user
async fn list_tasks(
    user_id: i32,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl domain::task::driving_ports::TaskPort,
) -> Result<Json<Vec<Task>>, ErrorResponse> {
    info!("Listing tasks for user {user_id}");
    let task_read = persistence::db_task_driven_ports::DbTaskReader {};

    let tasks_result = task_service
        .tasks_for_user(user_id, &mut *ext_cxn, &task_read)
        .await;
    match tasks_result {
        Ok(tasks) => Ok(Json(tasks.into_iter().map(Task::from).collect())),
        Err(fetch_err) => {
            error!("Failed to list tasks for user {user_id}: {fetch_err}");
            Err(GenericErrorResponse(fetch_err).into())
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/tasks",
    tag = TASK_API_GROUP,
    security(("bearer_token" = [])),
    request_body = NewTask,
    responses(
        (status = 201, description = "Task created", body = Task),
        (status = 400, response = dto::err_resps::BasicError400),
        (status = 401, response = dto::err_resps::BasicError401),
        (status = 403, response = dto::err_resps::BasicError403),
        (status = 500, response = dto::err_resps::BasicError500),
    ),
)]
/// Creates a task owned by the signed-in user
async fn create_task(
    user_id: i32,
    new_task: NewTask,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl domain::task::driving_ports::TaskPort,
) -> Result<(StatusCode, Json<Task>), ErrorResponse> {
    info!("Creating a task for user {user_id}");
    new_task.validate().map_err(ValidationErrorResponse::from)?;

    let domain_new_task = domain::task::NewTask::from(new_task);
    let task_write = persistence::db_task_driven_ports::DbTaskWriter {};

    let create_result = task_service
        .create_task_for_user(user_id, &domain_new_task, &mut *ext_cxn, &task_write)
        .await;
    match create_result {
        Ok(created_task) => Ok((StatusCode::CREATED, Json(created_task.into()))),
        Err(create_err) => {
            error!("Failed to create a task for user {user_id}: {create_err}");
            Err(GenericErrorResponse(create_err).into())
        }
    }
}

#[utoipa::path(
    patch,
    path = "/api/tasks/{task_id}",
    tag = TASK_API_GROUP,
    security(("bearer_token" = [])),
    params(
        ("task_id" = i32, Path, description = "ID of the task to update"),
    ),
    request_body = UpdateTask,
    responses(
        (status = 200, description = "Task updated", body = Task),
        (status = 400, response = dto::err_resps::BasicError400),
        (status = 401, response = dto::err_resps::BasicError401),
        (status = 403, response = dto::err_resps::BasicError403),
        (status = 404, response = dto::err_resps::BasicError404),
        (status = 500, response = dto::err_resps::BasicError500),
    ),
)]
/// Applies a partial update to one of the signed-in user's tasks
async fn update_task(
    user_id: i32,
    task_id: i32,
    update: UpdateTask,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl domain::task::driving_ports::TaskPort,
) -> Result<Json<Task>, ErrorResponse> {
    info!("Updating task {task_id} for user {user_id}");
    update.validate().map_err(ValidationErrorResponse::from)?;

    let domain_update = domain::task::UpdateTask::from(update);
    let task_write = persistence::db_task_driven_ports::DbTaskWriter {};

    let update_result = task_service
        .update_user_task(user_id, task_id, &domain_update, &mut *ext_cxn, &task_write)
        .await;
    match update_result {
        Ok(updated_task) => Ok(Json(updated_task.into())),
        Err(domain::task::driving_ports::TaskError::NotFound) => {
            Err(NotFoundErrorResponse.into())
        }
        Err(domain::task::driving_ports::TaskError::PortError(port_err)) => {
            error!("Failed to update task {task_id} for user {user_id}: {port_err}");
            Err(GenericErrorResponse(port_err).into())
        }
    }
}

#[utoipa::path(
    delete,
    path = "/api/tasks/{task_id}",
    tag = TASK_API_GROUP,
    security(("bearer_token" = [])),
    params(
        ("task_id" = i32, Path, description = "ID of the task to delete"),
    ),
    responses(
        (status = 204, description = "Task deleted"),
        (status = 401, response = dto::err_resps::BasicError401),
        (status = 403, response = dto::err_resps::BasicError403),
        (status = 404, response = dto::err_resps::BasicError404),
        (status = 500, response = dto::err_resps::BasicError500),
    ),
)]
/// Deletes one of the signed-in user's tasks
async fn delete_task(
    user_id: i32,
    task_id: i32,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl domain::task::driving_ports::TaskPort,
) -> Result<StatusCode, ErrorResponse> {
    info!("Deleting task {task_id} for user {user_id}");
    let task_write = persistence::db_task_driven_ports::DbTaskWriter {};

    let delete_result = task_service
        .delete_user_task(user_id, task_id, &mut *ext_cxn, &task_write)
        .await;
    match delete_result {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(domain::task::driving_ports::TaskError::NotFound) => {
            Err(NotFoundErrorResponse.into())
        }
        Err(domain::task::driving_ports::TaskError::PortError(port_err)) => {
            error!("Failed to delete task {task_id} for user {user_id}: {port_err}");
            Err(GenericErrorResponse(port_err).into())
        }
    }
}
