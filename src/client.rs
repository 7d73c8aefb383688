use crate::dto;
use thiserror::Error;

pub mod cache;
pub mod http_api;
pub mod stats;

#[cfg(test)]
pub mod test_util;

/// Errors surfaced by clients of the task API
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server turned the request away as invalid
    #[error("the server rejected the request: {0}")]
    InvalidInput(String),
    /// The server doesn't know about the requested task (or it belongs to someone else)
    #[error("the requested task does not exist")]
    NotFound,
    /// The session token was missing, expired, or rejected
    #[error("the session is no longer valid")]
    Unauthorized,
    /// The request never completed or the server failed internally
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

/// Client-side view of the task API. Implementors handle transport and
/// authentication so consumers like [cache::TaskCache] only deal in DTOs.
pub trait TaskApi {
    async fn fetch_tasks(&self) -> Result<Vec<dto::task::Task>, ApiError>;
    async fn create_task(
        &self,
        new_task: &dto::task::NewTask,
    ) -> Result<dto::task::Task, ApiError>;
    async fn update_task(
        &self,
        task_id: i32,
        update: &dto::task::UpdateTask,
    ) -> Result<dto::task::Task, ApiError>;
    async fn delete_task(&self, task_id: i32) -> Result<(), ApiError>;
}
