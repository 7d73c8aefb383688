use crate::client::{ApiError, TaskApi};
use crate::dto;
use crate::dto::task::{NewTask, Task, UpdateTask};
use anyhow::{Context, anyhow};
use reqwest::{Response, StatusCode};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_tracing::TracingMiddleware;

/// Production [TaskApi] implementation speaking the REST surface over HTTP. Every
/// request carries the session's bearer token; outbound requests are traced through
/// the client middleware stack.
pub struct HttpTaskApi {
    http: ClientWithMiddleware,
    base_url: String,
    bearer_token: String,
}

impl HttpTaskApi {
    /// Builds a client that talks to the API rooted at `base_url` (scheme and
    /// authority, no trailing path), authenticating as the session behind
    /// `bearer_token`.
    pub fn new(base_url: &str, bearer_token: &str) -> HttpTaskApi {
        let base_client = reqwest::Client::builder().use_rustls_tls().build().unwrap();
        let http = ClientBuilder::new(base_client)
            .with(TracingMiddleware::default())
            .build();

        HttpTaskApi {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
            bearer_token: bearer_token.to_owned(),
        }
    }

    fn collection_url(&self) -> String {
        format!("{}/api/tasks", self.base_url)
    }

    fn task_url(&self, task_id: i32) -> String {
        format!("{}/api/tasks/{}", self.base_url, task_id)
    }
}

/// Maps an unsuccessful response onto [ApiError]. Validation failures surface the
/// error envelope's description when the body parses as one, and the raw body text
/// otherwise.
async fn error_from_response(response: Response) -> ApiError {
    match response.status() {
        StatusCode::BAD_REQUEST => {
            let raw_body = response.text().await.unwrap_or_default();
            let description = serde_json::from_str::<dto::ErrorBody>(&raw_body)
                .map(|envelope| envelope.error_description)
                .unwrap_or(raw_body);
            ApiError::InvalidInput(description)
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Unauthorized,
        StatusCode::NOT_FOUND => ApiError::NotFound,
        unexpected_status => ApiError::Failed(anyhow!(
            "The server answered with an unexpected status: {unexpected_status}"
        )),
    }
}

impl TaskApi for HttpTaskApi {
    async fn fetch_tasks(&self) -> Result<Vec<Task>, ApiError> {
        let response = self
            .http
            .get(self.collection_url())
            .bearer_auth(&self.bearer_token)
            .send()
            .await
            .context("Requesting the task collection")?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let tasks = response
            .json::<Vec<Task>>()
            .await
            .context("Reading the fetched task collection")?;
        Ok(tasks)
    }

    async fn create_task(&self, new_task: &NewTask) -> Result<Task, ApiError> {
        let response = self
            .http
            .post(self.collection_url())
            .bearer_auth(&self.bearer_token)
            .json(new_task)
            .send()
            .await
            .context("Requesting task creation")?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let created_task = response
            .json::<Task>()
            .await
            .context("Reading the created task")?;
        Ok(created_task)
    }

    async fn update_task(&self, task_id: i32, update: &UpdateTask) -> Result<Task, ApiError> {
        let response = self
            .http
            .patch(self.task_url(task_id))
            .bearer_auth(&self.bearer_token)
            .json(update)
            .send()
            .await
            .context("Requesting a task update")?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let updated_task = response
            .json::<Task>()
            .await
            .context("Reading the updated task")?;
        Ok(updated_task)
    }

    async fn delete_task(&self, task_id: i32) -> Result<(), ApiError> {
        let response = self
            .http
            .delete(self.task_url(task_id))
            .bearer_auth(&self.bearer_token)
            .send()
            .await
            .context("Requesting task deletion")?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        Ok(())
    }
}
