use crate::domain::task::driven_ports::{TaskReader, TaskWriter};
use crate::domain::task::driving_ports::TaskError;
use crate::external_connections::ExternalConnectivity;
use crate::patch::Patch;
use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// How urgently a task needs attention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

/// Lifecycle state of a task. Transitions only happen when a caller asks for one
/// explicitly; editing other fields never moves a task between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "task_status", rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Pending,
    Completed,
    Deferred,
}

#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(test, derive(Clone))]
pub struct Task {
    pub id: i32,
    pub user_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub status: TaskStatus,
    pub due_date: Option<NaiveDate>,
    pub categories: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for a task that doesn't exist yet. New tasks always start in
/// [TaskStatus::Pending]; there is deliberately no way to create one in another state.
#[cfg_attr(test, derive(Clone))]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    pub categories: Vec<String>,
}

/// A partial update to an existing task. [Option] fields are replaced when present and
/// untouched when absent; [Patch] fields additionally support being cleared, since those
/// are the only ones that may hold no value at all.
#[derive(Debug, Default)]
#[cfg_attr(test, derive(Clone))]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Patch<String>,
    pub priority: Option<Priority>,
    pub status: Option<TaskStatus>,
    pub due_date: Patch<NaiveDate>,
    pub categories: Option<Vec<String>>,
}

pub mod driven_ports {
    use super::*;
    use crate::external_connections::ExternalConnectivity;

    pub trait TaskReader {
        /// Fetches every task owned by the given user, newest first
        /// (descending creation time, ties broken by descending ID).
        async fn tasks_for_user(
            &self,
            user_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Vec<Task>, anyhow::Error>;
    }

    pub trait TaskWriter {
        /// Persists a new pending task owned by the given user. Both timestamps are set
        /// to [creation_time].
        async fn create_task_for_user(
            &self,
            user_id: i32,
            new_task: &NewTask,
            creation_time: DateTime<Utc>,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Task, anyhow::Error>;

        /// Applies a partial update to the task in a single atomic write, stamping
        /// [update_time] as the new modification time. Returns [None] when no task
        /// matches both the ID and the owner.
        async fn update_user_task(
            &self,
            user_id: i32,
            task_id: i32,
            update: &UpdateTask,
            update_time: DateTime<Utc>,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<Task>, anyhow::Error>;

        /// Removes the task matching both the ID and the owner. Returns whether a task
        /// was actually deleted.
        async fn delete_user_task(
            &self,
            user_id: i32,
            task_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<bool, anyhow::Error>;
    }
}

pub mod driving_ports {
    use super::*;
    use crate::external_connections::ExternalConnectivity;
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum TaskError {
        /// Covers both a task that doesn't exist and a task owned by somebody else.
        /// Callers must not be able to tell the difference.
        #[error("the requested task does not exist")]
        NotFound,
        #[error(transparent)]
        PortError(#[from] anyhow::Error),
    }


    pub trait TaskPort {
        async fn tasks_for_user(
            &self,
            user_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
            task_read: &impl driven_ports::TaskReader,
        ) -> Result<Vec<Task>, anyhow::Error>;
        async fn create_task_for_user(
            &self,
            user_id: i32,
            task: &NewTask,
            ext_cxn: &mut impl ExternalConnectivity,
            task_write: &impl driven_ports::TaskWriter,
        ) -> Result<Task, anyhow::Error>;
        async fn update_user_task(
            &self,
            user_id: i32,
            task_id: i32,
            update: &UpdateTask,
            ext_cxn: &mut impl ExternalConnectivity,
            task_write: &impl driven_ports::TaskWriter,
        ) -> Result<Task, TaskError>;
        async fn delete_user_task(
            &self,
            user_id: i32,
            task_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
            task_write: &impl driven_ports::TaskWriter,
        ) -> Result<(), TaskError>;
    }
}

/// Owns the task lifecycle: every read is scoped to the requesting user and every
/// mutation goes through a single-statement write filtered on both the task ID and the
/// owner, so a task belonging to someone else is indistinguishable from one that does
/// not exist. The service clock stamps mutation times, which keeps the
/// `created_at == updated_at at creation` and `updated_at always advances` rules in one
/// place instead of scattered across adapters.
pub struct TaskService {}

impl driving_ports::TaskPort for TaskService {
    async fn tasks_for_user(
        &self,
        user_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
        task_read: &impl TaskReader,
    ) -> Result<Vec<Task>, anyhow::Error> {
        let tasks = task_read
            .tasks_for_user(user_id, &mut *ext_cxn)
            .await
            .context("fetching a user's tasks")?;

        Ok(tasks)
    }

    async fn create_task_for_user(
        &self,
        user_id: i32,
        task: &NewTask,
        ext_cxn: &mut impl ExternalConnectivity,
        task_write: &impl TaskWriter,
    ) -> Result<Task, anyhow::Error> {
        let creation_time = Utc::now();
        let created_task = task_write
            .create_task_for_user(user_id, task, creation_time, &mut *ext_cxn)
            .await
            .context("creating a task")?;

        Ok(created_task)
    }

    async fn update_user_task(
        &self,
        user_id: i32,
        task_id: i32,
        update: &UpdateTask,
        ext_cxn: &mut impl ExternalConnectivity,
        task_write: &impl TaskWriter,
    ) -> Result<Task, TaskError> {
        let update_time = Utc::now();
        let updated_task = task_write
            .update_user_task(user_id, task_id, update, update_time, &mut *ext_cxn)
            .await
            .context("updating a task")?;

        updated_task.ok_or(TaskError::NotFound)
    }

    async fn delete_user_task(
        &self,
        user_id: i32,
        task_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
        task_write: &impl TaskWriter,
    ) -> Result<(), TaskError> {
        let removed = task_write
            .delete_user_task(user_id, task_id, &mut *ext_cxn)
            .await
            .context("deleting a task")?;

        if removed {
            Ok(())
        } else {
            Err(TaskError::NotFound)
        }
    }
}
