use crate::domain;
use crate::domain::task::{NewTask, Priority, Task, TaskStatus, UpdateTask};
use crate::external_connections::{ConnectionHandle, ExternalConnectivity};
use anyhow::{Context, Error};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{query, query_as, FromRow};

/// Every query returns the full set of task columns so the domain always sees the
/// post-write row, never a locally reconstructed one.
const TASK_COLUMNS: &str =
    "id, user_id, title, description, priority, status, due_date, categories, created_at, updated_at";

#[derive(FromRow)]
struct TaskRow {
    id: i32,
    user_id: i32,
    title: String,
    description: Option<String>,
    priority: Priority,
    status: TaskStatus,
    due_date: Option<NaiveDate>,
    categories: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TaskRow> for domain::task::Task {
    fn from(value: TaskRow) -> Self {
        Task {
            id: value.id,
            user_id: value.user_id,
            title: value.title,
            description: value.description,
            priority: value.priority,
            status: value.status,
            due_date: value.due_date,
            categories: value.categories,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

pub struct DbTaskReader;

impl domain::task::driven_ports::TaskReader for DbTaskReader {
    async fn tasks_for_user(
        &self,
        user_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Vec<Task>, Error> {
        let mut cxn = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let tasks: Vec<Task> = query_as::<_, TaskRow>(&format!(
            "SELECT {TASK_COLUMNS} FROM task WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(cxn.borrow_connection())
        .await
        .context("trying to fetch a user's tasks")?
        .into_iter()
        .map(domain::task::Task::from)
        .collect();

        Ok(tasks)
    }
}

pub struct DbTaskWriter;

impl domain::task::driven_ports::TaskWriter for DbTaskWriter {
    async fn create_task_for_user(
        &self,
        user_id: i32,
        new_task: &NewTask,
        creation_time: DateTime<Utc>,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Task, Error> {
        let mut cxn = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let inserted_row = query_as::<_, TaskRow>(&format!(
            "INSERT INTO task(user_id, title, description, priority, status, due_date, categories, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, 'pending', $5, $6, $7, $7) \
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(user_id)
        .bind(&new_task.title)
        .bind(new_task.description.as_deref())
        .bind(new_task.priority)
        .bind(new_task.due_date)
        .bind(&new_task.categories)
        .bind(creation_time)
        .fetch_one(cxn.borrow_connection())
        .await
        .context("trying to insert a new task into the database")?;

        Ok(inserted_row.into())
    }

    async fn update_user_task(
        &self,
        user_id: i32,
        task_id: i32,
        update: &UpdateTask,
        update_time: DateTime<Utc>,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<Task>, Error> {
        let mut cxn = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        // One statement applies the whole merge, so concurrent updates each see a
        // consistent row and the ownership filter can't be bypassed between reads.
        let updated_row = query_as::<_, TaskRow>(&format!(
            "UPDATE task SET \
                title = CASE WHEN $3 THEN $4 ELSE title END, \
                description = CASE WHEN $5 THEN $6 ELSE description END, \
                priority = CASE WHEN $7 THEN $8 ELSE priority END, \
                status = CASE WHEN $9 THEN $10 ELSE status END, \
                due_date = CASE WHEN $11 THEN $12 ELSE due_date END, \
                categories = CASE WHEN $13 THEN $14 ELSE categories END, \
                updated_at = $15 \
             WHERE id = $1 AND user_id = $2 \
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(task_id)
        .bind(user_id)
        .bind(update.title.is_some())
        .bind(update.title.as_deref())
        .bind(update.description.changes())
        .bind(update.description.value().map(String::as_str))
        .bind(update.priority.is_some())
        .bind(update.priority)
        .bind(update.status.is_some())
        .bind(update.status)
        .bind(update.due_date.changes())
        .bind(update.due_date.value().copied())
        .bind(update.categories.is_some())
        .bind(update.categories.as_deref())
        .bind(update_time)
        .fetch_optional(cxn.borrow_connection())
        .await
        .context("trying to update a task in the database")?;

        Ok(updated_row.map(Task::from))
    }

    async fn delete_user_task(
        &self,
        user_id: i32,
        task_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<bool, Error> {
        let mut cxn = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let delete_result = query("DELETE FROM task WHERE id = $1 AND user_id = $2")
            .bind(task_id)
            .bind(user_id)
            .execute(cxn.borrow_connection())
            .await
            .context("trying to remove a task from the database")?;

        Ok(delete_result.rows_affected() > 0)
    }
}
