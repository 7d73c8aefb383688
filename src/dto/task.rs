use crate::domain;
use crate::domain::task::{Priority, TaskStatus};
use crate::patch::Patch;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// DTO for a task returned by the API. Serializes and deserializes both ways since the
/// bundled client reads the same shape the server writes.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(test, derive(PartialEq, Eq))]
pub struct Task {
    #[schema(example = 10)]
    pub id: i32,
    #[schema(example = "Water the plants")]
    pub title: String,
    #[schema(example = "The ficus is looking sad")]
    pub description: Option<String>,
    pub priority: Priority,
    pub status: TaskStatus,
    pub due_date: Option<NaiveDate>,
    #[schema(example = json!(["home"]))]
    pub categories: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<domain::task::Task> for Task {
    fn from(value: domain::task::Task) -> Self {
        Task {
            id: value.id,
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

/// DTO for creating a new task via the API. Everything but the title is optional;
/// omitted fields fall back to their documented defaults.
#[derive(Deserialize, Serialize, Validate, ToSchema)]
#[cfg_attr(test, derive(Clone))]
pub struct NewTask {
    #[validate(length(min = 1, max = 200))]
    #[schema(example = "Water the plants")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "The ficus is looking sad")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
}

impl From<NewTask> for domain::task::NewTask {
    fn from(value: NewTask) -> Self {
        domain::task::NewTask {
            title: value.title,
            description: value.description,
            priority: value.priority.unwrap_or_default(),
            due_date: value.due_date,
            categories: value.categories.unwrap_or_default(),
        }
    }
}

/// DTO for partially updating a task via the API.
///
/// Leaving a field out of the request keeps its current value. For `description` and
/// `due_date` an explicit `null` clears the field instead; the remaining fields treat
/// `null` the same as leaving the field out, since they always hold a value.
#[derive(Debug, Default, Deserialize, Serialize, Validate, ToSchema)]
#[cfg_attr(test, derive(Clone))]
pub struct UpdateTask {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 200))]
    #[schema(example = "Water all the plants")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    #[schema(value_type = Option<String>)]
    pub description: Patch<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    #[schema(value_type = Option<NaiveDate>)]
    pub due_date: Patch<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
}

impl UpdateTask {
    /// Applies this patch to a task in place, leaving the timestamps alone. The client
    /// cache uses this to mirror the server's merge rules on its local copy.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(ref title) = self.title {
            task.title = title.clone();
        }
        self.description.apply_to(&mut task.description);
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        self.due_date.apply_to(&mut task.due_date);
        if let Some(ref categories) = self.categories {
            task.categories = categories.clone();
        }
    }
}

impl From<UpdateTask> for domain::task::UpdateTask {
    fn from(value: UpdateTask) -> Self {
        domain::task::UpdateTask {
            title: value.title,
            description: value.description,
            priority: value.priority,
            status: value.status,
            due_date: value.due_date,
            categories: value.categories,
        }
    }
}
