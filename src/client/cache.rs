use crate::client::{ApiError, TaskApi};
use crate::dto::task::{NewTask, Task, UpdateTask};
use crate::domain::task::TaskStatus;
use chrono::Utc;
use std::sync::Mutex;
use tracing::warn;

/// An optimistic, in-memory mirror of the signed-in user's tasks.
///
/// Every mutation lands in the local view first, then travels to the server through the
/// injected [TaskApi]. When the server answers, the local view is reconciled: the server's
/// record replaces whatever was guessed locally on success, and the guess is rolled back
/// on failure, so a reported error never leaves the view diverged from the server. The
/// caller sees the failure only after that rollback has completed.
///
/// The view sits behind a [Mutex] that is only ever locked between await points, never
/// across a network call. Operations awaiting the server therefore interleave freely;
/// mutations on different tasks never block each other. Two concurrent mutations on the
/// *same* task are not coordinated. The last response to arrive wins, which is an
/// accepted race for a single-user, single-session cache.
pub struct TaskCache<Api: TaskApi> {
    api: Api,
    state: Mutex<CacheState>,
}

struct CacheState {
    tasks: Vec<Task>,
    /// Counts downward. Provisional ids are negative so they can never collide with a
    /// server-assigned id.
    next_provisional_id: i32,
}

/// Builds the placeholder record shown while a create request is in flight. The server's
/// answer replaces every guessed field, timestamps included.
fn provisional_task(provisional_id: i32, new_task: &NewTask) -> Task {
    let now = Utc::now();
    Task {
        id: provisional_id,
        title: new_task.title.clone(),
        description: new_task.description.clone(),
        priority: new_task.priority.unwrap_or_default(),
        status: TaskStatus::Pending,
        due_date: new_task.due_date,
        categories: new_task.categories.clone().unwrap_or_default(),
        created_at: now,
        updated_at: now,
    }
}

impl<Api: TaskApi> TaskCache<Api> {
    /// Creates an empty cache around the given API client. Call [TaskCache::refresh] to
    /// perform the initial load.
    pub fn new(api: Api) -> TaskCache<Api> {
        TaskCache {
            api,
            state: Mutex::new(CacheState {
                tasks: Vec::new(),
                next_provisional_id: -1,
            }),
        }
    }

    /// A point-in-time copy of the local view, in display order (newest first, as the
    /// server lists them; provisional entries appear at the front).
    pub fn tasks(&self) -> Vec<Task> {
        let state = self.state.lock().expect("task cache mutex poisoned");
        state.tasks.clone()
    }

    /// Replaces the entire local view with the server's collection. Also used internally
    /// as the full-reconciliation path after a failed update.
    pub async fn refresh(&self) -> Result<(), ApiError> {
        let fetched_tasks = self.api.fetch_tasks().await?;

        let mut state = self.state.lock().expect("task cache mutex poisoned");
        state.tasks = fetched_tasks;
        Ok(())
    }

    /// Creates a task, optimistically showing a provisional entry (with a negative id)
    /// at the front of the view until the server responds. On success the provisional
    /// entry is replaced by the server's record, which is returned; on failure the
    /// provisional entry is removed before the error reaches the caller.
    pub async fn create(&self, new_task: NewTask) -> Result<Task, ApiError> {
        let provisional_id = {
            let mut state = self.state.lock().expect("task cache mutex poisoned");
            let provisional_id = state.next_provisional_id;
            state.next_provisional_id -= 1;
            let placeholder = provisional_task(provisional_id, &new_task);
            state.tasks.insert(0, placeholder);
            provisional_id
        };

        let create_result = self.api.create_task(&new_task).await;

        let mut state = self.state.lock().expect("task cache mutex poisoned");
        match create_result {
            Ok(server_task) => {
                let provisional_index = state
                    .tasks
                    .iter()
                    .position(|task| task.id == provisional_id);
                match provisional_index {
                    Some(index) => state.tasks[index] = server_task.clone(),
                    // Another operation dropped the provisional entry while the request
                    // was in flight. The server's record still wins.
                    None => state.tasks.insert(0, server_task.clone()),
                }
                Ok(server_task)
            }
            Err(create_err) => {
                state.tasks.retain(|task| task.id != provisional_id);
                Err(create_err)
            }
        }
    }

    /// Applies a partial update, optimistically patching the cached entry (with a locally
    /// guessed modification time) until the server responds. On success the server's
    /// record, including its authoritative `updated_at`, replaces the local guess and is
    /// returned. On failure the pre-patch entry is restored and the whole collection is
    /// refetched, since the failure mode may have left the local view stale in ways a
    /// partial undo can't repair; a failure of that refetch is logged and swallowed
    /// because the restored snapshot is already consistent.
    pub async fn update(&self, task_id: i32, update: UpdateTask) -> Result<Task, ApiError> {
        let pre_patch = {
            let mut state = self.state.lock().expect("task cache mutex poisoned");
            match state.tasks.iter_mut().find(|task| task.id == task_id) {
                Some(cached) => {
                    let snapshot = cached.clone();
                    update.apply_to(cached);
                    cached.updated_at = Utc::now();
                    Some(snapshot)
                }
                // Nothing cached under that id; the server still gets asked.
                None => None,
            }
        };

        let update_result = self.api.update_task(task_id, &update).await;

        match update_result {
            Ok(server_task) => {
                let mut state = self.state.lock().expect("task cache mutex poisoned");
                if let Some(cached) = state.tasks.iter_mut().find(|task| task.id == task_id) {
                    *cached = server_task.clone();
                }
                Ok(server_task)
            }
            Err(update_err) => {
                if let Some(snapshot) = pre_patch {
                    let mut state = self.state.lock().expect("task cache mutex poisoned");
                    if let Some(cached) = state.tasks.iter_mut().find(|task| task.id == task_id)
                    {
                        *cached = snapshot;
                    }
                }

                if let Err(refetch_err) = self.refresh().await {
                    warn!("Could not refetch tasks after a failed update: {refetch_err}");
                }
                Err(update_err)
            }
        }
    }

    /// Deletes a task, optimistically removing it from the view until the server
    /// responds. Success needs no further reconciliation; on failure the removed entry is
    /// reinserted at its old position (clamped in case neighbors vanished meanwhile)
    /// before the error reaches the caller.
    pub async fn delete(&self, task_id: i32) -> Result<(), ApiError> {
        let removed = {
            let mut state = self.state.lock().expect("task cache mutex poisoned");
            let removal_index = state.tasks.iter().position(|task| task.id == task_id);
            removal_index.map(|index| (index, state.tasks.remove(index)))
        };

        let delete_result = self.api.delete_task(task_id).await;

        if let Err(delete_err) = delete_result {
            if let Some((old_index, removed_task)) = removed {
                let mut state = self.state.lock().expect("task cache mutex poisoned");
                let reinsert_at = old_index.min(state.tasks.len());
                state.tasks.insert(reinsert_at, removed_task);
            }
            return Err(delete_err);
        }

        Ok(())
    }
}
