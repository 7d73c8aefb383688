use crate::client::{ApiError, TaskApi};
use crate::dto::task::{NewTask, Task, UpdateTask};
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::sync::oneshot;

/// A queued response, optionally held behind a oneshot gate so a test can keep the
/// call in flight and observe the cache mid-request.
struct Scripted<Resp> {
    response: Resp,
    gate: Option<oneshot::Receiver<()>>,
}

/// Hand-scripted [TaskApi] for exercising the task cache without a server.
///
/// Responses are queued per operation and consumed in call order; a call that finds
/// its queue empty panics, failing the test. [TaskApi] is implemented on
/// `&ScriptedTaskApi` so a test keeps its own handle for scripting and inspection
/// while the cache owns the borrow.
pub struct ScriptedTaskApi {
    fetch_responses: Mutex<VecDeque<Scripted<Result<Vec<Task>, ApiError>>>>,
    create_responses: Mutex<VecDeque<Scripted<Result<Task, ApiError>>>>,
    update_responses: Mutex<VecDeque<Scripted<Result<Task, ApiError>>>>,
    delete_responses: Mutex<VecDeque<Scripted<Result<(), ApiError>>>>,

    fetch_count: Mutex<u32>,
    create_arguments: Mutex<Vec<NewTask>>,
    update_arguments: Mutex<Vec<(i32, UpdateTask)>>,
    delete_arguments: Mutex<Vec<i32>>,
}

/// Queues an ungated response.
fn push_response<Resp>(queue: &Mutex<VecDeque<Scripted<Resp>>>, response: Resp) {
    queue
        .lock()
        .expect("scripted response mutex poisoned")
        .push_back(Scripted {
            response,
            gate: None,
        });
}

/// Queues a gated response, handing back the sender that releases it.
fn push_gated_response<Resp>(
    queue: &Mutex<VecDeque<Scripted<Resp>>>,
    response: Resp,
) -> oneshot::Sender<()> {
    let (release, gate) = oneshot::channel();
    queue
        .lock()
        .expect("scripted response mutex poisoned")
        .push_back(Scripted {
            response,
            gate: Some(gate),
        });
    release
}

/// Pops the next response for an operation, parking on its gate if one was scripted.
async fn consume_response<Resp>(
    queue: &Mutex<VecDeque<Scripted<Resp>>>,
    operation: &str,
) -> Resp {
    let next = queue
        .lock()
        .expect("scripted response mutex poisoned")
        .pop_front()
        .unwrap_or_else(|| panic!("No responses left in the script for {operation}"));
    if let Some(gate) = next.gate {
        gate.await
            .unwrap_or_else(|_| panic!("The gate for a {operation} response was dropped unsent"));
    }
    next.response
}

impl ScriptedTaskApi {
    pub fn new() -> ScriptedTaskApi {
        ScriptedTaskApi {
            fetch_responses: Mutex::new(VecDeque::new()),
            create_responses: Mutex::new(VecDeque::new()),
            update_responses: Mutex::new(VecDeque::new()),
            delete_responses: Mutex::new(VecDeque::new()),

            fetch_count: Mutex::new(0),
            create_arguments: Mutex::new(Vec::new()),
            update_arguments: Mutex::new(Vec::new()),
            delete_arguments: Mutex::new(Vec::new()),
        }
    }

    pub fn script_fetch(&self, response: Result<Vec<Task>, ApiError>) {
        push_response(&self.fetch_responses, response);
    }

    pub fn script_create(&self, response: Result<Task, ApiError>) {
        push_response(&self.create_responses, response);
    }

    pub fn script_gated_create(&self, response: Result<Task, ApiError>) -> oneshot::Sender<()> {
        push_gated_response(&self.create_responses, response)
    }

    pub fn script_update(&self, response: Result<Task, ApiError>) {
        push_response(&self.update_responses, response);
    }

    pub fn script_gated_update(&self, response: Result<Task, ApiError>) -> oneshot::Sender<()> {
        push_gated_response(&self.update_responses, response)
    }

    pub fn script_delete(&self, response: Result<(), ApiError>) {
        push_response(&self.delete_responses, response);
    }

    pub fn script_gated_delete(&self, response: Result<(), ApiError>) -> oneshot::Sender<()> {
        push_gated_response(&self.delete_responses, response)
    }

    /// How many times the collection was fetched.
    pub fn fetch_calls(&self) -> u32 {
        *self
            .fetch_count
            .lock()
            .expect("scripted call count mutex poisoned")
    }

    pub fn create_calls(&self) -> Vec<NewTask> {
        self.create_arguments
            .lock()
            .expect("scripted call log mutex poisoned")
            .clone()
    }

    pub fn update_calls(&self) -> Vec<(i32, UpdateTask)> {
        self.update_arguments
            .lock()
            .expect("scripted call log mutex poisoned")
            .clone()
    }

    pub fn delete_calls(&self) -> Vec<i32> {
        self.delete_arguments
            .lock()
            .expect("scripted call log mutex poisoned")
            .clone()
    }
}

impl TaskApi for &ScriptedTaskApi {
    async fn fetch_tasks(&self) -> Result<Vec<Task>, ApiError> {
        *self
            .fetch_count
            .lock()
            .expect("scripted call count mutex poisoned") += 1;
        consume_response(&self.fetch_responses, "fetch_tasks").await
    }

    async fn create_task(&self, new_task: &NewTask) -> Result<Task, ApiError> {
        self.create_arguments
            .lock()
            .expect("scripted call log mutex poisoned")
            .push(new_task.clone());
        consume_response(&self.create_responses, "create_task").await
    }

    async fn update_task(&self, task_id: i32, update: &UpdateTask) -> Result<Task, ApiError> {
        self.update_arguments
            .lock()
            .expect("scripted call log mutex poisoned")
            .push((task_id, update.clone()));
        consume_response(&self.update_responses, "update_task").await
    }

    async fn delete_task(&self, task_id: i32) -> Result<(), ApiError> {
        self.delete_arguments
            .lock()
            .expect("scripted call log mutex poisoned")
            .push(task_id);
        consume_response(&self.delete_responses, "delete_task").await
    }
}
