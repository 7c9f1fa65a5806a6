use super::cached;
use crate::api::tasks::{self as api, RunResult, SystemTask, TaskFilter, TaskRun, TaskRunFilter, UpdateTaskInput};
use crate::error::ClientError;
use crate::query::{KeyFilter, Mutation, QueryClient};

pub mod keys {
    use crate::api::tasks::{TaskFilter, TaskRunFilter};
    use crate::query::QueryKey;

    pub fn tasks(filter: &TaskFilter) -> QueryKey {
        QueryKey::new(["tasks"]).with_params(filter)
    }

    pub fn runs(filter: &TaskRunFilter) -> QueryKey {
        QueryKey::new(["tasks", "runs"]).with_params(filter)
    }
}

// Running or editing a task changes both the task row and its run history.
fn tasks_scope() -> KeyFilter {
    KeyFilter::prefix(["tasks"])
}

pub async fn system_tasks(client: &QueryClient, filter: &TaskFilter) -> Result<Vec<SystemTask>, ClientError> {
    cached(client, keys::tasks(filter), || {
        api::list_system_tasks(client.invoker(), filter)
    })
    .await
}

pub async fn task_runs(client: &QueryClient, filter: &TaskRunFilter) -> Result<Vec<TaskRun>, ClientError> {
    cached(client, keys::runs(filter), || api::list_task_runs(client.invoker(), filter)).await
}

pub async fn run_task_now(client: &QueryClient, task_type: &str) -> Result<RunResult, ClientError> {
    Mutation::new("run_system_task_now")
        .invalidates(tasks_scope())
        .run(client, api::run_system_task_now(client.invoker(), task_type))
        .await
}

pub async fn update_task(client: &QueryClient, input: &UpdateTaskInput) -> Result<SystemTask, ClientError> {
    Mutation::new("update_system_task")
        .invalidates(tasks_scope())
        .run(client, api::update_system_task(client.invoker(), input))
        .await
}
