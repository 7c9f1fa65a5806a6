//! Scheduled system tasks (backups, feed sync, log retention, ...).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{lenient_bool, lenient_count};
use crate::error::ClientError;
use crate::invoke::Invoker;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemTask {
    pub id: i64,
    pub task_type: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub enabled: bool,
    #[serde(default)]
    pub cron_expression: Option<String>,
    #[serde(default)]
    pub last_run_at: Option<String>,
    #[serde(default)]
    pub next_run_at: Option<String>,
    #[serde(default)]
    pub last_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    #[serde(default)]
    pub task_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub duration_ms: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub items_processed: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRun {
    pub id: i64,
    pub task_id: i64,
    pub started_at: String,
    #[serde(default)]
    pub finished_at: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub duration_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRunFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskInput {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cron_expression: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct RunTaskInput<'a> {
    task_type: &'a str,
}

pub async fn list_system_tasks(
    invoker: &Invoker,
    filter: &TaskFilter,
) -> Result<Vec<SystemTask>, ClientError> {
    invoker.invoke_with("list_system_tasks", filter).await
}

pub async fn run_system_task_now(invoker: &Invoker, task_type: &str) -> Result<RunResult, ClientError> {
    invoker
        .invoke_with("run_system_task_now", &RunTaskInput { task_type })
        .await
}

pub async fn update_system_task(
    invoker: &Invoker,
    input: &UpdateTaskInput,
) -> Result<SystemTask, ClientError> {
    invoker.invoke_with("update_system_task", input).await
}

pub async fn list_task_runs(
    invoker: &Invoker,
    filter: &TaskRunFilter,
) -> Result<Vec<TaskRun>, ClientError> {
    invoker.invoke_with("list_task_runs", filter).await
}
