//! Application log browsing.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::lenient_count;
use crate::error::ClientError;
use crate::invoke::Invoker;

/// A single structured log entry as stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: i64,
    pub timestamp: String,
    pub level: String,
    #[serde(default)]
    pub module: Option<String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogStats {
    #[serde(default, deserialize_with = "lenient_count")]
    pub total_entries: u64,
    /// Entry count per level (`error`, `warn`, ...).
    #[serde(default)]
    pub by_level: BTreeMap<String, u64>,
    #[serde(default)]
    pub oldest_entry: Option<String>,
    #[serde(default)]
    pub newest_entry: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub size_bytes: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearLogsInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub older_than_days: Option<u32>,
}

pub async fn get_application_logs(
    invoker: &Invoker,
    filter: &LogFilter,
) -> Result<Vec<LogEntry>, ClientError> {
    invoker.invoke_with("get_application_logs", filter).await
}

pub async fn get_application_log_stats(invoker: &Invoker) -> Result<LogStats, ClientError> {
    invoker.invoke("get_application_log_stats").await
}

/// Delete log entries; returns how many were removed.
pub async fn clear_application_logs(
    invoker: &Invoker,
    input: &ClearLogsInput,
) -> Result<u64, ClientError> {
    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Cleared {
        #[serde(default, deserialize_with = "lenient_count")]
        deleted: u64,
    }

    let cleared: Option<Cleared> = invoker.invoke_with("clear_application_logs", input).await?;
    Ok(cleared.map(|c| c.deleted).unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{input_of, ScriptedTransport};
    use serde_json::json;

    #[tokio::test]
    async fn log_filter_sends_only_given_fields() {
        let transport = ScriptedTransport::new(|_, _| {
            Ok(json!([{
                "id": 1,
                "timestamp": "2024-06-01T08:00:00Z",
                "level": "error",
                "module": "feeds",
                "message": "sync failed"
            }]))
        });
        let invoker = transport.invoker();

        let filter = LogFilter {
            level: Some("error".into()),
            limit: Some(100),
            ..Default::default()
        };
        let entries = get_application_logs(&invoker, &filter).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].module.as_deref(), Some("feeds"));
        assert!(entries[0].metadata.is_none());
        assert_eq!(
            input_of(&transport.calls()[0]),
            json!({"level": "error", "limit": 100})
        );
    }

    #[test]
    fn stats_default_missing_fields() {
        let stats: LogStats =
            serde_json::from_value(json!({"totalEntries": 10, "byLevel": {"info": 7, "error": 3}}))
                .unwrap();
        assert_eq!(stats.total_entries, 10);
        assert_eq!(stats.by_level.get("error"), Some(&3));
        assert_eq!(stats.size_bytes, 0);
    }

    #[tokio::test]
    async fn clear_logs_reads_deleted_count_or_zero() {
        let transport = ScriptedTransport::new(|_, args| {
            let days = args.and_then(|a| a["input"].get("olderThanDays")).cloned();
            if days.is_some() {
                Ok(json!({"deleted": 12}))
            } else {
                Ok(Value::Null)
            }
        });
        let invoker = transport.invoker();

        let removed = clear_application_logs(
            &invoker,
            &ClearLogsInput {
                older_than_days: Some(30),
            },
        )
        .await
        .unwrap();
        assert_eq!(removed, 12);

        let removed = clear_application_logs(&invoker, &ClearLogsInput::default())
            .await
            .unwrap();
        assert_eq!(removed, 0);
    }
}
