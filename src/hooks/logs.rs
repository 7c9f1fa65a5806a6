use super::cached;
use crate::api::logs::{self as api, ClearLogsInput, LogEntry, LogFilter, LogStats};
use crate::error::ClientError;
use crate::query::{KeyFilter, Mutation, QueryClient};

pub mod keys {
    use crate::api::logs::LogFilter;
    use crate::query::QueryKey;

    pub fn entries(filter: &LogFilter) -> QueryKey {
        QueryKey::new(["logs"]).with_params(filter)
    }

    pub fn stats() -> QueryKey {
        QueryKey::new(["logs", "stats"])
    }
}

pub async fn application_logs(client: &QueryClient, filter: &LogFilter) -> Result<Vec<LogEntry>, ClientError> {
    cached(client, keys::entries(filter), || {
        api::get_application_logs(client.invoker(), filter)
    })
    .await
}

pub async fn log_stats(client: &QueryClient) -> Result<LogStats, ClientError> {
    cached(client, keys::stats(), || api::get_application_log_stats(client.invoker())).await
}

/// Returns how many entries the backend deleted.
pub async fn clear_logs(client: &QueryClient, older_than_days: Option<u32>) -> Result<u64, ClientError> {
    let input = ClearLogsInput { older_than_days };
    Mutation::new("clear_application_logs")
        .invalidates(KeyFilter::prefix(["logs"]))
        .run(client, api::clear_application_logs(client.invoker(), &input))
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::testing::ScriptedTransport;
    use serde_json::json;

    #[tokio::test]
    async fn clear_invalidates_entries_and_stats() {
        let transport = ScriptedTransport::new(|command, _| match command {
            "clear_application_logs" => Ok(json!({"deleted": 12})),
            "get_application_log_stats" => Ok(json!({"totalEntries": 40, "byLevel": {"error": 2}})),
            _ => Ok(json!([{"id": 1, "timestamp": "2026-03-01T10:00:00Z", "level": "error", "message": "boom"}])),
        });
        let client = QueryClient::new(transport.invoker(), ClientConfig::default());
        let errors = LogFilter {
            level: Some("error".into()),
            ..Default::default()
        };

        assert_eq!(application_logs(&client, &errors).await.unwrap().len(), 1);
        assert_eq!(log_stats(&client).await.unwrap().by_level["error"], 2);

        assert_eq!(clear_logs(&client, Some(30)).await.unwrap(), 12);
        assert!(client.cache().get(&keys::entries(&errors)).unwrap().stale);
        assert!(client.cache().get(&keys::stats()).unwrap().stale);
    }
}
