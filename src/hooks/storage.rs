//! Database statistics, backups, export and import.

use super::cached;
use crate::api::storage::{self as api, BackupInfo, ExportInfo, ImportSummary, StorageStats};
use crate::error::ClientError;
use crate::query::{KeyFilter, Mutation, PollHandle, QueryClient};

pub mod keys {
    use crate::query::QueryKey;

    pub fn stats() -> QueryKey {
        QueryKey::new(["storage", "stats"])
    }

    pub fn backups() -> QueryKey {
        QueryKey::new(["storage", "backups"])
    }
}

fn storage_scope() -> KeyFilter {
    KeyFilter::prefix(["storage"])
}

pub async fn storage_stats(client: &QueryClient) -> Result<StorageStats, ClientError> {
    cached(client, keys::stats(), || api::get_storage_statistics(client.invoker())).await
}

/// Keep the statistics entry refreshed on the configured interval while the
/// returned handle lives.
pub fn poll_storage_stats(client: &QueryClient) -> PollHandle {
    let invoker = client.invoker().clone();
    client.poll(
        keys::stats(),
        client.config().storage_poll_interval(),
        move || {
            let invoker = invoker.clone();
            async move { api::get_storage_statistics(&invoker).await }
        },
    )
}

pub async fn backups(client: &QueryClient) -> Result<Vec<BackupInfo>, ClientError> {
    cached(client, keys::backups(), || api::list_database_backups(client.invoker())).await
}

pub async fn create_backup(client: &QueryClient) -> Result<BackupInfo, ClientError> {
    Mutation::new("create_database_backup")
        .invalidates(storage_scope())
        .run(client, api::create_database_backup(client.invoker()))
        .await
}

pub async fn delete_backup(client: &QueryClient, backup_path: &str) -> Result<(), ClientError> {
    Mutation::new("delete_database_backup")
        .invalidates(storage_scope())
        .run(client, api::delete_database_backup(client.invoker(), backup_path))
        .await
}

/// Restore replaces the whole database, so every cached query is stale.
pub async fn restore_backup(client: &QueryClient, backup_path: &str) -> Result<(), ClientError> {
    Mutation::new("restore_database_from_backup")
        .invalidates_all()
        .run(client, api::restore_database_from_backup(client.invoker(), backup_path))
        .await
}

pub async fn export_database(client: &QueryClient) -> Result<ExportInfo, ClientError> {
    Mutation::new("export_database")
        .run(client, api::export_database(client.invoker()))
        .await
}

pub async fn import_database(client: &QueryClient, import_path: &str) -> Result<ImportSummary, ClientError> {
    Mutation::new("import_database")
        .invalidates_all()
        .run(client, api::import_database(client.invoker(), import_path))
        .await
}
