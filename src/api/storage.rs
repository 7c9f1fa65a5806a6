//! Database statistics, backups, export and import.

use serde::{Deserialize, Serialize};

use super::{lenient_count, BackupPathInput};
use crate::error::ClientError;
use crate::invoke::Invoker;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageStats {
    #[serde(default, deserialize_with = "lenient_count")]
    pub database_size_bytes: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub backups_size_bytes: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub logs_size_bytes: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub backup_count: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub idea_count: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub writing_count: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub article_count: u64,
    #[serde(default)]
    pub last_backup_at: Option<String>,
}

impl StorageStats {
    pub fn total_size_bytes(&self) -> u64 {
        self.database_size_bytes
            .saturating_add(self.backups_size_bytes)
            .saturating_add(self.logs_size_bytes)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupInfo {
    pub path: String,
    #[serde(default)]
    pub file_name: String,
    #[serde(default, deserialize_with = "lenient_count")]
    pub size_bytes: u64,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportInfo {
    pub path: String,
    #[serde(default, deserialize_with = "lenient_count")]
    pub size_bytes: u64,
    #[serde(default)]
    pub exported_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    #[serde(default, deserialize_with = "lenient_count")]
    pub ideas_imported: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub writings_imported: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub articles_imported: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub feed_sources_imported: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub skipped: u64,
    #[serde(default)]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImportInput<'a> {
    import_path: &'a str,
}

pub async fn get_storage_statistics(invoker: &Invoker) -> Result<StorageStats, ClientError> {
    invoker.invoke("get_storage_statistics").await
}

pub async fn list_database_backups(invoker: &Invoker) -> Result<Vec<BackupInfo>, ClientError> {
    invoker.invoke("list_database_backups").await
}

pub async fn create_database_backup(invoker: &Invoker) -> Result<BackupInfo, ClientError> {
    invoker.invoke("create_database_backup").await
}

pub async fn restore_database_from_backup(
    invoker: &Invoker,
    backup_path: &str,
) -> Result<(), ClientError> {
    invoker
        .invoke_with("restore_database_from_backup", &BackupPathInput { backup_path })
        .await
}

pub async fn delete_database_backup(invoker: &Invoker, backup_path: &str) -> Result<(), ClientError> {
    invoker
        .invoke_with("delete_database_backup", &BackupPathInput { backup_path })
        .await
}

pub async fn export_database(invoker: &Invoker) -> Result<ExportInfo, ClientError> {
    invoker.invoke("export_database").await
}

pub async fn import_database(invoker: &Invoker, import_path: &str) -> Result<ImportSummary, ClientError> {
    invoker
        .invoke_with("import_database", &ImportInput { import_path })
        .await
}
