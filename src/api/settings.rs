//! Application settings and first-run setup status.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::{lenient_bool, lenient_count};
use crate::error::ClientError;
use crate::invoke::Invoker;

fn default_theme() -> String {
    "system".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

/// Known settings with their defaults. Keys this client does not know about
/// are kept in `extra` so a read-modify-write never drops them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default, deserialize_with = "lenient_count")]
    pub news_sync_interval_minutes: u64,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub auto_backup_enabled: bool,
    #[serde(default, deserialize_with = "lenient_count")]
    pub backup_retention_count: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub log_retention_days: u64,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            language: default_language(),
            news_sync_interval_minutes: 0,
            auto_backup_enabled: false,
            backup_retention_count: 0,
            log_retention_days: 0,
            extra: BTreeMap::new(),
        }
    }
}

/// One `{key, value}` pair for `update_settings`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettingUpdate {
    pub key: String,
    pub value: Value,
}

impl SettingUpdate {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Result of `check_setup_status_command`. The backend answers in snake_case.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SetupStatus {
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_complete: bool,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub has_master_key: bool,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub has_database: bool,
    #[serde(default)]
    pub cockpit_home: Option<String>,
}

pub async fn get_app_settings(invoker: &Invoker) -> Result<AppSettings, ClientError> {
    invoker.invoke("get_app_settings").await
}

pub async fn update_settings(invoker: &Invoker, updates: &[SettingUpdate]) -> Result<(), ClientError> {
    invoker.invoke_with("update_settings", updates).await
}

pub async fn check_setup_status(invoker: &Invoker) -> Result<SetupStatus, ClientError> {
    invoker.invoke("check_setup_status_command").await
}
