use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File name of the client configuration inside [`config_dir`].
pub const CLIENT_CONFIG_FILE: &str = "client.json";

/// Default loopback address of the desktop backend's command bridge.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:7420";

/// Get the config directory using platform-appropriate location.
///
/// - macOS: `~/Library/Application Support/cockpit/`
/// - Linux: `~/.config/cockpit/` (or `$XDG_CONFIG_HOME`)
/// - Windows: `%APPDATA%/cockpit/`
///
/// Falls back to `~/.cockpit/` if the platform dir is unavailable.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("cockpit"))
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".cockpit")
        })
}

/// Load a JSON config file, returning Default if missing or corrupt.
/// A file that exists but cannot be parsed is logged rather than silently reset.
pub fn load_json_config<T: DeserializeOwned + Default>(path: &Path) -> T {
    if !path.exists() {
        return T::default();
    }
    let content = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(path = %path.display(), "could not read config: {e}");
            return T::default();
        }
    };
    match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(e) => {
            tracing::error!(path = %path.display(), "corrupt config, using defaults: {e}");
            T::default()
        }
    }
}

/// Save a JSON config file atomically (temp file + rename).
pub fn save_json_config<T: Serialize>(path: &Path, config: &T) -> Result<(), String> {
    let dir = path
        .parent()
        .ok_or_else(|| format!("Config path has no parent: {}", path.display()))?;
    std::fs::create_dir_all(dir).map_err(|e| format!("Failed to create config directory: {e}"))?;

    let json = serde_json::to_string_pretty(config)
        .map_err(|e| format!("Failed to serialize config: {e}"))?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| CLIENT_CONFIG_FILE.to_string());
    let temp = dir.join(format!("{file_name}.tmp.{}", std::process::id()));

    std::fs::write(&temp, &json).map_err(|e| format!("Failed to write temp config: {e}"))?;

    // The auth token lives in here: owner read/write only
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&temp, perms)
            .map_err(|e| format!("Failed to set config permissions: {e}"))?;
    }

    std::fs::rename(&temp, path).map_err(|e| {
        let _ = std::fs::remove_file(&temp);
        format!("Failed to commit config: {e}")
    })?;

    Ok(())
}

/// Bounded retry policy applied to queries before an error is terminal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetryConfig {
    /// Extra attempts after the first failure (0 disables retry).
    pub attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: 1,
            base_delay_ms: 1_000,
            max_delay_ms: 30_000,
            multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    pub fn none() -> Self {
        Self {
            attempts: 0,
            ..Self::default()
        }
    }

    /// Delay to wait before retry number `retry` (0-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let ms = crate::error::backoff_delay_ms(
            retry,
            self.base_delay_ms as f64,
            self.max_delay_ms as f64,
            self.multiplier,
        );
        Duration::from_millis(ms as u64)
    }
}

/// Client-side configuration: where the backend lives and how the cache behaves.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientConfig {
    /// Base URL of the backend's command bridge.
    pub endpoint: String,
    /// Bearer token for the command bridge, if it requires one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    /// Minimum freshness window for cached query results.
    pub stale_time_ms: u64,
    pub retry: RetryConfig,
    /// Quiescence window for autosaved drafts.
    pub autosave_debounce_ms: u64,
    /// Polling interval for storage statistics.
    pub storage_poll_interval_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            auth_token: None,
            stale_time_ms: 30_000,
            retry: RetryConfig::default(),
            autosave_debounce_ms: 500,
            storage_poll_interval_ms: 30_000,
        }
    }
}

impl ClientConfig {
    pub fn stale_time(&self) -> Duration {
        Duration::from_millis(self.stale_time_ms)
    }

    pub fn autosave_debounce(&self) -> Duration {
        Duration::from_millis(self.autosave_debounce_ms)
    }

    pub fn storage_poll_interval(&self) -> Duration {
        Duration::from_millis(self.storage_poll_interval_ms)
    }

    /// Apply `COCKPIT_ENDPOINT` / `COCKPIT_TOKEN` overrides. Empty values are ignored.
    pub fn apply_env_overrides(mut self) -> Self {
        if let Ok(endpoint) = std::env::var("COCKPIT_ENDPOINT")
            && !endpoint.is_empty()
        {
            self.endpoint = endpoint;
        }
        if let Ok(token) = std::env::var("COCKPIT_TOKEN")
            && !token.is_empty()
        {
            self.auth_token = Some(token);
        }
        self
    }
}

/// Load the client config from the platform config dir, then apply env overrides.
pub fn load_client_config() -> ClientConfig {
    load_client_config_from(&config_dir().join(CLIENT_CONFIG_FILE))
}

pub fn load_client_config_from(path: &Path) -> ClientConfig {
    load_json_config::<ClientConfig>(path).apply_env_overrides()
}

pub fn save_client_config(config: &ClientConfig) -> Result<(), String> {
    save_json_config(&config_dir().join(CLIENT_CONFIG_FILE), config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        // SAFETY: tests touching the environment run under #[serial]
        unsafe {
            std::env::remove_var("COCKPIT_ENDPOINT");
            std::env::remove_var("COCKPIT_TOKEN");
        }
    }

    #[test]
    #[serial]
    fn missing_file_yields_defaults() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let config = load_client_config_from(&dir.path().join("client.json"));
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.autosave_debounce(), Duration::from_millis(500));
    }

    #[test]
    #[serial]
    fn partial_file_fills_remaining_defaults() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.json");
        std::fs::write(&path, r#"{"endpoint":"http://127.0.0.1:9999","retry":{"attempts":3}}"#)
            .unwrap();

        let config = load_client_config_from(&path);
        assert_eq!(config.endpoint, "http://127.0.0.1:9999");
        assert_eq!(config.retry.attempts, 3);
        assert_eq!(config.retry.base_delay_ms, 1_000);
        assert_eq!(config.stale_time_ms, 30_000);
    }

    #[test]
    #[serial]
    fn corrupt_file_falls_back_to_defaults() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.json");
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(load_client_config_from(&path), ClientConfig::default());
    }

    #[test]
    #[serial]
    fn env_overrides_win_but_empty_values_are_ignored() {
        clear_env();
        unsafe {
            std::env::set_var("COCKPIT_ENDPOINT", "http://10.0.0.2:7420");
            std::env::set_var("COCKPIT_TOKEN", "");
        }
        let config = ClientConfig::default().apply_env_overrides();
        assert_eq!(config.endpoint, "http://10.0.0.2:7420");
        assert!(config.auth_token.is_none());
        clear_env();
    }

    #[test]
    #[serial]
    fn save_then_load_preserves_values() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("client.json");
        let config = ClientConfig {
            auth_token: Some("secret".into()),
            stale_time_ms: 5_000,
            ..ClientConfig::default()
        };
        save_json_config(&path, &config).unwrap();
        assert_eq!(load_client_config_from(&path), config);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn retry_none_disables_attempts() {
        assert_eq!(RetryConfig::none().attempts, 0);
        assert!(RetryConfig::default().delay_for(0) <= Duration::from_millis(1_050));
    }
}
