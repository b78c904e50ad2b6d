//! Configuration management
//!
//! Settings live in `settings.json` inside the data directory:
//! ```json
//! {
//!   "api": { "baseUrl": "http://localhost:8080/api/v1", "timeoutSecs": 30 },
//!   "dashboard": { "transactionLimit": 10 },
//!   "transfer": { "balancePrecheck": false }
//! }
//! ```
//! Keys this crate does not know about are preserved on save, and a file
//! that does not parse is left untouched.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

pub const SETTINGS_FILENAME: &str = "settings.json";
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api/v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_TRANSACTION_LIMIT: usize = 10;

/// Environment variable overriding the API base URL
pub const API_URL_ENV: &str = "BANKLIFY_API_URL";
/// Environment variable overriding the balance pre-check toggle
pub const BALANCE_PRECHECK_ENV: &str = "BANKLIFY_BALANCE_PRECHECK";

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    api: ApiSettings,
    #[serde(default)]
    dashboard: DashboardSettings,
    #[serde(default)]
    transfer: TransferSettings,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timeout_secs: Option<u64>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DashboardSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    transaction_limit: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransferSettings {
    #[serde(default)]
    balance_precheck: bool,
}

/// Banklify configuration (resolved view of settings + environment)
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub timeout: Duration,
    pub transaction_limit: usize,
    /// Advisory insufficient-funds check before submitting a transfer
    pub balance_precheck: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            transaction_limit: DEFAULT_TRANSACTION_LIMIT,
            balance_precheck: false,
        }
    }
}

impl Config {
    /// Load config from the banklify directory
    ///
    /// `BANKLIFY_API_URL` and `BANKLIFY_BALANCE_PRECHECK` win over the file.
    pub fn load(banklify_dir: &Path) -> Result<Self> {
        let raw = read_settings(banklify_dir);

        let api_base_url = std::env::var(API_URL_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or(raw.api.base_url)
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

        let balance_precheck = parse_bool_env(BALANCE_PRECHECK_ENV)
            .unwrap_or(raw.transfer.balance_precheck);

        let config = Self {
            api_base_url: normalize_base_url(&api_base_url)?,
            timeout: Duration::from_secs(raw.api.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS).max(1)),
            transaction_limit: raw
                .dashboard
                .transaction_limit
                .filter(|l| *l > 0)
                .unwrap_or(DEFAULT_TRANSACTION_LIMIT),
            balance_precheck,
        };

        Ok(config)
    }

    /// Save config to the banklify directory
    /// Preserves other settings that the CLI doesn't manage
    pub fn save(&self, banklify_dir: &Path) -> Result<()> {
        let mut settings = read_settings_strict(banklify_dir)?;

        settings.api.base_url = Some(self.api_base_url.clone());
        settings.api.timeout_secs = Some(self.timeout.as_secs());
        settings.dashboard.transaction_limit = Some(self.transaction_limit);
        settings.transfer.balance_precheck = self.balance_precheck;

        std::fs::create_dir_all(banklify_dir)?;
        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(banklify_dir.join(SETTINGS_FILENAME), content)?;
        Ok(())
    }

    /// Point the client at another backend
    pub fn set_api_base_url(&mut self, url: &str) -> Result<()> {
        self.api_base_url = normalize_base_url(url)?;
        Ok(())
    }
}

/// Settings for reading only: a damaged file falls back to defaults
fn read_settings(banklify_dir: &Path) -> SettingsFile {
    read_settings_strict(banklify_dir).unwrap_or_default()
}

/// Settings that are about to be rewritten; a file that doesn't parse is never replaced
fn read_settings_strict(banklify_dir: &Path) -> Result<SettingsFile> {
    let settings_path = banklify_dir.join(SETTINGS_FILENAME);
    if !settings_path.exists() {
        return Ok(SettingsFile::default());
    }
    let content = std::fs::read_to_string(&settings_path)
        .with_context(|| format!("Failed to read {:?}", settings_path))?;
    serde_json::from_str(&content).map_err(|e| {
        crate::Error::Config(format!(
            "{} is not valid settings JSON ({}); fix or remove it before saving",
            settings_path.display(),
            e
        ))
        .into()
    })
}

fn parse_bool_env(name: &str) -> Option<bool> {
    match std::env::var(name).ok().as_deref() {
        Some("true" | "1" | "yes" | "TRUE" | "YES") => Some(true),
        Some("false" | "0" | "no" | "FALSE" | "NO") => Some(false),
        _ => None,
    }
}

/// Validate an http(s) base URL and drop the trailing slash
pub fn normalize_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    let parsed = Url::parse(trimmed)
        .map_err(|e| crate::Error::Config(format!("Invalid API base URL '{}': {}", trimmed, e)))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(crate::Error::Config(format!(
            "API base URL must use http or https, got '{}'",
            parsed.scheme()
        ))
        .into());
    }
    if parsed.host_str().is_none() {
        return Err(crate::Error::Config(format!("API base URL '{}' has no host", trimmed)).into());
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_without_file() {
        let dir = tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.transaction_limit, 10);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_save_preserves_unknown_keys() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(SETTINGS_FILENAME),
            r#"{"api":{"baseUrl":"https://bank.example/api/v1/","proxy":"corp"},"theme":"dark"}"#,
        )
        .unwrap();

        let mut config = Config::load(dir.path()).unwrap();
        config.transaction_limit = 25;
        config.save(dir.path()).unwrap();

        let raw: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join(SETTINGS_FILENAME)).unwrap(),
        )
        .unwrap();
        assert_eq!(raw["theme"], "dark");
        assert_eq!(raw["api"]["proxy"], "corp");
        assert_eq!(raw["dashboard"]["transactionLimit"], 25);
    }

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(
            normalize_base_url("https://bank.example/api/v1/").unwrap(),
            "https://bank.example/api/v1"
        );
        assert!(normalize_base_url("ftp://bank.example").is_err());
        assert!(normalize_base_url("not a url").is_err());
    }

    #[test]
    fn test_corrupt_settings_fall_back_to_defaults() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(SETTINGS_FILENAME), "{{{").unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.transaction_limit, DEFAULT_TRANSACTION_LIMIT);
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn test_save_keeps_unparseable_settings_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILENAME);
        let damaged = r#"{"api":{"baseUrl":"https://bank.example/api/v1"},"theme":"dark","#;
        std::fs::write(&path, damaged).unwrap();

        let mut config = Config::load(dir.path()).unwrap();
        config.transaction_limit = 25;
        let err = config.save(dir.path()).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<crate::Error>(),
            Some(crate::Error::Config(_))
        ));
        assert!(err.to_string().contains(SETTINGS_FILENAME));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), damaged);
    }

    #[test]
    fn test_save_refuses_settings_with_wrong_shape() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILENAME);
        std::fs::write(&path, r#"{"api":"https://bank.example","theme":"dark"}"#).unwrap();

        assert!(Config::default().save(dir.path()).is_err());
        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["theme"], "dark");
    }
}
