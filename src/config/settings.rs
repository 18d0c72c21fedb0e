use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default Dashboard API root
pub const DEFAULT_BASE_URL: &str = "https://api.meraki.com/api/v1";

/// Per-request timeout used when none (or zero) is configured
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Networks scanned per health check. A fixed ceiling on fan-out for large
/// organizations; networks beyond it are ignored.
pub const DEFAULT_NETWORK_SCAN_LIMIT: usize = 10;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssistantConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub health_check: HealthCheckConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Root URL of the management API
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// API key (usually supplied through MERAKI_API_KEY)
    #[serde(default)]
    pub api_key: Option<String>,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckConfig {
    /// Maximum number of networks scanned, in listing order
    #[serde(default = "default_network_scan_limit")]
    pub network_scan_limit: usize,
    /// Networks scanned at once. 1 scans strictly one after another.
    #[serde(default = "default_scan_concurrency")]
    pub scan_concurrency: usize,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_network_scan_limit() -> usize {
    DEFAULT_NETWORK_SCAN_LIMIT
}

fn default_scan_concurrency() -> usize {
    1
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ApiConfig {
    /// Effective request timeout. Zero would fail every call, so it falls
    /// back to the default.
    pub fn timeout(&self) -> Duration {
        match self.timeout_secs {
            0 => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            secs => Duration::from_secs(secs),
        }
    }
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            network_scan_limit: default_network_scan_limit(),
            scan_concurrency: default_scan_concurrency(),
        }
    }
}

impl AssistantConfig {
    /// Load configuration from a YAML file
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AssistantConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration, falling back to defaults if file doesn't exist
    pub fn load_or_default(path: Option<&PathBuf>) -> anyhow::Result<Self> {
        match path {
            Some(p) if p.exists() => Self::from_file(p),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration and apply MERAKI_* environment overrides
    pub fn load_with_env(path: Option<&PathBuf>) -> anyhow::Result<Self> {
        Ok(Self::load_or_default(path)?.apply_env_overrides())
    }

    /// Find a config file in the usual places
    pub fn auto_detect(base_dir: &Path) -> Option<PathBuf> {
        let mut candidates = vec![
            base_dir.join("meraki-assistant.yaml"),
            base_dir.join(".meraki-assistant.yaml"),
        ];
        if let Some(config_dir) = dirs::config_dir() {
            candidates.push(config_dir.join("meraki-assistant/config.yaml"));
        }

        candidates.into_iter().find(|path| path.exists())
    }

    /// Apply environment variable overrides on top of file/default values.
    pub fn apply_env_overrides(self) -> Self {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(key) = lookup("MERAKI_API_KEY").filter(|k| !k.is_empty()) {
            self.api.api_key = Some(key);
        }
        if let Some(url) = lookup("MERAKI_BASE_URL").filter(|u| !u.is_empty()) {
            self.api.base_url = url;
        }
        if let Some(secs) = lookup("MERAKI_TIMEOUT_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
        {
            self.api.timeout_secs = secs;
        }
        if let Some(limit) = lookup("MERAKI_NETWORK_SCAN_LIMIT").and_then(|s| s.parse().ok()) {
            self.health_check.network_scan_limit = limit;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AssistantConfig::default();
        assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.api.timeout_secs, 30);
        assert!(config.api.api_key.is_none());
        assert_eq!(config.health_check.network_scan_limit, 10);
        assert_eq!(config.health_check.scan_concurrency, 1);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "health_check:\n  scan_concurrency: 4").unwrap();

        let config = AssistantConfig::from_file(file.path()).unwrap();
        assert_eq!(config.health_check.scan_concurrency, 4);
        assert_eq!(config.health_check.network_scan_limit, 10);
        assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.yaml");
        let config = AssistantConfig::load_or_default(Some(&path)).unwrap();
        assert_eq!(config.api.timeout_secs, 30);
    }

    #[test]
    fn test_auto_detect_prefers_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("meraki-assistant.yaml");
        std::fs::write(&local, "api:\n  timeout_secs: 5\n").unwrap();

        assert_eq!(AssistantConfig::auto_detect(dir.path()), Some(local));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("MERAKI_API_KEY", "secret"),
            ("MERAKI_BASE_URL", "http://localhost:9999"),
            ("MERAKI_TIMEOUT_SECS", "not-a-number"),
            ("MERAKI_NETWORK_SCAN_LIMIT", "3"),
        ]);

        let config = AssistantConfig::default()
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.api.api_key.as_deref(), Some("secret"));
        assert_eq!(config.api.base_url, "http://localhost:9999");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.health_check.network_scan_limit, 3);
    }

    #[test]
    fn test_zero_timeout_in_file_uses_default() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "api:\n  timeout_secs: 0").unwrap();

        let config = AssistantConfig::from_file(file.path()).unwrap();
        assert_eq!(config.api.timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));

        let api = ApiConfig {
            timeout_secs: 5,
            ..Default::default()
        };
        assert_eq!(api.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_zero_timeout_override_is_ignored() {
        let config = AssistantConfig::default().apply_overrides(|key| {
            (key == "MERAKI_TIMEOUT_SECS").then(|| "0".to_string())
        });
        assert_eq!(config.api.timeout_secs, 30);

        let config = AssistantConfig::default().apply_overrides(|key| {
            (key == "MERAKI_TIMEOUT_SECS").then(|| "12".to_string())
        });
        assert_eq!(config.api.timeout_secs, 12);
    }
}
