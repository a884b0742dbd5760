//! Configuration management for VittaCash

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::{DEFAULT_SCHEMA_VERSION, SweepIntervals, TtlPolicy};
use crate::error::{ConfigError, Result};

/// Default API base URL
pub const DEFAULT_API_URL: &str = "https://vittacash.onrender.com/api";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Expense API base URL
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Bearer token issued by the auth service
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Account the cache is scoped to; "anonymous" when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Cache settings
    #[serde(default)]
    pub cache: CacheSettings,
}

/// Cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Persist entries across runs
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Override for the cache directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,

    /// Records written with another version are purged on startup
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    #[serde(default = "default_volatile_sweep_secs")]
    pub volatile_sweep_secs: u64,

    #[serde(default = "default_persistent_sweep_secs")]
    pub persistent_sweep_secs: u64,

    /// Upper bound for the persistent store, in bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quota_bytes: Option<u64>,

    #[serde(default)]
    pub ttl: TtlPolicy,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_true() -> bool {
    true
}

fn default_schema_version() -> u32 {
    DEFAULT_SCHEMA_VERSION
}

fn default_volatile_sweep_secs() -> u64 {
    2 * 60
}

fn default_persistent_sweep_secs() -> u64 {
    5 * 60
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
            schema_version: default_schema_version(),
            volatile_sweep_secs: default_volatile_sweep_secs(),
            persistent_sweep_secs: default_persistent_sweep_secs(),
            quota_bytes: None,
            ttl: TtlPolicy::default(),
        }
    }
}

impl CacheSettings {
    pub fn sweep_intervals(&self) -> SweepIntervals {
        SweepIntervals {
            volatile: Duration::from_secs(self.volatile_sweep_secs.max(1)),
            persistent: Duration::from_secs(self.persistent_sweep_secs.max(1)),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            token: None,
            user_id: None,
            timeout_secs: default_timeout_secs(),
            cache: CacheSettings::default(),
        }
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::Invalid(
            "Could not determine home directory".to_string(),
        ))?;

        Ok(home.join(".vittacash").join("config.yaml"))
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()).into());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents).map_err(ConfigError::from)?;
        config.validate()?;

        Ok(config)
    }

    /// Load from `path` (or the default path), falling back to defaults when no file exists
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path()?,
        };
        match Self::load_from(&path) {
            Err(crate::error::Error::Config(ConfigError::NotFound(_))) => {
                log::debug!("No config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents =
            serde_yaml::to_string(self).map_err(|e| ConfigError::SaveError(e.to_string()))?;

        std::fs::write(path, contents)?;

        // Set file permissions to 600 on Unix systems; the file holds a token
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(path)?.permissions();
            perms.set_mode(0o600);
            std::fs::set_permissions(path, perms)?;
        }

        Ok(())
    }

    /// Reject values that would make the client unusable
    pub fn validate(&self) -> Result<()> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "api_url must be an http(s) URL, got {}",
                self.api_url
            ))
            .into());
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout_secs must be positive".to_string()).into());
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::TierTtl;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.token.is_none());
        assert!(config.user_id.is_none());
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.timeout(), Duration::from_secs(60));
        assert!(config.cache.enabled);
        assert_eq!(config.cache.sweep_intervals(), SweepIntervals::default());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = r#"
user_id: user-42
cache:
  schema_version: 3
  ttl:
    expense:
      volatile_secs: 10
      persistent_secs: 20
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.user_id.as_deref(), Some("user-42"));
        assert_eq!(config.cache.schema_version, 3);
        assert_eq!(config.cache.volatile_sweep_secs, 120);
        assert_eq!(
            config.cache.ttl.expense,
            TierTtl::new(Duration::from_secs(10), Duration::from_secs(20))
        );
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let mut config = Config::default();
        config.token = Some("secret".to_string());
        config.cache.quota_bytes = Some(1024);
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.token.as_deref(), Some("secret"));
        assert_eq!(loaded.cache.quota_bytes, Some(1024));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_or_default(Some(&dir.path().join("absent.yaml"))).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_invalid_api_url_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "api_url: ftp://example.com\n").unwrap();

        assert!(Config::load_from(&path).is_err());
    }
}
