//! JustDoIt configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main JustDoIt configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// AI text service configuration
    pub ai: AiConfig,

    /// Storage configuration
    pub storage: StorageConfig,

    /// Log level (trace, debug, info, warn, error)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .justdoit.yml
        let local_config = PathBuf::from(".justdoit.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/justdoit/justdoit.yml
        if let Some(user_config) = user_config_path()
            && user_config.exists()
        {
            match Self::load_from_file(&user_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is initialized
    ///
    /// Errors are ignored; a broken config file is reported later by `load`.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let candidates = match config_path {
            Some(path) => vec![path.clone()],
            None => [Some(PathBuf::from(".justdoit.yml")), user_config_path()]
                .into_iter()
                .flatten()
                .collect(),
        };

        candidates
            .iter()
            .find(|p| p.exists())
            .and_then(|p| fs::read_to_string(p).ok())
            .and_then(|content| serde_yaml::from_str::<Config>(&content).ok())
            .and_then(|config| config.log_level)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("justdoit").join("justdoit.yml"))
}

/// AI text service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Provider name (currently only "gemini" supported)
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            model: "gemini-3-flash-preview".to_string(),
            api_key_env: "API_KEY".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            max_tokens: 1024,
            timeout_ms: 30_000,
        }
    }
}

impl AiConfig {
    /// Read the API key from the configured environment variable
    ///
    /// An unset or blank variable means the service runs in fallback mode.
    pub fn get_api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
    }

    pub fn is_configured(&self) -> bool {
        self.get_api_key().is_some()
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the task list
    #[serde(rename = "data-dir")]
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        // Use XDG data directory (~/.local/share/justdoit on Linux)
        let data_dir = dirs::data_dir()
            .map(|d| d.join("justdoit"))
            .unwrap_or_else(|| PathBuf::from(".justdoit"));

        Self { data_dir }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.ai.provider, "gemini");
        assert_eq!(config.ai.api_key_env, "API_KEY");
        assert!(config.storage.data_dir.ends_with("justdoit") || config.storage.data_dir.ends_with(".justdoit"));
        assert!(config.log_level.is_none());
    }

    #[test]
    fn test_deserialize_config() {
        let yaml = r#"
ai:
  provider: gemini
  model: gemini-2.5-pro
  api-key-env: GEMINI_KEY
  base-url: http://localhost:9999
  max-tokens: 256
  timeout-ms: 5000

storage:
  data-dir: /tmp/justdoit-test

log-level: debug
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.ai.model, "gemini-2.5-pro");
        assert_eq!(config.ai.api_key_env, "GEMINI_KEY");
        assert_eq!(config.ai.base_url, "http://localhost:9999");
        assert_eq!(config.ai.max_tokens, 256);
        assert_eq!(config.ai.timeout_ms, 5000);
        assert_eq!(config.storage.data_dir, PathBuf::from("/tmp/justdoit-test"));
        assert_eq!(config.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let yaml = r#"
ai:
  model: gemini-lite
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.ai.model, "gemini-lite");
        assert_eq!(config.ai.provider, "gemini");
        assert_eq!(config.ai.timeout_ms, 30_000);
    }

    #[test]
    fn test_load_explicit_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("justdoit.yml");
        fs::write(&path, "log-level: warn\nstorage:\n  data-dir: /srv/tasks\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.storage.data_dir, PathBuf::from("/srv/tasks"));
        assert_eq!(Config::load_log_level(Some(&path)).as_deref(), Some("warn"));
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("absent.yml");
        assert!(Config::load(Some(&path)).is_err());
        assert!(Config::load_log_level(Some(&path)).is_none());
    }

    #[test]
    #[serial]
    fn test_api_key_from_env() {
        let config = AiConfig {
            api_key_env: "JUSTDOIT_TEST_API_KEY".to_string(),
            ..Default::default()
        };

        unsafe { std::env::remove_var("JUSTDOIT_TEST_API_KEY") };
        assert!(!config.is_configured());

        unsafe { std::env::set_var("JUSTDOIT_TEST_API_KEY", "   ") };
        assert!(config.get_api_key().is_none());

        unsafe { std::env::set_var("JUSTDOIT_TEST_API_KEY", "secret") };
        assert_eq!(config.get_api_key().as_deref(), Some("secret"));

        unsafe { std::env::remove_var("JUSTDOIT_TEST_API_KEY") };
    }
}
