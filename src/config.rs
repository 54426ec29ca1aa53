use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{GmailError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub labels: LabelConfig,
    #[serde(default)]
    pub reply: ReplyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    #[serde(default = "default_min_interval_secs")]
    pub min_interval_secs: u64,
    #[serde(default = "default_max_interval_secs")]
    pub max_interval_secs: u64,
    #[serde(default = "default_query")]
    pub query: String,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            min_interval_secs: default_min_interval_secs(),
            max_interval_secs: default_max_interval_secs(),
            query: default_query(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelConfig {
    #[serde(default = "default_label_name")]
    pub name: String,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            name: default_label_name(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyConfig {
    #[serde(default = "default_from")]
    pub from: String,
    #[serde(default = "default_body")]
    pub body: String,
}

impl Default for ReplyConfig {
    fn default() -> Self {
        Self {
            from: default_from(),
            body: default_body(),
        }
    }
}

fn default_min_interval_secs() -> u64 {
    5
}

fn default_max_interval_secs() -> u64 {
    10
}

fn default_query() -> String {
    "in:inbox is:unread".to_string()
}

fn default_label_name() -> String {
    "PENDING".to_string()
}

fn default_from() -> String {
    "me".to_string()
}

fn default_body() -> String {
    "Dear,\n\nWe have received your mail. I am currently away and will reply soon.\n\nRegards"
        .to_string()
}

impl Config {
    pub async fn load(path: &Path) -> Result<Self> {
        // If file doesn't exist, return default config with warning
        if !path.exists() {
            tracing::warn!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| GmailError::ConfigError(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| GmailError::ConfigError(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;

        tracing::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    GmailError::ConfigError(format!("Failed to create config directory: {}", e))
                })?;
            }
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| GmailError::ConfigError(format!("Failed to serialize config: {}", e)))?;

        tokio::fs::write(path, content)
            .await
            .map_err(|e| GmailError::ConfigError(format!("Failed to write config file: {}", e)))?;

        tracing::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.poll.min_interval_secs == 0 {
            return Err(GmailError::ConfigError(
                "poll.min_interval_secs must be at least 1".to_string(),
            ));
        }
        if self.poll.min_interval_secs > self.poll.max_interval_secs {
            return Err(GmailError::ConfigError(format!(
                "poll.min_interval_secs ({}) cannot exceed poll.max_interval_secs ({})",
                self.poll.min_interval_secs, self.poll.max_interval_secs
            )));
        }
        if self.poll.query.trim().is_empty() {
            return Err(GmailError::ConfigError(
                "poll.query cannot be empty".to_string(),
            ));
        }
        if self.labels.name.trim().is_empty() {
            return Err(GmailError::ConfigError(
                "labels.name cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Write a config file populated with the defaults
    pub async fn create_example(path: &Path) -> Result<()> {
        Self::default().save(path).await
    }
}
