//! # Configuration Management Module
//!
//! Settings for where documents are fetched from, where table files live and how the
//! crawler treats ids that are already present locally.
//!
//! ## Configuration Structure
//!
//! - [`SourceConfig`] - Remote detail pages and baseline datasets
//! - [`StorageConfig`] - Table file location and naming
//! - [`CrawlConfig`] - Conflict policy for ids already present locally
//! - [`LoggingConfig`] - Logging level and optional log file
//!
//! ## Usage
//!
//! ```rust,no_run
//! use dbextract::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("dbextract.toml").await?;
//!     println!("Tables under: {}", config.storage.db_dir);
//!
//!     Config::create_default("dbextract.toml").await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration File Format
//!
//! ```toml
//! [source]
//! detail_url = "https://database.turtle-wow.org/"
//! baseline_url = "https://raw.githubusercontent.com/shagu/pfQuest/master/db/"
//! timeout_seconds = 30
//!
//! [storage]
//! db_dir = "./db"
//! locale = "enUS"
//! suffix = "turtle"
//!
//! [crawl]
//! conflict = "ask"
//!
//! [logging]
//! level = "info"
//! ```
//!
//! CLI arguments override the file, which overrides the defaults.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::crawler::ConflictPolicy;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Base of detail pages; `?<type>=<id>` is appended.
    pub detail_url: String,
    /// Base of the baseline datasets; `<file>s.lua` is appended.
    pub baseline_url: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("dbextract/{}", env!("CARGO_PKG_VERSION"))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub db_dir: String,
    #[serde(default = "default_locale")]
    pub locale: String,
    #[serde(default = "default_suffix")]
    pub suffix: String,
}

fn default_locale() -> String {
    "enUS".to_string()
}

fn default_suffix() -> String {
    "turtle".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CrawlConfig {
    #[serde(default)]
    pub conflict: ConflictPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub source: SourceConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub crawl: CrawlConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        Ok(config)
    }

    /// Load configuration from a file, or the defaults when the file does not exist.
    /// A file that exists but cannot be read or parsed is an error.
    pub async fn load_or_default(path: &str) -> Result<Self> {
        match fs::try_exists(path).await {
            Ok(false) => Ok(Config::default()),
            _ => Self::load(path).await,
        }
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    pub fn log_level(&self) -> log::LevelFilter {
        self.logging
            .level
            .parse()
            .unwrap_or(log::LevelFilter::Info)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            source: SourceConfig {
                detail_url: "https://database.turtle-wow.org/".to_string(),
                baseline_url: "https://raw.githubusercontent.com/shagu/pfQuest/master/db/"
                    .to_string(),
                timeout_seconds: default_timeout_seconds(),
                user_agent: default_user_agent(),
            },
            storage: StorageConfig {
                db_dir: "./db".to_string(),
                locale: default_locale(),
                suffix: default_suffix(),
            },
            crawl: CrawlConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                file: None,
            },
        }
    }
}
