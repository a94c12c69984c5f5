//! Production configuration system
//!
//! Provides centralized configuration management with:
//! - Config file loading (explicit path or well-known locations)
//! - Environment variable overrides
//! - Runtime defaults
//! - Validation and type safety
//!
//! Domain data that the reports depend on (referrer aliases, collection
//! prefixes, facet prefixes) lives here rather than in code.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::pagination::DEFAULT_MAX_PAGES;
use crate::search_terms::DEFAULT_FACET_PREFIX;

/// Largest page the reporting API will serve.
pub const MAX_PAGE_SIZE: u32 = 100_000;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub logging: LoggingConfig,

    /// Reporting API connection
    pub api: ApiConfig,

    /// Pagination guards
    pub pagination: PaginationConfig,

    /// Raw identifier -> canonical label
    pub aliases: HashMap<String, String>,

    /// Search term report inputs
    pub search: SearchConfig,

    /// Monthly report inputs
    pub monthly: MonthlyConfig,

    /// Output configuration
    pub output: OutputConfig,

    /// Paths configuration
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub output: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub endpoint: String,
    pub view_id: String,
    pub access_token: Option<String>,
    pub page_size: u32,
    pub timeout_secs: u64,
    pub max_retries: usize,
    pub retry_backoff_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub max_pages: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub collections: Vec<String>,
    pub facet_prefixes: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MonthlyConfig {
    pub host_prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: PathBuf,
    pub json_pretty: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub log_directory: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "WARN".to_string(),
            format: "pretty".to_string(),
            output: "console".to_string(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://analyticsreporting.googleapis.com/v4/reports:batchGet".to_string(),
            view_id: String::new(),
            access_token: None,
            page_size: 10_000,
            timeout_secs: 60,
            max_retries: 3,
            retry_backoff_ms: 500,
        }
    }
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            collections: Vec::new(),
            facet_prefixes: vec![DEFAULT_FACET_PREFIX.to_string()],
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("reports"),
            json_pretty: true,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            log_directory: PathBuf::from("logs"),
        }
    }
}

impl Config {
    /// Load configuration from an explicit file or the default locations,
    /// then environment, then validate.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => {
                info!(config_file = %path.display(), "Loading configuration from file");
                Self::load_from_file(path)?
            }
            None => Self::discover()?,
        };

        // Override with environment variables
        config.apply_env_overrides()?;

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    fn discover() -> Result<Self> {
        let config_paths = [
            PathBuf::from("analytics-report.toml"),
            PathBuf::from(".analytics-report.toml"),
            dirs::config_dir()
                .map(|d| d.join("analytics-report").join("config.toml"))
                .unwrap_or_default(),
        ];

        for path in &config_paths {
            if path.is_file() {
                info!(config_file = %path.display(), "Loading configuration from file");
                return Self::load_from_file(path);
            }
        }
        Ok(Self::default())
    }

    /// Load configuration from TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        // Logging overrides
        if let Ok(val) = env::var("LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = env::var("LOG_FORMAT") {
            self.logging.format = val;
        }
        if let Ok(val) = env::var("LOG_OUTPUT") {
            self.logging.output = val;
        }

        // API overrides
        if let Ok(val) = env::var("ANALYTICS_API_ENDPOINT") {
            self.api.endpoint = val;
        }
        if let Ok(val) = env::var("ANALYTICS_VIEW_ID") {
            self.api.view_id = val;
        }
        if let Ok(val) = env::var("ANALYTICS_ACCESS_TOKEN") {
            self.api.access_token = Some(val);
        }
        if let Ok(val) = env::var("ANALYTICS_PAGE_SIZE") {
            self.api.page_size = val.parse().context("Invalid ANALYTICS_PAGE_SIZE")?;
        }
        if let Ok(val) = env::var("ANALYTICS_TIMEOUT_SECS") {
            self.api.timeout_secs = val.parse().context("Invalid ANALYTICS_TIMEOUT_SECS")?;
        }

        // Pagination overrides
        if let Ok(val) = env::var("ANALYTICS_MAX_PAGES") {
            self.pagination.max_pages = val.parse().context("Invalid ANALYTICS_MAX_PAGES")?;
        }

        // Path overrides
        if let Ok(val) = env::var("ANALYTICS_OUTPUT_DIR") {
            self.output.directory = PathBuf::from(val);
        }
        if let Ok(val) = env::var("ANALYTICS_LOG_DIR") {
            self.paths.log_directory = PathBuf::from(val);
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.api.page_size == 0 || self.api.page_size > MAX_PAGE_SIZE {
            return Err(anyhow::anyhow!(
                "Page size must be between 1 and {}, got {}",
                MAX_PAGE_SIZE,
                self.api.page_size
            ));
        }

        if self.api.timeout_secs == 0 {
            return Err(anyhow::anyhow!("Request timeout must be greater than 0"));
        }

        if self.pagination.max_pages == 0 {
            return Err(anyhow::anyhow!("Max pages must be greater than 0"));
        }

        if self.aliases.keys().any(|k| k.trim().is_empty()) {
            return Err(anyhow::anyhow!("Alias table contains an empty identifier"));
        }

        if self.api.view_id.is_empty() {
            warn!("No view id configured; requests will be rejected by the reporting API");
        }

        // Create the log directory only when something will be written there
        if self.logging.output != "console" && !self.paths.log_directory.exists() {
            fs::create_dir_all(&self.paths.log_directory)
                .context("Failed to create log directory")?;
        }

        Ok(())
    }

    /// Save current configuration to file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        info!(path = %path.display(), "Configuration saved to file");

        Ok(())
    }
}
