use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::download::DEFAULT_TIMEOUT;
use crate::media::is_valid_url;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Speech-to-text API settings
    pub api: ApiConfig,

    /// Media download settings
    pub download: DownloadConfig,

    /// Application settings
    pub app: AppConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the OpenAI-compatible API
    pub base_url: String,

    /// Transcription model name
    pub model: String,

    /// API key; the command line and `OPENAI_API_KEY` take precedence
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DownloadConfig {
    /// Connect and read timeout in seconds
    pub timeout_secs: u64,

    /// Directory for temporary media files (system temp dir if unset)
    pub temp_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Language hint used when none is given on the command line
    pub default_language: Option<String>,

    /// Warn when downloaded media exceeds this many (decimal) megabytes
    pub large_file_warning_mb: u64,

    /// Default output format
    pub default_output_format: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "whisper-1".to_string(),
            api_key: None,
        }
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            temp_dir: None,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_language: None,
            large_file_warning_mb: 50,
            default_output_format: "text".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            download: DownloadConfig::default(),
            app: AppConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file, writing the defaults there if it does not exist
    pub fn load(path_override: Option<&Path>) -> Result<Self> {
        let config_path = Self::config_path(path_override)?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Self::default();
            config.save_to(&config_path)?;
            tracing::debug!("Wrote default configuration to {}", config_path.display());
            Ok(config)
        }
    }

    /// Read and validate a configuration file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs_err::read_to_string(path)
            .context("Failed to read config file")?;

        let config: Config = serde_yaml::from_str(&content)
            .context("Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)
            .context("Failed to serialize config")?;

        fs_err::write(path, content)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Get configuration file path
    pub fn config_path(path_override: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = path_override {
            return Ok(path.to_path_buf());
        }

        // Current directory first for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?;

        Ok(config_dir.join("media-transcriptor").join("config.yaml"))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.download.timeout_secs == 0 {
            anyhow::bail!("download.timeout_secs must be greater than zero");
        }

        if !is_valid_url(&self.api.base_url) {
            anyhow::bail!("api.base_url must be an HTTP or HTTPS URL: {}", self.api.base_url);
        }

        if self.api.model.trim().is_empty() {
            anyhow::bail!("api.model must not be empty");
        }

        Ok(())
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  API Base URL: {}", self.api.base_url);
        println!("  Model: {}", self.api.model);
        println!(
            "  API Key: {}",
            if self.api.api_key.is_some() { "configured" } else { "not set (uses OPENAI_API_KEY)" }
        );
        println!("  Download Timeout: {}s", self.download.timeout_secs);
        if let Some(dir) = &self.download.temp_dir {
            println!("  Temp Directory: {}", dir.display());
        }
        if let Some(lang) = &self.app.default_language {
            println!("  Default Language: {}", lang);
        }
        println!("  Large File Warning: {} MB", self.app.large_file_warning_mb);
        println!("  Default Format: {}", self.app.default_output_format);
    }

    /// Connect and read timeout for downloads
    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download.timeout_secs)
    }

    /// Size above which a downloaded file triggers a warning
    pub fn large_file_warning_bytes(&self) -> u64 {
        self.app.large_file_warning_mb.saturating_mul(1_000_000)
    }

    /// Pick the API key: explicit value first, then the config file
    pub fn resolve_api_key(&self, explicit: Option<String>) -> Option<String> {
        explicit
            .or_else(|| self.api.api_key.clone())
            .filter(|key| !key.trim().is_empty())
    }
}
