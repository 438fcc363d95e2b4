use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub telegram: TelegramConfig,
    pub scraper: ScraperConfig,
    pub sites: SitesConfig,
    pub checker: CheckerConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: Option<String>,
    pub api_base_url: String,
    /// Long-polling timeout for getUpdates, in seconds
    pub poll_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// Per-request timeout, in seconds
    pub request_timeout: u64,
    pub user_agent: String,
    pub accept_language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SitesConfig {
    pub ozon_base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckerConfig {
    pub interval_minutes: u64,
    /// Delay between two notification deliveries
    pub pacing_ms: u64,
    pub deduplicate: bool,
    pub allow_overlap: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub filter: String,
    /// Daily rolling log files are written here when set
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub endpoint: String,
}

impl CheckerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes * 60)
    }

    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }
}

impl AppConfig {
    pub fn load(config_dir: &Path) -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
        let source = |name: &str| config_dir.join(name).to_string_lossy().into_owned();

        let s = Config::builder()
            // Start with default configuration
            .add_source(File::with_name(&source("default")))
            // Add environment-specific config
            .add_source(File::with_name(&source(&run_mode)).required(false))
            // Add local config (ignored by git)
            .add_source(File::with_name(&source("local")).required(false))
            // Add environment variables with prefix "HUNTER__"
            .add_source(
                Environment::with_prefix("HUNTER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut config: AppConfig = s.try_deserialize()?;

        // Accept the conventional bot token variable as well
        if config.telegram.bot_token.is_none() {
            config.telegram.bot_token = env::var("TELEGRAM_BOT_TOKEN")
                .ok()
                .filter(|token| !token.trim().is_empty());
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        // Validate server configuration
        if self.server.port == 0 {
            return Err(ConfigError::Message("Server port must be greater than 0".into()));
        }

        // Validate site configuration
        match Url::parse(&self.sites.ozon_base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => {
                return Err(ConfigError::Message("Invalid site base URL format".into()));
            }
        }

        // Validate scraper configuration
        if self.scraper.request_timeout == 0 {
            return Err(ConfigError::Message("Scraper request_timeout must be greater than 0".into()));
        }

        if self.scraper.user_agent.trim().is_empty() {
            return Err(ConfigError::Message("Scraper user_agent must not be empty".into()));
        }

        // Validate checker configuration
        if self.checker.interval_minutes == 0 {
            return Err(ConfigError::Message("Checker interval_minutes must be greater than 0".into()));
        }

        if self.checker.pacing_ms == 0 {
            return Err(ConfigError::Message("Checker pacing_ms must be greater than 0".into()));
        }

        // Validate telegram configuration
        if self.telegram.poll_timeout == 0 {
            return Err(ConfigError::Message("Telegram poll_timeout must be greater than 0".into()));
        }

        // Validate metrics configuration
        if !self.metrics.endpoint.starts_with('/') {
            return Err(ConfigError::Message("Metrics endpoint must start with '/'".into()));
        }

        Ok(())
    }
}
