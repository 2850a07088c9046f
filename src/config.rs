//! Configuration module for loading and parsing TOML configuration files.
//!
//! Values come from a TOML file and are then overridden by a fixed set of
//! environment variables, so secrets never need to live in the file.

use crate::snapshot::JobSettings;
use chrono_tz::Tz;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "SPX_CONFIG";

/// Configuration file used when [`CONFIG_PATH_ENV`] is unset.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse TOML configuration.
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    /// Invalid configuration value.
    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Tradier market-data configuration.
    pub tradier: TradierConfig,
    /// Snapshot job configuration.
    pub snapshot: SnapshotConfig,
    /// Administrative endpoint configuration.
    pub admin: AdminConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port number to listen on.
    pub port: u16,
    /// Origins allowed by CORS.
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["http://localhost:5173".to_string()],
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL.
    pub url: String,
    /// Maximum pool size.
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
        }
    }
}

/// Tradier configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TradierConfig {
    /// API base URL.
    pub base_url: String,
    /// Bearer token.
    pub access_token: String,
    /// Brokerage account, unused by market-data calls.
    pub account_id: Option<String>,
}

impl Default for TradierConfig {
    fn default() -> Self {
        Self {
            base_url: tradier_client::DEFAULT_BASE_URL.to_string(),
            access_token: String::new(),
            account_id: None,
        }
    }
}

/// Snapshot job configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    /// Minutes between scheduled runs.
    pub interval_minutes: u64,
    /// Underlying symbol.
    pub underlying: String,
    /// Target days-to-expiration.
    pub dte_targets: Vec<u32>,
    /// Accepted distance from the target date, in days.
    pub dte_tolerance_days: u32,
    /// IANA timezone name of the exchange.
    pub timezone: String,
    /// Capture outside regular trading hours.
    pub allow_outside_rth: bool,
    /// Abort a run when one chain fetch fails.
    pub abort_on_chain_failure: bool,
    /// Run once immediately at startup.
    pub run_on_startup: bool,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            interval_minutes: 5,
            underlying: "SPX".to_string(),
            dte_targets: vec![3, 5, 7],
            dte_tolerance_days: 1,
            timezone: "America/New_York".to_string(),
            allow_outside_rth: false,
            abort_on_chain_failure: true,
            run_on_startup: true,
        }
    }
}

impl SnapshotConfig {
    /// Parsed exchange timezone.
    ///
    /// # Errors
    /// Returns error if the name is not a known IANA timezone.
    pub fn tz(&self) -> Result<Tz, ConfigError> {
        self.timezone.parse::<Tz>().map_err(|_| {
            ConfigError::InvalidValue(format!("unknown timezone: {}", self.timezone))
        })
    }

    /// Snapshot job settings derived from this section.
    ///
    /// # Errors
    /// Returns error if the timezone is unknown.
    pub fn job_settings(&self) -> Result<JobSettings, ConfigError> {
        Ok(JobSettings {
            underlying: self.underlying.trim().to_uppercase(),
            dte_targets: self.dte_targets.clone(),
            tolerance_days: self.dte_tolerance_days,
            timezone: self.tz()?,
            allow_outside_rth: self.allow_outside_rth,
            abort_on_chain_failure: self.abort_on_chain_failure,
        })
    }

    /// Scheduler period.
    #[must_use]
    pub fn interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.interval_minutes.saturating_mul(60))
    }
}

/// Administrative endpoint configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Key expected in `X-API-Key`; the endpoint is disabled when unset.
    pub api_key: Option<String>,
}

impl Config {
    /// Loads configuration from a TOML file, applies environment overrides
    /// and validates the result.
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file.
    ///
    /// # Errors
    /// Returns error if file cannot be read, parsed or validated.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Loads from the file named by `SPX_CONFIG`, falling back to defaults
    /// plus environment when the file does not exist.
    ///
    /// # Errors
    /// Returns error if the file exists but is invalid, or if the resulting
    /// configuration fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        if Path::new(&path).exists() {
            return Self::load(path);
        }

        let mut config = Config::default();
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Arguments
    /// * `content` - TOML content as string.
    ///
    /// # Errors
    /// Returns error if content cannot be parsed or validated.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Overrides deployment values from `lookup`, usually the process
    /// environment.
    ///
    /// # Errors
    /// Returns error if `PORT` is not a valid port number.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(token) = lookup("TRADIER_ACCESS_TOKEN") {
            self.tradier.access_token = token;
        }
        if let Some(base_url) = lookup("TRADIER_BASE_URL") {
            self.tradier.base_url = base_url;
        }
        if let Some(key) = lookup("ADMIN_API_KEY") {
            self.admin.api_key = Some(key);
        }
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| ConfigError::InvalidValue(format!("PORT is not a port: {port}")))?;
        }
        Ok(())
    }

    /// Validates the configuration values.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "database.url must be set".to_string(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "database.max_connections must be positive".to_string(),
            ));
        }
        if self.tradier.access_token.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "tradier.access_token must be set".to_string(),
            ));
        }
        if self.snapshot.underlying.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "snapshot.underlying cannot be empty".to_string(),
            ));
        }
        if self.snapshot.dte_targets.is_empty() {
            return Err(ConfigError::InvalidValue(
                "at least one snapshot.dte_targets entry must be configured".to_string(),
            ));
        }
        if self.snapshot.interval_minutes == 0 {
            return Err(ConfigError::InvalidValue(
                "snapshot.interval_minutes must be positive".to_string(),
            ));
        }
        self.snapshot.tz()?;
        if matches!(self.admin.api_key.as_deref(), Some(key) if key.is_empty()) {
            return Err(ConfigError::InvalidValue(
                "admin.api_key cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const MINIMAL: &str = r#"
[database]
url = "postgres://localhost/spx"

[tradier]
access_token = "token"
"#;

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[server]
host = "127.0.0.1"
port = 3000
cors_origins = ["http://localhost:5173", "https://spx.example.com"]

[database]
url = "postgres://localhost/spx"
max_connections = 4

[tradier]
base_url = "https://api.tradier.com/v1"
access_token = "secret"
account_id = "VA000000"

[snapshot]
interval_minutes = 1
underlying = "SPX"
dte_targets = [0, 1, 3]
dte_tolerance_days = 2
timezone = "America/Chicago"
allow_outside_rth = true
abort_on_chain_failure = false
run_on_startup = false

[admin]
api_key = "admin-key"
"#;

        let config = Config::parse(toml_content).expect("should parse");
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.cors_origins.len(), 2);
        assert_eq!(config.database.max_connections, 4);
        assert_eq!(config.tradier.account_id.as_deref(), Some("VA000000"));
        assert_eq!(config.snapshot.dte_targets, vec![0, 1, 3]);
        assert_eq!(config.snapshot.dte_tolerance_days, 2);
        assert_eq!(config.snapshot.tz().unwrap(), chrono_tz::America::Chicago);
        assert!(config.snapshot.allow_outside_rth);
        assert!(!config.snapshot.abort_on_chain_failure);
        assert!(!config.snapshot.run_on_startup);
        assert_eq!(config.admin.api_key.as_deref(), Some("admin-key"));
    }

    #[test]
    fn test_defaults_applied() {
        let config = Config::parse(MINIMAL).expect("should parse");
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.cors_origins, vec!["http://localhost:5173"]);
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.tradier.base_url, "https://sandbox.tradier.com/v1");
        assert_eq!(config.snapshot.interval_minutes, 5);
        assert_eq!(config.snapshot.underlying, "SPX");
        assert_eq!(config.snapshot.dte_targets, vec![3, 5, 7]);
        assert_eq!(config.snapshot.dte_tolerance_days, 1);
        assert_eq!(config.snapshot.tz().unwrap(), chrono_tz::America::New_York);
        assert!(!config.snapshot.allow_outside_rth);
        assert!(config.snapshot.abort_on_chain_failure);
        assert!(config.snapshot.run_on_startup);
        assert!(config.admin.api_key.is_none());
    }

    #[test]
    fn test_job_settings() {
        let mut config = Config::parse(MINIMAL).unwrap();
        config.snapshot.underlying = " spx ".to_string();
        let settings = config.snapshot.job_settings().unwrap();
        assert_eq!(settings.underlying, "SPX");
        assert_eq!(settings.dte_targets, vec![3, 5, 7]);
        assert_eq!(settings.tolerance_days, 1);
        assert_eq!(settings.timezone, chrono_tz::America::New_York);
        assert!(settings.abort_on_chain_failure);
        assert_eq!(config.snapshot.interval().as_secs(), 300);
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("DATABASE_URL", "postgres://db/override"),
            ("TRADIER_ACCESS_TOKEN", "env-token"),
            ("TRADIER_BASE_URL", "https://api.tradier.com/v1"),
            ("ADMIN_API_KEY", "env-admin"),
            ("HOST", "127.0.0.1"),
            ("PORT", "9000"),
        ]);
        let mut config = Config::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.database.url, "postgres://db/override");
        assert_eq!(config.tradier.access_token, "env-token");
        assert_eq!(config.tradier.base_url, "https://api.tradier.com/v1");
        assert_eq!(config.admin.api_key.as_deref(), Some("env-admin"));
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_port_override() {
        let mut config = Config::default();
        let result = config.apply_overrides(|key| (key == "PORT").then(|| "http".to_string()));
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_validation_missing_secrets() {
        assert!(Config::default().validate().is_err());

        let mut config = Config::default();
        config.database.url = "postgres://localhost/spx".to_string();
        assert!(config.validate().is_err());

        config.tradier.access_token = "token".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_empty_targets() {
        let mut config = Config::parse(MINIMAL).unwrap();
        config.snapshot.dte_targets.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_zero_interval() {
        let mut config = Config::parse(MINIMAL).unwrap();
        config.snapshot.interval_minutes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_unknown_timezone() {
        let mut config = Config::parse(MINIMAL).unwrap();
        config.snapshot.timezone = "Mars/Olympus_Mons".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_negative_target_rejected() {
        let content = format!("{MINIMAL}\n[snapshot]\ndte_targets = [3, -1]\n");
        assert!(matches!(
            Config::parse(&content),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_empty_admin_key_rejected() {
        let content = format!("{MINIMAL}\n[admin]\napi_key = \"\"\n");
        assert!(Config::parse(&content).is_err());
    }
}
