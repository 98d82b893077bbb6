use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_BASE_URL: &str = "http://localhost:8080/v1";
const DEFAULT_COURIER_RATES_URL: &str = "https://api.rajaongkir.com/starter";
const DEFAULT_COURIERS: [&str; 3] = ["jne", "pos", "tiki"];
const CONFIG_DIR: &str = "config";

/// Client configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Base URL of the marketplace backend, e.g. `https://api.example.com/v1`
    #[validate(url)]
    pub base_url: String,

    /// Per-request timeout in seconds. Unset means requests may wait indefinitely.
    #[serde(default)]
    #[validate(range(min = 1, max = 300))]
    pub request_timeout_secs: Option<u64>,

    /// Application environment
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Where the CLI persists the session tokens
    #[serde(default)]
    pub session_file: Option<PathBuf>,

    /// Shipping rate provider queried for courier costs
    #[serde(default = "default_courier_rates_url")]
    #[validate(url)]
    pub courier_rates_url: String,

    /// API key sent with every rate lookup
    #[serde(default)]
    pub courier_api_key: Option<String>,

    /// Courier codes offered at checkout
    #[serde(default = "default_couriers")]
    #[validate(length(min = 1))]
    pub couriers: Vec<String>,
}

impl ClientConfig {
    /// Creates a configuration pointing at `base_url` with defaults for everything else
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            request_timeout_secs: None,
            environment: default_environment(),
            log_level: default_log_level(),
            log_json: false,
            session_file: None,
            courier_rates_url: default_courier_rates_url(),
            courier_api_key: None,
            couriers: default_couriers(),
        }
    }

    /// Base URL without a trailing slash, ready for path joining
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Gets log level reference
    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    /// Rate provider URL without a trailing slash
    pub fn courier_rates_url(&self) -> &str {
        self.courier_rates_url.trim_end_matches('/')
    }

    /// Session file location: explicit setting, else `$HOME/.storefront/session.json`
    pub fn session_file_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.session_file {
            return Some(path.clone());
        }

        env::var("HOME").ok().map(|home| {
            let mut path = PathBuf::from(home);
            path.push(".storefront");
            path.push("session.json");
            path
        })
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ClientConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}

fn default_courier_rates_url() -> String {
    DEFAULT_COURIER_RATES_URL.to_string()
}

fn default_couriers() -> Vec<String> {
    DEFAULT_COURIERS.iter().map(|c| c.to_string()).collect()
}

/// Validates log level values
fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if valid_levels.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("log_level");
        err.message = Some("Must be one of: trace, debug, info, warn, error".into());
        Err(err)
    }
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!("storefront_client={},storefront_cli={}", level, level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    // try_init: a subscriber may already be installed by an embedding application
    if json {
        let _ = fmt()
            .with_env_filter(EnvFilter::new(filter_directive))
            .json()
            .try_init();
    } else {
        let _ = fmt()
            .with_env_filter(EnvFilter::new(filter_directive))
            .try_init();
    }
}

/// Loads client configuration from `./config`
///
/// Layers configuration sources in this order:
/// 1. Built-in defaults
/// 2. Default config (config/default.toml)
/// 3. Environment-specific config (config/{env}.toml)
/// 4. Environment variables (APP__*)
pub fn load_config() -> Result<ClientConfig, ClientConfigError> {
    load_config_from(Path::new(CONFIG_DIR))
}

/// Same as [`load_config`] but reading files from `config_dir`
pub fn load_config_from(config_dir: &Path) -> Result<ClientConfig, ClientConfigError> {
    // Support both RUN_ENV and APP_ENV for selecting config profile
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !config_dir.exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            config_dir.display()
        );
    }

    let config = Config::builder()
        .set_default("base_url", DEFAULT_BASE_URL)?
        .set_default("environment", DEFAULT_ENV)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(
            File::with_name(&config_dir.join("default").to_string_lossy()).required(false),
        )
        .add_source(File::with_name(&config_dir.join(&run_env).to_string_lossy()).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let client_config: ClientConfig = config.try_deserialize()?;

    client_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        ClientConfigError::Validation(e)
    })?;

    info!("Configuration loaded successfully");
    Ok(client_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn config_dir_with(content: &str) -> TempDir {
        let dir = TempDir::new().expect("temp dir");
        fs::write(dir.path().join("default.toml"), content).expect("write default.toml");
        dir
    }

    #[test]
    fn new_config_is_valid() {
        let cfg = ClientConfig::new("https://api.example.com/v1/");
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.base_url(), "https://api.example.com/v1");
        assert!(cfg.request_timeout().is_none());
    }

    #[test]
    fn rejects_non_url_base() {
        let cfg = ClientConfig::new("not a url");
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_unknown_log_level() {
        let mut cfg = ClientConfig::new("https://api.example.com");
        cfg.log_level = "verbose".into();
        let errors = cfg.validate().expect_err("log level should be rejected");
        assert!(errors.field_errors().contains_key("log_level"));
    }

    #[test]
    fn rejects_out_of_range_timeout() {
        let mut cfg = ClientConfig::new("https://api.example.com");
        cfg.request_timeout_secs = Some(0);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn loads_values_from_default_file() {
        let dir = config_dir_with(
            r#"
            base_url = "https://shop.example.com/api"
            request_timeout_secs = 15
            log_level = "debug"
            "#,
        );

        let cfg = load_config_from(dir.path()).expect("config should load");

        assert_eq!(cfg.base_url(), "https://shop.example.com/api");
        assert_eq!(cfg.request_timeout(), Some(Duration::from_secs(15)));
        assert_eq!(cfg.log_level(), "debug");
        assert_eq!(cfg.courier_rates_url(), "https://api.rajaongkir.com/starter");
        assert_eq!(cfg.couriers, vec!["jne", "pos", "tiki"]);
    }

    #[test]
    fn courier_settings_come_from_file() {
        let dir = config_dir_with(
            r#"
            courier_rates_url = "https://rates.example.com/starter/"
            courier_api_key = "secret"
            couriers = ["jne", "sicepat"]
            "#,
        );

        let cfg = load_config_from(dir.path()).expect("config should load");

        assert_eq!(cfg.courier_rates_url(), "https://rates.example.com/starter");
        assert_eq!(cfg.courier_api_key.as_deref(), Some("secret"));
        assert_eq!(cfg.couriers, vec!["jne", "sicepat"]);
    }

    #[test]
    fn rejects_empty_courier_list() {
        let mut cfg = ClientConfig::new("https://api.example.com");
        cfg.couriers.clear();
        let errors = cfg.validate().expect_err("empty courier list should be rejected");
        assert!(errors.field_errors().contains_key("couriers"));
    }

    #[test]
    fn invalid_file_values_fail_validation() {
        let dir = config_dir_with(r#"base_url = "::nope::""#);

        let result = load_config_from(dir.path());

        assert!(matches!(result, Err(ClientConfigError::Validation(_))));
    }

    #[test]
    fn explicit_session_file_wins() {
        let mut cfg = ClientConfig::new("https://api.example.com");
        cfg.session_file = Some(PathBuf::from("/tmp/session.json"));
        assert_eq!(
            cfg.session_file_path(),
            Some(PathBuf::from("/tmp/session.json"))
        );
    }
}
