//! Configuration management for the weather proxy
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! environment variables. The provider credential has no default and a
//! missing one stops the process at start-up.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use chrono_tz::Tz;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

/// Config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "weather-proxy.toml";

/// Environment variable overriding [`DEFAULT_CONFIG_FILE`]
pub const CONFIG_PATH_ENV: &str = "WEATHER_PROXY_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Listening port
    #[serde(default = "default_port")]
    pub port: u16,
    /// OpenWeatherMap API key
    #[serde(default)]
    pub openweather_api_key: Option<String>,
    #[serde(default = "default_openweather_base_url")]
    pub openweather_base_url: String,
    /// RapidAPI key for the GeoDB autocomplete
    #[serde(default)]
    pub rapidapi_key: Option<String>,
    #[serde(default = "default_geodb_host")]
    pub geodb_host: String,
    #[serde(default = "default_upstream_timeout")]
    pub upstream_timeout_seconds: u64,
    #[serde(default = "default_rate_limit_max_requests")]
    pub rate_limit_max_requests: u32,
    #[serde(default = "default_rate_limit_window")]
    pub rate_limit_window_seconds: u64,
    /// IANA zone used to derive forecast calendar dates
    #[serde(default = "default_forecast_timezone")]
    pub forecast_timezone: String,
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

fn default_port() -> u16 {
    5001
}

fn default_openweather_base_url() -> String {
    "https://api.openweathermap.org/data/2.5".to_string()
}

fn default_geodb_host() -> String {
    "wft-geo-db.p.rapidapi.com".to_string()
}

fn default_upstream_timeout() -> u64 {
    8
}

fn default_rate_limit_max_requests() -> u32 {
    100
}

fn default_rate_limit_window() -> u64 {
    15 * 60
}

fn default_forecast_timezone() -> String {
    "UTC".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            openweather_api_key: None,
            openweather_base_url: default_openweather_base_url(),
            rapidapi_key: None,
            geodb_host: default_geodb_host(),
            upstream_timeout_seconds: default_upstream_timeout(),
            rate_limit_max_requests: default_rate_limit_max_requests(),
            rate_limit_window_seconds: default_rate_limit_window(),
            forecast_timezone: default_forecast_timezone(),
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

impl ProxyConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        let config_file = env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));

        let builder = Config::builder()
            .add_source(
                File::from(config_file)
                    .required(false)
                    .format(FileFormat::Toml),
            )
            .add_source(Environment::default());

        Self::from_builder(builder)
    }

    /// Build and validate from an already assembled set of sources
    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let config: ProxyConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_keys()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    fn validate_api_keys(&self) -> Result<()> {
        match self.openweather_api_key.as_deref().map(str::trim) {
            None | Some("") => bail!("OPENWEATHER_API_KEY must be set to a non-empty value"),
            Some(_) => Ok(()),
        }
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.upstream_timeout_seconds == 0 || self.upstream_timeout_seconds > 300 {
            bail!("Upstream timeout must be between 1 and 300 seconds");
        }

        if self.rate_limit_max_requests == 0 {
            bail!("Rate limit must allow at least one request");
        }

        if self.rate_limit_window_seconds == 0 {
            bail!("Rate limit window cannot be zero");
        }

        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.log_level.as_str()) {
            bail!(
                "Invalid log level '{}'. Must be one of: {}",
                self.log_level,
                valid_log_levels.join(", ")
            );
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.log_format.as_str()) {
            bail!(
                "Invalid log format '{}'. Must be one of: {}",
                self.log_format,
                valid_log_formats.join(", ")
            );
        }

        if !self.openweather_base_url.starts_with("http://")
            && !self.openweather_base_url.starts_with("https://")
        {
            bail!("OpenWeather base URL must be a valid HTTP or HTTPS URL");
        }

        self.forecast_tz()?;

        Ok(())
    }

    /// Parsed forecast time zone
    pub fn forecast_tz(&self) -> Result<Tz> {
        self.forecast_timezone
            .parse::<Tz>()
            .map_err(|_| anyhow!("Unknown forecast time zone '{}'", self.forecast_timezone))
    }

    #[must_use]
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_seconds)
    }

    #[must_use]
    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_seconds)
    }

    /// The API key, empty when unset. Only meaningful after [`Self::validate`].
    #[must_use]
    pub fn api_key(&self) -> &str {
        self.openweather_api_key.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> ProxyConfig {
        ProxyConfig {
            openweather_api_key: Some("0123456789abcdef".to_string()),
            ..ProxyConfig::default()
        }
    }

    #[test]
    fn test_default_config() {
        let config = ProxyConfig::default();
        assert_eq!(config.port, 5001);
        assert_eq!(config.openweather_base_url, "https://api.openweathermap.org/data/2.5");
        assert_eq!(config.upstream_timeout(), Duration::from_secs(8));
        assert_eq!(config.rate_limit_max_requests, 100);
        assert_eq!(config.rate_limit_window(), Duration::from_secs(900));
        assert_eq!(config.forecast_tz().unwrap(), Tz::UTC);
        assert!(config.openweather_api_key.is_none());
    }

    #[test]
    fn test_missing_api_key_fails_fast() {
        let result = ProxyConfig::default().validate();
        assert!(result.unwrap_err().to_string().contains("OPENWEATHER_API_KEY"));

        let mut blank = valid_config();
        blank.openweather_api_key = Some("   ".to_string());
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_numeric_ranges() {
        let mut config = valid_config();
        config.upstream_timeout_seconds = 0;
        assert!(config.validate().unwrap_err().to_string().contains("timeout"));

        let mut config = valid_config();
        config.rate_limit_max_requests = 0;
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.rate_limit_window_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_string_values() {
        let mut config = valid_config();
        config.log_level = "loud".to_string();
        assert!(config.validate().unwrap_err().to_string().contains("Invalid log level"));

        let mut config = valid_config();
        config.openweather_base_url = "ftp://example.org".to_string();
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.forecast_timezone = "Mars/Olympus_Mons".to_string();
        assert!(config.validate().unwrap_err().to_string().contains("time zone"));

        let mut config = valid_config();
        config.forecast_timezone = "Europe/Berlin".to_string();
        assert_eq!(config.forecast_tz().unwrap(), chrono_tz::Europe::Berlin);
    }

    #[test]
    fn test_from_builder_overrides() {
        let builder = Config::builder()
            .set_override("openweather_api_key", "key_from_override")
            .unwrap()
            .set_override("port", 8080)
            .unwrap()
            .set_override("forecast_timezone", "America/New_York")
            .unwrap();

        let config = ProxyConfig::from_builder(builder).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.api_key(), "key_from_override");
        assert_eq!(config.rate_limit_max_requests, 100);
        assert_eq!(config.forecast_tz().unwrap(), chrono_tz::America::New_York);
    }

    #[test]
    fn test_errors_are_not_request_errors() {
        let err = ProxyConfig::default().validate().unwrap_err();
        assert!(err.downcast_ref::<crate::ProxyError>().is_none());
    }

    #[test]
    fn test_from_builder_without_key() {
        let builder = Config::builder().set_override("port", 8080).unwrap();
        assert!(ProxyConfig::from_builder(builder).is_err());
    }
}
