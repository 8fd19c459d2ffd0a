//! API configuration

use serde::{Deserialize, Serialize};

use core_kernel::Timezone;
use infra_db::DataEnvironment;

/// Output format of the log subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// JWT secret for authentication
    pub jwt_secret: String,
    /// JWT expiration in seconds
    pub jwt_expiration_secs: u64,
    /// Database URL
    pub database_url: String,
    /// Which data set the server reads
    pub data_environment: DataEnvironment,
    /// Time zone used for report days when a request names none
    pub default_timezone: Timezone,
    /// Log level
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            jwt_secret: "change-me-in-production".to_string(),
            jwt_expiration_secs: 3600,
            database_url: "postgres://localhost/tutor_desk".to_string(),
            data_environment: DataEnvironment::Development,
            default_timezone: Timezone::default(),
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from `API_*` environment variables over the defaults
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Config::try_from(&ApiConfig::default())?)
            .add_source(config::Environment::with_prefix("API").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_round_trip_through_config() {
        let loaded: ApiConfig = config::Config::builder()
            .add_source(config::Config::try_from(&ApiConfig::default()).unwrap())
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(loaded.port, 8080);
        assert_eq!(loaded.data_environment, DataEnvironment::Development);
        assert_eq!(loaded.default_timezone, Timezone::default());
        assert_eq!(loaded.log_format, LogFormat::Text);
    }

    #[test]
    fn test_overrides_are_applied() {
        let loaded: ApiConfig = config::Config::builder()
            .add_source(config::Config::try_from(&ApiConfig::default()).unwrap())
            .set_override("data_environment", "production")
            .unwrap()
            .set_override("default_timezone", "Asia/Kolkata")
            .unwrap()
            .set_override("log_format", "json")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(loaded.data_environment, DataEnvironment::Production);
        assert_eq!(loaded.default_timezone.name(), "Asia/Kolkata");
        assert_eq!(loaded.log_format, LogFormat::Json);
        assert_eq!(loaded.server_addr(), "0.0.0.0:8080");
    }
}
