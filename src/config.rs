use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;
use validator::Validate;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Parse error for {field}: {value} - {source}")]
    Parse {
        field: String,
        value: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Server configuration with validation
#[derive(Clone, Debug, Validate, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host address
    #[validate(length(min = 1, message = "HTTP host cannot be empty"))]
    pub http_host: String,

    /// HTTP server port (1-65535)
    #[validate(range(
        min = 1,
        max = 65535,
        message = "HTTP port must be between 1 and 65535"
    ))]
    pub http_port: u16,

    /// Database schema holding the spatial tables
    #[validate(length(min = 1, message = "Schema name cannot be empty"))]
    pub schema: String,

    /// Generative model used for SQL generation
    #[validate(length(min = 1, message = "Model name cannot be empty"))]
    pub model: String,

    /// Timeout in seconds applied to model calls and whole HTTP requests
    #[validate(range(
        min = 1,
        max = 600,
        message = "Request timeout must be between 1 and 600 seconds"
    ))]
    pub request_timeout_secs: u64,

    /// Number of times a failed model call is retried (0 = single attempt)
    #[validate(range(max = 5, message = "Generation retries must be at most 5"))]
    pub generation_retries: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_host: "0.0.0.0".to_string(),
            http_port: 5000,
            schema: "public".to_string(),
            model: "gemini-2.0-flash".to_string(),
            request_timeout_secs: 30,
            generation_retries: 0,
        }
    }
}

impl ServerConfig {
    /// Create configuration from environment variables with validation
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            http_host: env::var("GEOSEARCH_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            http_port: parse_env_var("GEOSEARCH_PORT", "5000")?,
            schema: env::var("PG_SCHEMA").unwrap_or_else(|_| "public".to_string()),
            model: env::var("GEOSEARCH_MODEL")
                .unwrap_or_else(|_| "gemini-2.0-flash".to_string()),
            request_timeout_secs: parse_env_var("GEOSEARCH_REQUEST_TIMEOUT_SECS", "30")?,
            generation_retries: parse_env_var("GEOSEARCH_GENERATION_RETRIES", "0")?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Create configuration from CLI arguments with validation
    ///
    /// Every unset CLI option falls back to its environment variable, then
    /// to the built-in default, so flags genuinely override the environment.
    pub fn from_cli(cli: CliConfig) -> Result<Self, ConfigError> {
        let config = Self {
            http_host: cli
                .http_host
                .or_else(|| env::var("GEOSEARCH_HOST").ok())
                .unwrap_or_else(|| "0.0.0.0".to_string()),
            http_port: match cli.http_port {
                Some(port) => port,
                None => parse_env_var("GEOSEARCH_PORT", "5000")?,
            },
            schema: cli
                .schema
                .or_else(|| env::var("PG_SCHEMA").ok())
                .unwrap_or_else(|| "public".to_string()),
            model: cli
                .model
                .or_else(|| env::var("GEOSEARCH_MODEL").ok())
                .unwrap_or_else(|| "gemini-2.0-flash".to_string()),
            request_timeout_secs: match cli.request_timeout_secs {
                Some(timeout) => timeout,
                None => parse_env_var("GEOSEARCH_REQUEST_TIMEOUT_SECS", "30")?,
            },
            generation_retries: match cli.generation_retries {
                Some(retries) => retries,
                None => parse_env_var("GEOSEARCH_GENERATION_RETRIES", "0")?,
            },
        };

        config.validate()?;
        Ok(config)
    }
}

/// CLI configuration (parsed from command line arguments)
///
/// Unset options are `None` so `from_cli` can fall back to the environment.
#[derive(Clone, Debug, Default)]
pub struct CliConfig {
    pub http_host: Option<String>,
    pub http_port: Option<u16>,
    pub schema: Option<String>,
    pub model: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub generation_retries: Option<u32>,
}

/// Parse an environment variable with a default value
fn parse_env_var<T: std::str::FromStr>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = env::var(key).unwrap_or_else(|_| default.to_string());
    value.parse().map_err(|e| ConfigError::Parse {
        field: key.to_string(),
        value,
        source: Box::new(e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.http_port, 5000);
        assert_eq!(config.schema, "public");
        assert_eq!(config.generation_retries, 0);
    }

    #[test]
    fn test_invalid_port_range() {
        let config = ServerConfig {
            http_port: 0, // Invalid
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_timeout() {
        let config = ServerConfig {
            request_timeout_secs: 601, // Invalid (> 600)
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_schema() {
        let config = ServerConfig {
            schema: "".to_string(), // Invalid
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_from_env_reads_schema() {
        std::env::set_var("PG_SCHEMA", "nairobi");
        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.schema, "nairobi");
        std::env::remove_var("PG_SCHEMA");
    }

    #[test]
    #[serial]
    fn test_cli_overrides_env_schema() {
        std::env::set_var("PG_SCHEMA", "nairobi");
        let cli = CliConfig {
            schema: Some("mombasa".to_string()),
            ..Default::default()
        };
        let config = ServerConfig::from_cli(cli).unwrap();
        assert_eq!(config.schema, "mombasa");
        std::env::remove_var("PG_SCHEMA");
    }

    #[test]
    #[serial]
    fn test_unset_cli_flags_fall_back_to_env() {
        std::env::set_var("GEOSEARCH_PORT", "8123");
        std::env::set_var("GEOSEARCH_REQUEST_TIMEOUT_SECS", "45");
        std::env::set_var("GEOSEARCH_GENERATION_RETRIES", "2");

        let config = ServerConfig::from_cli(CliConfig::default()).unwrap();
        assert_eq!(config.http_port, 8123);
        assert_eq!(config.request_timeout_secs, 45);
        assert_eq!(config.generation_retries, 2);

        std::env::remove_var("GEOSEARCH_PORT");
        std::env::remove_var("GEOSEARCH_REQUEST_TIMEOUT_SECS");
        std::env::remove_var("GEOSEARCH_GENERATION_RETRIES");
    }

    #[test]
    #[serial]
    fn test_from_cli_sees_dotenv_provided_schema() {
        std::env::remove_var("PG_SCHEMA");

        // Simulate main's startup order: the .env file is loaded before the
        // config fallbacks read the environment.
        let env_file = std::env::temp_dir().join("geosearch_config_test.env");
        std::fs::write(&env_file, "PG_SCHEMA=dotenv_schema\n").unwrap();
        dotenvy::from_path(&env_file).unwrap();

        let config = ServerConfig::from_cli(CliConfig::default()).unwrap();
        assert_eq!(config.schema, "dotenv_schema");

        std::env::remove_var("PG_SCHEMA");
        std::fs::remove_file(&env_file).ok();
    }
}
