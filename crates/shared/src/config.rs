//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Code and rollup engine configuration.
    #[serde(default)]
    pub engine: EngineConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Engine configuration.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct EngineConfig {
    /// Fail allocation when an existing sibling suffix is not numeric,
    /// instead of leaving it out of the max computation.
    #[serde(default)]
    pub strict_suffixes: bool,
    /// How many times a create-with-allocate sequence is retried after
    /// losing a uniqueness race before the conflict reaches the caller.
    #[serde(default = "default_create_retries")]
    pub create_retries: u32,
}

fn default_create_retries() -> u32 {
    1
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strict_suffixes: false,
            create_retries: default_create_retries(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Default `EnvFilter` directive, used when `RUST_LOG` is not set.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

fn default_log_filter() -> String {
    "aip=info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Sources, later ones winning: `config/default`, `config/{RUN_MODE}`,
    /// then `AIP__*` environment variables (e.g. `AIP__DATABASE__URL`).
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("AIP").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_environment() {
        temp_env::with_vars(
            [
                ("AIP__DATABASE__URL", Some("postgres://localhost/aip_test")),
                ("AIP__ENGINE__STRICT_SUFFIXES", Some("true")),
                ("RUN_MODE", Some("test-no-such-file")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.database.url, "postgres://localhost/aip_test");
                assert_eq!(config.database.max_connections, 10);
                assert!(config.engine.strict_suffixes);
                assert_eq!(config.engine.create_retries, 1);
                assert_eq!(config.logging, LoggingConfig::default());
            },
        );
    }

    #[test]
    fn test_missing_database_url_fails() {
        temp_env::with_vars(
            [
                ("AIP__DATABASE__URL", None::<&str>),
                ("RUN_MODE", Some("test-no-such-file")),
            ],
            || {
                assert!(AppConfig::load().is_err());
            },
        );
    }

    #[test]
    fn test_engine_defaults() {
        let engine = EngineConfig::default();
        assert!(!engine.strict_suffixes);
        assert_eq!(engine.create_retries, 1);
    }
}
