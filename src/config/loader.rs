//! Configuration Loader
//!
//! Environment-aware loading built on the `config` crate: TOML file discovery, environment
//! detection, environment-variable overrides and validation.

use super::error::ConfigResult;
use super::MolarConfig;
use config::{Config, Environment, File};
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};

const ENVIRONMENT_VARIABLE: &str = "MOLAR_ENV";
const ENV_PREFIX: &str = "MOLAR";
const ENV_SEPARATOR: &str = "__";
const BASE_FILE_NAME: &str = "molar";

static GLOBAL_CONFIG: OnceLock<Arc<ConfigManager>> = OnceLock::new();

/// Loaded configuration together with the context it was loaded from
#[derive(Debug)]
pub struct ConfigManager {
    config: MolarConfig,
    environment: String,
    config_directory: PathBuf,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        Self::load_from_directory(None)
    }

    /// Load configuration from a specific directory
    pub fn load_from_directory(config_dir: Option<PathBuf>) -> ConfigResult<Arc<ConfigManager>> {
        let environment = Self::detect_environment();
        Self::load_from_directory_with_env(config_dir, &environment)
    }

    /// Load configuration from a specific directory with an explicit environment
    pub fn load_from_directory_with_env(
        config_dir: Option<PathBuf>,
        environment: &str,
    ) -> ConfigResult<Arc<ConfigManager>> {
        Self::load_with_overrides(config_dir, environment, None)
    }

    /// Load configuration, reading environment overrides from `env_vars` instead of the
    /// process environment when given
    pub fn load_with_overrides(
        config_dir: Option<PathBuf>,
        environment: &str,
        env_vars: Option<HashMap<String, String>>,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let config_directory = config_dir.unwrap_or_else(Self::default_config_directory);

        debug!(
            environment = %environment,
            directory = %config_directory.display(),
            "Loading configuration"
        );

        let config = Self::load_and_merge_config(&config_directory, environment, env_vars)?;
        config.validate()?;

        info!(
            environment = %environment,
            database_host = %config.database.host,
            max_connections = config.database.max_connections,
            schemas = ?config.database.schemas,
            "Configuration loaded successfully"
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory,
        }))
    }

    fn load_and_merge_config(
        config_directory: &Path,
        environment: &str,
        env_vars: Option<HashMap<String, String>>,
    ) -> ConfigResult<MolarConfig> {
        let base_file = config_directory.join(format!("{BASE_FILE_NAME}.toml"));
        let environment_file = config_directory.join(format!("{BASE_FILE_NAME}.{environment}.toml"));

        let mut environment_source = Environment::with_prefix(ENV_PREFIX)
            .prefix_separator(ENV_SEPARATOR)
            .separator(ENV_SEPARATOR)
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("database.schemas");
        if let Some(vars) = env_vars {
            environment_source = environment_source.source(Some(vars.into_iter().collect()));
        }

        // Missing fields fall back to the serde defaults of each section
        let merged = Config::builder()
            .add_source(File::from(base_file).required(false))
            .add_source(File::from(environment_file).required(false))
            .add_source(environment_source)
            .build()?;

        merged.try_deserialize::<MolarConfig>().map_err(|error| {
            super::ConfigurationError::DeserializeError {
                error: error.to_string(),
            }
        })
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &MolarConfig {
        &self.config
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn config_directory(&self) -> &Path {
        &self.config_directory
    }

    /// Detect the environment from `MOLAR_ENV`
    pub fn detect_environment() -> String {
        env::var(ENVIRONMENT_VARIABLE).unwrap_or_else(|_| "development".to_string())
    }

    fn default_config_directory() -> PathBuf {
        PathBuf::from("config")
    }

    /// Process-wide configuration, loaded on first use
    ///
    /// Falls back to built-in defaults if loading fails, so callers always get a configuration.
    pub fn global() -> Arc<ConfigManager> {
        GLOBAL_CONFIG
            .get_or_init(|| match Self::load() {
                Ok(manager) => manager,
                Err(error) => {
                    warn!(error = %error, "Falling back to default configuration");
                    Arc::new(ConfigManager {
                        config: MolarConfig::default(),
                        environment: Self::detect_environment(),
                        config_directory: Self::default_config_directory(),
                    })
                }
            })
            .clone()
    }
}
