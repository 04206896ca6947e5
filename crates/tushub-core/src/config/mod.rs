//! Application configuration schemas.
//!
//! All configuration structs are deserialized via the `config` crate from
//! `config/default.toml`, an optional explicit file, and environment
//! variables prefixed with `TUSHUB`.

pub mod hooks;
pub mod logging;
pub mod storage;

use serde::{Deserialize, Serialize};

pub use self::hooks::{
    BackendConfig, FileHookConfig, GrpcHookConfig, HooksConfig, HttpHookConfig, PluginHookConfig,
};
pub use self::logging::LoggingConfig;
pub use self::storage::StorageConfig;

use crate::error::AppError;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Hook dispatch settings.
    #[serde(default)]
    pub hooks: HooksConfig,
    /// Local upload storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration.
    ///
    /// Merges `config/default.toml` (if present), the given file, and
    /// environment variables such as `TUSHUB__HOOKS__STOP_UPLOAD_CODE=1`.
    /// `TUSHUB__HOOKS__ENABLED_HOOKS` accepts a comma separated list.
    pub fn load(path: Option<&str>) -> Result<Self, AppError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false));

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix("TUSHUB")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("hooks.enabled_hooks")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }

    /// Parse configuration from a TOML document.
    pub fn from_toml_str(toml: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
