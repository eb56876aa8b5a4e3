//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section, and every field has a default so an empty configuration is
//! valid.

pub mod logging;
pub mod metadata;
pub mod storage;

use serde::{Deserialize, Serialize};

pub use self::logging::LoggingConfig;
pub use self::metadata::MetadataConfig;
pub use self::storage::StorageConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Blob and snapshot storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Metadata store and cascade settings.
    #[serde(default)]
    pub metadata: MetadataConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay,
    /// an optional explicit file, and environment variables prefixed with
    /// `FILENEST` (nested keys separated by `__`).
    pub fn load(env: &str, explicit: Option<&str>) -> Result<Self, AppError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false));

        if let Some(path) = explicit {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix("FILENEST")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_source_uses_defaults() {
        let config: AppConfig = config::Config::builder()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(config.metadata.max_batch_operations, 500);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.storage.upload_chunk_size_bytes, 262_144);
    }

    #[test]
    fn test_toml_overrides_section() {
        let toml = r#"
            [metadata]
            max_batch_operations = 20

            [logging]
            format = "json"
        "#;
        let config: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(config.metadata.max_batch_operations, 20);
        assert_eq!(config.metadata.blob_delete_concurrency, 16);
        assert_eq!(config.logging.format, "json");
    }
}
