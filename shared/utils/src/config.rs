use anyhow::Result;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub catalog: CatalogConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Path to the catalog source (CSV, XLSX, or Markdown table).
    pub source_path: String,
    /// Format override; detected from the file extension when unset.
    pub format: Option<String>,
    /// When true, a catalog with Error-severity validation issues fails
    /// the load instead of serving the surviving rows.
    pub strict: bool,
    /// Relative tolerance when cross-checking the identifier's nominal
    /// volume against the total volume column.
    pub volume_tolerance: f64,
    /// Part numbers are Warning-level by default; some deployments
    /// require them.
    pub require_part_number: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub file_path: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let config = Config::builder()
            // Start with default values
            .add_source(File::with_name("config/default").required(false))
            // Add environment-specific config
            .add_source(
                File::with_name(&format!(
                    "config/{}",
                    env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into())
                ))
                .required(false),
            )
            // Add local config (gitignored)
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables with PLATEBOOK prefix
            .add_source(Environment::with_prefix("PLATEBOOK").separator("__"));

        config.build()?.try_deserialize()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                timeout_seconds: 30,
            },
            catalog: CatalogConfig {
                source_path: "data/corning_costar.md".to_string(),
                format: None,
                strict: false,
                volume_tolerance: 0.05,
                require_part_number: false,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "text".to_string(),
                file_path: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.catalog.source_path, "data/corning_costar.md");
        assert!(!config.catalog.strict);
    }

    #[test]
    fn test_malformed_config_surfaces_error() {
        let result = Config::builder()
            .add_source(File::from_str("server =", FileFormat::Toml))
            .build();

        let err = result.expect_err("malformed config must not build");
        assert!(!err.to_string().is_empty());
    }
}
