use anyhow::Result;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for the workflow engine
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct EngineConfig {
    /// HTTP listener settings
    pub server: ServerConfig,
    /// Observability settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,
    /// TCP port to listen on
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Default tracing filter when RUST_LOG is unset
    pub log_level: String,
    /// Emit JSON log lines instead of compact text
    pub json_logs: bool,
    /// Log operation counters on shutdown
    pub metrics_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: true,
            metrics_enabled: true,
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

pub const CONFIG_FILE_STEM: &str = "workflow-engine";
pub const ENV_PREFIX: &str = "WORKFLOW_ENGINE";

impl EngineConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration file (workflow-engine.toml)
    /// 3. Environment variables (prefixed with WORKFLOW_ENGINE__)
    pub fn load() -> Result<Self> {
        Self::load_from(CONFIG_FILE_STEM)
    }

    /// Same layering as [`EngineConfig::load`] with an explicit file stem or path.
    /// A missing file falls back to defaults.
    pub fn load_from(file: &str) -> Result<Self> {
        Self::layered(file, false)
    }

    /// Layering with a file the caller named explicitly; a missing file is an error.
    pub fn load_required(file: &str) -> Result<Self> {
        Self::layered(file, true)
    }

    fn layered(file: &str, required: bool) -> Result<Self> {
        let defaults = toml::to_string(&EngineConfig::default())?;
        let config = Config::builder()
            .add_source(File::from_str(&defaults, FileFormat::Toml))
            .add_source(File::with_name(file).required(required))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_file() {
        let config = EngineConfig::load_from("definitely-not-a-config-file").unwrap();
        assert_eq!(config.server, ServerConfig::default());
        assert_eq!(config.server.bind_address(), "127.0.0.1:3000");
        assert!(config.observability.json_logs);
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let missing = std::env::temp_dir().join(format!("wf-missing-{}.toml", uuid::Uuid::new_v4()));
        assert!(EngineConfig::load_required(missing.to_str().unwrap()).is_err());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = std::env::temp_dir().join(format!("wf-config-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("engine.toml");
        std::fs::write(
            &path,
            "[server]\nhost = \"0.0.0.0\"\nport = 8088\n\n[observability]\nlog_level = \"debug\"\njson_logs = false\nmetrics_enabled = false\n",
        )
        .unwrap();

        let config = EngineConfig::load_required(path.to_str().unwrap()).unwrap();
        assert_eq!(config.server.bind_address(), "0.0.0.0:8088");
        assert_eq!(config.observability.log_level, "debug");
        assert!(!config.observability.json_logs);

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_toml_round_trip_through_file() {
        let dir = std::env::temp_dir().join(format!("wf-config-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("saved.toml");

        let mut original = EngineConfig::default();
        original.server.port = 9123;
        original.save_to_file(&path).unwrap();

        let loaded = EngineConfig::load_from(path.to_str().unwrap()).unwrap();
        assert_eq!(loaded.server.port, 9123);

        std::fs::remove_dir_all(dir).unwrap();
    }
}
