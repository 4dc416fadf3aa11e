//! Configuration management for the claim fraud detector

use crate::schema::UnknownKeyPolicy;
use crate::types::prediction::DEFAULT_DECISION_THRESHOLD;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Prefix for environment overrides, e.g. `CLAIM_FRAUD_DETECTION__THRESHOLD=0.4`
pub const ENV_PREFIX: &str = "CLAIM_FRAUD";

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub schema: SchemaConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Model artifact configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Path to the exported pipeline artifact
    #[serde(default = "default_artifact_path")]
    pub artifact_path: PathBuf,
    /// Number of threads for ONNX inference (default: 1)
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
}

fn default_artifact_path() -> PathBuf {
    PathBuf::from("models/fraud_model.json")
}

fn default_onnx_threads() -> usize {
    1
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            artifact_path: default_artifact_path(),
            onnx_threads: default_onnx_threads(),
        }
    }
}

/// Detection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DetectionConfig {
    /// Fraud probability at or above which a claim is labeled fraudulent
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

fn default_threshold() -> f64 {
    DEFAULT_DECISION_THRESHOLD
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
        }
    }
}

/// Input handling configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaConfig {
    /// How override keys outside the default profile are treated
    #[serde(default)]
    pub unknown_keys: UnknownKeyPolicy,
    /// Range-check claim inputs before completion
    #[serde(default = "default_validate_input")]
    pub validate_input: bool,
}

fn default_validate_input() -> bool {
    true
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            unknown_keys: UnknownKeyPolicy::default(),
            validate_input: default_validate_input(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (json, pretty)
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a specific path, layered with environment overrides.
    ///
    /// A missing file leaves the built-in defaults in place.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that cannot produce meaningful decisions
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.detection.threshold) {
            anyhow::bail!(
                "detection.threshold must be within [0, 1], got {}",
                self.detection.threshold
            );
        }
        if self.model.onnx_threads == 0 {
            anyhow::bail!("model.onnx_threads must be at least 1");
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            detection: DetectionConfig::default(),
            schema: SchemaConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Mutex, MutexGuard};

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    /// Holds the environment lock and clears `CLAIM_FRAUD_*` variables for the
    /// duration of a test, restoring the previous values on drop.
    struct EnvGuard {
        saved: Vec<(String, String)>,
        _lock: MutexGuard<'static, ()>,
    }

    impl EnvGuard {
        fn new(vars: &[(&str, &str)]) -> Self {
            let lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            let saved: Vec<(String, String)> = std::env::vars()
                .filter(|(key, _)| is_app_var(key))
                .collect();
            for (key, _) in &saved {
                std::env::remove_var(key);
            }
            for (key, value) in vars {
                std::env::set_var(key, value);
            }
            Self { saved, _lock: lock }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            let current: Vec<String> = std::env::vars()
                .map(|(key, _)| key)
                .filter(|key| is_app_var(key))
                .collect();
            for key in current {
                std::env::remove_var(key);
            }
            for (key, value) in &self.saved {
                std::env::set_var(key, value);
            }
        }
    }

    fn is_app_var(key: &str) -> bool {
        key.starts_with(ENV_PREFIX) && key[ENV_PREFIX.len()..].starts_with('_')
    }

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.detection.threshold, 0.3);
        assert_eq!(config.model.artifact_path, PathBuf::from("models/fraud_model.json"));
        assert_eq!(config.schema.unknown_keys, UnknownKeyPolicy::PassThrough);
        assert!(config.schema.validate_input);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let _env = EnvGuard::new(&[]);
        let file = write_config(
            r#"
            [model]
            artifact_path = "artifacts/model.json"

            [detection]
            threshold = 0.45

            [schema]
            unknown_keys = "reject"
            "#,
        );

        let config = AppConfig::load_from_path(file.path()).unwrap();
        assert_eq!(config.model.artifact_path, PathBuf::from("artifacts/model.json"));
        assert_eq!(config.model.onnx_threads, 1);
        assert_eq!(config.detection.threshold, 0.45);
        assert_eq!(config.schema.unknown_keys, UnknownKeyPolicy::Reject);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let _env = EnvGuard::new(&[]);
        let config = AppConfig::load_from_path("no/such/config.toml").unwrap();
        assert_eq!(config.detection.threshold, DEFAULT_DECISION_THRESHOLD);
    }

    #[test]
    fn test_threshold_out_of_range() {
        let _env = EnvGuard::new(&[]);
        let file = write_config("[detection]\nthreshold = 1.5\n");
        assert!(AppConfig::load_from_path(file.path()).is_err());
    }

    #[test]
    fn test_environment_overrides_file() {
        let _env = EnvGuard::new(&[
            ("CLAIM_FRAUD_DETECTION__THRESHOLD", "0.6"),
            ("CLAIM_FRAUD_SCHEMA__VALIDATE_INPUT", "false"),
        ]);
        let file = write_config(
            r#"
            [detection]
            threshold = 0.45

            [schema]
            unknown_keys = "reject"
            "#,
        );

        let config = AppConfig::load_from_path(file.path()).unwrap();
        assert_eq!(config.detection.threshold, 0.6);
        assert!(!config.schema.validate_input);
        assert_eq!(config.schema.unknown_keys, UnknownKeyPolicy::Reject);
    }

    #[test]
    fn test_environment_without_file() {
        let _env = EnvGuard::new(&[("CLAIM_FRAUD_SCHEMA__UNKNOWN_KEYS", "reject")]);

        let config = AppConfig::load_from_path("no/such/config.toml").unwrap();
        assert_eq!(config.schema.unknown_keys, UnknownKeyPolicy::Reject);
        assert_eq!(config.detection.threshold, DEFAULT_DECISION_THRESHOLD);
    }

    #[test]
    fn test_environment_threshold_is_validated() {
        let _env = EnvGuard::new(&[("CLAIM_FRAUD_DETECTION__THRESHOLD", "2.0")]);
        assert!(AppConfig::load_from_path("no/such/config.toml").is_err());
    }
}
