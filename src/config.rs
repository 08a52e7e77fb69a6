use crate::database::common::DEFAULT_ADMIN_PASSWORD;
use crate::database::DatabaseConfig;
use crate::error::Error;
use crate::model::ModelConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Error => write!(f, "error"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Trace => write!(f, "trace"),
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(Error::Config(format!(
                "Invalid log level '{}'. Valid levels are: error, warn, info, debug, trace",
                s
            ))),
        }
    }
}

fn default_dataset_path() -> String {
    "heart_failure_clinical_records_dataset.csv".to_string()
}

fn default_admin_password() -> String {
    DEFAULT_ADMIN_PASSWORD.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub log_level: LogLevel,
    #[serde(default = "default_dataset_path")]
    pub dataset_path: String,
    // Only used when seeding a fresh database
    #[serde(default = "default_admin_password")]
    pub default_admin_password: String,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub model: ModelConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize TOML: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), Error> {
        if self.dataset_path.trim().is_empty() {
            return Err(Error::Config("dataset_path is empty".to_string()));
        }
        match &self.database {
            DatabaseConfig::Sqlite { path } if path.trim().is_empty() => {
                return Err(Error::Config("database path is empty".to_string()));
            }
            _ => {}
        }
        if self.default_admin_password.is_empty() {
            return Err(Error::Config(
                "default_admin_password must not be empty".to_string(),
            ));
        }

        let model = &self.model;
        if !(model.test_size > 0.0 && model.test_size < 1.0) {
            return Err(Error::Config(format!(
                "model.test_size must be between 0 and 1, got {}",
                model.test_size
            )));
        }
        if model.n_estimators == 0 {
            return Err(Error::Config(
                "model.n_estimators must be greater than 0".to_string(),
            ));
        }
        if model.smote_neighbors == 0 {
            return Err(Error::Config(
                "model.smote_neighbors must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_level: LogLevel::default(),
            dataset_path: default_dataset_path(),
            default_admin_password: default_admin_password(),
            database: DatabaseConfig::default(),
            model: ModelConfig::default(),
        }
    }
}

impl std::fmt::Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "log_level: {}, dataset_path: {}, database: {}, model: {}",
            self.log_level, self.dataset_path, self.database, self.model,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_config_validation() {
        assert!(Config::default().validate().is_ok());

        let mut config = Config::default();
        config.model.test_size = 1.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.model.n_estimators = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.model.smote_neighbors = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.database = DatabaseConfig::Sqlite {
            path: " ".to_string(),
        };
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.default_admin_password.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cardiotriage.toml");
        let mut config = Config::default();
        config.log_level = LogLevel::Debug;
        config.model.n_estimators = 10;
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            dataset_path = "data.csv"

            [database]
            type = "sqlite"
            path = "test.db"

            [model]
            n_estimators = 50
            "#,
        )
        .unwrap();
        assert_eq!(config.dataset_path, "data.csv");
        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(config.default_admin_password, DEFAULT_ADMIN_PASSWORD);
        assert_eq!(config.model.n_estimators, 50);
        assert_eq!(config.model.seed, 42);
        assert_eq!(
            config.database,
            DatabaseConfig::Sqlite {
                path: "test.db".to_string()
            }
        );
    }

    #[test]
    fn test_log_level_parsing() {
        assert_eq!("error".parse::<LogLevel>().unwrap(), LogLevel::Error);
        assert_eq!("warn".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!("info".parse::<LogLevel>().unwrap(), LogLevel::Info);
        assert_eq!("debug".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert_eq!("trace".parse::<LogLevel>().unwrap(), LogLevel::Trace);

        // Test case insensitive parsing
        assert_eq!("ERROR".parse::<LogLevel>().unwrap(), LogLevel::Error);
        assert_eq!("Info".parse::<LogLevel>().unwrap(), LogLevel::Info);

        // Test invalid log level
        assert!("invalid".parse::<LogLevel>().is_err());
    }
}
