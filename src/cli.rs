use crate::config::{Config, LogLevel};
use crate::database::DatabaseConfig;
use crate::error::Error;
use clap::Parser;
use std::path::Path;

#[derive(Parser, Debug)]
#[command(name = "cardiotriage")]
#[command(version = "0.1.0")]
#[command(about = "Heart-failure risk triage with a locally trained classifier")]
pub struct Cli {
    /// Configuration file path
    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        default_value = "cardiotriage.toml"
    )]
    pub config: String,

    /// Generate a default configuration file
    #[arg(long = "generate-config")]
    pub generate_config: bool,

    /// Create the database and default admin account, then exit
    #[arg(long = "init")]
    pub init: bool,

    /// Train the model, print scores on the held-out split, then exit
    #[arg(long = "evaluate")]
    pub evaluate: bool,

    /// Dataset CSV path (overrides config file)
    #[arg(short = 'd', long = "dataset", value_name = "PATH")]
    pub dataset: Option<String>,

    /// SQLite database path (overrides config file)
    #[arg(long = "database", value_name = "PATH")]
    pub database: Option<String>,

    /// Log level (overrides config file)
    #[arg(
        long = "log-level",
        value_name = "LEVEL",
        help = "Set log level (error, warn, info, debug, trace)"
    )]
    pub log_level: Option<String>,
}

/// What the process should do after argument handling.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    GenerateConfig,
    Init,
    Evaluate,
    Interactive,
}

impl Cli {
    pub fn command(&self) -> Command {
        if self.generate_config {
            Command::GenerateConfig
        } else if self.init {
            Command::Init
        } else if self.evaluate {
            Command::Evaluate
        } else {
            Command::Interactive
        }
    }

    /// Load the config file, falling back to defaults when it does not
    /// exist, then apply command line overrides and validate.
    pub fn resolve_config(&self) -> Result<Config, Error> {
        let mut config = if Path::new(&self.config).exists() {
            Config::from_file(&self.config)?
        } else {
            Config::default()
        };

        if let Some(dataset) = &self.dataset {
            config.dataset_path = dataset.clone();
        }

        if let Some(path) = &self.database {
            config.database = DatabaseConfig::Sqlite { path: path.clone() };
        }

        if let Some(log_level_str) = &self.log_level {
            config.log_level = log_level_str.parse::<LogLevel>()?;
        }

        // Validate the final configuration
        config.validate()?;

        Ok(config)
    }
}
