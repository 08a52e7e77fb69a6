mod app;
mod cli;
mod config;
pub mod database;
pub mod error;
mod model;
mod record;

use clap::Parser;
use log::{debug, error, info, LevelFilter};

use crate::app::AppContext;
use crate::cli::{Cli, Command};
use crate::config::Config;
use crate::database::service::DatabaseService;
use crate::error::Error;
use crate::model::RiskPredictor;

fn log_level_to_filter(level: &config::LogLevel) -> LevelFilter {
    match level {
        config::LogLevel::Error => LevelFilter::Error,
        config::LogLevel::Warn => LevelFilter::Warn,
        config::LogLevel::Info => LevelFilter::Info,
        config::LogLevel::Debug => LevelFilter::Debug,
        config::LogLevel::Trace => LevelFilter::Trace,
    }
}

async fn run(cli: &Cli, config: Config) -> Result<(), Error> {
    match cli.command() {
        Command::GenerateConfig => {
            config.save_to_file(&cli.config)?;
            info!("Generated configuration file: {}", cli.config);
        }
        Command::Init => {
            let db = DatabaseService::new(&config.database).await?;
            db.setup(&config.default_admin_password).await?;
            eprintln!("Database {} is ready.", config.database);
        }
        Command::Evaluate => {
            let predictor = RiskPredictor::train(&config.dataset_path, &config.model)?;
            let evaluation = predictor.evaluate();
            println!("{}", serde_json::to_string_pretty(&evaluation)?);
        }
        Command::Interactive => {
            let ctx = AppContext::new(&config).await?;
            debug!("Held-out scores: {:?}", ctx.predictor().evaluate());
            app::terminal::run(&ctx).await?;
            info!("Session closed");
        }
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    // Resolve configuration first to get log level
    let config = match cli.resolve_config() {
        Ok(config) => config,
        Err(e) => {
            // Initialize basic logger for error reporting
            env_logger::init();
            error!("{}", e);
            std::process::exit(1);
        }
    };

    // Initialize logger with configured level
    env_logger::Builder::from_default_env()
        .filter_level(log_level_to_filter(&config.log_level))
        .init();

    info!("Starting cardiotriage");
    debug!("Config: {}", config);

    if let Err(e) = run(&cli, config).await {
        error!("{}", e);
        std::process::exit(1);
    }
}
