pub mod common;
pub mod models;
pub mod service;
pub(crate) mod sqlite;

use crate::error::Error;
use async_trait::async_trait;
use models::{LogEntry, LogRecord, NewLogEntry, NewUser, User};

/// Database configuration enum to support multiple database backends
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DatabaseConfig {
    Sqlite { path: String },
}

impl std::fmt::Display for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatabaseConfig::Sqlite { path } => {
                write!(f, "sqlite({})", path)
            }
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig::Sqlite {
            path: "cardiotriage.db".to_string(),
        }
    }
}

/// Trait defining the database operations interface
#[async_trait]
pub trait DatabaseRepository: Send + Sync {
    /// Create tables and indexes if they do not exist
    async fn initialize(&self) -> Result<(), Error>;

    /// Insert the default admin unless the username is already present.
    /// Returns whether a row was inserted.
    async fn seed_admin(&self, username: &str, password_hash: &str) -> Result<bool, Error>;

    /// User operations
    async fn create_user(&self, user: &NewUser) -> Result<User, Error>;
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, Error>;
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, Error>;
    async fn list_users(&self) -> Result<Vec<User>, Error>;

    /// Log operations
    async fn insert_log(&self, log: &NewLogEntry) -> Result<LogEntry, Error>;
    async fn list_logs(&self) -> Result<Vec<LogRecord>, Error>;
    async fn list_logs_for_doctor(&self, doctor_id: i64) -> Result<Vec<LogEntry>, Error>;

    /// Statistics
    async fn count_users(&self) -> Result<i64, Error>;
    async fn count_logs(&self) -> Result<i64, Error>;
}

/// Database factory to create appropriate repository based on configuration
pub async fn create_repository(
    config: &DatabaseConfig,
) -> Result<Box<dyn DatabaseRepository>, Error> {
    match config {
        DatabaseConfig::Sqlite { path } => {
            let repo = sqlite::SqliteRepository::new(path).await?;
            Ok(Box::new(repo))
        }
    }
}
