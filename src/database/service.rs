use log::info;
use std::sync::Arc;

use crate::database::common::DEFAULT_ADMIN_USERNAME;
use crate::database::models::hash_password;
use crate::database::{create_repository, DatabaseConfig, DatabaseRepository};
use crate::error::Error;

/// Database service that provides high-level operations
#[derive(Clone)]
pub struct DatabaseService {
    repository: Arc<Box<dyn DatabaseRepository>>,
}

impl DatabaseService {
    /// Create a new database service with the given configuration
    pub async fn new(config: &DatabaseConfig) -> Result<Self, Error> {
        info!("Initializing database service");
        let repository = create_repository(config).await?;
        Ok(Self {
            repository: Arc::new(repository),
        })
    }

    /// Get a reference to the repository for direct access
    pub fn repository(&self) -> &dyn DatabaseRepository {
        self.repository.as_ref().as_ref()
    }

    /// Idempotent: creates missing tables and seeds the default admin on a
    /// fresh database. An existing admin keeps its password.
    pub async fn setup(&self, admin_password: &str) -> Result<(), Error> {
        self.repository().initialize().await?;
        let hash = hash_password(admin_password)?;
        if self
            .repository()
            .seed_admin(DEFAULT_ADMIN_USERNAME, &hash)
            .await?
        {
            info!("Created default '{}' account", DEFAULT_ADMIN_USERNAME);
        }
        Ok(())
    }
}
