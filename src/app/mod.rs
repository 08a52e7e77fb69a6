pub mod navigation;
pub mod terminal;

use log::{info, warn};
use serde::Serialize;

use crate::config::Config;
use crate::database::models::{LogEntry, LogRecord, NewLogEntry, NewUser, Role, User};
use crate::database::service::DatabaseService;
use crate::error::Error;
use crate::model::RiskPredictor;
use crate::record::ClinicalRecord;

/// The authenticated user of an interactive session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
}

impl From<&User> for Session {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            username: user.username.clone(),
            role: user.role,
        }
    }
}

/// Store and trained model, built once at startup and handed to whoever
/// needs them.
pub struct AppContext {
    database: DatabaseService,
    predictor: RiskPredictor,
}

impl AppContext {
    pub async fn new(config: &Config) -> Result<Self, Error> {
        let database = DatabaseService::new(&config.database).await?;
        database.setup(&config.default_admin_password).await?;
        let predictor = RiskPredictor::train(&config.dataset_path, &config.model)?;
        Ok(Self::with_parts(database, predictor))
    }

    pub fn with_parts(database: DatabaseService, predictor: RiskPredictor) -> Self {
        Self {
            database,
            predictor,
        }
    }

    pub fn predictor(&self) -> &RiskPredictor {
        &self.predictor
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<Session, Error> {
        let user = self
            .database
            .repository()
            .get_user_by_username(username)
            .await?
            .ok_or_else(|| {
                warn!("Login attempt for unknown user '{}'", username);
                Error::UserNotFound(username.to_string())
            })?;

        if !user.verify_password(password) {
            warn!("Invalid password for user '{}'", username);
            return Err(Error::InvalidPassword);
        }
        info!("User '{}' logged in as {}", user.username, user.role);
        Ok(Session::from(&user))
    }

    pub async fn add_doctor(
        &self,
        session: &Session,
        username: &str,
        password: &str,
    ) -> Result<User, Error> {
        require_role(session, Role::Admin)?;
        let username = username.trim();
        if username.is_empty() {
            return Err(Error::InvalidInput("username is required".into()));
        }
        if password.is_empty() {
            return Err(Error::InvalidInput("password is required".into()));
        }

        let new = NewUser::new(username.to_string(), password, Role::Doctor)?;
        let user = self.database.repository().create_user(&new).await?;
        info!("Doctor '{}' added by '{}'", user.username, session.username);
        Ok(user)
    }

    /// Parse, predict, then append exactly one log row. Nothing is written
    /// if any step before the insert fails.
    pub async fn submit_prediction<S: AsRef<str>>(
        &self,
        session: &Session,
        raw_fields: &[S],
    ) -> Result<LogEntry, Error> {
        require_role(session, Role::Doctor)?;
        let record = ClinicalRecord::parse(raw_fields)?;
        let prediction = self.predictor.predict(&record)?;

        let entry = self
            .database
            .repository()
            .insert_log(&NewLogEntry::new(session.user_id, record, prediction))
            .await?;
        info!(
            "Prediction #{} by '{}': {} ({:.2})",
            entry.id, session.username, prediction.label, prediction.probability
        );
        Ok(entry)
    }

    pub async fn view_logs(&self, session: &Session) -> Result<Vec<LogRecord>, Error> {
        require_role(session, Role::Admin)?;
        self.database.repository().list_logs().await
    }

    pub async fn list_doctors(&self, session: &Session) -> Result<Vec<User>, Error> {
        require_role(session, Role::Admin)?;
        let users = self.database.repository().list_users().await?;
        Ok(users.into_iter().filter(|u| u.role == Role::Doctor).collect())
    }

    pub async fn my_history(&self, session: &Session) -> Result<Vec<LogEntry>, Error> {
        require_role(session, Role::Doctor)?;
        self.database
            .repository()
            .list_logs_for_doctor(session.user_id)
            .await
    }
}

fn require_role(session: &Session, role: Role) -> Result<(), Error> {
    if session.role != role {
        return Err(Error::PermissionDenied(format!(
            "'{}' is not a {}",
            session.username, role
        )));
    }
    Ok(())
}
