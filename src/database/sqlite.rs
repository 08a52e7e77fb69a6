use async_trait::async_trait;
use log::{debug, info};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use std::str::FromStr;

use crate::database::models::{LogEntry, LogRecord, NewLogEntry, NewUser, User};
use crate::database::DatabaseRepository;
use crate::error::Error;

const LOG_COLUMNS: &str = r#"l.id, l.doctor_id, l.age, l.anaemia, l.creatinine_phosphokinase,
    l.diabetes, l.ejection_fraction, l.high_blood_pressure, l.platelets, l.serum_creatinine,
    l.serum_sodium, l.sex, l.smoking, l.time, l.risk_prediction, l.risk_probability, l.timestamp"#;

pub struct SqliteRepository {
    pool: Pool<Sqlite>,
}

impl SqliteRepository {
    pub async fn new(database_path: &str) -> Result<Self, Error> {
        let database_url = format!("sqlite:{}", database_path);
        info!("Connecting to SQLite database: {}", database_path);

        let options = SqliteConnectOptions::from_str(&database_url)
            .map_err(|e| Error::Database(format!("Invalid SQLite path '{}': {}", database_path, e)))?
            .create_if_missing(true)
            .foreign_keys(true);

        // one interactive session at a time
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| Error::Database(format!("Failed to connect to SQLite database: {}", e)))?;

        let repo = Self { pool };
        repo.initialize().await?;

        Ok(repo)
    }

    async fn create_tables(&self) -> Result<(), Error> {
        // Create users table
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL CHECK (role IN ('admin', 'doctor'))
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to create users table: {}", e)))?;

        // Create log table
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                doctor_id INTEGER NOT NULL,
                age REAL NOT NULL,
                anaemia REAL NOT NULL,
                creatinine_phosphokinase REAL NOT NULL,
                diabetes REAL NOT NULL,
                ejection_fraction REAL NOT NULL,
                high_blood_pressure REAL NOT NULL,
                platelets REAL NOT NULL,
                serum_creatinine REAL NOT NULL,
                serum_sodium REAL NOT NULL,
                sex REAL NOT NULL,
                smoking REAL NOT NULL,
                time REAL NOT NULL,
                risk_prediction INTEGER NOT NULL CHECK (risk_prediction IN (0, 1)),
                risk_probability REAL NOT NULL,
                timestamp INTEGER NOT NULL,
                FOREIGN KEY (doctor_id) REFERENCES users (id)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to create logs table: {}", e)))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_logs_doctor_id ON logs (doctor_id)")
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to create logs doctor_id index: {}", e)))?;

        info!("Database tables and indexes created successfully");
        Ok(())
    }
}

#[async_trait]
impl DatabaseRepository for SqliteRepository {
    async fn initialize(&self) -> Result<(), Error> {
        debug!("Initializing SQLite database");
        self.create_tables().await
    }

    async fn seed_admin(&self, username: &str, password_hash: &str) -> Result<bool, Error> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO users (username, password_hash, role) VALUES (?, ?, 'admin')",
        )
        .bind(username)
        .bind(password_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to seed admin: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    // User operations
    async fn create_user(&self, user: &NewUser) -> Result<User, Error> {
        let result = sqlx::query("INSERT INTO users (username, password_hash, role) VALUES (?, ?, ?)")
            .bind(&user.username)
            .bind(&user.password_hash)
            .bind(user.role)
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    Error::UsernameTaken(user.username.clone())
                }
                e => Error::Database(format!("Failed to create user: {}", e)),
            })?;

        Ok(User {
            id: result.last_insert_rowid(),
            username: user.username.clone(),
            password_hash: user.password_hash.clone(),
            role: user.role,
        })
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, Error> {
        let row = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, role FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to get user by id: {}", e)))?;

        Ok(row)
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, Error> {
        let row = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, role FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to get user by username: {}", e)))?;

        Ok(row)
    }

    async fn list_users(&self) -> Result<Vec<User>, Error> {
        sqlx::query_as::<_, User>("SELECT id, username, password_hash, role FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to list users: {}", e)))
    }

    // log operations
    async fn insert_log(&self, log: &NewLogEntry) -> Result<LogEntry, Error> {
        let r = &log.record;
        let result = sqlx::query(
            r#"
            INSERT INTO logs
            (doctor_id, age, anaemia, creatinine_phosphokinase, diabetes, ejection_fraction,
            high_blood_pressure, platelets, serum_creatinine, serum_sodium, sex, smoking, time,
            risk_prediction, risk_probability, timestamp)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(log.doctor_id)
        .bind(r.age)
        .bind(r.anaemia)
        .bind(r.creatinine_phosphokinase)
        .bind(r.diabetes)
        .bind(r.ejection_fraction)
        .bind(r.high_blood_pressure)
        .bind(r.platelets)
        .bind(r.serum_creatinine)
        .bind(r.serum_sodium)
        .bind(r.sex)
        .bind(r.smoking)
        .bind(r.time)
        .bind(log.prediction.label.as_i64())
        .bind(log.prediction.probability)
        .bind(log.timestamp)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to insert log: {}", e)))?;

        Ok(LogEntry {
            id: result.last_insert_rowid(),
            doctor_id: log.doctor_id,
            record: log.record,
            risk_prediction: log.prediction.label.as_i64(),
            risk_probability: log.prediction.probability,
            timestamp: log.timestamp,
        })
    }

    async fn list_logs(&self) -> Result<Vec<LogRecord>, Error> {
        let sql = format!(
            "SELECT u.username, {} FROM logs l JOIN users u ON l.doctor_id = u.id ORDER BY l.id",
            LOG_COLUMNS
        );
        let logs = sqlx::query_as::<_, LogRecord>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to list logs: {}", e)))?;

        Ok(logs)
    }

    async fn list_logs_for_doctor(&self, doctor_id: i64) -> Result<Vec<LogEntry>, Error> {
        let sql = format!(
            "SELECT {} FROM logs l WHERE l.doctor_id = ? ORDER BY l.id",
            LOG_COLUMNS
        );
        let logs = sqlx::query_as::<_, LogEntry>(&sql)
            .bind(doctor_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to list logs for doctor: {}", e)))?;

        Ok(logs)
    }

    async fn count_users(&self) -> Result<i64, Error> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to count users: {}", e)))?;

        Ok(row.get("count"))
    }

    async fn count_logs(&self) -> Result<i64, Error> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM logs")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to count logs: {}", e)))?;

        Ok(row.get("count"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{hash_password, Role};
    use crate::record::{ClinicalRecord, Prediction, RiskLabel};
    use tempfile::tempdir;

    async fn open_repo(dir: &tempfile::TempDir) -> SqliteRepository {
        let path = dir.path().join("test.db");
        SqliteRepository::new(&path.to_string_lossy()).await.unwrap()
    }

    fn record() -> ClinicalRecord {
        ClinicalRecord::from([
            65.5, 1.0, 160.0, 1.0, 20.0, 0.0, 327000.0, 2.7, 116.0, 0.0, 0.0, 8.0,
        ])
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let dir = tempdir().unwrap();
        let repo = open_repo(&dir).await;
        repo.initialize().await.unwrap();
        repo.initialize().await.unwrap();
        assert_eq!(repo.count_users().await.unwrap(), 0);

        // reopening an existing file keeps its rows
        let hash = hash_password("pw").unwrap();
        assert!(repo.seed_admin("admin", &hash).await.unwrap());
        drop(repo);
        let reopened = open_repo(&dir).await;
        assert_eq!(reopened.count_users().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_seed_admin_inserts_once() {
        let dir = tempdir().unwrap();
        let repo = open_repo(&dir).await;
        let hash = hash_password("adminpass").unwrap();
        assert!(repo.seed_admin("admin", &hash).await.unwrap());
        assert!(!repo.seed_admin("admin", &hash).await.unwrap());
        assert_eq!(repo.count_users().await.unwrap(), 1);

        let admin = repo.get_user_by_username("admin").await.unwrap().unwrap();
        assert_eq!(admin.role, Role::Admin);
        assert!(admin.verify_password("adminpass"));
    }

    #[tokio::test]
    async fn test_create_user_duplicate() {
        let dir = tempdir().unwrap();
        let repo = open_repo(&dir).await;
        let new = NewUser::new("cameron".into(), "pw1", Role::Doctor).unwrap();
        let created = repo.create_user(&new).await.unwrap();
        assert!(created.id > 0);

        let again = NewUser::new("cameron".into(), "pw2", Role::Doctor).unwrap();
        match repo.create_user(&again).await {
            Err(Error::UsernameTaken(name)) => assert_eq!(name, "cameron"),
            other => panic!("unexpected: {:?}", other),
        }
        assert_eq!(repo.count_users().await.unwrap(), 1);

        let stored = repo.get_user_by_id(created.id).await.unwrap().unwrap();
        assert!(stored.verify_password("pw1"));
        assert_eq!(stored.role, Role::Doctor);
        assert!(repo.get_user_by_username("foreman").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_and_list_logs() {
        let dir = tempdir().unwrap();
        let repo = open_repo(&dir).await;
        let doctor = repo
            .create_user(&NewUser::new("chase".into(), "pw", Role::Doctor).unwrap())
            .await
            .unwrap();
        let prediction = Prediction {
            label: RiskLabel::Risk,
            probability: 0.73,
        };

        let first = repo
            .insert_log(&NewLogEntry::new(doctor.id, record(), prediction))
            .await
            .unwrap();
        let second = repo
            .insert_log(&NewLogEntry::new(doctor.id, record(), prediction))
            .await
            .unwrap();
        assert!(second.id > first.id);

        let logs = repo.list_logs().await.unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].username, "chase");
        assert_eq!(logs[0].entry, first);
        assert_eq!(logs[0].entry.record, record());
        assert_eq!(logs[0].entry.label(), Some(RiskLabel::Risk));
        assert_eq!(logs[1].entry.id, second.id);

        let mine = repo.list_logs_for_doctor(doctor.id).await.unwrap();
        assert_eq!(mine, vec![first, second]);
        assert!(repo.list_logs_for_doctor(doctor.id + 1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_log_requires_existing_user() {
        let dir = tempdir().unwrap();
        let repo = open_repo(&dir).await;
        let prediction = Prediction {
            label: RiskLabel::NoRisk,
            probability: 0.1,
        };
        let result = repo.insert_log(&NewLogEntry::new(42, record(), prediction)).await;
        assert!(matches!(result, Err(Error::Database(_))));
        assert_eq!(repo.count_logs().await.unwrap(), 0);
    }
}
