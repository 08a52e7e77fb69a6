use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::{ClinicalRecord, Prediction, RiskLabel};

/// Log model for database storage
/// One row per prediction; never updated or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct LogEntry {
    pub id: i64,
    pub doctor_id: i64,
    #[sqlx(flatten)]
    pub record: ClinicalRecord,
    pub risk_prediction: i64,
    pub risk_probability: f64,
    /// Unix milliseconds, UTC
    pub timestamp: i64,
}

impl LogEntry {
    pub fn label(&self) -> Option<RiskLabel> {
        RiskLabel::from_i64(self.risk_prediction)
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewLogEntry {
    pub doctor_id: i64,
    pub record: ClinicalRecord,
    pub prediction: Prediction,
    pub timestamp: i64,
}

impl NewLogEntry {
    pub fn new(doctor_id: i64, record: ClinicalRecord, prediction: Prediction) -> Self {
        Self {
            doctor_id,
            record,
            prediction,
            timestamp: Utc::now().timestamp_millis(),
        }
    }
}

/// A log entry joined with the submitting doctor's username.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct LogRecord {
    pub username: String,
    #[sqlx(flatten)]
    pub entry: LogEntry,
}
