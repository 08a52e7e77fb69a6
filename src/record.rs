use crate::error::Error;
use serde::{Deserialize, Serialize};

pub const FEATURE_COUNT: usize = 12;

/// Column names in the order the classifier is fit on.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "age",
    "anaemia",
    "creatinine_phosphokinase",
    "diabetes",
    "ejection_fraction",
    "high_blood_pressure",
    "platelets",
    "serum_creatinine",
    "serum_sodium",
    "sex",
    "smoking",
    "time",
];

/// Human-readable labels, same order as `FEATURE_NAMES`.
pub const FEATURE_LABELS: [&str; FEATURE_COUNT] = [
    "Age",
    "Anaemia",
    "Creatinine Phosphokinase",
    "Diabetes",
    "Ejection Fraction",
    "High Blood Pressure",
    "Platelets",
    "Serum Creatinine",
    "Serum Sodium",
    "Sex",
    "Smoking",
    "Time",
];

pub const OUTCOME_COLUMN: &str = "DEATH_EVENT";

/// One patient's vitals as submitted by a doctor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ClinicalRecord {
    pub age: f64,
    pub anaemia: f64,
    pub creatinine_phosphokinase: f64,
    pub diabetes: f64,
    pub ejection_fraction: f64,
    pub high_blood_pressure: f64,
    pub platelets: f64,
    pub serum_creatinine: f64,
    pub serum_sodium: f64,
    pub sex: f64,
    pub smoking: f64,
    pub time: f64,
}

impl ClinicalRecord {
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.age,
            self.anaemia,
            self.creatinine_phosphokinase,
            self.diabetes,
            self.ejection_fraction,
            self.high_blood_pressure,
            self.platelets,
            self.serum_creatinine,
            self.serum_sodium,
            self.sex,
            self.smoking,
            self.time,
        ]
    }

    /// Parse raw form input. Fields are matched to `FEATURE_NAMES` by position.
    pub fn parse<S: AsRef<str>>(raw: &[S]) -> Result<Self, Error> {
        if raw.len() != FEATURE_COUNT {
            return Err(Error::InvalidInput(format!(
                "expected {} fields, got {}",
                FEATURE_COUNT,
                raw.len()
            )));
        }

        let mut values = [0.0; FEATURE_COUNT];
        for (i, field) in raw.iter().enumerate() {
            values[i] = parse_field(FEATURE_LABELS[i], field.as_ref())?;
        }
        Ok(Self::from(values))
    }
}

fn parse_field(label: &str, raw: &str) -> Result<f64, Error> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput(format!("{} is required", label)));
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(Error::InvalidInput(format!(
            "{} must be a number, got '{}'",
            label, trimmed
        ))),
    }
}

impl From<[f64; FEATURE_COUNT]> for ClinicalRecord {
    fn from(v: [f64; FEATURE_COUNT]) -> Self {
        Self {
            age: v[0],
            anaemia: v[1],
            creatinine_phosphokinase: v[2],
            diabetes: v[3],
            ejection_fraction: v[4],
            high_blood_pressure: v[5],
            platelets: v[6],
            serum_creatinine: v[7],
            serum_sodium: v[8],
            sex: v[9],
            smoking: v[10],
            time: v[11],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLabel {
    NoRisk,
    Risk,
}

impl RiskLabel {
    pub fn as_i64(&self) -> i64 {
        match self {
            RiskLabel::NoRisk => 0,
            RiskLabel::Risk => 1,
        }
    }

    pub fn from_i64(v: i64) -> Option<Self> {
        match v {
            0 => Some(RiskLabel::NoRisk),
            1 => Some(RiskLabel::Risk),
            _ => None,
        }
    }
}

impl std::fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLabel::NoRisk => write!(f, "no risk"),
            RiskLabel::Risk => write!(f, "risk"),
        }
    }
}

/// Classifier output for one record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: RiskLabel,
    /// Probability of the positive class, in [0, 1].
    pub probability: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_input() -> Vec<&'static str> {
        vec![
            "75", "0", "582", "0", "20", "1", "265000", "1.9", "130", "1", "0", "4",
        ]
    }

    #[test]
    fn test_parse_keeps_field_order() {
        let record = ClinicalRecord::parse(&valid_input()).unwrap();
        assert_eq!(record.age, 75.0);
        assert_eq!(record.creatinine_phosphokinase, 582.0);
        assert_eq!(record.serum_creatinine, 1.9);
        assert_eq!(record.time, 4.0);
        assert_eq!(
            record.to_array(),
            [75.0, 0.0, 582.0, 0.0, 20.0, 1.0, 265000.0, 1.9, 130.0, 1.0, 0.0, 4.0]
        );
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let mut input = valid_input();
        input[0] = "  61.5 ";
        let record = ClinicalRecord::parse(&input).unwrap();
        assert_eq!(record.age, 61.5);
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        for i in 0..FEATURE_COUNT {
            let mut input = valid_input();
            input[i] = "abc";
            match ClinicalRecord::parse(&input) {
                Err(Error::InvalidInput(msg)) => assert!(msg.contains(FEATURE_LABELS[i])),
                other => panic!("unexpected result for field {}: {:?}", i, other),
            }
        }
    }

    #[test]
    fn test_parse_rejects_missing_and_non_finite() {
        let mut input = valid_input();
        input[4] = " ";
        assert!(matches!(
            ClinicalRecord::parse(&input),
            Err(Error::InvalidInput(_))
        ));

        let mut input = valid_input();
        input[6] = "NaN";
        assert!(matches!(
            ClinicalRecord::parse(&input),
            Err(Error::InvalidInput(_))
        ));

        let input = valid_input();
        assert!(matches!(
            ClinicalRecord::parse(&input[..11]),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_risk_label_codes() {
        assert_eq!(RiskLabel::from_i64(0), Some(RiskLabel::NoRisk));
        assert_eq!(RiskLabel::from_i64(1), Some(RiskLabel::Risk));
        assert_eq!(RiskLabel::from_i64(2), None);
        assert_eq!(RiskLabel::Risk.as_i64(), 1);
    }
}
