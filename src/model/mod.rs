pub mod dataset;
pub mod forest;
pub mod scaler;
pub mod smote;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Error;
use crate::record::{ClinicalRecord, Prediction, RiskLabel};
use dataset::Dataset;
use forest::RandomForest;
use scaler::StandardScaler;
use smote::Smote;

fn default_seed() -> u64 {
    42
}

fn default_test_size() -> f64 {
    0.2
}

fn default_n_estimators() -> usize {
    100
}

fn default_smote_neighbors() -> usize {
    5
}

/// Training parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_test_size")]
    pub test_size: f64,
    #[serde(default = "default_n_estimators")]
    pub n_estimators: usize,
    #[serde(default = "default_smote_neighbors")]
    pub smote_neighbors: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            test_size: default_test_size(),
            n_estimators: default_n_estimators(),
            smote_neighbors: default_smote_neighbors(),
        }
    }
}

impl std::fmt::Display for ModelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "seed={} test_size={} n_estimators={} smote_neighbors={}",
            self.seed, self.test_size, self.n_estimators, self.smote_neighbors
        )
    }
}

/// Scores on the held-out split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub train_rows: usize,
    pub balanced_rows: usize,
    pub test_rows: usize,
    pub true_positives: usize,
    pub false_positives: usize,
    pub true_negatives: usize,
    pub false_negatives: usize,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Scaler and forest fit once at startup; answers single-row predictions.
#[derive(Debug, Clone)]
pub struct RiskPredictor {
    scaler: StandardScaler,
    forest: RandomForest,
    test: Dataset,
    train_rows: usize,
    balanced_rows: usize,
}

impl RiskPredictor {
    pub fn train<P: AsRef<Path>>(dataset_path: P, config: &ModelConfig) -> Result<Self, Error> {
        let path = dataset_path.as_ref();
        info!("Training risk model from {}", path.display());
        let dataset = Dataset::from_csv(path)?;
        Self::fit(&dataset, config)
    }

    pub fn fit(dataset: &Dataset, config: &ModelConfig) -> Result<Self, Error> {
        let (train, test) = dataset.train_test_split(config.test_size, config.seed)?;

        let scaler = StandardScaler::fit(&train.features)?;
        let scaled = Dataset::new(scaler.transform(&train.features), train.labels.clone());
        let balanced = Smote::new(config.smote_neighbors, config.seed).fit_resample(&scaled)?;
        let forest = RandomForest::fit(&balanced, config.n_estimators, config.seed)?;

        info!(
            "Risk model ready: {} trees, {} training rows ({} after oversampling), {} held out",
            forest.n_trees(),
            train.len(),
            balanced.len(),
            test.len()
        );
        debug!("Deepest tree: {} levels", forest.max_depth());
        Ok(Self {
            scaler,
            forest,
            test,
            train_rows: train.len(),
            balanced_rows: balanced.len(),
        })
    }

    pub fn predict(&self, record: &ClinicalRecord) -> Result<Prediction, Error> {
        self.predict_features(&record.to_array())
    }

    /// Scale with the fitted parameters, then classify.
    pub fn predict_features(&self, features: &[f64]) -> Result<Prediction, Error> {
        let scaled = self.scaler.transform_slice(features)?;
        let probability = self.forest.predict_proba(&scaled);
        if !(0.0..=1.0).contains(&probability) {
            return Err(Error::Model(format!(
                "classifier returned probability {}",
                probability
            )));
        }
        let label = RiskLabel::from_i64(self.forest.predict(&scaled) as i64)
            .ok_or_else(|| Error::Model("classifier returned an unknown label".into()))?;
        debug!("Predicted {} with probability {:.3}", label, probability);
        Ok(Prediction { label, probability })
    }

    pub fn evaluate(&self) -> Evaluation {
        let (mut tp, mut fp, mut tn, mut fn_) = (0, 0, 0, 0);
        for (row, &label) in self.test.features.iter().zip(self.test.labels.iter()) {
            let predicted = self.forest.predict(&self.scaler.transform_row(row));
            match (predicted, label) {
                (1, 1) => tp += 1,
                (1, _) => fp += 1,
                (_, 1) => fn_ += 1,
                _ => tn += 1,
            }
        }

        let ratio = |num: usize, den: usize| if den == 0 { 0.0 } else { num as f64 / den as f64 };
        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, tp + fn_);
        let f1 = if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        };
        Evaluation {
            train_rows: self.train_rows,
            balanced_rows: self.balanced_rows,
            test_rows: self.test.len(),
            true_positives: tp,
            false_positives: fp,
            true_negatives: tn,
            false_negatives: fn_,
            accuracy: ratio(tp + tn, self.test.len()),
            precision,
            recall,
            f1,
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::record::{FEATURE_NAMES, OUTCOME_COLUMN};
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use std::fmt::Write as _;
    use std::path::{Path, PathBuf};

    /// Write a synthetic heart-failure-like CSV. Roughly a third of the rows
    /// are positive: low ejection fraction, high serum creatinine or a short
    /// follow-up.
    pub(crate) fn write_dataset(dir: &Path, rows: usize, seed: u64) -> PathBuf {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut content = format!("{},{}\n", FEATURE_NAMES.join(","), OUTCOME_COLUMN);
        for _ in 0..rows {
            let age = rng.random_range(40..95) as f64;
            let ejection_fraction = rng.random_range(14..80) as f64;
            let serum_creatinine = (rng.random_range(50..400) as f64) / 100.0;
            let time = rng.random_range(4..285) as f64;
            let death = ejection_fraction < 25.0 || serum_creatinine > 3.2 || time < 15.0;
            writeln!(
                content,
                "{},{},{},{},{},{},{},{},{},{},{},{},{}",
                age,
                rng.random_range(0..2),
                rng.random_range(23..7861),
                rng.random_range(0..2),
                ejection_fraction,
                rng.random_range(0..2),
                rng.random_range(25100..850000),
                serum_creatinine,
                rng.random_range(113..148),
                rng.random_range(0..2),
                rng.random_range(0..2),
                time,
                u8::from(death)
            )
            .unwrap();
        }
        let path = dir.join("heart_failure.csv");
        std::fs::write(&path, content).unwrap();
        path
    }
}
