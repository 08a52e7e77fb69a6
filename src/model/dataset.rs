use log::debug;
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use std::path::Path;

use crate::error::Error;
use crate::record::{FEATURE_COUNT, FEATURE_NAMES, OUTCOME_COLUMN};

pub type Row = [f64; FEATURE_COUNT];

/// Feature rows with their binary outcomes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub features: Vec<Row>,
    pub labels: Vec<u8>,
}

impl Dataset {
    pub fn new(features: Vec<Row>, labels: Vec<u8>) -> Self {
        debug_assert_eq!(features.len(), labels.len());
        Self { features, labels }
    }

    /// Load a CSV file whose columns are the 12 clinical fields, in order,
    /// plus the outcome column.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let mut reader = csv::Reader::from_path(path)
            .map_err(|e| Error::Dataset(format!("Failed to open {}: {}", path.display(), e)))?;
        let headers = reader.headers()?.clone();

        let outcome_idx = headers
            .iter()
            .position(|h| h.trim() == OUTCOME_COLUMN)
            .ok_or_else(|| Error::Dataset(format!("Missing outcome column '{}'", OUTCOME_COLUMN)))?;

        let input_columns: Vec<&str> = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != outcome_idx)
            .map(|(_, h)| h.trim())
            .collect();
        if input_columns != FEATURE_NAMES {
            return Err(Error::Dataset(format!(
                "Input columns must be [{}], found [{}]",
                FEATURE_NAMES.join(", "),
                input_columns.join(", ")
            )));
        }

        let mut dataset = Dataset::default();
        for (n, result) in reader.records().enumerate() {
            let record = result?;
            // header is line 1
            let line = n + 2;
            let mut row = [0.0; FEATURE_COUNT];
            let mut col = 0;
            for (i, cell) in record.iter().enumerate() {
                let value = parse_cell(cell, line, headers.get(i).unwrap_or("?"))?;
                if i == outcome_idx {
                    dataset.labels.push(parse_outcome(value, line)?);
                } else {
                    row[col] = value;
                    col += 1;
                }
            }
            dataset.features.push(row);
        }

        if dataset.is_empty() {
            return Err(Error::Dataset(format!("{} has no rows", path.display())));
        }
        debug!(
            "Loaded {} rows from {} ({} positive)",
            dataset.len(),
            path.display(),
            dataset.count_label(1)
        );
        Ok(dataset)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn count_label(&self, label: u8) -> usize {
        self.labels.iter().filter(|&&l| l == label).count()
    }

    fn subset(&self, indices: &[usize]) -> Dataset {
        Dataset {
            features: indices.iter().map(|&i| self.features[i]).collect(),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
        }
    }

    /// Shuffle with `seed` and hold out `ceil(len * test_size)` rows.
    /// Returns `(train, test)`.
    pub fn train_test_split(&self, test_size: f64, seed: u64) -> Result<(Dataset, Dataset), Error> {
        if !(test_size > 0.0 && test_size < 1.0) {
            return Err(Error::Dataset(format!(
                "test_size must be in (0, 1), got {}",
                test_size
            )));
        }
        let n_test = (self.len() as f64 * test_size).ceil() as usize;
        if n_test == 0 || n_test >= self.len() {
            return Err(Error::Dataset(format!(
                "Cannot split {} rows with test_size {}",
                self.len(),
                test_size
            )));
        }

        let mut indices: Vec<usize> = (0..self.len()).collect();
        indices.shuffle(&mut StdRng::seed_from_u64(seed));
        let (test_idx, train_idx) = indices.split_at(n_test);
        Ok((self.subset(train_idx), self.subset(test_idx)))
    }
}

fn parse_cell(cell: &str, line: usize, column: &str) -> Result<f64, Error> {
    match cell.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(Error::Dataset(format!(
            "Line {}: column '{}' is not a number: '{}'",
            line, column, cell
        ))),
    }
}

fn parse_outcome(value: f64, line: usize) -> Result<u8, Error> {
    if value == 0.0 {
        Ok(0)
    } else if value == 1.0 {
        Ok(1)
    } else {
        Err(Error::Dataset(format!(
            "Line {}: '{}' must be 0 or 1, got {}",
            line, OUTCOME_COLUMN, value
        )))
    }
}
