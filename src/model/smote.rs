use log::debug;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::error::Error;
use crate::record::FEATURE_COUNT;

use super::dataset::{Dataset, Row};

/// Synthetic minority oversampling: new minority rows are drawn on the
/// segment between a minority row and one of its `k` nearest minority
/// neighbours, until both classes have the same count.
#[derive(Debug, Clone)]
pub struct Smote {
    k_neighbors: usize,
    seed: u64,
}

impl Smote {
    pub fn new(k_neighbors: usize, seed: u64) -> Self {
        Self { k_neighbors, seed }
    }

    /// Returns the input rows followed by the synthetic ones.
    pub fn fit_resample(&self, data: &Dataset) -> Result<Dataset, Error> {
        let positives = data.count_label(1);
        let negatives = data.count_label(0);
        if positives == 0 || negatives == 0 {
            return Err(Error::Dataset(
                "Training split must contain both outcome classes".into(),
            ));
        }

        let (minority_label, n_minority, n_majority) = if positives < negatives {
            (1u8, positives, negatives)
        } else {
            (0u8, negatives, positives)
        };
        let n_synthetic = n_majority - n_minority;
        if n_synthetic == 0 {
            return Ok(data.clone());
        }
        if n_minority < 2 {
            return Err(Error::Dataset(format!(
                "Oversampling needs at least 2 minority rows, found {}",
                n_minority
            )));
        }
        if self.k_neighbors == 0 {
            return Err(Error::Dataset("k_neighbors must be greater than 0".into()));
        }
        let k = self.k_neighbors.min(n_minority - 1);

        let minority: Vec<Row> = data
            .features
            .iter()
            .zip(data.labels.iter())
            .filter(|(_, &l)| l == minority_label)
            .map(|(r, _)| *r)
            .collect();
        let neighbors: Vec<Vec<usize>> = (0..minority.len())
            .map(|i| nearest_neighbors(&minority, i, k))
            .collect();

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut out = data.clone();
        out.features.reserve(n_synthetic);
        out.labels.reserve(n_synthetic);
        for _ in 0..n_synthetic {
            let i = rng.random_range(0..minority.len());
            let nn = neighbors[i][rng.random_range(0..k)];
            let gap: f64 = rng.random();

            let mut row = [0.0; FEATURE_COUNT];
            for j in 0..FEATURE_COUNT {
                row[j] = minority[i][j] + gap * (minority[nn][j] - minority[i][j]);
            }
            out.features.push(row);
            out.labels.push(minority_label);
        }

        debug!(
            "Oversampled class {} from {} to {} rows",
            minority_label, n_minority, n_majority
        );
        Ok(out)
    }
}

fn squared_distance(a: &Row, b: &Row) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Indices of the `k` rows closest to `rows[target]`, excluding itself.
/// Ties are broken by index so the result is stable.
fn nearest_neighbors(rows: &[Row], target: usize, k: usize) -> Vec<usize> {
    let mut candidates: Vec<(f64, usize)> = rows
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != target)
        .map(|(i, r)| (squared_distance(&rows[target], r), i))
        .collect();
    candidates.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    candidates.into_iter().take(k).map(|(_, i)| i).collect()
}
