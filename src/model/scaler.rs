use crate::error::Error;
use crate::record::FEATURE_COUNT;

use super::dataset::Row;

/// Per-feature standardization fit on training rows.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    mean: Row,
    scale: Row,
}

impl StandardScaler {
    /// Population mean and standard deviation of each column. A constant
    /// column gets scale 1 so it maps to 0 instead of dividing by zero.
    pub fn fit(rows: &[Row]) -> Result<Self, Error> {
        if rows.is_empty() {
            return Err(Error::Dataset("Cannot fit scaler on zero rows".into()));
        }
        let n = rows.len() as f64;

        let mut mean = [0.0; FEATURE_COUNT];
        for row in rows {
            for (m, v) in mean.iter_mut().zip(row.iter()) {
                *m += v;
            }
        }
        mean.iter_mut().for_each(|m| *m /= n);

        let mut scale = [0.0; FEATURE_COUNT];
        for row in rows {
            for j in 0..FEATURE_COUNT {
                let d = row[j] - mean[j];
                scale[j] += d * d;
            }
        }
        for s in scale.iter_mut() {
            *s = (*s / n).sqrt();
            if *s <= f64::EPSILON {
                *s = 1.0;
            }
        }

        Ok(Self { mean, scale })
    }

    pub fn transform_row(&self, row: &Row) -> Row {
        let mut out = [0.0; FEATURE_COUNT];
        for j in 0..FEATURE_COUNT {
            out[j] = (row[j] - self.mean[j]) / self.scale[j];
        }
        out
    }

    pub fn transform(&self, rows: &[Row]) -> Vec<Row> {
        rows.iter().map(|r| self.transform_row(r)).collect()
    }

    /// Scale an unchecked feature slice, as received at inference time.
    pub fn transform_slice(&self, features: &[f64]) -> Result<Row, Error> {
        let row: Row = features.try_into().map_err(|_| {
            Error::Model(format!(
                "expected {} features, got {}",
                FEATURE_COUNT,
                features.len()
            ))
        })?;
        if let Some(j) = row.iter().position(|v| !v.is_finite()) {
            return Err(Error::Model(format!("feature {} is not a finite number", j)));
        }
        Ok(self.transform_row(&row))
    }

    pub fn mean(&self) -> &Row {
        &self.mean
    }

    pub fn scale(&self) -> &Row {
        &self.scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(first: f64, second: f64) -> Row {
        let mut r = [5.0; FEATURE_COUNT];
        r[0] = first;
        r[1] = second;
        r
    }

    #[test]
    fn test_fit_transform() {
        let rows = vec![row(1.0, 10.0), row(3.0, 20.0), row(5.0, 30.0)];
        let scaler = StandardScaler::fit(&rows).unwrap();
        assert_eq!(scaler.mean()[0], 3.0);
        assert_eq!(scaler.mean()[1], 20.0);

        let scaled = scaler.transform(&rows);
        for j in 0..2 {
            let mean: f64 = scaled.iter().map(|r| r[j]).sum::<f64>() / 3.0;
            let var: f64 = scaled.iter().map(|r| (r[j] - mean).powi(2)).sum::<f64>() / 3.0;
            assert!(mean.abs() < 1e-12);
            assert!((var - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_constant_column_maps_to_zero() {
        let rows = vec![row(1.0, 10.0), row(3.0, 20.0)];
        let scaler = StandardScaler::fit(&rows).unwrap();
        assert_eq!(scaler.scale()[5], 1.0);
        let scaled = scaler.transform_row(&row(2.0, 15.0));
        assert_eq!(scaled[5], 0.0);
        assert_eq!(scaled[0], 0.0);
    }

    #[test]
    fn test_transform_uses_fitted_parameters() {
        let scaler = StandardScaler::fit(&[row(0.0, 0.0), row(2.0, 4.0)]).unwrap();
        // fitted mean 1, std 1 for the first column
        let scaled = scaler.transform_row(&row(11.0, 2.0));
        assert_eq!(scaled[0], 10.0);
        assert_eq!(scaled[1], 0.0);
    }

    #[test]
    fn test_transform_slice_errors() {
        let scaler = StandardScaler::fit(&[row(0.0, 0.0), row(2.0, 4.0)]).unwrap();
        assert!(matches!(
            scaler.transform_slice(&[1.0; 11]),
            Err(Error::Model(_))
        ));
        let mut bad = [1.0; FEATURE_COUNT];
        bad[3] = f64::INFINITY;
        assert!(matches!(scaler.transform_slice(&bad), Err(Error::Model(_))));
        assert!(scaler.transform_slice(&[1.0; FEATURE_COUNT]).is_ok());
        assert!(StandardScaler::fit(&[]).is_err());
    }
}
