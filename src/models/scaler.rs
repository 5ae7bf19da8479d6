use serde::{Deserialize, Serialize};

use crate::error::EstimatorError;
use crate::sanitize::validate_matrix;
use crate::types::EPSILON;

/// Column-wise standardisation with statistics captured at fit time
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    /// Population mean and standard deviation per column; constant columns scale by 1
    pub fn fit(x: &[Vec<f64>]) -> Result<Self, EstimatorError> {
        let d = validate_matrix(x)?;
        let n = x.len() as f64;

        let mut mean = vec![0.0; d];
        for row in x {
            for (m, v) in mean.iter_mut().zip(row) {
                *m += v;
            }
        }
        for m in &mut mean {
            *m /= n;
        }

        let mut scale = vec![0.0; d];
        for row in x {
            for ((s, v), m) in scale.iter_mut().zip(row).zip(&mean) {
                *s += (v - m).powi(2);
            }
        }
        for s in &mut scale {
            let std = (*s / n).sqrt();
            *s = if std < EPSILON { 1.0 } else { std };
        }

        Ok(Self { mean, scale })
    }

    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>, EstimatorError> {
        if row.len() != self.mean.len() {
            return Err(EstimatorError::FeatureCountMismatch {
                expected: self.mean.len(),
                found: row.len(),
            });
        }
        Ok(row
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(v, (m, s))| (v - m) / s)
            .collect())
    }

    pub fn transform(&self, x: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, EstimatorError> {
        x.iter().map(|row| self.transform_row(row)).collect()
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn scale(&self) -> &[f64] {
        &self.scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_statistics() {
        let x = vec![vec![1.0, 5.0], vec![3.0, 5.0]];
        let scaler = StandardScaler::fit(&x).unwrap();
        assert_eq!(scaler.mean(), &[2.0, 5.0]);
        assert_eq!(scaler.scale(), &[1.0, 1.0]);
    }

    #[test]
    fn test_transform_zero_mean_unit_variance() {
        let x = vec![vec![2.0], vec![4.0], vec![4.0], vec![4.0], vec![5.0], vec![5.0], vec![7.0], vec![9.0]];
        let scaler = StandardScaler::fit(&x).unwrap();
        let z = scaler.transform(&x).unwrap();

        let mean: f64 = z.iter().map(|r| r[0]).sum::<f64>() / z.len() as f64;
        let var: f64 = z.iter().map(|r| (r[0] - mean).powi(2)).sum::<f64>() / z.len() as f64;
        assert!(mean.abs() < 1e-12);
        assert!((var - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_constant_column() {
        let scaler = StandardScaler::fit(&[vec![3.0], vec![3.0]]).unwrap();
        assert_eq!(scaler.transform_row(&[4.0]).unwrap(), vec![1.0]);
    }

    #[test]
    fn test_errors() {
        assert_eq!(StandardScaler::fit(&[]).unwrap_err(), EstimatorError::EmptyTrainingSet);
        let scaler = StandardScaler::fit(&[vec![1.0, 2.0]]).unwrap();
        assert!(scaler.transform_row(&[1.0]).is_err());
    }
}
