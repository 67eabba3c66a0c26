use statrs::statistics::Statistics;

use crate::error::ComputationError;

/// Per-column standardisation to zero mean and unit population variance.
///
/// Constant columns carry no information for isolation; they map to 0.0.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    means: Vec<f64>,
    std_devs: Vec<f64>,
}

impl StandardScaler {
    /// Fit on row-major data. Fails when every column is constant.
    pub fn fit(data: &[Vec<f64>]) -> Result<Self, ComputationError> {
        let width = data.first().map(Vec::len).unwrap_or(0);
        if data.is_empty() || width == 0 {
            return Err(ComputationError::InsufficientRows {
                needed: 1,
                found: data.len(),
            });
        }

        let mut means = Vec::with_capacity(width);
        let mut std_devs = Vec::with_capacity(width);
        for col in 0..width {
            let column: Vec<f64> = data.iter().map(|row| row[col]).collect();
            let mean = column.iter().mean();
            let sd = column.iter().population_std_dev();
            means.push(mean);
            std_devs.push(if is_constant(sd, mean) { 0.0 } else { sd });
        }

        if std_devs.iter().all(|sd| *sd == 0.0) {
            return Err(ComputationError::DegenerateFeatures);
        }
        Ok(Self { means, std_devs })
    }

    pub fn transform(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.means.iter().zip(&self.std_devs))
            .map(|(x, (mean, sd))| if *sd == 0.0 { 0.0 } else { (x - mean) / sd })
            .collect()
    }

    pub fn fit_transform(data: &[Vec<f64>]) -> Result<(Self, Vec<Vec<f64>>), ComputationError> {
        let scaler = Self::fit(data)?;
        let scaled = data.iter().map(|row| scaler.transform(row)).collect();
        Ok((scaler, scaled))
    }

    /// Columns that were treated as constant
    pub fn constant_columns(&self) -> Vec<usize> {
        self.std_devs
            .iter()
            .enumerate()
            .filter(|(_, sd)| **sd == 0.0)
            .map(|(i, _)| i)
            .collect()
    }
}

fn is_constant(sd: f64, mean: f64) -> bool {
    !sd.is_finite() || sd <= f64::EPSILON * mean.abs().max(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaled_columns_have_zero_mean_unit_variance() {
        let data = vec![vec![1.0, 10.0], vec![2.0, 20.0], vec![3.0, 30.0], vec![4.0, 40.0]];
        let (_, scaled) = StandardScaler::fit_transform(&data).unwrap();
        for col in 0..2 {
            let column: Vec<f64> = scaled.iter().map(|r| r[col]).collect();
            assert!(column.iter().mean().abs() < 1e-12);
            assert!((column.iter().population_std_dev() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn constant_column_maps_to_zero() {
        let data = vec![vec![1.0, 5.0], vec![2.0, 5.0], vec![3.0, 5.0]];
        let (scaler, scaled) = StandardScaler::fit_transform(&data).unwrap();
        assert_eq!(scaler.constant_columns(), vec![1]);
        assert!(scaled.iter().all(|r| r[1] == 0.0));
    }

    #[test]
    fn all_constant_is_degenerate() {
        let data = vec![vec![1.0, 5.0], vec![1.0, 5.0]];
        assert_eq!(StandardScaler::fit(&data).unwrap_err(), ComputationError::DegenerateFeatures);
    }
}
