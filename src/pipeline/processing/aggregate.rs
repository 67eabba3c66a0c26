use serde::Serialize;
use statrs::statistics::Statistics;
use std::collections::BTreeMap;
use tracing::{debug, instrument};

use super::anomaly::Detection;
use crate::error::ComputationError;
use crate::metrics::StageMetrics;
use crate::types::{DerivedReading, NumericColumn};

/// One row of `sensor_performance_summary`: the same two columns the hosted
/// pipeline emits.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateSummary {
    pub sensor_type: String,
    pub avg_efficiency_ratio: f64,
}

/// Per sensor type statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub sensor_type: String,
    pub count: usize,
    pub mean_efficiency_ratio: f64,
    pub mean_performance_score: f64,
    /// `None` when detection did not run
    pub anomaly_count: Option<usize>,
}

impl GroupSummary {
    pub fn to_summary_row(&self) -> AggregateSummary {
        AggregateSummary {
            sensor_type: self.sensor_type.clone(),
            avg_efficiency_ratio: self.mean_efficiency_ratio,
        }
    }
}

/// Collect one column's values per sensor type, ordered by sensor type
pub fn values_by_sensor(rows: &[DerivedReading], column: NumericColumn) -> BTreeMap<String, Vec<f64>> {
    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for row in rows {
        groups
            .entry(row.sensor_type().to_string())
            .or_default()
            .push(row.value(column));
    }
    groups
}

/// Group rows by `sensor_type`. Every returned group is non-empty.
#[instrument(skip_all, fields(rows = rows.len()))]
pub fn group_by_sensor(rows: &[DerivedReading], detection: Option<&Detection>) -> Vec<GroupSummary> {
    let mut members: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (i, row) in rows.iter().enumerate() {
        members.entry(row.sensor_type()).or_default().push(i);
    }

    let groups: Vec<GroupSummary> = members
        .into_iter()
        .map(|(sensor_type, idx)| GroupSummary {
            sensor_type: sensor_type.to_string(),
            count: idx.len(),
            mean_efficiency_ratio: idx.iter().map(|&i| rows[i].energy_efficiency_ratio).mean(),
            mean_performance_score: idx.iter().map(|&i| rows[i].performance_score).mean(),
            anomaly_count: detection.map(|d| idx.iter().filter(|&&i| d.labels[i].is_anomaly).count()),
        })
        .collect();

    StageMetrics::groups_aggregated(groups.len());
    debug!("Aggregated {} sensor groups", groups.len());
    groups
}

pub fn overall_mean(rows: &[DerivedReading], column: NumericColumn) -> f64 {
    rows.iter().map(|r| r.value(column)).mean()
}

/// Pearson correlation of the numeric columns
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<NumericColumn>,
    /// Row-major, `values[i][j]` is corr(columns[i], columns[j])
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: NumericColumn, b: NumericColumn) -> Option<f64> {
        let i = self.columns.iter().position(|c| *c == a)?;
        let j = self.columns.iter().position(|c| *c == b)?;
        Some(self.values[i][j])
    }
}

/// Pairwise Pearson correlation.
///
/// A zero-variance column has no defined correlation, which is reported as
/// an error rather than rendered as NaN.
#[instrument(skip_all, fields(rows = rows.len()))]
pub fn correlation_matrix(
    rows: &[DerivedReading],
    columns: &[NumericColumn],
) -> Result<CorrelationMatrix, ComputationError> {
    if rows.len() < 2 {
        return Err(ComputationError::InsufficientRows {
            needed: 2,
            found: rows.len(),
        });
    }

    let series: Vec<Vec<f64>> = columns
        .iter()
        .map(|c| rows.iter().map(|r| r.value(*c)).collect())
        .collect();
    let centered: Vec<(Vec<f64>, f64)> = series
        .iter()
        .zip(columns)
        .map(|(values, column)| {
            let mean = values.iter().mean();
            let deltas: Vec<f64> = values.iter().map(|v| v - mean).collect();
            let norm = deltas.iter().map(|d| d * d).sum::<f64>().sqrt();
            if !norm.is_finite() || norm <= f64::EPSILON * mean.abs().max(1.0) * (values.len() as f64).sqrt() {
                Err(ComputationError::ZeroVariance {
                    column: column.to_string(),
                })
            } else {
                Ok((deltas, norm))
            }
        })
        .collect::<Result<_, _>>()?;

    let k = columns.len();
    let mut values = vec![vec![0.0; k]; k];
    for i in 0..k {
        values[i][i] = 1.0;
        for j in (i + 1)..k {
            let (di, ni) = &centered[i];
            let (dj, nj) = &centered[j];
            let dot: f64 = di.iter().zip(dj).map(|(a, b)| a * b).sum();
            let r = (dot / (ni * nj)).clamp(-1.0, 1.0);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    Ok(CorrelationMatrix {
        columns: columns.to_vec(),
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::processing::anomaly::AnomalyLabel;
    use crate::pipeline::processing::features::FeatureDeriver;
    use crate::types::SensorReading;

    fn row(sensor: &str, data: f64, energy: f64, duration: f64, eff: f64) -> DerivedReading {
        FeatureDeriver::new()
            .derive_one(&SensorReading {
                line: 2,
                timestamp: None,
                sensor_id: None,
                sensor_type: sensor.to_string(),
                layer: None,
                data_size_bytes: Some(data),
                energy_consumption: Some(energy),
                transmission_duration: Some(duration),
                energy_efficiency_ratio: Some(eff),
                transmission_efficiency_score: None,
            })
            .unwrap()
    }

    fn sample() -> Vec<DerivedReading> {
        vec![
            row("ECG", 100.0, 50.0, 2.0, 1400.0),
            row("ECG", 200.0, 60.0, 4.0, 1500.0),
            row("Accelerometer", 300.0, 70.0, 3.0, 1300.0),
            row("BloodPressure", 400.0, 80.0, 8.0, 1350.0),
            row("Accelerometer", 150.0, 90.0, 5.0, 1420.0),
        ]
    }

    #[test]
    fn groups_are_sorted_and_weighted_means_reproduce_overall_mean() {
        let rows = sample();
        let groups = group_by_sensor(&rows, None);
        let names: Vec<&str> = groups.iter().map(|g| g.sensor_type.as_str()).collect();
        assert_eq!(names, vec!["Accelerometer", "BloodPressure", "ECG"]);

        let total: usize = groups.iter().map(|g| g.count).sum();
        let weighted = groups
            .iter()
            .map(|g| g.mean_efficiency_ratio * g.count as f64)
            .sum::<f64>()
            / total as f64;
        let overall = overall_mean(&rows, NumericColumn::EnergyEfficiencyRatio);
        assert!((weighted - overall).abs() < 1e-9);
        assert_eq!(groups[2].mean_efficiency_ratio, 1450.0);
        assert_eq!(groups[0].anomaly_count, None);
    }

    #[test]
    fn anomaly_counts_follow_labels() {
        let rows = sample();
        let detection = Detection {
            model: "test".to_string(),
            features: vec![NumericColumn::PerformanceScore],
            contamination: 0.2,
            seed: 0,
            labels: [false, true, false, false, false]
                .iter()
                .map(|&is_anomaly| AnomalyLabel { score: 0.5, is_anomaly })
                .collect(),
        };
        let groups = group_by_sensor(&rows, Some(&detection));
        let ecg = groups.iter().find(|g| g.sensor_type == "ECG").unwrap();
        assert_eq!(ecg.anomaly_count, Some(1));
        assert_eq!(ecg.to_summary_row().avg_efficiency_ratio, 1450.0);
    }

    #[test]
    fn correlation_is_symmetric_with_unit_diagonal() {
        let rows = sample();
        let m = correlation_matrix(&rows, &NumericColumn::ALL).unwrap();
        for i in 0..m.columns.len() {
            assert_eq!(m.values[i][i], 1.0);
            for j in 0..m.columns.len() {
                assert_eq!(m.values[i][j], m.values[j][i]);
                assert!(m.values[i][j].abs() <= 1.0);
            }
        }
    }

    #[test]
    fn perfectly_linear_columns_correlate_to_one() {
        let rows: Vec<DerivedReading> = (1..6)
            .map(|i| row("ECG", 100.0 * i as f64, 50.0, 2.0, 1000.0 + i as f64))
            .collect();
        let m = correlation_matrix(&rows, &[NumericColumn::DataSizeBytes, NumericColumn::BytesPerDuration]).unwrap();
        let r = m
            .get(NumericColumn::DataSizeBytes, NumericColumn::BytesPerDuration)
            .unwrap();
        assert!((r - 1.0).abs() < 1e-12);
    }

    #[test]
    fn zero_variance_column_is_a_computation_error() {
        let rows = vec![row("ECG", 100.0, 50.0, 2.0, 1.0), row("ECG", 200.0, 50.0, 3.0, 2.0)];
        let err = correlation_matrix(&rows, &NumericColumn::ALL).unwrap_err();
        assert_eq!(
            err,
            ComputationError::ZeroVariance {
                column: "energy_consumption".to_string()
            }
        );
    }
}
