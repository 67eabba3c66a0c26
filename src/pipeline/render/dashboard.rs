use plotters::coord::Shift;
use plotters::prelude::*;
use std::collections::BTreeMap;

use super::bar::{draw_bars, BarFill, BarSeries};
use super::boxplot::{draw_boxes, BoxSeries};
use super::scatter::draw_energy_vs_efficiency;
use super::{DrawResult, ANOMALY_COLOR};
use crate::pipeline::processing::{Detection, GroupSummary};
use crate::types::DerivedReading;

/// Anomalies per sensor type, from the groups when they carry counts
fn anomaly_counts(rows: &[DerivedReading], groups: &[GroupSummary], detection: &Detection) -> Vec<f64> {
    if groups.iter().all(|g| g.anomaly_count.is_some()) {
        return groups
            .iter()
            .map(|g| g.anomaly_count.unwrap_or(0) as f64)
            .collect();
    }
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for (row, label) in rows.iter().zip(&detection.labels) {
        if label.is_anomaly {
            *counts.entry(row.sensor_type()).or_default() += 1;
        }
    }
    groups
        .iter()
        .map(|g| counts.get(g.sensor_type.as_str()).copied().unwrap_or(0) as f64)
        .collect()
}

/// 2x2 overview: efficiency, anomalies, performance spread, energy vs efficiency
pub fn draw_dashboard<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    rows: &[DerivedReading],
    groups: &[GroupSummary],
    performance: &BoxSeries,
    detection: &Detection,
) -> DrawResult<DB> {
    let body = area.titled("IoT Sensor Performance Metrics Dashboard", ("sans-serif", 28))?;
    let panels = body.split_evenly((2, 2));

    let labels: Vec<String> = groups.iter().map(|g| g.sensor_type.clone()).collect();
    let efficiency: Vec<f64> = groups.iter().map(|g| g.mean_efficiency_ratio).collect();
    let anomalies = anomaly_counts(rows, groups, detection);

    draw_bars(
        &panels[0],
        &BarSeries {
            caption: "Average Efficiency by Sensor",
            y_desc: "Efficiency Ratio",
            labels: &labels,
            values: &efficiency,
            fill: BarFill::Palette,
            annotate: false,
        },
    )?;
    draw_bars(
        &panels[1],
        &BarSeries {
            caption: "Anomalies Detected by Sensor",
            y_desc: "Anomaly Count",
            labels: &labels,
            values: &anomalies,
            fill: BarFill::Single(ANOMALY_COLOR),
            annotate: true,
        },
    )?;
    draw_boxes(&panels[2], performance, "Performance Score Distribution", "Performance Score")?;
    draw_energy_vs_efficiency(&panels[3], rows)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::processing::AnomalyLabel;
    use crate::pipeline::processing::FeatureDeriver;
    use crate::types::SensorReading;

    fn reading(sensor: &str) -> DerivedReading {
        FeatureDeriver::new()
            .derive_one(&SensorReading {
                line: 2,
                timestamp: None,
                sensor_id: None,
                sensor_type: sensor.to_string(),
                layer: None,
                data_size_bytes: Some(100.0),
                energy_consumption: Some(10.0),
                transmission_duration: Some(2.0),
                energy_efficiency_ratio: Some(1400.0),
                transmission_efficiency_score: None,
            })
            .unwrap()
    }

    #[test]
    fn anomaly_counts_fall_back_to_labels() {
        let rows = vec![reading("ECG"), reading("ECG"), reading("Accelerometer")];
        let detection = Detection {
            model: "test".to_string(),
            features: Vec::new(),
            contamination: 0.3,
            seed: 1,
            labels: [true, false, true]
                .iter()
                .map(|&is_anomaly| AnomalyLabel { score: 0.6, is_anomaly })
                .collect(),
        };
        let mut groups = crate::pipeline::processing::aggregate::group_by_sensor(&rows, None);
        assert_eq!(anomaly_counts(&rows, &groups, &detection), vec![1.0, 1.0]);

        groups[0].anomaly_count = Some(4);
        groups[1].anomaly_count = Some(0);
        assert_eq!(anomaly_counts(&rows, &groups, &detection), vec![4.0, 0.0]);
    }
}
