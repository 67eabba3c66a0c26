//! Tabular and JSON artifacts written at the end of a run

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::error::Result;
use crate::pipeline::processing::{Detection, GroupSummary};
use crate::types::{DerivedReading, Layer};

/// One row of the labelled data export. Label cells are empty when
/// detection did not run.
#[derive(Debug, Serialize)]
struct LabeledRow<'a> {
    timestamp: Option<&'a str>,
    sensor_id: Option<&'a str>,
    sensor_type: &'a str,
    layer: Option<Layer>,
    data_size_bytes: f64,
    energy_consumption: f64,
    transmission_duration: f64,
    energy_efficiency_ratio: f64,
    transmission_efficiency_score: Option<f64>,
    bytes_per_duration: f64,
    performance_score: f64,
    anomaly_score: Option<f64>,
    is_anomaly: Option<bool>,
}

impl<'a> LabeledRow<'a> {
    fn new(row: &'a DerivedReading, label: Option<(f64, bool)>) -> Self {
        let r = &row.reading;
        Self {
            timestamp: r.timestamp.as_deref(),
            sensor_id: r.sensor_id.as_deref(),
            sensor_type: &r.sensor_type,
            layer: r.layer,
            data_size_bytes: row.data_size_bytes,
            energy_consumption: row.energy_consumption,
            transmission_duration: row.transmission_duration,
            energy_efficiency_ratio: row.energy_efficiency_ratio,
            transmission_efficiency_score: r.transmission_efficiency_score,
            bytes_per_duration: row.bytes_per_duration,
            performance_score: row.performance_score,
            anomaly_score: label.map(|(score, _)| score),
            is_anomaly: label.map(|(_, flag)| flag),
        }
    }
}

/// Every usable row with its derived columns and anomaly label
#[instrument(skip_all, fields(path = %path.display(), rows = rows.len()))]
pub fn write_labeled_rows(path: &Path, rows: &[DerivedReading], detection: Option<&Detection>) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for (i, row) in rows.iter().enumerate() {
        let label = detection
            .and_then(|d| d.labels.get(i))
            .map(|l| (l.score, l.is_anomaly));
        writer.serialize(LabeledRow::new(row, label))?;
    }
    writer.flush()?;
    debug!("Wrote labelled rows");
    Ok(())
}

/// `sensor_type,avg_efficiency_ratio`, one line per group
pub fn write_summary_csv(path: &Path, groups: &[GroupSummary]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for group in groups {
        writer.serialize(group.to_summary_row())?;
    }
    writer.flush()?;
    Ok(())
}

/// Hex SHA-256 of a file's contents
pub fn sha256_file(path: &Path) -> io::Result<String> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

#[derive(Debug, Clone, Serialize)]
pub struct DetectionSummary {
    pub model: String,
    pub contamination: f64,
    pub seed: u64,
    pub anomalies: usize,
    pub threshold: Option<f64>,
    pub labels_sha256: String,
}

impl DetectionSummary {
    pub fn from_detection(detection: &Detection) -> Self {
        Self {
            model: detection.model.clone(),
            contamination: detection.contamination,
            seed: detection.seed,
            anomalies: detection.anomaly_count(),
            threshold: detection.threshold(),
            labels_sha256: detection.labels_fingerprint(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartRecord {
    pub chart: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedChart {
    pub chart: String,
    pub reason: String,
}

/// Contents of `run_summary.json`
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub input: PathBuf,
    pub input_sha256: String,
    pub rows_loaded: usize,
    pub rows_used: usize,
    pub rows_excluded: usize,
    pub exclusions: BTreeMap<String, usize>,
    /// `None` when detection failed; the reason is in `detection_error`
    pub detection: Option<DetectionSummary>,
    pub detection_error: Option<String>,
    pub groups: Vec<GroupSummary>,
    pub charts: Vec<ChartRecord>,
    pub skipped_charts: Vec<SkippedChart>,
}

impl RunSummary {
    pub fn anomaly_percentage(&self) -> Option<f64> {
        let d = self.detection.as_ref()?;
        if self.rows_used == 0 {
            return None;
        }
        Some(d.anomalies as f64 / self.rows_used as f64 * 100.0)
    }
}

pub fn write_run_summary(path: &Path, summary: &RunSummary) -> Result<()> {
    let json = serde_json::to_string_pretty(summary)?;
    fs::write(path, json)?;
    Ok(())
}

/// Human-readable recap printed at the end of `analyze`
pub fn print_console_summary(summary: &RunSummary) {
    println!("\n📊 IoT Sensor Analysis Summary");
    println!("   Total records analyzed: {}", summary.rows_used);
    if summary.rows_excluded > 0 {
        println!("   Records excluded: {}", summary.rows_excluded);
        for (reason, count) in &summary.exclusions {
            println!("     - {reason}: {count}");
        }
    }

    match (&summary.detection, summary.anomaly_percentage()) {
        (Some(d), Some(pct)) => {
            println!("   Anomalies detected: {} ({:.1}%)", d.anomalies, pct);
            println!("\n🔍 Anomalies by sensor type:");
            for g in &summary.groups {
                println!("   {}: {}", g.sensor_type, g.anomaly_count.unwrap_or(0));
            }
        }
        _ => {
            let reason = summary.detection_error.as_deref().unwrap_or("unknown");
            println!("   Anomaly detection skipped: {reason}");
        }
    }

    println!("\n📈 Average metrics by sensor type:");
    for g in &summary.groups {
        println!(
            "   {:<16} n={:<5} efficiency={:>10.2} performance={:>12.2}",
            g.sensor_type, g.count, g.mean_efficiency_ratio, g.mean_performance_score
        );
    }

    println!("\n🖼️  Charts written: {}", summary.charts.len());
    for c in &summary.charts {
        println!("   {}", c.path.display());
    }
    if !summary.skipped_charts.is_empty() {
        println!("\n⚠️  Charts skipped:");
        for s in &summary.skipped_charts {
            println!("   - {}: {}", s.chart, s.reason);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::processing::{AnomalyLabel, FeatureDeriver};
    use crate::types::SensorReading;
    use tempfile::tempdir;

    fn rows() -> Vec<DerivedReading> {
        let deriver = FeatureDeriver::new();
        ["ECG", "Accelerometer"]
            .iter()
            .enumerate()
            .map(|(i, sensor)| {
                deriver
                    .derive_one(&SensorReading {
                        line: i as u64 + 2,
                        timestamp: Some("2024-01-01T00:00:00".to_string()),
                        sensor_id: None,
                        sensor_type: sensor.to_string(),
                        layer: Some(Layer::Edge),
                        data_size_bytes: Some(200.0),
                        energy_consumption: Some(100.0),
                        transmission_duration: Some(2.0),
                        energy_efficiency_ratio: Some(1400.0 + i as f64),
                        transmission_efficiency_score: None,
                    })
                    .unwrap()
            })
            .collect()
    }

    #[test]
    fn labeled_rows_leave_label_cells_empty_without_detection() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("labeled.csv");
        write_labeled_rows(&path, &rows(), None).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("timestamp,sensor_id,sensor_type,layer,"));
        assert!(header.ends_with("bytes_per_duration,performance_score,anomaly_score,is_anomaly"));
        let first = lines.next().unwrap();
        assert!(first.contains(",edge,"));
        assert!(first.ends_with(",,"));
    }

    #[test]
    fn labeled_rows_carry_scores_and_flags() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("labeled.csv");
        let detection = Detection {
            model: "test".to_string(),
            features: Vec::new(),
            contamination: 0.5,
            seed: 7,
            labels: vec![
                AnomalyLabel { score: 0.75, is_anomaly: true },
                AnomalyLabel { score: 0.25, is_anomaly: false },
            ],
        };
        write_labeled_rows(&path, &rows(), Some(&detection)).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let body: Vec<&str> = text.lines().skip(1).collect();
        assert!(body[0].ends_with(",0.75,true"));
        assert!(body[1].ends_with(",0.25,false"));
    }

    #[test]
    fn summary_csv_has_two_columns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("summary.csv");
        let groups = crate::pipeline::processing::aggregate::group_by_sensor(&rows(), None);
        write_summary_csv(&path, &groups).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "sensor_type,avg_efficiency_ratio");
        assert_eq!(lines[1], "Accelerometer,1401.0");
        assert_eq!(lines[2], "ECG,1400.0");
    }

    #[test]
    fn file_digest_matches_known_value() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("abc.txt");
        fs::write(&path, "abc").unwrap();
        assert_eq!(
            sha256_file(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
