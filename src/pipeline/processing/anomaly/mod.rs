//! Unsupervised anomaly labelling of derived readings
//!
//! Features are standardised, scored by an [`AnomalyModel`], and the
//! `round(contamination * rows)` highest-scoring rows are labelled anomalous.

pub mod isolation_forest;
pub mod scaler;

pub use isolation_forest::{ForestConfig, IsolationForest};
pub use scaler::StandardScaler;

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{info, instrument, warn};

use crate::config::DetectorConfig;
use crate::error::ComputationError;
use crate::metrics::StageMetrics;
use crate::types::{DerivedReading, NumericColumn};

/// Trait for anomaly scoring models
pub trait AnomalyModel {
    /// Train on the full batch
    fn fit(&mut self, data: &[Vec<f64>]) -> Result<(), ComputationError>;

    /// Score a sample, higher = more anomalous
    fn score(&self, sample: &[f64]) -> f64;

    fn name(&self) -> &str;

    fn is_trained(&self) -> bool;
}

/// Per-row outcome of detection
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnomalyLabel {
    pub score: f64,
    pub is_anomaly: bool,
}

/// Labels for a batch, index-aligned with the derived rows
#[derive(Debug, Clone, Serialize)]
pub struct Detection {
    pub model: String,
    pub features: Vec<NumericColumn>,
    pub contamination: f64,
    pub seed: u64,
    pub labels: Vec<AnomalyLabel>,
}

impl Detection {
    pub fn anomaly_count(&self) -> usize {
        self.labels.iter().filter(|l| l.is_anomaly).count()
    }

    /// Lowest score that was still labelled anomalous
    pub fn threshold(&self) -> Option<f64> {
        self.labels
            .iter()
            .filter(|l| l.is_anomaly)
            .map(|l| l.score)
            .min_by(f64::total_cmp)
    }

    /// SHA-256 over the label bits, stable across identical runs
    pub fn labels_fingerprint(&self) -> String {
        let bits: Vec<u8> = self.labels.iter().map(|l| u8::from(l.is_anomaly)).collect();
        let mut hasher = Sha256::new();
        hasher.update(&bits);
        hex::encode(hasher.finalize())
    }
}

/// Number of rows to label for a contamination fraction
pub fn anomaly_quota(contamination: f64, rows: usize) -> usize {
    ((contamination * rows as f64).round() as usize).min(rows)
}

/// Mark exactly `quota` rows, highest score first, ties to the lower index
pub fn label_top(scores: &[f64], quota: usize) -> Vec<bool> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]).then(a.cmp(&b)));
    let mut flags = vec![false; scores.len()];
    for &i in order.iter().take(quota) {
        flags[i] = true;
    }
    flags
}

/// Fit an isolation forest on the configured feature columns and label rows
#[instrument(skip_all, fields(rows = rows.len(), contamination = config.contamination))]
pub fn detect(rows: &[DerivedReading], config: &DetectorConfig) -> Result<Detection, ComputationError> {
    let mut model = IsolationForest::new(ForestConfig {
        n_trees: config.n_trees,
        max_samples: config.max_samples,
        seed: config.seed,
    });
    detect_with(&mut model, rows, config).inspect_err(|e| {
        StageMetrics::detection_failed();
        warn!("Anomaly detection failed: {}", e);
    })
}

/// Same as [`detect`] with a caller-supplied model
pub fn detect_with<M: AnomalyModel>(
    model: &mut M,
    rows: &[DerivedReading],
    config: &DetectorConfig,
) -> Result<Detection, ComputationError> {
    if rows.len() < 2 {
        return Err(ComputationError::InsufficientRows {
            needed: 2,
            found: rows.len(),
        });
    }

    let matrix: Vec<Vec<f64>> = rows
        .iter()
        .map(|r| config.features.iter().map(|c| r.value(*c)).collect())
        .collect();
    let (scaler, scaled) = StandardScaler::fit_transform(&matrix)?;
    for idx in scaler.constant_columns() {
        warn!("Feature '{}' is constant and will not influence detection", config.features[idx]);
    }

    model.fit(&scaled)?;
    let scores: Vec<f64> = scaled.iter().map(|row| model.score(row)).collect();
    let quota = anomaly_quota(config.contamination, rows.len());
    let flags = label_top(&scores, quota);

    let detection = Detection {
        model: model.name().to_string(),
        features: config.features.clone(),
        contamination: config.contamination,
        seed: config.seed,
        labels: scores
            .into_iter()
            .zip(flags)
            .map(|(score, is_anomaly)| AnomalyLabel { score, is_anomaly })
            .collect(),
    };

    StageMetrics::anomalies_detected(detection.anomaly_count(), rows.len());
    info!(
        "Detected {} anomalies out of {} records ({:.1}%)",
        detection.anomaly_count(),
        rows.len(),
        detection.anomaly_count() as f64 / rows.len() as f64 * 100.0
    );
    Ok(detection)
}
