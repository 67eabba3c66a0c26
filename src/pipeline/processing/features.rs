use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info, instrument, warn};

use crate::config::FeatureConfig;
use crate::metrics::StageMetrics;
use crate::types::{DerivedReading, SensorReading};

/// Why a reading was kept out of the analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    /// Empty sensor type or required numeric cell
    MissingValue,
    NonPositiveDuration,
    NonPositiveEnergy,
    NegativeDataSize,
    /// An input or derived value is infinite or NaN
    NonFinite,
}

impl ExclusionReason {
    pub fn as_str(self) -> &'static str {
        match self {
            ExclusionReason::MissingValue => "missing_value",
            ExclusionReason::NonPositiveDuration => "non_positive_duration",
            ExclusionReason::NonPositiveEnergy => "non_positive_energy",
            ExclusionReason::NegativeDataSize => "negative_data_size",
            ExclusionReason::NonFinite => "non_finite",
        }
    }
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Exclusion {
    pub line: u64,
    pub reason: ExclusionReason,
}

/// Output of the deriver: usable rows plus what was dropped and why
#[derive(Debug, Clone, Default)]
pub struct Derivation {
    pub rows: Vec<DerivedReading>,
    pub excluded: Vec<Exclusion>,
}

impl Derivation {
    pub fn exclusion_counts(&self) -> BTreeMap<ExclusionReason, usize> {
        let mut counts = BTreeMap::new();
        for e in &self.excluded {
            *counts.entry(e.reason).or_insert(0) += 1;
        }
        counts
    }
}

/// Appends `bytes_per_duration`, `energy_efficiency_ratio` and
/// `performance_score` to each reading.
///
/// Rows that would yield an undefined value are excluded, never propagated.
pub struct FeatureDeriver {
    pub config: FeatureConfig,
}

impl Default for FeatureDeriver {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureDeriver {
    pub fn new() -> Self {
        Self {
            config: FeatureConfig::default(),
        }
    }

    pub fn with_config(config: FeatureConfig) -> Self {
        Self { config }
    }

    #[instrument(skip_all, fields(rows = readings.len()))]
    pub fn derive(&self, readings: &[SensorReading]) -> Derivation {
        let mut derivation = Derivation::default();
        for reading in readings {
            match self.derive_one(reading) {
                Ok(row) => derivation.rows.push(row),
                Err(reason) => {
                    debug!(line = reading.line, %reason, "Excluding reading");
                    StageMetrics::row_excluded(reason.as_str());
                    derivation.excluded.push(Exclusion {
                        line: reading.line,
                        reason,
                    });
                }
            }
        }

        StageMetrics::rows_derived(derivation.rows.len());
        if !derivation.excluded.is_empty() {
            warn!(
                "Excluded {} of {} readings: {:?}",
                derivation.excluded.len(),
                readings.len(),
                derivation.exclusion_counts()
            );
        }
        info!("Derived features for {} readings", derivation.rows.len());
        derivation
    }

    /// Apply the exclusion policy to one reading, first failing rule wins
    pub fn derive_one(&self, reading: &SensorReading) -> Result<DerivedReading, ExclusionReason> {
        let (data_size, energy, duration) = match (
            reading.data_size_bytes,
            reading.energy_consumption,
            reading.transmission_duration,
        ) {
            (Some(d), Some(e), Some(t)) if !reading.sensor_type.trim().is_empty() => (d, e, t),
            _ => return Err(ExclusionReason::MissingValue),
        };
        if [data_size, energy, duration].iter().any(|v| !v.is_finite()) {
            return Err(ExclusionReason::NonFinite);
        }
        if duration <= 0.0 {
            return Err(ExclusionReason::NonPositiveDuration);
        }
        if energy <= 0.0 {
            return Err(ExclusionReason::NonPositiveEnergy);
        }
        if data_size < 0.0 {
            return Err(ExclusionReason::NegativeDataSize);
        }

        let bytes_per_duration = data_size / duration;
        let efficiency = reading
            .energy_efficiency_ratio
            .unwrap_or(data_size / energy);
        let performance_score = self.performance_score(efficiency, bytes_per_duration, energy);

        if ![bytes_per_duration, efficiency, performance_score]
            .iter()
            .all(|v| v.is_finite())
        {
            return Err(ExclusionReason::NonFinite);
        }

        Ok(DerivedReading {
            reading: reading.clone(),
            data_size_bytes: data_size,
            energy_consumption: energy,
            transmission_duration: duration,
            energy_efficiency_ratio: efficiency,
            bytes_per_duration,
            performance_score,
        })
    }

    /// `eff^a * bpd^b / energy^c`
    pub fn performance_score(&self, efficiency: f64, bytes_per_duration: f64, energy: f64) -> f64 {
        let c = &self.config;
        efficiency.powf(c.efficiency_weight) * bytes_per_duration.powf(c.throughput_weight)
            / energy.powf(c.energy_weight)
    }
}
