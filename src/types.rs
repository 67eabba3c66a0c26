use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::*;

/// Network tier a reading was transmitted from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    Sensor,
    Edge,
    Cloud,
}

impl FromStr for Layer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sensor" => Ok(Layer::Sensor),
            "edge" => Ok(Layer::Edge),
            "cloud" => Ok(Layer::Cloud),
            other => Err(format!("unknown layer '{other}'")),
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Layer::Sensor => "sensor",
            Layer::Edge => "edge",
            Layer::Cloud => "cloud",
        };
        f.write_str(name)
    }
}

/// One transmission event as read from the input file.
///
/// Numeric fields are `None` when the cell was empty; the feature deriver
/// decides what to do with those rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// 1-based line in the source file (header is line 1)
    pub line: u64,
    pub timestamp: Option<String>,
    pub sensor_id: Option<String>,
    pub sensor_type: String,
    pub layer: Option<Layer>,
    pub data_size_bytes: Option<f64>,
    pub energy_consumption: Option<f64>,
    pub transmission_duration: Option<f64>,
    pub energy_efficiency_ratio: Option<f64>,
    pub transmission_efficiency_score: Option<f64>,
}

/// A reading that passed the exclusion policy, with derived columns appended
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedReading {
    pub reading: SensorReading,
    pub data_size_bytes: f64,
    pub energy_consumption: f64,
    pub transmission_duration: f64,
    pub energy_efficiency_ratio: f64,
    pub bytes_per_duration: f64,
    pub performance_score: f64,
}

impl DerivedReading {
    pub fn sensor_type(&self) -> &str {
        &self.reading.sensor_type
    }

    pub fn value(&self, column: NumericColumn) -> f64 {
        match column {
            NumericColumn::EnergyEfficiencyRatio => self.energy_efficiency_ratio,
            NumericColumn::EnergyConsumption => self.energy_consumption,
            NumericColumn::DataSizeBytes => self.data_size_bytes,
            NumericColumn::TransmissionDuration => self.transmission_duration,
            NumericColumn::BytesPerDuration => self.bytes_per_duration,
            NumericColumn::PerformanceScore => self.performance_score,
        }
    }
}

/// The numeric analysis columns available after feature derivation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericColumn {
    EnergyEfficiencyRatio,
    EnergyConsumption,
    DataSizeBytes,
    TransmissionDuration,
    BytesPerDuration,
    PerformanceScore,
}

impl NumericColumn {
    /// Columns in correlation-matrix order
    pub const ALL: [NumericColumn; 6] = [
        NumericColumn::EnergyEfficiencyRatio,
        NumericColumn::EnergyConsumption,
        NumericColumn::DataSizeBytes,
        NumericColumn::TransmissionDuration,
        NumericColumn::BytesPerDuration,
        NumericColumn::PerformanceScore,
    ];

    pub fn name(self) -> &'static str {
        match self {
            NumericColumn::EnergyEfficiencyRatio => COL_EFFICIENCY,
            NumericColumn::EnergyConsumption => COL_ENERGY,
            NumericColumn::DataSizeBytes => COL_DATA_SIZE,
            NumericColumn::TransmissionDuration => COL_DURATION,
            NumericColumn::BytesPerDuration => COL_BYTES_PER_DURATION,
            NumericColumn::PerformanceScore => COL_PERFORMANCE,
        }
    }
}

impl fmt::Display for NumericColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layer_parses_case_insensitively() {
        assert_eq!("Edge".parse::<Layer>(), Ok(Layer::Edge));
        assert_eq!(" CLOUD ".parse::<Layer>(), Ok(Layer::Cloud));
        assert!("fog".parse::<Layer>().is_err());
    }

    #[test]
    fn numeric_column_serde_names_match_csv_headers() {
        for column in NumericColumn::ALL {
            let json = serde_json::to_string(&column).unwrap();
            assert_eq!(json, format!("\"{}\"", column.name()));
        }
    }
}
