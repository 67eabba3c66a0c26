//! Data loading: delimited sensor readings into memory

pub mod sample;

use csv::StringRecord;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, instrument};

use crate::constants::*;
use crate::error::{DataFormatError, Result};
use crate::metrics::StageMetrics;
use crate::types::{Layer, SensorReading};

/// Positions of the known columns in the header row
#[derive(Debug, Clone, PartialEq)]
struct ColumnIndex {
    sensor_type: usize,
    data_size_bytes: usize,
    energy_consumption: usize,
    transmission_duration: usize,
    timestamp: Option<usize>,
    sensor_id: Option<usize>,
    layer: Option<usize>,
    energy_efficiency_ratio: Option<usize>,
    transmission_efficiency_score: Option<usize>,
}

impl ColumnIndex {
    fn from_headers(headers: &StringRecord) -> std::result::Result<Self, DataFormatError> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| DataFormatError::MissingColumn {
                column: name.to_string(),
            })
        };

        let index = Self {
            sensor_type: require(COL_SENSOR_TYPE)?,
            data_size_bytes: require(COL_DATA_SIZE)?,
            energy_consumption: require(COL_ENERGY)?,
            transmission_duration: require(COL_DURATION)?,
            timestamp: find(COL_TIMESTAMP),
            sensor_id: find(COL_SENSOR_ID),
            layer: find(COL_LAYER),
            energy_efficiency_ratio: find(COL_EFFICIENCY),
            transmission_efficiency_score: find(COL_TRANSMISSION_SCORE),
        };

        let extra: Vec<&str> = headers
            .iter()
            .map(str::trim)
            .filter(|h| !RAW_SCHEMA.contains(h))
            .collect();
        if !extra.is_empty() {
            debug!(?extra, "Ignoring columns outside the raw schema");
        }
        Ok(index)
    }

    fn parse(&self, record: &StringRecord, line: u64) -> std::result::Result<SensorReading, DataFormatError> {
        let text = |idx: Option<usize>| {
            idx.and_then(|i| record.get(i))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let number = |idx: Option<usize>, column: &str| -> std::result::Result<Option<f64>, DataFormatError> {
            match text(idx) {
                None => Ok(None),
                Some(raw) => raw.parse::<f64>().map(Some).map_err(|_| DataFormatError::InvalidValue {
                    column: column.to_string(),
                    line,
                    value: raw,
                }),
            }
        };

        let layer = match text(self.layer) {
            None => None,
            Some(raw) => Some(raw.parse::<Layer>().map_err(|_| DataFormatError::InvalidValue {
                column: COL_LAYER.to_string(),
                line,
                value: raw,
            })?),
        };

        Ok(SensorReading {
            line,
            timestamp: text(self.timestamp),
            sensor_id: text(self.sensor_id),
            sensor_type: text(Some(self.sensor_type)).unwrap_or_default(),
            layer,
            data_size_bytes: number(Some(self.data_size_bytes), COL_DATA_SIZE)?,
            energy_consumption: number(Some(self.energy_consumption), COL_ENERGY)?,
            transmission_duration: number(Some(self.transmission_duration), COL_DURATION)?,
            energy_efficiency_ratio: number(self.energy_efficiency_ratio, COL_EFFICIENCY)?,
            transmission_efficiency_score: number(self.transmission_efficiency_score, COL_TRANSMISSION_SCORE)?,
        })
    }
}

/// Load every row of a delimited file.
///
/// Fails with a [`DataFormatError`] when the file cannot be read, a required
/// column is missing, a cell does not parse, or there are no data rows.
/// Empty cells load as `None` and are left to the feature deriver.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn load_readings(path: &Path) -> Result<Vec<SensorReading>> {
    let file = File::open(path).map_err(|e| DataFormatError::Unreadable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    read_readings(file, path)
}

/// Same as [`load_readings`] over any reader; `source` is only used in errors
pub fn read_readings<R: Read>(reader: R, source: &Path) -> Result<Vec<SensorReading>> {
    let unreadable = |e: csv::Error| DataFormatError::Unreadable {
        path: source.to_path_buf(),
        reason: e.to_string(),
    };

    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers = csv_reader.headers().map_err(unreadable)?.clone();
    let index = ColumnIndex::from_headers(&headers)?;

    let mut readings = Vec::new();
    for (i, record) in csv_reader.records().enumerate() {
        let record = record.map_err(unreadable)?;
        let line = record.position().map(|p| p.line()).unwrap_or(i as u64 + 2);
        readings.push(index.parse(&record, line)?);
    }

    if readings.is_empty() {
        return Err(DataFormatError::Empty {
            path: source.to_path_buf(),
        }
        .into());
    }

    StageMetrics::rows_loaded(readings.len());
    info!("Loaded {} readings from {}", readings.len(), source.display());
    Ok(readings)
}
