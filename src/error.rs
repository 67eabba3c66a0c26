use std::path::PathBuf;
use thiserror::Error;

/// Malformed or incomplete input. Always fatal for a run.
#[derive(Error, Debug)]
pub enum DataFormatError {
    #[error("cannot read input '{path}': {reason}")]
    Unreadable { path: PathBuf, reason: String },

    #[error("missing required column '{column}'")]
    MissingColumn { column: String },

    #[error("invalid value '{value}' in column '{column}' at line {line}")]
    InvalidValue {
        column: String,
        line: u64,
        value: String,
    },

    #[error("input '{path}' contains no data rows")]
    Empty { path: PathBuf },

    #[error("no usable rows remain after excluding {excluded} invalid rows")]
    NoUsableRows { excluded: usize },
}

/// A numeric step could not produce a meaningful result. The run continues
/// and the dependent chart is skipped.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComputationError {
    #[error("column '{column}' has zero variance")]
    ZeroVariance { column: String },

    #[error("need at least {needed} rows, found {found}")]
    InsufficientRows { needed: usize, found: usize },

    #[error("every feature column is constant, nothing to isolate")]
    DegenerateFeatures,

    #[error("column '{column}' exceeds the plottable range")]
    Unplottable { column: String },

    #[error("anomaly detection was not available: {0}")]
    DetectionUnavailable(String),

    #[error("failed to render {chart}: {message}")]
    Render { chart: String, message: String },
}

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("data format error: {0}")]
    DataFormat(#[from] DataFormatError),

    #[error("computation error: {0}")]
    Computation(#[from] ComputationError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AnalysisError {
    /// True when the error must abort the whole run.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, AnalysisError::Computation(_))
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
