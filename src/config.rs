use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::constants::*;
use crate::error::{AnalysisError, Result};
use crate::types::NumericColumn;

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub detector: DetectorConfig,
    pub features: FeatureConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

/// Isolation forest settings
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct DetectorConfig {
    /// Expected share of anomalous rows, in (0, 0.5]
    pub contamination: f64,
    pub n_trees: usize,
    /// Sub-sample size per tree, capped at the row count
    pub max_samples: usize,
    pub seed: u64,
    pub features: Vec<NumericColumn>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            contamination: DEFAULT_CONTAMINATION,
            n_trees: DEFAULT_TREES,
            max_samples: DEFAULT_MAX_SAMPLES,
            seed: DEFAULT_SEED,
            features: vec![
                NumericColumn::EnergyEfficiencyRatio,
                NumericColumn::EnergyConsumption,
                NumericColumn::BytesPerDuration,
                NumericColumn::PerformanceScore,
            ],
        }
    }
}

/// Exponents of `performance_score = eff^a * bpd^b / energy^c`
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct FeatureConfig {
    pub efficiency_weight: f64,
    pub throughput_weight: f64,
    pub energy_weight: f64,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            efficiency_weight: 1.0,
            throughput_weight: 1.0,
            energy_weight: 1.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: PathBuf,
    pub chart_width: u32,
    pub chart_height: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("output"),
            chart_width: 1200,
            chart_height: 600,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub directory: PathBuf,
    pub file_name: String,
    /// Default level for this crate when RUST_LOG is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("logs"),
            file_name: "sensor_insights.log".to_string(),
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Resolve and load the configuration.
    ///
    /// Lookup order: `explicit`, then `SENSOR_INSIGHTS_CONFIG`, then
    /// `./config.toml` when it exists, then built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let config = match Self::resolve_path(explicit) {
            Some(path) => Self::from_file(&path)?,
            None => {
                debug!("No config file found, using defaults");
                Self::default()
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// The file [`Config::load`] would read, or `None` for built-in defaults
    pub fn resolve_path(explicit: Option<&Path>) -> Option<PathBuf> {
        let env_path = std::env::var(CONFIG_ENV_VAR)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        explicit.map(Path::to_path_buf).or(env_path).or_else(|| {
            let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
            default_path.exists().then_some(default_path)
        })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(path).map_err(|e| {
            AnalysisError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        let config: Config = toml::from_str(&config_content)?;
        debug!(path = %path.display(), "Read configuration file");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let d = &self.detector;
        if !(d.contamination > 0.0 && d.contamination <= 0.5) {
            return Err(AnalysisError::Config(format!(
                "detector.contamination must be in (0, 0.5], got {}",
                d.contamination
            )));
        }
        if d.n_trees == 0 {
            return Err(AnalysisError::Config("detector.n_trees must be positive".into()));
        }
        if d.max_samples == 0 {
            return Err(AnalysisError::Config("detector.max_samples must be positive".into()));
        }
        if d.features.is_empty() {
            return Err(AnalysisError::Config("detector.features must not be empty".into()));
        }
        let f = &self.features;
        for (name, w) in [
            ("efficiency_weight", f.efficiency_weight),
            ("throughput_weight", f.throughput_weight),
            ("energy_weight", f.energy_weight),
        ] {
            if !w.is_finite() {
                return Err(AnalysisError::Config(format!("features.{name} must be finite")));
            }
        }
        let o = &self.output;
        if o.chart_width == 0 || o.chart_height == 0 {
            return Err(AnalysisError::Config("chart dimensions must be positive".into()));
        }
        if o.chart_width > MAX_CHART_SIDE || o.chart_height > MAX_CHART_SIDE {
            return Err(AnalysisError::Config(format!(
                "chart dimensions must not exceed {MAX_CHART_SIDE} px, got {}x{}",
                o.chart_width, o.chart_height
            )));
        }
        Ok(())
    }
}
