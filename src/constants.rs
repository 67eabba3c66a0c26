/// Column name constants shared by the loader, the report writer and the
/// sample generator.

// Input columns
pub const COL_TIMESTAMP: &str = "timestamp";
pub const COL_SENSOR_ID: &str = "sensor_id";
pub const COL_SENSOR_TYPE: &str = "sensor_type";
pub const COL_LAYER: &str = "layer";
pub const COL_DATA_SIZE: &str = "data_size_bytes";
pub const COL_ENERGY: &str = "energy_consumption";
pub const COL_DURATION: &str = "transmission_duration";
pub const COL_EFFICIENCY: &str = "energy_efficiency_ratio";
pub const COL_TRANSMISSION_SCORE: &str = "transmission_efficiency_score";

// Derived columns
pub const COL_BYTES_PER_DURATION: &str = "bytes_per_duration";
pub const COL_PERFORMANCE: &str = "performance_score";

/// Columns the loader refuses to run without
pub const REQUIRED_COLUMNS: [&str; 4] = [COL_SENSOR_TYPE, COL_DATA_SIZE, COL_ENERGY, COL_DURATION];

/// The documented nine-column raw schema, in file order
pub const RAW_SCHEMA: [&str; 9] = [
    COL_TIMESTAMP,
    COL_SENSOR_ID,
    COL_SENSOR_TYPE,
    COL_LAYER,
    COL_DATA_SIZE,
    COL_ENERGY,
    COL_DURATION,
    COL_EFFICIENCY,
    COL_TRANSMISSION_SCORE,
];

/// Known sensor types with the mean efficiency ratio reported by the hosted
/// pipeline's `sensor_performance_summary` output.
pub const KNOWN_SENSORS: [(&str, f64); 5] = [
    ("ECG", 1459.19),
    ("BodyTemperature", 1334.23),
    ("Accelerometer", 1399.96),
    ("BloodPressure", 1351.63),
    ("PulseOximeter", 1441.74),
];

// Artifact file names
pub const BAR_CHART_FILE: &str = "sensor_efficiency_bar_chart.svg";
pub const BOX_PLOT_FILE: &str = "performance_score_boxplot.svg";
pub const EFFICIENCY_BOX_PLOT_FILE: &str = "efficiency_distribution_boxplot.svg";
pub const HEATMAP_FILE: &str = "correlation_heatmap.svg";
pub const SCATTER_FILE: &str = "anomaly_detection_scatter.svg";
pub const SCORE_HISTOGRAM_FILE: &str = "anomaly_score_distribution.svg";
pub const DASHBOARD_FILE: &str = "performance_dashboard.svg";
pub const LABELED_DATA_FILE: &str = "sensor_data_with_anomalies.csv";
pub const SUMMARY_FILE: &str = "sensor_performance_summary.csv";
pub const RUN_SUMMARY_FILE: &str = "run_summary.json";
pub const METRICS_FILE: &str = "metrics.prom";

// Defaults
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";
pub const CONFIG_ENV_VAR: &str = "SENSOR_INSIGHTS_CONFIG";
pub const DEFAULT_CONTAMINATION: f64 = 0.1;
pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_TREES: usize = 100;
pub const DEFAULT_MAX_SAMPLES: usize = 256;
pub const DEFAULT_ROWS_PER_SENSOR: usize = 100;
/// Upper bound for a configured chart side, in pixels
pub const MAX_CHART_SIDE: u32 = 20_000;
