//! Metrics for the analysis pipeline
//!
//! Stages record through the `metrics` facade. The CLI installs a Prometheus
//! recorder once and writes the text exposition next to the other artifacts,
//! since a batch run is gone before anything could scrape it. Without an
//! installed recorder every call is a no-op, which is what tests rely on.

pub mod core;
pub mod stages;

pub use self::core::{time_stage, TimingGuard};
pub use stages::StageMetrics;

use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{info, warn};

static HANDLE: OnceLock<metrics_exporter_prometheus::PrometheusHandle> = OnceLock::new();

/// Macro to build metric names with a consistent prefix:
/// sensor_{stage}_{metric_name}[_total]
macro_rules! stage_metric {
    (counter, $stage:literal, $name:literal) => {
        concat!("sensor_", $stage, "_", $name, "_total")
    };
    (histogram, $stage:literal, $name:literal) => {
        concat!("sensor_", $stage, "_", $name)
    };
}

pub(crate) use stage_metric;

/// Install the Prometheus recorder. Idempotent.
pub fn init_metrics() {
    if HANDLE.get().is_some() {
        return;
    }
    match metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            if HANDLE.set(handle).is_err() {
                warn!("Prometheus handle was already stored");
            }
            info!("Prometheus recorder installed");
        }
        Err(e) => {
            warn!("Failed to install Prometheus recorder: {}", e);
        }
    }
}

/// Render the current snapshot in Prometheus text format, if a recorder is installed
pub fn render_snapshot() -> Option<String> {
    HANDLE.get().map(|h| h.render())
}

/// Write the snapshot to `path`. Returns false when no recorder is installed.
pub fn write_snapshot(path: &Path) -> std::io::Result<bool> {
    match render_snapshot() {
        Some(text) => {
            fs::write(path, text)?;
            info!(path = %path.display(), "Wrote metrics snapshot");
            Ok(true)
        }
        None => Ok(false),
    }
}
