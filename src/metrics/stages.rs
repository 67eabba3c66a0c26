//! Per-stage metric recorders

use super::stage_metric;

/// Metric recording for each pipeline stage
pub struct StageMetrics;

impl StageMetrics {
    pub fn rows_loaded(count: usize) {
        ::metrics::counter!(stage_metric!(counter, "ingest", "rows_loaded")).increment(count as u64);
    }

    pub fn row_excluded(reason: &'static str) {
        ::metrics::counter!(stage_metric!(counter, "derive", "rows_excluded"), "reason" => reason)
            .increment(1);
    }

    pub fn rows_derived(count: usize) {
        ::metrics::counter!(stage_metric!(counter, "derive", "rows_derived")).increment(count as u64);
    }

    pub fn anomalies_detected(count: usize, rows: usize) {
        ::metrics::counter!(stage_metric!(counter, "detect", "anomalies")).increment(count as u64);
        if rows > 0 {
            ::metrics::histogram!(stage_metric!(histogram, "detect", "anomaly_ratio"))
                .record(count as f64 / rows as f64);
        }
    }

    pub fn detection_failed() {
        ::metrics::counter!(stage_metric!(counter, "detect", "failures")).increment(1);
    }

    pub fn groups_aggregated(count: usize) {
        ::metrics::histogram!(stage_metric!(histogram, "aggregate", "groups")).record(count as f64);
    }

    pub fn chart_rendered(chart: &'static str) {
        ::metrics::counter!(stage_metric!(counter, "render", "charts_rendered"), "chart" => chart)
            .increment(1);
    }

    pub fn chart_skipped(chart: &'static str) {
        ::metrics::counter!(stage_metric!(counter, "render", "charts_skipped"), "chart" => chart)
            .increment(1);
    }
}
