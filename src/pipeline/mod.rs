// Analysis pipeline: ingestion, processing, rendering and reporting

pub mod ingestion;
pub mod processing;
pub mod render;
pub mod report;

use chrono::Utc;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::constants::*;
use crate::error::{DataFormatError, Result};
use crate::metrics::{time_stage, StageMetrics};
use crate::types::NumericColumn;
use processing::aggregate::{correlation_matrix, group_by_sensor};
use processing::anomaly::detect;
use processing::{Derivation, FeatureDeriver};
use render::{render_chart, ChartKind, RenderContext};
use report::{ChartRecord, DetectionSummary, RunSummary, SkippedChart};

/// Outcome of `validate`: what loading and derivation would feed the analysis
#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub rows_loaded: usize,
    pub rows_usable: usize,
    pub exclusions: BTreeMap<String, usize>,
}

/// Result of a complete pipeline run
#[derive(Debug)]
pub struct PipelineResult {
    pub output_dir: PathBuf,
    pub summary: RunSummary,
}

impl PipelineResult {
    pub fn artifact(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }
}

pub struct Pipeline {
    config: Config,
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Load and derive. Running out of usable rows is fatal.
    fn load_and_derive(&self, input: &Path) -> Result<(usize, Derivation)> {
        let readings = {
            let _timing = time_stage("ingest");
            ingestion::load_readings(input)?
        };
        info!("✅ Loaded {} readings", readings.len());
        println!("✅ Loaded {} readings from {}", readings.len(), input.display());

        let derivation = {
            let _timing = time_stage("derive");
            FeatureDeriver::with_config(self.config.features.clone()).derive(&readings)
        };
        if derivation.rows.is_empty() {
            return Err(DataFormatError::NoUsableRows {
                excluded: derivation.excluded.len(),
            }
            .into());
        }
        println!(
            "🔧 Derived features for {} readings ({} excluded)",
            derivation.rows.len(),
            derivation.excluded.len()
        );
        Ok((readings.len(), derivation))
    }

    /// Run loader and deriver only
    #[instrument(skip(self), fields(input = %input.display()))]
    pub fn validate(&self, input: &Path) -> Result<ValidationReport> {
        let (rows_loaded, derivation) = self.load_and_derive(input)?;
        Ok(ValidationReport {
            rows_loaded,
            rows_usable: derivation.rows.len(),
            exclusions: exclusion_names(&derivation),
        })
    }

    /// Run the complete analysis and write every artifact into `output_dir`
    #[instrument(skip(self), fields(input = %input.display(), output_dir = %output_dir.display()))]
    pub fn run(&self, input: &Path, output_dir: &Path) -> Result<PipelineResult> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(%run_id, "🚀 Starting analysis");
        println!("🚀 Starting analysis of {}", input.display());
        let _timing = time_stage("pipeline");

        let (rows_loaded, derivation) = self.load_and_derive(input)?;
        let rows = &derivation.rows;
        let input_sha256 = report::sha256_file(input)?;

        // Nothing is written before the input is known to be usable
        fs::create_dir_all(output_dir)?;

        println!("🤖 Detecting anomalies...");
        let detection = {
            let _timing = time_stage("detect");
            detect(rows, &self.config.detector)
        };
        match &detection {
            Ok(d) => println!(
                "✅ Detected {} anomalies out of {} records",
                d.anomaly_count(),
                rows.len()
            ),
            Err(e) => println!("⚠️  Anomaly detection skipped: {e}"),
        }

        let (groups, correlation) = {
            let _timing = time_stage("aggregate");
            let groups = group_by_sensor(rows, detection.as_ref().ok());
            let correlation = correlation_matrix(rows, &NumericColumn::ALL);
            if let Err(e) = &correlation {
                warn!("Correlation matrix unavailable: {}", e);
            }
            (groups, correlation)
        };

        println!("🎨 Rendering charts...");
        let ctx = RenderContext {
            rows,
            groups: &groups,
            correlation: correlation.as_ref(),
            detection: detection.as_ref(),
            size: (self.config.output.chart_width, self.config.output.chart_height),
        };
        let mut charts = Vec::new();
        let mut skipped_charts = Vec::new();
        {
            let _timing = time_stage("render");
            for kind in ChartKind::ALL {
                match render_chart(kind, &ctx, output_dir) {
                    Ok(path) => {
                        StageMetrics::chart_rendered(kind.as_str());
                        println!("   Saved {}", path.display());
                        charts.push(ChartRecord {
                            chart: kind.to_string(),
                            path,
                        });
                    }
                    Err(e) => {
                        StageMetrics::chart_skipped(kind.as_str());
                        warn!(chart = %kind, "Skipping chart: {}", e);
                        skipped_charts.push(SkippedChart {
                            chart: kind.to_string(),
                            reason: e.to_string(),
                        });
                    }
                }
            }
        }

        println!("💾 Writing reports...");
        {
            let _timing = time_stage("report");
            report::write_labeled_rows(&output_dir.join(LABELED_DATA_FILE), rows, detection.as_ref().ok())?;
            report::write_summary_csv(&output_dir.join(SUMMARY_FILE), &groups)?;
        }

        let summary = RunSummary {
            run_id,
            started_at,
            finished_at: Utc::now(),
            input: input.to_path_buf(),
            input_sha256,
            rows_loaded,
            rows_used: rows.len(),
            rows_excluded: derivation.excluded.len(),
            exclusions: exclusion_names(&derivation),
            detection: detection.as_ref().ok().map(DetectionSummary::from_detection),
            detection_error: detection.as_ref().err().map(|e| e.to_string()),
            groups,
            charts,
            skipped_charts,
        };
        report::write_run_summary(&output_dir.join(RUN_SUMMARY_FILE), &summary)?;

        info!(
            %run_id,
            charts = summary.charts.len(),
            skipped = summary.skipped_charts.len(),
            "✅ Analysis complete"
        );
        Ok(PipelineResult {
            output_dir: output_dir.to_path_buf(),
            summary,
        })
    }
}

fn exclusion_names(derivation: &Derivation) -> BTreeMap<String, usize> {
    derivation
        .exclusion_counts()
        .into_iter()
        .map(|(reason, count)| (reason.as_str().to_string(), count))
        .collect()
}
