//! SVG chart rendering
//!
//! Each drawing function is generic over the backend and draws into a
//! [`DrawingArea`], so the dashboard can reuse them on split panels.
//! Only [`render_chart`] touches the filesystem.

pub mod bar;
pub mod boxplot;
pub mod dashboard;
pub mod heatmap;
pub mod histogram;
pub mod scatter;

use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use std::fmt;
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

use crate::constants::*;
use crate::error::ComputationError;
use crate::pipeline::processing::{CorrelationMatrix, Detection, GroupSummary};
use crate::types::{DerivedReading, NumericColumn};
use boxplot::{draw_boxes, BoxSeries};

pub type DrawResult<DB> = Result<(), DrawingAreaErrorKind<<DB as DrawingBackend>::ErrorType>>;

pub const CAPTION_FONT: (&str, u32) = ("sans-serif", 22);
pub const LABEL_FONT: (&str, u32) = ("sans-serif", 14);

pub const NORMAL_COLOR: RGBColor = RGBColor(0x4E, 0xCD, 0xC4);
pub const ANOMALY_COLOR: RGBColor = RGBColor(0xFF, 0x6B, 0x6B);
pub const HISTOGRAM_COLOR: RGBColor = RGBColor(0x45, 0xB7, 0xD1);

const PALETTE: [RGBColor; 5] = [
    RGBColor(0xFF, 0x6B, 0x6B),
    RGBColor(0x4E, 0xCD, 0xC4),
    RGBColor(0x45, 0xB7, 0xD1),
    RGBColor(0xFF, 0xA0, 0x7A),
    RGBColor(0x98, 0xD8, 0xC8),
];

pub fn palette(i: usize) -> RGBColor {
    PALETTE[i % PALETTE.len()]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartKind {
    EfficiencyBar,
    PerformanceBoxPlot,
    EfficiencyBoxPlot,
    CorrelationHeatmap,
    AnomalyScatter,
    ScoreHistogram,
    Dashboard,
}

impl ChartKind {
    pub const ALL: [ChartKind; 7] = [
        ChartKind::EfficiencyBar,
        ChartKind::PerformanceBoxPlot,
        ChartKind::EfficiencyBoxPlot,
        ChartKind::CorrelationHeatmap,
        ChartKind::AnomalyScatter,
        ChartKind::ScoreHistogram,
        ChartKind::Dashboard,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ChartKind::EfficiencyBar => "efficiency_bar",
            ChartKind::PerformanceBoxPlot => "performance_boxplot",
            ChartKind::EfficiencyBoxPlot => "efficiency_boxplot",
            ChartKind::CorrelationHeatmap => "correlation_heatmap",
            ChartKind::AnomalyScatter => "anomaly_scatter",
            ChartKind::ScoreHistogram => "score_histogram",
            ChartKind::Dashboard => "dashboard",
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            ChartKind::EfficiencyBar => BAR_CHART_FILE,
            ChartKind::PerformanceBoxPlot => BOX_PLOT_FILE,
            ChartKind::EfficiencyBoxPlot => EFFICIENCY_BOX_PLOT_FILE,
            ChartKind::CorrelationHeatmap => HEATMAP_FILE,
            ChartKind::AnomalyScatter => SCATTER_FILE,
            ChartKind::ScoreHistogram => SCORE_HISTOGRAM_FILE,
            ChartKind::Dashboard => DASHBOARD_FILE,
        }
    }

    /// Canvas size derived from the configured base chart size
    fn canvas(self, (w, h): (u32, u32)) -> (u32, u32) {
        let scale = |v: u32, num: u32, den: u32| v.saturating_mul(num) / den;
        match self {
            ChartKind::CorrelationHeatmap => (scale(w, 5, 6), scale(h, 4, 3)),
            ChartKind::AnomalyScatter => (w, scale(h, 4, 3)),
            ChartKind::Dashboard => (w.saturating_add(w / 6), scale(h, 5, 3)),
            _ => (w, h),
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a chart may need. Upstream failures are carried along so a
/// chart that depends on them can report why it was skipped.
pub struct RenderContext<'a> {
    pub rows: &'a [DerivedReading],
    pub groups: &'a [GroupSummary],
    pub correlation: Result<&'a CorrelationMatrix, &'a ComputationError>,
    pub detection: Result<&'a Detection, &'a ComputationError>,
    pub size: (u32, u32),
}

impl<'a> RenderContext<'a> {
    fn require_detection(&self) -> Result<&'a Detection, ComputationError> {
        self.detection
            .map_err(|e| ComputationError::DetectionUnavailable(e.to_string()))
    }
}

/// Render one chart into `output_dir`, returning the written path
#[instrument(skip(ctx, output_dir), fields(chart = %kind))]
pub fn render_chart(kind: ChartKind, ctx: &RenderContext<'_>, output_dir: &Path) -> Result<PathBuf, ComputationError> {
    let path = output_dir.join(kind.file_name());
    let canvas = kind.canvas(ctx.size);

    match kind {
        ChartKind::EfficiencyBar => render_svg(kind, &path, canvas, |area| {
            let labels: Vec<String> = ctx.groups.iter().map(|g| g.sensor_type.clone()).collect();
            let values: Vec<f64> = ctx.groups.iter().map(|g| g.mean_efficiency_ratio).collect();
            bar::draw_bars(
                area,
                &bar::BarSeries {
                    caption: "IoT Sensor Performance: Average Efficiency Ratio by Sensor Type",
                    y_desc: "Average Efficiency Ratio",
                    labels: &labels,
                    values: &values,
                    fill: bar::BarFill::Palette,
                    annotate: true,
                },
            )
        })?,
        ChartKind::PerformanceBoxPlot => {
            let series = BoxSeries::new(ctx.rows, NumericColumn::PerformanceScore)?;
            render_svg(kind, &path, canvas, |area| {
                draw_boxes(
                    area,
                    &series,
                    "Distribution of Performance Score by Sensor Type",
                    "Performance Score",
                )
            })?
        }
        ChartKind::EfficiencyBoxPlot => {
            let series = BoxSeries::new(ctx.rows, NumericColumn::EnergyEfficiencyRatio)?;
            render_svg(kind, &path, canvas, |area| {
                draw_boxes(
                    area,
                    &series,
                    "Energy Efficiency Distribution by Sensor Type",
                    "Energy Efficiency Ratio",
                )
            })?
        }
        ChartKind::CorrelationHeatmap => {
            let matrix = ctx.correlation.map_err(|e| e.clone())?;
            render_svg(kind, &path, canvas, |area| heatmap::draw_heatmap(area, matrix))?
        }
        ChartKind::AnomalyScatter => {
            let detection = ctx.require_detection()?;
            render_svg(kind, &path, canvas, |area| scatter::draw_anomaly_scatter(area, ctx.rows, detection))?
        }
        ChartKind::ScoreHistogram => {
            let detection = ctx.require_detection()?;
            render_svg(kind, &path, canvas, |area| histogram::draw_score_histogram(area, detection))?
        }
        ChartKind::Dashboard => {
            let detection = ctx.require_detection()?;
            let performance = BoxSeries::new(ctx.rows, NumericColumn::PerformanceScore)?;
            render_svg(kind, &path, canvas, |area| {
                dashboard::draw_dashboard(area, ctx.rows, ctx.groups, &performance, detection)
            })?
        }
    }

    debug!(path = %path.display(), "Rendered chart");
    Ok(path)
}

/// Draw onto a white SVG canvas and write it out. A chart that fails
/// part-way is removed again.
fn render_svg<F>(kind: ChartKind, path: &Path, size: (u32, u32), draw: F) -> Result<(), ComputationError>
where
    F: FnOnce(&DrawingArea<SVGBackend<'_>, Shift>) -> Result<(), DrawingAreaErrorKind<std::io::Error>>,
{
    // The backend flushes whatever was drawn when `root` drops at the end of this block
    let drawn = {
        let root = SVGBackend::new(path, size).into_drawing_area();
        root.fill(&WHITE)
            .and_then(|_| draw(&root))
            .and_then(|_| root.present())
    };
    drawn.map_err(|e| {
        if let Err(rm) = fs::remove_file(path) {
            debug!(path = %path.display(), "No partial chart to remove: {}", rm);
        }
        ComputationError::Render {
            chart: kind.to_string(),
            message: e.to_string(),
        }
    })
}

/// Category label for a segmented axis value
pub(crate) fn segment_label(value: &SegmentValue<u32>, names: &[String]) -> String {
    match value {
        SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => names.get(*i as usize).cloned().unwrap_or_default(),
        SegmentValue::Last => String::new(),
    }
}

/// Right edge of category `i` out of `n`
pub(crate) fn segment_end(i: u32, n: u32) -> SegmentValue<u32> {
    if i + 1 < n {
        SegmentValue::Exact(i + 1)
    } else {
        SegmentValue::Last
    }
}

/// Category axis with exactly `n` segments
pub(crate) fn categories(n: usize) -> Range<u32> {
    0..(n.max(1) as u32 - 1)
}

/// Value range covering `values` with 5% padding on each side
pub(crate) fn padded_range(values: impl IntoIterator<Item = f64>) -> Range<f64> {
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !lo.is_finite() || !hi.is_finite() {
        return 0.0..1.0;
    }
    if hi <= lo {
        return (lo - 1.0)..(hi + 1.0);
    }
    let pad = (hi - lo) * 0.05;
    (lo - pad)..(hi + pad)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padded_range_handles_constant_and_empty_input() {
        assert_eq!(padded_range(Vec::new()), 0.0..1.0);
        assert_eq!(padded_range(vec![3.0, 3.0]), 2.0..4.0);
        let r = padded_range(vec![0.0, 10.0]);
        assert_eq!(r, -0.5..10.5);
    }

    #[test]
    fn categories_have_one_segment_per_name() {
        assert_eq!(categories(5), 0..4);
        assert_eq!(categories(1), 0..0);
        assert!(matches!(segment_end(3, 5), SegmentValue::Exact(4)));
        assert!(matches!(segment_end(4, 5), SegmentValue::Last));
    }

    #[test]
    fn oversized_canvas_saturates_instead_of_overflowing() {
        let huge = (4_000_000_000, 4_000_000_000);
        for kind in ChartKind::ALL {
            let (w, h) = kind.canvas(huge);
            assert!(w > 0 && h > 0);
        }
        assert_eq!(ChartKind::CorrelationHeatmap.canvas((1200, 600)), (1000, 800));
    }

    #[test]
    fn failed_drawing_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.svg");
        let err = render_svg(ChartKind::EfficiencyBar, &path, (200, 100), |area| {
            area.fill(&BLUE)?;
            Err(DrawingAreaErrorKind::LayoutError)
        })
        .unwrap_err();
        assert!(matches!(err, ComputationError::Render { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn every_chart_has_a_distinct_file() {
        let mut names: Vec<&str> = ChartKind::ALL.iter().map(|k| k.file_name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), ChartKind::ALL.len());
        assert!(names.iter().all(|n| n.ends_with(".svg")));
    }
}
