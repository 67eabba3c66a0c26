use plotters::coord::Shift;
use plotters::prelude::*;
use std::ops::Range;

use super::{categories, padded_range, palette, segment_label, DrawResult, CAPTION_FONT, LABEL_FONT};
use crate::error::ComputationError;
use crate::pipeline::processing::aggregate::values_by_sensor;
use crate::types::{DerivedReading, NumericColumn};

/// One column's values per sensor type, checked to fit the f32 axis
/// plotters' box plots draw on
#[derive(Debug, Clone)]
pub struct BoxSeries {
    pub column: NumericColumn,
    pub names: Vec<String>,
    pub groups: Vec<Vec<f64>>,
    pub range: Range<f32>,
}

impl BoxSeries {
    pub fn new(rows: &[DerivedReading], column: NumericColumn) -> Result<Self, ComputationError> {
        let by_sensor = values_by_sensor(rows, column);
        let range = f32_range(padded_range(by_sensor.values().flatten().copied()), column)?;
        let (names, groups) = by_sensor.into_iter().unzip();
        Ok(Self {
            column,
            names,
            groups,
            range,
        })
    }
}

/// Narrow an axis range to f32. An infinite f32 axis never finishes
/// laying out its mesh, so it is rejected here.
pub(crate) fn f32_range(range: Range<f64>, column: NumericColumn) -> Result<Range<f32>, ComputationError> {
    let unplottable = || ComputationError::Unplottable {
        column: column.to_string(),
    };
    let (lo, hi) = (range.start as f32, range.end as f32);
    if !lo.is_finite() || !hi.is_finite() {
        return Err(unplottable());
    }
    if lo < hi {
        return Ok(lo..hi);
    }
    // Distinct f64 bounds can collapse to one f32
    let pad = lo.abs().max(1.0) * 1e-3;
    let (lo, hi) = (lo - pad, hi + pad);
    if lo.is_finite() && hi.is_finite() && lo < hi {
        Ok(lo..hi)
    } else {
        Err(unplottable())
    }
}

/// Box plot of one column per sensor type
pub fn draw_boxes<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    series: &BoxSeries,
    caption: &str,
    y_desc: &str,
) -> DrawResult<DB> {
    let names = &series.names;

    let mut chart = ChartBuilder::on(area)
        .caption(caption, CAPTION_FONT)
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(70)
        .build_cartesian_2d(categories(names.len()).into_segmented(), series.range.clone())?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(names.len())
        .x_label_formatter(&|v| segment_label(v, names))
        .x_desc("Sensor Type")
        .y_desc(y_desc)
        .axis_desc_style(LABEL_FONT)
        .draw()?;

    chart.draw_series(series.groups.iter().enumerate().map(|(i, values)| {
        let quartiles = Quartiles::new(values);
        Boxplot::new_vertical(SegmentValue::CenterOf(i as u32), &quartiles)
            .width(30)
            .whisker_width(0.5)
            .style(palette(i).stroke_width(2))
    }))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::processing::FeatureDeriver;
    use crate::types::SensorReading;

    fn row(sensor: &str, data: f64, eff: f64) -> DerivedReading {
        FeatureDeriver::new()
            .derive_one(&SensorReading {
                line: 2,
                timestamp: None,
                sensor_id: None,
                sensor_type: sensor.to_string(),
                layer: None,
                data_size_bytes: Some(data),
                energy_consumption: Some(1.0),
                transmission_duration: Some(1.0),
                energy_efficiency_ratio: Some(eff),
                transmission_efficiency_score: None,
            })
            .unwrap()
    }

    #[test]
    fn series_groups_are_sorted_by_sensor_type() {
        let rows = vec![row("ECG", 100.0, 1400.0), row("Accelerometer", 200.0, 1300.0)];
        let series = BoxSeries::new(&rows, NumericColumn::EnergyEfficiencyRatio).unwrap();
        assert_eq!(series.names, vec!["Accelerometer", "ECG"]);
        assert_eq!(series.groups, vec![vec![1300.0], vec![1400.0]]);
        assert!(series.range.start < 1300.0 && series.range.end > 1400.0);
    }

    #[test]
    fn score_beyond_f32_is_unplottable() {
        // 1e20 * 1e20 / 1 passes every exclusion rule in f64
        let rows = vec![row("ECG", 1e20, 1e20), row("ECG", 100.0, 1400.0)];
        assert!(rows[0].performance_score.is_finite());
        assert_eq!(
            BoxSeries::new(&rows, NumericColumn::PerformanceScore).unwrap_err(),
            ComputationError::Unplottable {
                column: "performance_score".to_string()
            }
        );
        assert!(BoxSeries::new(&rows, NumericColumn::EnergyEfficiencyRatio).is_ok());
    }

    #[test]
    fn collapsed_f32_range_is_widened() {
        let range = f32_range(1e10..(1e10 + 1.0), NumericColumn::DataSizeBytes).unwrap();
        assert!(range.start < range.end);
        assert!(f32_range(f64::MAX / 2.0..f64::MAX, NumericColumn::DataSizeBytes).is_err());
    }
}
