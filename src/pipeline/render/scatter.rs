use plotters::coord::Shift;
use plotters::prelude::*;

use super::{padded_range, palette, DrawResult, ANOMALY_COLOR, CAPTION_FONT, LABEL_FONT, NORMAL_COLOR};
use crate::pipeline::processing::aggregate::values_by_sensor;
use crate::pipeline::processing::Detection;
use crate::types::{DerivedReading, NumericColumn};

/// Efficiency vs performance score, anomalies drawn as red crosses
pub fn draw_anomaly_scatter<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    rows: &[DerivedReading],
    detection: &Detection,
) -> DrawResult<DB> {
    let (normal, anomalous): (Vec<(f64, f64)>, Vec<(f64, f64)>) = {
        let mut normal = Vec::new();
        let mut anomalous = Vec::new();
        for (row, label) in rows.iter().zip(&detection.labels) {
            let point = (row.energy_efficiency_ratio, row.performance_score);
            if label.is_anomaly {
                anomalous.push(point);
            } else {
                normal.push(point);
            }
        }
        (normal, anomalous)
    };

    let mut chart = ChartBuilder::on(area)
        .caption("ML-Based Anomaly Detection: Isolation Forest Algorithm", CAPTION_FONT)
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(80)
        .build_cartesian_2d(
            padded_range(rows.iter().map(|r| r.energy_efficiency_ratio)),
            padded_range(rows.iter().map(|r| r.performance_score)),
        )?;

    chart
        .configure_mesh()
        .x_desc("Energy Efficiency Ratio")
        .y_desc("Performance Score")
        .axis_desc_style(LABEL_FONT)
        .draw()?;

    chart
        .draw_series(
            normal
                .iter()
                .map(|&p| Circle::new(p, 4, NORMAL_COLOR.mix(0.6).filled())),
        )?
        .label("Normal")
        .legend(|(x, y)| Circle::new((x, y), 4, NORMAL_COLOR.filled()));

    chart
        .draw_series(
            anomalous
                .iter()
                .map(|&p| Cross::new(p, 6, ANOMALY_COLOR.stroke_width(2))),
        )?
        .label("Anomaly")
        .legend(|(x, y)| Cross::new((x, y), 6, ANOMALY_COLOR.stroke_width(2)));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.85))
        .border_style(BLACK)
        .label_font(LABEL_FONT)
        .draw()?;

    Ok(())
}

/// Energy consumption vs efficiency, one series per sensor type
pub fn draw_energy_vs_efficiency<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    rows: &[DerivedReading],
) -> DrawResult<DB> {
    let energy = values_by_sensor(rows, NumericColumn::EnergyConsumption);
    let efficiency = values_by_sensor(rows, NumericColumn::EnergyEfficiencyRatio);

    let mut chart = ChartBuilder::on(area)
        .caption("Energy Consumption vs Efficiency", CAPTION_FONT)
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(
            padded_range(rows.iter().map(|r| r.energy_consumption)),
            padded_range(rows.iter().map(|r| r.energy_efficiency_ratio)),
        )?;

    chart
        .configure_mesh()
        .x_desc("Energy Consumption")
        .y_desc("Efficiency Ratio")
        .draw()?;

    for (i, (sensor, xs)) in energy.iter().enumerate() {
        let color = palette(i);
        let ys = &efficiency[sensor];
        chart
            .draw_series(
                xs.iter()
                    .zip(ys)
                    .map(move |(&x, &y)| Circle::new((x, y), 3, color.mix(0.6).filled())),
            )?
            .label(sensor.as_str())
            .legend(move |(x, y)| Circle::new((x, y), 4, color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.85))
        .border_style(BLACK)
        .label_font(("sans-serif", 11))
        .draw()?;

    Ok(())
}
