use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use super::{categories, palette, segment_end, segment_label, DrawResult, CAPTION_FONT, LABEL_FONT};

pub enum BarFill {
    /// One palette color per category
    Palette,
    Single(RGBColor),
}

pub struct BarSeries<'a> {
    pub caption: &'a str,
    pub y_desc: &'a str,
    pub labels: &'a [String],
    pub values: &'a [f64],
    pub fill: BarFill,
    /// Print each value above its bar
    pub annotate: bool,
}

/// Vertical bar chart over categorical labels
pub fn draw_bars<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, bars: &BarSeries<'_>) -> DrawResult<DB> {
    let n = bars.labels.len() as u32;
    let top = bars.values.iter().cloned().fold(0.0, f64::max);
    let y_max = if top > 0.0 { top * 1.15 } else { 1.0 };

    let mut chart = ChartBuilder::on(area)
        .caption(bars.caption, CAPTION_FONT)
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(70)
        .build_cartesian_2d(categories(bars.labels.len()).into_segmented(), 0f64..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(bars.labels.len())
        .x_label_formatter(&|v| segment_label(v, bars.labels))
        .x_desc("Sensor Type")
        .y_desc(bars.y_desc)
        .axis_desc_style(LABEL_FONT)
        .draw()?;

    chart.draw_series(bars.values.iter().enumerate().map(|(i, v)| {
        let color = match bars.fill {
            BarFill::Palette => palette(i),
            BarFill::Single(c) => c,
        };
        let i = i as u32;
        let mut bar = Rectangle::new(
            [(SegmentValue::Exact(i), 0.0), (segment_end(i, n), *v)],
            color.filled(),
        );
        bar.set_margin(0, 0, 12, 12);
        bar
    }))?;

    if bars.annotate {
        let style = TextStyle::from(LABEL_FONT.into_font()).pos(Pos::new(HPos::Center, VPos::Bottom));
        chart.draw_series(bars.values.iter().enumerate().map(|(i, v)| {
            Text::new(format!("{v:.2}"), (SegmentValue::CenterOf(i as u32), *v), style.clone())
        }))?;
    }

    Ok(())
}
