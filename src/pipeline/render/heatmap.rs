use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use super::{categories, segment_end, segment_label, DrawResult, CAPTION_FONT};
use crate::pipeline::processing::CorrelationMatrix;

/// Diverging blue-white-red scale for r in [-1, 1]
pub fn coolwarm(r: f64) -> RGBColor {
    let t = r.clamp(-1.0, 1.0);
    let (cold, warm) = ((59.0, 76.0, 192.0), (180.0, 4.0, 38.0));
    let white = (242.0, 242.0, 242.0);
    let (from, to, w) = if t < 0.0 { (white, cold, -t) } else { (white, warm, t) };
    let lerp = |a: f64, b: f64| (a + (b - a) * w).round() as u8;
    RGBColor(lerp(from.0, to.0), lerp(from.1, to.1), lerp(from.2, to.2))
}

/// Annotated correlation heatmap, first column at the top-left
pub fn draw_heatmap<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, matrix: &CorrelationMatrix) -> DrawResult<DB> {
    let names: Vec<String> = matrix.columns.iter().map(|c| c.to_string()).collect();
    // Rows are drawn bottom-up
    let reversed: Vec<String> = names.iter().rev().cloned().collect();
    let k = names.len() as u32;

    let mut chart = ChartBuilder::on(area)
        .caption("Correlation Matrix: IoT Sensor Performance Metrics", CAPTION_FONT)
        .margin(15)
        .x_label_area_size(60)
        .y_label_area_size(180)
        .build_cartesian_2d(
            categories(names.len()).into_segmented(),
            categories(names.len()).into_segmented(),
        )?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(names.len())
        .y_labels(names.len())
        .x_label_formatter(&|v| segment_label(v, &names))
        .y_label_formatter(&|v| segment_label(v, &reversed))
        .x_label_style(("sans-serif", 11))
        .y_label_style(("sans-serif", 12))
        .draw()?;

    let cells: Vec<(u32, u32, f64)> = (0..k)
        .flat_map(|i| (0..k).map(move |j| (i, j)))
        .map(|(i, j)| (i, j, matrix.values[i as usize][j as usize]))
        .collect();

    chart.draw_series(cells.iter().map(|&(i, j, r)| {
        let row = k - 1 - i;
        Rectangle::new(
            [
                (SegmentValue::Exact(j), SegmentValue::Exact(row)),
                (segment_end(j, k), segment_end(row, k)),
            ],
            coolwarm(r).filled(),
        )
    }))?;

    let style = TextStyle::from(("sans-serif", 15).into_font()).pos(Pos::new(HPos::Center, VPos::Center));
    chart.draw_series(cells.iter().map(|&(i, j, r)| {
        Text::new(
            format!("{r:.2}"),
            (SegmentValue::CenterOf(j), SegmentValue::CenterOf(k - 1 - i)),
            style.clone(),
        )
    }))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coolwarm_endpoints() {
        assert_eq!(coolwarm(0.0), RGBColor(242, 242, 242));
        assert_eq!(coolwarm(1.0), RGBColor(180, 4, 38));
        assert_eq!(coolwarm(-1.0), RGBColor(59, 76, 192));
        assert_eq!(coolwarm(5.0), coolwarm(1.0));
    }
}
