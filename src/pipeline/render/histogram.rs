use plotters::coord::Shift;
use plotters::prelude::*;

use super::{padded_range, DrawResult, ANOMALY_COLOR, CAPTION_FONT, HISTOGRAM_COLOR, LABEL_FONT};
use crate::pipeline::processing::Detection;

const BINS: usize = 50;

/// Equal-width bin counts over `range`; the last bin is closed on the right
pub fn bin_counts(values: &[f64], lo: f64, hi: f64, bins: usize) -> Vec<usize> {
    let mut counts = vec![0; bins.max(1)];
    let width = (hi - lo) / counts.len() as f64;
    for &v in values {
        if !v.is_finite() || v < lo || v > hi {
            continue;
        }
        let idx = if width > 0.0 {
            (((v - lo) / width) as usize).min(counts.len() - 1)
        } else {
            0
        };
        counts[idx] += 1;
    }
    counts
}

/// Distribution of anomaly scores with the labelling threshold marked
pub fn draw_score_histogram<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, detection: &Detection) -> DrawResult<DB> {
    let scores: Vec<f64> = detection.labels.iter().map(|l| l.score).collect();
    let range = padded_range(scores.iter().copied());
    let counts = bin_counts(&scores, range.start, range.end, BINS);
    let width = (range.end - range.start) / BINS as f64;
    let y_max = counts.iter().copied().max().unwrap_or(0).max(1) as f64 * 1.1;

    let mut chart = ChartBuilder::on(area)
        .caption("Distribution of Anomaly Scores", CAPTION_FONT)
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(60)
        .build_cartesian_2d(range.clone(), 0f64..y_max)?;

    chart
        .configure_mesh()
        .x_desc("Anomaly Score")
        .y_desc("Frequency")
        .axis_desc_style(LABEL_FONT)
        .draw()?;

    chart.draw_series(counts.iter().enumerate().filter(|(_, c)| **c > 0).map(|(i, &c)| {
        let x0 = range.start + width * i as f64;
        let mut bar = Rectangle::new([(x0, 0.0), (x0 + width, c as f64)], HISTOGRAM_COLOR.mix(0.8).filled());
        bar.set_margin(0, 0, 1, 1);
        bar
    }))?;

    if let Some(threshold) = detection.threshold() {
        chart
            .draw_series(LineSeries::new(
                vec![(threshold, 0.0), (threshold, y_max)],
                ANOMALY_COLOR.stroke_width(2),
            ))?
            .label("Anomaly Threshold")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], ANOMALY_COLOR.stroke_width(2)));

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.85))
            .border_style(BLACK)
            .label_font(LABEL_FONT)
            .draw()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bins_cover_every_value_in_range() {
        let values = [0.0, 0.05, 0.5, 0.99, 1.0, 2.0];
        let counts = bin_counts(&values, 0.0, 1.0, 10);
        assert_eq!(counts.len(), 10);
        assert_eq!(counts.iter().sum::<usize>(), 5);
        assert_eq!(counts[0], 2);
        assert_eq!(counts[9], 2);
    }

    #[test]
    fn degenerate_range_uses_one_bin() {
        let counts = bin_counts(&[0.3, 0.3], 0.3, 0.3, 4);
        assert_eq!(counts, vec![2, 0, 0, 0]);
    }
}
