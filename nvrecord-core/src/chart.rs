//! PNG time-series charts for recorded utilization columns.

use std::path::Path;

use chrono::{Duration, NaiveDateTime};
use once_cell::sync::Lazy;
use plotters::coord::types::RangedDateTime;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{register_font, FontStyle};
use tracing::debug;

use crate::error::{MonitorError, Result};

const IMAGE_WIDTH: u32 = 1920;
const IMAGE_HEIGHT: u32 = 1440;

/// Only the first and last x ticks are labelled; millisecond precision keeps
/// short recordings readable.
const TICK_FORMAT: &str = "%H:%M:%S%.3f";

// Text rendering is pure Rust, with the face embedded so charts come out
// identical on hosts without any system fonts installed.
static EMBEDDED_FONT: &[u8] = include_bytes!("../fonts/DejaVuSans.ttf");

static FONT_REGISTRATION: Lazy<std::result::Result<(), String>> = Lazy::new(|| {
    register_font("sans-serif", FontStyle::Normal, EMBEDDED_FONT)
        .map_err(|_| "embedded font was rejected by the text backend".to_string())
});

fn ensure_font() -> Result<()> {
    FONT_REGISTRATION
        .as_ref()
        .map_err(|e| MonitorError::Render(e.clone()))?;
    Ok(())
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Render one column as a line chart with a dashed mean reference line.
///
/// The samples are assumed evenly spaced between `start` and `end`; only
/// those two endpoints carry an x tick label. Needs at least two points,
/// otherwise there is no span to draw.
pub fn render_time_series(
    values: &[f64],
    path: &Path,
    title: &str,
    x_desc: &str,
    y_desc: &str,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Result<()> {
    if values.len() < 2 {
        return Err(MonitorError::TooFewPoints(values.len()));
    }
    ensure_font()?;
    draw_chart(values, path, title, x_desc, y_desc, start, end)
        .map_err(|e| MonitorError::Render(e.to_string()))?;

    debug!("rendered {} points to {}", values.len(), path.display());
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn draw_chart(
    values: &[f64],
    path: &Path,
    title: &str,
    x_desc: &str,
    y_desc: &str,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    // A zero-width (or reversed) time span has no usable axis mapping;
    // widen it to a millisecond instead of failing the whole render.
    let end = if end > start {
        end
    } else {
        start + Duration::milliseconds(1)
    };

    let step = (end - start) / (values.len() as i32 - 1);
    let points = (0..values.len()).map(|i| (start + step * i as i32, values[i]));

    let average = mean(values);
    let low = values.iter().copied().fold(average, f64::min);
    let high = values.iter().copied().fold(average, f64::max);
    let pad = ((high - low) * 0.05).max(1.0);
    let (y_min, y_max) = (low - pad, high + pad);

    let root = BitMapBackend::new(path, (IMAGE_WIDTH, IMAGE_HEIGHT)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 40))
        .margin(30)
        .x_label_area_size(70)
        .y_label_area_size(90)
        // `Range<NaiveDateTime>` alone is not a ranged coordinate; it has
        // to go through the `RangedDateTime` wrapper.
        .build_cartesian_2d(RangedDateTime::from(start..end), y_min..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .x_desc(x_desc)
        .y_desc(y_desc)
        .axis_desc_style(("sans-serif", 26))
        .label_style(("sans-serif", 20))
        // Endpoint labels are drawn by hand below.
        .x_label_formatter(&|_| String::new())
        .draw()?;

    chart
        .draw_series(LineSeries::new(points, BLUE.stroke_width(1)))?
        .label("Data")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE.stroke_width(1)));

    chart
        .draw_series(DashedLineSeries::new(
            [(start, average), (end, average)],
            10,
            6,
            RED.stroke_width(1),
        ))?
        .label(format!("Average ({:.2})", average))
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED.stroke_width(1)));

    let tick_style = ("sans-serif", 20).into_font().color(&BLACK);
    chart.draw_series(std::iter::once(Text::new(
        start.format(TICK_FORMAT).to_string(),
        (start, y_min),
        tick_style.clone().pos(Pos::new(HPos::Left, VPos::Bottom)),
    )))?;
    chart.draw_series(std::iter::once(Text::new(
        end.format(TICK_FORMAT).to_string(),
        (end, y_min),
        tick_style.pos(Pos::new(HPos::Right, VPos::Bottom)),
    )))?;

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .label_font(("sans-serif", 22))
        .draw()?;

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn ts(seconds: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(9, 30, seconds)
            .unwrap()
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[10.0, 20.0]), 15.0);
        assert_eq!(mean(&[5.0]), 5.0);
    }

    #[test]
    fn test_too_few_points_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("chart.png");

        let err =
            render_time_series(&[42.0], &path, "t", "Time", "%", ts(0), ts(1)).unwrap_err();
        assert!(matches!(err, MonitorError::TooFewPoints(1)));
        assert!(!path.exists());
    }

    #[test]
    fn test_renders_two_point_series_as_png() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("chart.png");

        render_time_series(&[10.0, 20.0], &path, "util", "Time", "%", ts(0), ts(10)).unwrap();
        // The output must be an actual PNG, not just a non-empty file.
        let written = std::fs::read(&path).unwrap();
        assert!(written.starts_with(b"\x89PNG\r\n\x1a\n"));
    }

    #[test]
    fn test_renders_constant_series() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("flat.png");

        // Constant values and a zero-width time span both need widening.
        render_time_series(&[0.0, 0.0, 0.0], &path, "idle", "Time", "%", ts(5), ts(5))
            .unwrap();
        assert!(path.exists());
    }
}
