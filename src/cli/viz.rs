//! Terminal visualization using braille graphics
//!
//! Deviation series are drawn on a drawille canvas: line number on the
//! horizontal axis, deviation in mm on the vertical axis, with the zero line
//! and the tolerance band marked.

use drawille::Canvas;

use crate::core::aggregate::SeriesPoint;

/// Default canvas size for series plots (in braille dots)
pub const PLOT_WIDTH: u32 = 120;
pub const PLOT_HEIGHT: u32 = 40;

/// Width of a deviation bar in characters
const BAR_WIDTH: usize = 41;

/// Vertical extent of a plot: at least the tolerance band, at least 1 mm
fn vertical_extent(points: &[SeriesPoint], tolerance: f64) -> f64 {
    let data_max = points
        .iter()
        .map(|p| p.value.abs())
        .fold(0.0_f64, f64::max);
    let band = if tolerance.is_finite() && tolerance > 0.0 {
        tolerance
    } else {
        0.0
    };
    data_max.max(band).max(1.0) * 1.1
}

/// Render a deviation series as a braille line chart
///
/// # Example Output
/// ```text
/// ⠀⠀⠀⠀⠀⠀⡠⠊⠢⡀⠀⠀⠀⠀
/// ⠤⠤⠤⠤⠤⠔⠤⠤⠤⠬⠢⠤⠤⠤
/// ⠀⠀⠀⠀⠀⠀⠀⠀⠀⠀⠀⠑⠤⠊
///   A1 .. A12   range ±11.0 mm
/// ```
pub fn render_series_plot(points: &[SeriesPoint], prefix: char, tolerance: f64, width: u32, height: u32) -> String {
    if points.is_empty() {
        return "  (no data)".to_string();
    }

    let width = width.max(8);
    let height = height.max(8);
    let mut canvas = Canvas::new(width, height);

    let extent = vertical_extent(points, tolerance);
    let first = points[0].index as f64;
    let last = points[points.len() - 1].index as f64;
    let span = (last - first).max(1.0);
    let max_x = (width - 1) as f64;
    let max_y = (height - 1) as f64;

    let to_x = |index: u32| ((index as f64 - first) / span * max_x).round();
    let to_y = |value: f64| ((extent - value) / (2.0 * extent) * max_y).round().clamp(0.0, max_y);

    // Zero line, solid
    let zero = to_y(0.0) as u32;
    for x in 0..width {
        canvas.set(x, zero);
    }

    // Tolerance band, dotted
    if tolerance.is_finite() && tolerance > 0.0 {
        for bound in [tolerance, -tolerance] {
            let y = to_y(bound) as u32;
            for x in (0..width).step_by(4) {
                canvas.set(x, y);
            }
        }
    }

    // Data, joined point to point
    let mut previous: Option<(f64, f64)> = None;
    for point in points {
        let (x, y) = (to_x(point.index), to_y(point.value));
        if let Some((px, py)) = previous {
            let steps = (x - px).abs().max((y - py).abs()).max(1.0) as u32;
            for s in 0..=steps {
                let t = s as f64 / steps as f64;
                canvas.set((px + (x - px) * t) as u32, (py + (y - py) * t) as u32);
            }
        } else {
            canvas.set(x as u32, y as u32);
        }
        previous = Some((x, y));
    }

    let mut output = canvas.frame();
    output.push_str(&format!(
        "\n  {}{} .. {}{}   range ±{:.1} mm",
        prefix, points[0].index, prefix, points[points.len() - 1].index, extent
    ));
    if tolerance.is_finite() && tolerance > 0.0 {
        output.push_str(&format!("   tolerance ±{:.1} mm", tolerance));
    }
    output
}

/// Render one deviation on a horizontal bar centered on zero
///
/// The bar spans twice the tolerance (or 10 mm without one); `│` marks the
/// tolerance limits and `●` the value, clamped to the bar ends.
pub fn render_deviation_bar(value: f64, tolerance: f64) -> String {
    let limit = if tolerance.is_finite() && tolerance > 0.0 {
        tolerance
    } else {
        5.0
    };
    let view = limit * 2.0;
    let center = BAR_WIDTH / 2;
    let to_pos = |v: f64| {
        let pos = center as f64 + v / view * center as f64;
        pos.round().clamp(0.0, (BAR_WIDTH - 1) as f64) as usize
    };

    let mut bar: Vec<char> = vec!['─'; BAR_WIDTH];
    bar[center] = '┼';
    bar[to_pos(-limit)] = '│';
    bar[to_pos(limit)] = '│';
    if value.is_finite() {
        bar[to_pos(value)] = '●';
    }
    bar.into_iter().collect()
}
