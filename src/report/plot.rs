//! ASCII line charts for case trends
//!
//! The series is resampled to the requested width, scaled to the requested height
//! and drawn with box characters next to a labelled y axis. The caption is centered
//! below the chart.

/// Render `series` as a chart `width` columns wide and `height + 1` rows tall
///
/// An empty series renders the caption only.
pub fn plot(series: &[f64], width: usize, height: usize, caption: &str) -> String {
    let points = resample(series, width.max(1));
    let Some((min, max)) = bounds(&points) else {
        return caption.to_string();
    };

    let span = max - min;
    let height = height.max(1);
    let level = |value: f64| -> usize {
        if span == 0.0 {
            0
        } else {
            ((value - min) / span * height as f64).round() as usize
        }
    };
    let levels: Vec<usize> = points.iter().map(|v| level(*v)).collect();

    // Row 0 is the top of the chart
    let row = |level: usize| height - level.min(height);
    let mut grid = vec![vec![' '; points.len()]; height + 1];
    for (x, pair) in levels.windows(2).enumerate() {
        let (from, to) = (pair[0], pair[1]);
        match from.cmp(&to) {
            std::cmp::Ordering::Equal => grid[row(from)][x] = '─',
            std::cmp::Ordering::Greater => {
                grid[row(to)][x] = '╰';
                grid[row(from)][x] = '╮';
                for level in to + 1..from {
                    grid[row(level)][x] = '│';
                }
            }
            std::cmp::Ordering::Less => {
                grid[row(to)][x] = '╭';
                grid[row(from)][x] = '╯';
                for level in from + 1..to {
                    grid[row(level)][x] = '│';
                }
            }
        }
    }

    let labels: Vec<String> = (0..=height)
        .map(|r| {
            let value = max - span * r as f64 / height as f64;
            format!("{:.0}", value)
        })
        .collect();
    let label_width = labels.iter().map(String::len).max().unwrap_or(0);
    let start_row = row(levels[0]);

    let mut out = String::new();
    for (r, cells) in grid.iter().enumerate() {
        let axis = if r == start_row { '┼' } else { '┤' };
        let line: String = cells.iter().collect();
        out.push_str(&format!(
            "{:>width$} {}{}",
            labels[r],
            axis,
            line.trim_end(),
            width = label_width
        ));
        out.push('\n');
    }

    if !caption.is_empty() {
        let offset = label_width + 2;
        let indent = offset + points.len().saturating_sub(caption.chars().count()) / 2;
        out.push('\n');
        out.push_str(&" ".repeat(indent));
        out.push_str(caption);
    } else if out.ends_with('\n') {
        out.pop();
    }
    out
}

/// Linear interpolation of `series` onto `width` evenly spaced points
fn resample(series: &[f64], width: usize) -> Vec<f64> {
    match series.len() {
        0 => Vec::new(),
        1 => vec![series[0]; width],
        len if len == width => series.to_vec(),
        len => {
            if width == 1 {
                return vec![series[len - 1]];
            }
            let step = (len - 1) as f64 / (width - 1) as f64;
            (0..width)
                .map(|i| {
                    let pos = i as f64 * step;
                    let lower = pos.floor() as usize;
                    let upper = (lower + 1).min(len - 1);
                    let fraction = pos - lower as f64;
                    series[lower] + (series[upper] - series[lower]) * fraction
                })
                .collect()
        }
    }
}

fn bounds(points: &[f64]) -> Option<(f64, f64)> {
    let first = *points.first()?;
    Some(
        points
            .iter()
            .fold((first, first), |(lo, hi), v| (lo.min(*v), hi.max(*v))),
    )
}
