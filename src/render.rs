//! Plain-text chart and gauges for the terminal.

use std::fmt::Write;

use crate::display::{gauge_fraction, project, Axis, GaugeZone, ACCEL_MAX, ACCEL_MIN};
use crate::store::Sample;

const RESET: &str = "\x1b[0m";
const GAUGE_WIDTH: usize = 41;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub color: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { color: true }
    }
}

/// Status line for the latest sample, e.g. `DayTime: 12:00:01.500  x_axis: 12 ...`.
pub fn status_line(sample: &Sample) -> String {
    format!(
        "DayTime: {}  x_axis: {}  y_axis: {}  z_axis: {}",
        sample.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
        sample.x,
        sample.y,
        sample.z
    )
}

/// One row per sample in `window`, one column per selected axis.
pub fn chart(window: &[Sample], axes: &[Axis], opts: RenderOptions) -> String {
    let series = project(window, axes);
    let mut out = String::new();

    let _ = write!(out, "{:<12}", "time");
    for s in &series {
        out.push_str(&paint(s.axis.name(), s.axis.color().ansi(), opts, 8));
    }
    out.push('\n');

    for (row, sample) in window.iter().enumerate() {
        let _ = write!(out, "{:<12}", sample.timestamp.format("%H:%M:%S%.3f"));
        for s in &series {
            let value = s.points[row].1.to_string();
            out.push_str(&paint(&value, s.axis.color().ansi(), opts, 8));
        }
        out.push('\n');
    }
    out
}

/// Three horizontal gauges scaled to `[ACCEL_MIN, ACCEL_MAX]`.
pub fn gauges(sample: &Sample, opts: RenderOptions) -> String {
    let mut out = String::new();
    for axis in Axis::ALL {
        let value = axis.value(sample);
        let zone = GaugeZone::of(value);
        let needle = (gauge_fraction(value) * (GAUGE_WIDTH - 1) as f64).round() as usize;
        let bar: String = (0..GAUGE_WIDTH)
            .map(|i| if i == needle { '|' } else { '-' })
            .collect();
        let _ = writeln!(
            out,
            "{:<7} {:>6} [{}] {}..{}",
            axis.gauge_label(),
            value,
            paint(&bar, zone.color().ansi(), opts, 0),
            ACCEL_MIN,
            ACCEL_MAX
        );
    }
    out
}

fn paint(text: &str, ansi: &str, opts: RenderOptions, width: usize) -> String {
    if opts.color {
        format!("{ansi}{text:>width$}{RESET}")
    } else {
        format!("{text:>width$}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::Axes;
    use chrono::{Local, TimeZone};

    const PLAIN: RenderOptions = RenderOptions { color: false };

    fn sample(secs: i64, x: i32, y: i32, z: i32) -> Sample {
        Sample::new(
            Local.timestamp_opt(1_700_000_000 + secs, 0).unwrap(),
            Axes::new(x, y, z),
        )
    }

    #[test]
    fn chart_has_header_and_one_row_per_sample() {
        let window = vec![sample(0, 1, 2, 3), sample(1, -4, 5, -6)];
        let text = chart(&window, &[Axis::X, Axis::Z], PLAIN);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains('x') && lines[0].contains('z'));
        assert!(!lines[0].contains('y'));
        assert!(lines[2].trim_end().ends_with("-6"));
        assert!(lines[2].contains("-4"));
    }

    #[test]
    fn gauges_place_needle_by_value() {
        let text = gauges(&sample(0, ACCEL_MIN, 0, ACCEL_MAX), PLAIN);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("X AXIS"));
        assert!(lines[0].contains("[|---"));
        assert!(lines[2].contains("---|]"));
        let mid = lines[1].find('|').unwrap() - lines[1].find('[').unwrap() - 1;
        assert_eq!(mid, GAUGE_WIDTH / 2);
    }

    #[test]
    fn color_wraps_text_in_escapes() {
        let text = gauges(&sample(0, 2000, 0, 0), RenderOptions::default());
        assert!(text.contains("\x1b[31m"));
        assert!(text.contains(RESET));
    }

    #[test]
    fn status_line_lists_all_axes() {
        let line = status_line(&sample(0, 100, -50, 30));
        assert!(line.ends_with("x_axis: 100  y_axis: -50  z_axis: 30"));
    }
}
