//! Display attributes shared by the chart and gauge renderers.
//!
//! Nothing here touches the store or the device. Renderers pull a window from
//! [`SampleStore`](crate::store::SampleStore) and use these helpers to pick
//! series, colours and gauge zones.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::store::{Sample, Timestamp};

/// Upper end of the gauge scale in raw counts.
pub const ACCEL_MAX: i32 = 2100;
/// Lower end of the gauge scale in raw counts.
pub const ACCEL_MIN: i32 = -2100;

/// Default number of samples drawn on the chart.
pub const DEFAULT_WINDOW: usize = 10;

/// One accelerometer axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Series name on the chart.
    pub fn name(self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        }
    }

    pub fn gauge_label(self) -> &'static str {
        match self {
            Axis::X => "X AXIS",
            Axis::Y => "Y AXIS",
            Axis::Z => "Z AXIS",
        }
    }

    pub fn color(self) -> Color {
        match self {
            Axis::X => Color::Red,
            Axis::Y => Color::Green,
            Axis::Z => Color::Blue,
        }
    }

    #[inline]
    pub fn value(self, sample: &Sample) -> i32 {
        match self {
            Axis::X => sample.x,
            Axis::Y => sample.y,
            Axis::Z => sample.z,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Axis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "x" => Ok(Axis::X),
            "y" => Ok(Axis::Y),
            "z" => Ok(Axis::Z),
            other => Err(format!("unknown axis {other:?} (expected x, y or z)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Green,
    Blue,
    Yellow,
}

impl Color {
    /// ANSI foreground escape for terminal output.
    pub fn ansi(self) -> &'static str {
        match self {
            Color::Red => "\x1b[31m",
            Color::Green => "\x1b[32m",
            Color::Yellow => "\x1b[33m",
            Color::Blue => "\x1b[34m",
        }
    }
}

/// Colour band of a gauge.
///
/// Bands split the scale at 10 %, 50 % and 90 % of [`ACCEL_MAX`]; everything
/// below 10 % (including the whole negative half) is blue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GaugeZone {
    Blue,
    Green,
    Yellow,
    Red,
}

impl GaugeZone {
    pub const ALL: [GaugeZone; 4] = [
        GaugeZone::Blue,
        GaugeZone::Green,
        GaugeZone::Yellow,
        GaugeZone::Red,
    ];

    /// Half-open `[start, end)` range of the band; the red band includes [`ACCEL_MAX`].
    pub fn range(self) -> (i32, i32) {
        match self {
            GaugeZone::Blue => (ACCEL_MIN, ACCEL_MAX / 10),
            GaugeZone::Green => (ACCEL_MAX / 10, ACCEL_MAX / 2),
            GaugeZone::Yellow => (ACCEL_MAX / 2, ACCEL_MAX * 9 / 10),
            GaugeZone::Red => (ACCEL_MAX * 9 / 10, ACCEL_MAX),
        }
    }

    /// Band for `value`; out-of-scale values land in the nearest end band.
    pub fn of(value: i32) -> GaugeZone {
        let v = clamp_to_gauge(value);
        GaugeZone::ALL
            .into_iter()
            .find(|zone| {
                let (start, end) = zone.range();
                v >= start && v < end
            })
            .unwrap_or(GaugeZone::Red)
    }

    pub fn color(self) -> Color {
        match self {
            GaugeZone::Blue => Color::Blue,
            GaugeZone::Green => Color::Green,
            GaugeZone::Yellow => Color::Yellow,
            GaugeZone::Red => Color::Red,
        }
    }
}

#[inline]
pub fn clamp_to_gauge(value: i32) -> i32 {
    value.clamp(ACCEL_MIN, ACCEL_MAX)
}

/// Needle position of `value` on the gauge, `0.0` at [`ACCEL_MIN`] and `1.0` at [`ACCEL_MAX`].
pub fn gauge_fraction(value: i32) -> f64 {
    let span = f64::from(ACCEL_MAX - ACCEL_MIN);
    f64::from(clamp_to_gauge(value) - ACCEL_MIN) / span
}

/// One chart trace.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub axis: Axis,
    pub points: Vec<(Timestamp, i32)>,
}

/// Build one series per requested axis, in the order given.
pub fn project(window: &[Sample], axes: &[Axis]) -> Vec<Series> {
    axes.iter()
        .map(|&axis| Series {
            axis,
            points: window
                .iter()
                .map(|s| (s.timestamp, axis.value(s)))
                .collect(),
        })
        .collect()
}
