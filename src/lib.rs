//! Live 3-axis accelerometer acquisition over a serial line.
//!
//! The board prints one `x,y,z` line per reading. This crate reads those lines,
//! keeps a recent history in memory and serves it to chart and gauge renderers.
//!
//! # Pipeline
//!
//! ```text
//! device bytes -> SerialSource -> decode -> AcquisitionLoop -> StoreWriter
//!                                                                 |
//!                          renderers <- SampleStore::{latest, recent_window}
//! ```
//!
//! Each tick of the acquisition loop appends exactly one [`Sample`]. A tick
//! whose read times out, faults, or yields an undecodable line repeats the
//! previous values with the new timestamp, so the series never has gaps and a
//! disconnected device shows up as frozen values.
//!
//! # Example
//! ```ignore
//! let source = SerialSource::open("/dev/ttyACM0", BAUD_RATE)?;
//! let (writer, store) = SampleStore::with_zero_seed();
//! let handle = AcquisitionLoop::new(source, writer, DEFAULT_READ_TIMEOUT)
//!     .spawn(DEFAULT_TICK_INTERVAL)?;
//!
//! println!("{:?}", store.latest());
//! let chart = store.recent_window(10);
//! handle.stop();
//! ```

pub mod acquisition;
pub mod config;
pub mod decoder;
pub mod display;
mod errors;
pub mod logging;
pub mod render;
pub mod serial;
pub mod store;

pub use acquisition::{
    AcquisitionHandle, AcquisitionLoop, AcquisitionStats, FallbackReason, TickOutcome,
    DEFAULT_TICK_INTERVAL,
};
pub use config::Config;
pub use decoder::{decode, Axes, DecodedFrame};
pub use display::{Axis, GaugeZone, ACCEL_MAX, ACCEL_MIN};
pub use errors::*;
pub use serial::{list_ports, FrameSource, SerialSource, BAUD_RATE, DEFAULT_READ_TIMEOUT};
pub use store::{Sample, SampleStore, StoreWriter, Timestamp};
