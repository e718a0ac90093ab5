//! Runtime configuration.
//!
//! Values come from, in increasing priority: built-in defaults, an optional
//! TOML file, and command line flags (applied by the binary).
//!
//! ```toml
//! port = "/dev/ttyACM0"
//! baud_rate = 115200
//! read_timeout_ms = 1000
//! tick_interval_ms = 500
//! window = 10
//! retention = 3600
//! stale_after = 20
//! axes = ["x", "z"]
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::display::{Axis, DEFAULT_WINDOW};
use crate::errors::ConfigError;
use crate::serial::{BAUD_RATE, DEFAULT_MAX_LINE};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Device path, e.g. `/dev/ttyACM0` or `COM3`.
    pub port: Option<String>,
    pub baud_rate: u32,
    pub read_timeout_ms: u64,
    pub tick_interval_ms: u64,
    /// Samples drawn on the chart.
    pub window: usize,
    /// Samples kept in memory. Unbounded when absent.
    pub retention: Option<usize>,
    /// Consecutive repeated ticks before a staleness warning. Disabled when absent.
    pub stale_after: Option<u32>,
    pub max_line: usize,
    pub axes: Vec<Axis>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: BAUD_RATE,
            read_timeout_ms: 1000,
            tick_interval_ms: 500,
            window: DEFAULT_WINDOW,
            retention: None,
            stale_after: None,
            max_line: DEFAULT_MAX_LINE,
            axes: Axis::ALL.to_vec(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Reject values the pipeline cannot run with.
    ///
    /// A read timeout longer than the tick interval is accepted with a
    /// warning: ticks then run late but never pile up.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        if self.baud_rate == 0 {
            return invalid("baud_rate must be positive");
        }
        if self.read_timeout_ms == 0 {
            return invalid("read_timeout_ms must be positive");
        }
        if self.tick_interval_ms == 0 {
            return invalid("tick_interval_ms must be positive");
        }
        if self.window == 0 {
            return invalid("window must hold at least one sample");
        }
        if self.retention == Some(0) {
            return invalid("retention must hold at least one sample");
        }
        if self.max_line == 0 {
            return invalid("max_line must be positive");
        }
        if self.port.as_deref().is_some_and(|p| p.trim().is_empty()) {
            return invalid("port must not be empty");
        }

        if self.read_timeout_ms > self.tick_interval_ms {
            warn!(
                "read_timeout_ms ({}) exceeds tick_interval_ms ({}); ticks may run late while the device is silent",
                self.read_timeout_ms, self.tick_interval_ms
            );
        }
        if let Some(retention) = self.retention {
            if retention < self.window {
                warn!(
                    "retention ({}) is smaller than the chart window ({}); the chart will never fill",
                    retention, self.window
                );
            }
        }
        Ok(())
    }
}
