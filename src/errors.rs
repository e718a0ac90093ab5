use std::io;
use std::path::PathBuf;
use std::str::Utf8Error;
use std::time::Duration;

use thiserror::Error;

/// Failures raised by a [`FrameSource`](crate::serial::FrameSource) while reading one line.
#[derive(Debug, Error)]
pub enum SourceError {
    /// No line terminator arrived before the deadline. Expected between transmissions.
    #[error("timeout: no frame terminator within {0:?}")]
    Timeout(Duration),
    /// The device reported end-of-stream or a read fault.
    #[error("device error: {0}")]
    Device(#[from] io::Error),
    #[error("serial error: {0}")]
    Open(#[from] serialport::Error),
}

impl SourceError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, SourceError::Timeout(_))
    }
}

/// Reasons a raw line could not be turned into an `(x, y, z)` triple.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("frame is not valid UTF-8: {0}")]
    Encoding(#[from] Utf8Error),
    #[error("expected at least 3 fields, found {found}")]
    FieldCount { found: usize },
    #[error("field {index} is not an integer: {field:?}")]
    Parse { index: usize, field: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("retention bound must hold at least the seed sample")]
    ZeroRetention,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, SourceError>;
