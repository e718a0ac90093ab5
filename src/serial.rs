//! Serial line reader for the accelerometer board.
//!
//! The board prints one `x,y,z` line roughly every 20 ms at 115200 baud. The
//! port itself is opened with a short read timeout ([`POLL_INTERVAL`]) and
//! [`SerialSource::read_frame`] keeps polling until the caller's deadline, so
//! a single call blocks for at most the requested timeout plus one poll.
//!
//! Bytes that arrive after a line terminator stay buffered for the next call,
//! as does a partial line left over when the deadline expires.

use std::io::{self, ErrorKind, Read};
use std::time::{Duration, Instant};

use log::{debug, trace, warn};

use crate::errors::{Result, SourceError};

// ============================================================================
// Constants
// ============================================================================

/// Default serial baud rate for the accelerometer board
pub const BAUD_RATE: u32 = 115200;

/// Default per-frame read timeout
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(1);

/// Read timeout configured on the port itself
pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Longest pending line kept without a terminator
pub const DEFAULT_MAX_LINE: usize = 256;

const READ_CHUNK: usize = 128;

// ============================================================================
// Transport Abstraction
// ============================================================================

/// Anything that yields newline-terminated frames.
///
/// Implemented by [`SerialSource`]; the acquisition loop is generic over it.
pub trait FrameSource: Send {
    /// Block until one full line arrives (terminator excluded) or `timeout` elapses.
    fn read_frame(&mut self, timeout: Duration) -> Result<Vec<u8>>;
}

/// Trait for Read + Send, allowing different transport backends.
pub trait Transport: Read + Send {}
impl<T: Read + Send> Transport for T {}

/// Description of a serial port found on the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    pub name: String,
    pub kind: String,
}

/// Enumerate serial ports available on this machine.
pub fn list_ports() -> Result<Vec<PortInfo>> {
    let ports = serialport::available_ports()?;
    Ok(ports
        .into_iter()
        .map(|p| {
            let kind = match p.port_type {
                serialport::SerialPortType::UsbPort(usb) => {
                    let product = usb.product.unwrap_or_default();
                    format!("usb {:04x}:{:04x} {}", usb.vid, usb.pid, product)
                        .trim_end()
                        .to_string()
                }
                serialport::SerialPortType::BluetoothPort => "bluetooth".to_string(),
                serialport::SerialPortType::PciPort => "pci".to_string(),
                serialport::SerialPortType::Unknown => "unknown".to_string(),
            };
            PortInfo {
                name: p.port_name,
                kind,
            }
        })
        .collect())
}

// ============================================================================
// Serial Source
// ============================================================================

/// Exclusive owner of the device handle.
///
/// # Example
/// ```ignore
/// let mut source = SerialSource::open("/dev/ttyACM0", BAUD_RATE)?;
/// let line = source.read_frame(DEFAULT_READ_TIMEOUT)?;
/// println!("{}", String::from_utf8_lossy(&line));
/// ```
pub struct SerialSource {
    transport: Box<dyn Transport>,
    pending: Vec<u8>,
    max_line: usize,
    label: String,
}

impl SerialSource {
    /// Open a serial port (e.g. `/dev/ttyACM0`, `/dev/cu.usbmodem14202`, `COM3`).
    pub fn open(path: &str, baud_rate: u32) -> Result<Self> {
        let port = serialport::new(path, baud_rate)
            .timeout(POLL_INTERVAL)
            .open()?;
        debug!("Opened serial port {} at {} baud", path, baud_rate);
        Ok(Self::from_transport(port, path))
    }

    /// Wrap an already opened byte stream.
    pub fn from_transport<T: Transport + 'static>(transport: T, label: &str) -> Self {
        Self {
            transport: Box::new(transport),
            pending: Vec::with_capacity(DEFAULT_MAX_LINE),
            max_line: DEFAULT_MAX_LINE,
            label: label.to_string(),
        }
    }

    pub fn with_max_line(mut self, max_line: usize) -> Self {
        self.max_line = max_line.max(1);
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Bytes buffered but not yet returned as a line.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Split the first complete line off the pending buffer.
    fn take_line(&mut self) -> Option<Vec<u8>> {
        let pos = self.pending.iter().position(|&b| b == b'\n')?;
        let mut line: Vec<u8> = self.pending.drain(..=pos).collect();
        line.pop();
        Some(line)
    }

    fn guard_overflow(&mut self) {
        if self.pending.len() > self.max_line && !self.pending.contains(&b'\n') {
            warn!(
                "{}: dropping {} bytes without a line terminator (max {})",
                self.label,
                self.pending.len(),
                self.max_line
            );
            self.pending.clear();
        }
    }
}

impl FrameSource for SerialSource {
    fn read_frame(&mut self, timeout: Duration) -> Result<Vec<u8>> {
        if let Some(line) = self.take_line() {
            return Ok(line);
        }

        let deadline = Instant::now() + timeout;
        let mut chunk = [0u8; READ_CHUNK];

        loop {
            match self.transport.read(&mut chunk) {
                Ok(0) => {
                    return Err(SourceError::Device(io::Error::new(
                        ErrorKind::UnexpectedEof,
                        format!("{}: device closed the stream", self.label),
                    )));
                }
                Ok(n) => {
                    trace!("{}: read {} bytes", self.label, n);
                    self.pending.extend_from_slice(&chunk[..n]);
                    if let Some(line) = self.take_line() {
                        return Ok(line);
                    }
                    self.guard_overflow();
                }
                Err(e)
                    if matches!(
                        e.kind(),
                        ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
                    ) =>
                {
                    // Poll slice elapsed, fall through to the deadline check
                }
                Err(e) => return Err(SourceError::Device(e)),
            }

            if Instant::now() >= deadline {
                return Err(SourceError::Timeout(timeout));
            }
        }
    }
}
