//! Periodic acquisition: one frame per tick into the sample store.
//!
//! Every tick appends exactly one sample. When the read times out, the device
//! faults or the line does not decode, the previous sample's values are
//! repeated with the current tick's timestamp ("fallback repeat"). Under a
//! dead device the displayed values therefore freeze at the last good reading
//! instead of showing a gap.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use chrono::Local;
use log::{debug, info, warn};

use crate::decoder::decode;
use crate::errors::{DecodeError, SourceError};
use crate::serial::FrameSource;
use crate::store::{Sample, StoreWriter, Timestamp};

/// Default acquisition period
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(500);

/// Longest uninterrupted sleep, so a stop request is noticed promptly
const STOP_POLL: Duration = Duration::from_millis(50);

/// Why a tick repeated the previous values instead of appending fresh ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    Timeout,
    Device,
    Decode(DecodeError),
}

/// What a single tick appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Fresh(Sample),
    Repeated {
        sample: Sample,
        reason: FallbackReason,
    },
}

impl TickOutcome {
    pub fn sample(&self) -> Sample {
        match self {
            TickOutcome::Fresh(s) => *s,
            TickOutcome::Repeated { sample, .. } => *sample,
        }
    }

    pub fn is_fresh(&self) -> bool {
        matches!(self, TickOutcome::Fresh(_))
    }
}

/// Running counters for one acquisition session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcquisitionStats {
    pub ticks: u64,
    pub fresh: u64,
    pub timeouts: u64,
    pub device_errors: u64,
    pub decode_errors: u64,
    /// Fallback ticks since the last fresh sample.
    pub consecutive_fallbacks: u32,
}

impl AcquisitionStats {
    pub fn fallbacks(&self) -> u64 {
        self.timeouts + self.device_errors + self.decode_errors
    }
}

/// Drives a [`FrameSource`] and owns the store's only writer.
pub struct AcquisitionLoop<S: FrameSource> {
    source: S,
    writer: StoreWriter,
    read_timeout: Duration,
    stale_after: Option<u32>,
    stale_reported: bool,
    stats: AcquisitionStats,
}

impl<S: FrameSource> AcquisitionLoop<S> {
    pub fn new(source: S, writer: StoreWriter, read_timeout: Duration) -> Self {
        Self {
            source,
            writer,
            read_timeout,
            stale_after: None,
            stale_reported: false,
            stats: AcquisitionStats::default(),
        }
    }

    /// Warn once after `ticks` consecutive fallback repeats. Off by default.
    pub fn with_stale_after(mut self, ticks: Option<u32>) -> Self {
        self.stale_after = ticks.filter(|&n| n > 0);
        self
    }

    pub fn stats(&self) -> &AcquisitionStats {
        &self.stats
    }

    /// Whether the staleness alarm is currently raised.
    pub fn is_stale(&self) -> bool {
        self.stale_reported
    }

    pub fn writer(&self) -> &StoreWriter {
        &self.writer
    }

    /// Give back the source, e.g. to close the device after the loop stopped.
    pub fn into_source(self) -> S {
        self.source
    }

    /// One acquisition step stamped with the current wall clock.
    pub fn tick(&mut self) -> TickOutcome {
        self.tick_at(Local::now())
    }

    /// One acquisition step stamped with `now`.
    ///
    /// A timestamp earlier than the latest stored sample (wall clock stepped
    /// back) is raised to that sample's timestamp to keep the series ordered.
    pub fn tick_at(&mut self, now: Timestamp) -> TickOutcome {
        let previous = self.writer.latest();
        let timestamp = now.max(previous.timestamp);

        let attempt = self
            .source
            .read_frame(self.read_timeout)
            .map_err(Self::classify_read_error)
            .and_then(|line| {
                decode(&line).map_err(|e| {
                    debug!(
                        "Dropping undecodable frame {:?}: {}",
                        String::from_utf8_lossy(&line),
                        e
                    );
                    FallbackReason::Decode(e)
                })
            });

        self.stats.ticks += 1;
        let outcome = match attempt {
            Ok(axes) => TickOutcome::Fresh(Sample::new(timestamp, axes)),
            Err(reason) => TickOutcome::Repeated {
                sample: Sample::new(timestamp, previous.axes()),
                reason,
            },
        };
        self.record(&outcome);
        self.writer.append(outcome.sample());
        outcome
    }

    fn classify_read_error(err: SourceError) -> FallbackReason {
        match err {
            SourceError::Timeout(t) => {
                debug!("No frame within {:?}, repeating last sample", t);
                FallbackReason::Timeout
            }
            other => {
                warn!(
                    "Device read failed, repeating last sample (check the connection): {}",
                    other
                );
                FallbackReason::Device
            }
        }
    }

    fn record(&mut self, outcome: &TickOutcome) {
        match outcome {
            TickOutcome::Fresh(_) => {
                self.stats.fresh += 1;
                if self.stale_reported {
                    info!(
                        "Fresh data resumed after {} repeated samples",
                        self.stats.consecutive_fallbacks
                    );
                    self.stale_reported = false;
                }
                self.stats.consecutive_fallbacks = 0;
            }
            TickOutcome::Repeated { reason, .. } => {
                match reason {
                    FallbackReason::Timeout => self.stats.timeouts += 1,
                    FallbackReason::Device => self.stats.device_errors += 1,
                    FallbackReason::Decode(_) => self.stats.decode_errors += 1,
                }
                self.stats.consecutive_fallbacks =
                    self.stats.consecutive_fallbacks.saturating_add(1);

                if let Some(limit) = self.stale_after {
                    if !self.stale_reported && self.stats.consecutive_fallbacks >= limit {
                        warn!(
                            "No fresh frame for {} ticks, displayed values are stale",
                            self.stats.consecutive_fallbacks
                        );
                        self.stale_reported = true;
                    }
                }
            }
        }
    }

    /// Tick every `interval` on the current thread until `stop` is set.
    ///
    /// Deadlines are fixed-rate. When a tick overruns (read timeout longer
    /// than the interval) the schedule is re-anchored rather than catching up
    /// with a burst of back-to-back ticks.
    pub fn run_until(&mut self, interval: Duration, stop: &AtomicBool) {
        let mut next = Instant::now();
        while !stop.load(Ordering::Relaxed) {
            self.tick();

            next += interval;
            let now = Instant::now();
            if next <= now {
                debug!("Tick overran its slot by {:?}", now - next);
                next = now;
                continue;
            }
            while !stop.load(Ordering::Relaxed) {
                let now = Instant::now();
                if now >= next {
                    break;
                }
                thread::sleep((next - now).min(STOP_POLL));
            }
        }
    }
}

impl<S: FrameSource + 'static> AcquisitionLoop<S> {
    /// Run the loop on a dedicated thread.
    pub fn spawn(mut self, interval: Duration) -> std::io::Result<AcquisitionHandle<S>> {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let thread = thread::Builder::new()
            .name("acquisition".to_string())
            .spawn(move || {
                debug!("Acquisition started, interval {:?}", interval);
                self.run_until(interval, &flag);
                debug!("Acquisition stopped after {} ticks", self.stats.ticks);
                self
            })?;
        Ok(AcquisitionHandle {
            stop,
            thread: Some(thread),
        })
    }
}

/// Handle to a loop started with [`AcquisitionLoop::spawn`].
///
/// Dropping the handle stops and joins the thread as well.
pub struct AcquisitionHandle<S: FrameSource> {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<AcquisitionLoop<S>>>,
}

impl<S: FrameSource> AcquisitionHandle<S> {
    /// Signal the loop and wait for the in-flight read to return.
    ///
    /// Returns the loop (and with it the device) so the caller decides when
    /// the handle is closed. `None` if the acquisition thread panicked.
    pub fn stop(mut self) -> Option<AcquisitionLoop<S>> {
        self.stop.store(true, Ordering::Relaxed);
        let thread = self.thread.take()?;
        match thread.join() {
            Ok(acq) => Some(acq),
            Err(_) => {
                warn!("Acquisition thread panicked");
                None
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl<S: FrameSource> Drop for AcquisitionHandle<S> {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
