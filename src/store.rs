//! In-memory time series of accelerometer samples.
//!
//! # Ownership
//!
//! [`SampleStore::seeded`] returns two handles over the same buffer:
//!
//! - a [`StoreWriter`], the only way to append. It is not `Clone`, so exactly
//!   one writer exists per store and it is moved into the acquisition loop.
//! - a [`SampleStore`], a cheap `Clone` read handle for any number of
//!   renderers.
//!
//! The store is never empty: it starts with an all-zero seed sample, so
//! [`SampleStore::latest`] is always defined. With a retention bound the
//! oldest samples are evicted first and the bound is never below one.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Local};

use crate::decoder::Axes;
use crate::errors::StoreError;

/// Timestamp type used for every sample.
pub type Timestamp = DateTime<Local>;

/// One accelerometer reading in raw sensor counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub timestamp: Timestamp,
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Sample {
    #[inline]
    pub fn new(timestamp: Timestamp, axes: Axes) -> Self {
        Self {
            timestamp,
            x: axes.x,
            y: axes.y,
            z: axes.z,
        }
    }

    /// The all-zero seed sample.
    pub fn zero(timestamp: Timestamp) -> Self {
        Self::new(timestamp, Axes::default())
    }

    #[inline]
    pub fn axes(&self) -> Axes {
        Axes::new(self.x, self.y, self.z)
    }
}

struct Inner {
    samples: VecDeque<Sample>,
    latest: Sample,
    retention: Option<usize>,
    total_appended: u64,
}

impl Inner {
    fn push(&mut self, sample: Sample) {
        if let Some(limit) = self.retention {
            while self.samples.len() >= limit {
                self.samples.pop_front();
            }
        }
        self.samples.push_back(sample);
        self.latest = sample;
        self.total_appended += 1;
    }
}

/// Read handle over the shared sample buffer.
#[derive(Clone)]
pub struct SampleStore {
    inner: Arc<Mutex<Inner>>,
}

/// Exclusive append handle. Owned by the acquisition loop.
pub struct StoreWriter {
    store: SampleStore,
}

impl SampleStore {
    /// Create a store holding only `seed`.
    ///
    /// `retention` caps how many samples are kept (`None` = unbounded). A bound
    /// of zero cannot hold the seed and is rejected; callers treat this as a
    /// fatal startup error.
    pub fn seeded(
        seed: Sample,
        retention: Option<usize>,
    ) -> Result<(StoreWriter, SampleStore), StoreError> {
        if retention == Some(0) {
            return Err(StoreError::ZeroRetention);
        }

        Ok(Self::build(seed, retention))
    }

    /// Unbounded store seeded with a zero sample stamped now.
    pub fn with_zero_seed() -> (StoreWriter, SampleStore) {
        Self::build(Sample::zero(Local::now()), None)
    }

    fn build(seed: Sample, retention: Option<usize>) -> (StoreWriter, SampleStore) {
        let mut samples = VecDeque::with_capacity(retention.unwrap_or(64).min(4096));
        samples.push_back(seed);

        let store = SampleStore {
            inner: Arc::new(Mutex::new(Inner {
                samples,
                latest: seed,
                retention,
                total_appended: 0,
            })),
        };
        let writer = StoreWriter {
            store: store.clone(),
        };
        (writer, store)
    }

    // The guarded data is valid after every statement, so a panicking reader
    // cannot leave it torn.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Most recently appended sample (the seed before the first append).
    pub fn latest(&self) -> Sample {
        self.lock().latest
    }

    /// The last `min(n, len)` samples in arrival order.
    pub fn recent_window(&self, n: usize) -> Vec<Sample> {
        let inner = self.lock();
        let skip = inner.samples.len().saturating_sub(n);
        inner.samples.iter().skip(skip).copied().collect()
    }

    /// Number of retained samples, seed included.
    pub fn len(&self) -> usize {
        self.lock().samples.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.lock().samples.is_empty()
    }

    /// Appends performed since construction, counting evicted samples.
    pub fn total_appended(&self) -> u64 {
        self.lock().total_appended
    }

    pub fn retention(&self) -> Option<usize> {
        self.lock().retention
    }
}

impl StoreWriter {
    pub fn append(&mut self, sample: Sample) {
        self.store.lock().push(sample);
    }

    pub fn latest(&self) -> Sample {
        self.store.latest()
    }

    /// A read handle onto the same buffer.
    pub fn reader(&self) -> SampleStore {
        self.store.clone()
    }
}
