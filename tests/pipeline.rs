use std::collections::VecDeque;
use std::io::{self, Read};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use accel_monitor::{
    decode, AcquisitionLoop, Axes, DecodeError, FallbackReason, Sample, SampleStore,
    SerialSource, TickOutcome, Timestamp,
};
use chrono::{Local, TimeZone};

const READ_TIMEOUT: Duration = Duration::from_millis(10);

/// Byte stream fed by the test; an empty queue behaves like a silent device.
#[derive(Clone, Default)]
struct FakePort(Arc<Mutex<VecDeque<io::Result<Vec<u8>>>>>);

impl FakePort {
    fn send(&self, bytes: &[u8]) {
        self.0.lock().unwrap().push_back(Ok(bytes.to_vec()));
    }

    fn unplug(&self) {
        self.0
            .lock()
            .unwrap()
            .push_back(Err(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged")));
    }
}

impl Read for FakePort {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.0.lock().unwrap().pop_front() {
            Some(Ok(bytes)) => {
                let n = bytes.len().min(buf.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                Ok(n)
            }
            Some(Err(e)) => Err(e),
            None => {
                std::thread::sleep(Duration::from_millis(1));
                Err(io::Error::new(io::ErrorKind::TimedOut, "poll"))
            }
        }
    }
}

fn at(secs: i64) -> Timestamp {
    Local.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

fn pipeline() -> (FakePort, AcquisitionLoop<SerialSource>, SampleStore) {
    let port = FakePort::default();
    let source = SerialSource::from_transport(port.clone(), "fake");
    let (writer, store) = SampleStore::seeded(Sample::zero(at(0)), None).unwrap();
    (port, AcquisitionLoop::new(source, writer, READ_TIMEOUT), store)
}

#[test]
fn scenario_a_fresh_frame_is_latest() {
    let (port, mut acq, store) = pipeline();
    port.send(b"100,-50,30\n");
    acq.tick_at(at(1));
    let latest = store.latest();
    assert_eq!((latest.x, latest.y, latest.z), (100, -50, 30));
}

#[test]
fn scenario_b_timeout_repeats_with_newer_timestamp() {
    let (port, mut acq, store) = pipeline();
    port.send(b"100,-50,30\n");
    acq.tick_at(at(1));
    let outcome = acq.tick_at(at(2));

    assert!(matches!(
        outcome,
        TickOutcome::Repeated {
            reason: FallbackReason::Timeout,
            ..
        }
    ));
    let window = store.recent_window(2);
    assert_eq!(window[1].axes(), Axes::new(100, -50, 30));
    assert!(window[1].timestamp > window[0].timestamp);
}

#[test]
fn scenario_c_bad_line_grows_store_by_one() {
    let (port, mut acq, store) = pipeline();
    port.send(b"1,2,3\n");
    acq.tick_at(at(1));
    let before = store.len();

    port.send(b"bad,data\n");
    let outcome = acq.tick_at(at(2));

    assert_eq!(store.len(), before + 1);
    assert_eq!(store.latest().axes(), Axes::new(1, 2, 3));
    assert!(matches!(
        outcome,
        TickOutcome::Repeated {
            reason: FallbackReason::Decode(DecodeError::FieldCount { found: 2 }),
            ..
        }
    ));
}

#[test]
fn device_fault_does_not_stop_acquisition() {
    let (port, mut acq, store) = pipeline();
    port.send(b"4,5,6\n");
    acq.tick_at(at(1));
    port.unplug();
    let outcome = acq.tick_at(at(2));
    assert!(matches!(
        outcome,
        TickOutcome::Repeated {
            reason: FallbackReason::Device,
            ..
        }
    ));
    port.send(b"7,8,9\n");
    assert!(acq.tick_at(at(3)).is_fresh());
    assert_eq!(store.latest().axes(), Axes::new(7, 8, 9));
    assert_eq!(acq.stats().device_errors, 1);
}

#[test]
fn frame_split_across_ticks_is_recovered() {
    let (port, mut acq, store) = pipeline();
    port.send(b"11,22");
    assert!(!acq.tick_at(at(1)).is_fresh());
    port.send(b",33\n");
    assert!(acq.tick_at(at(2)).is_fresh());
    assert_eq!(store.latest().axes(), Axes::new(11, 22, 33));
}

#[test]
fn decode_returns_exact_triple_regardless_of_trailer() {
    for (a, b, c) in [(0, 0, 0), (-2100, 2100, -1), (i32::MIN, 17, i32::MAX)] {
        let line = format!("{a},{b},{c}");
        let expected = Ok(Axes::new(a, b, c));
        assert_eq!(decode(line.as_bytes()), expected);
        assert_eq!(decode(format!("{line}\n").as_bytes()), expected);
        assert_eq!(decode(format!("{line},\r\n").as_bytes()), expected);
    }
}

#[test]
fn decode_rejects_short_or_non_numeric_frames() {
    assert_eq!(decode(b"12,7"), Err(DecodeError::FieldCount { found: 2 }));
    assert!(matches!(
        decode(b"12,x,7"),
        Err(DecodeError::Parse { index: 1, .. })
    ));
}

#[test]
fn failed_tick_copies_previous_values() {
    let (port, mut acq, store) = pipeline();
    let script: [&[u8]; 8] = [
        b"1,1,1\n",
        b"oops\n",
        b"",
        b"2,2,2\n",
        b"\xff\xfe\n",
        b"3,q,3\n",
        b"4,4,4\n",
        b"",
    ];
    for (i, bytes) in script.iter().enumerate() {
        if !bytes.is_empty() {
            port.send(bytes);
        }
        let prev = store.latest();
        let outcome = acq.tick_at(at(i as i64 + 1));
        let now = store.latest();
        assert_eq!(outcome.sample(), now);
        assert!(now.timestamp >= prev.timestamp);
        if !outcome.is_fresh() {
            assert_eq!(now.axes(), prev.axes());
        }
    }
    assert_eq!(store.total_appended(), script.len() as u64);
}

#[test]
fn window_is_ordered_and_bounded() {
    let (port, mut acq, store) = pipeline();
    for i in 1..=25 {
        if i % 3 != 0 {
            port.send(format!("{i},{i},{i}\n").as_bytes());
        }
        acq.tick_at(at(i));
        let total = store.len();
        for n in [0, 1, 5, 10, 100] {
            let window = store.recent_window(n);
            assert!(window.len() <= n.min(total));
            assert!(window.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        }
    }
}

#[test]
fn window_of_ten_after_twenty_appends() {
    let (writer_port, mut acq, store) = {
        let port = FakePort::default();
        let source = SerialSource::from_transport(port.clone(), "fake");
        let (writer, store) = SampleStore::seeded(Sample::zero(at(0)), Some(15)).unwrap();
        (port, AcquisitionLoop::new(source, writer, READ_TIMEOUT), store)
    };
    let mut appended = Vec::new();
    for i in 1..=20 {
        writer_port.send(format!("{i},{},{}\n", -i, i * 10).as_bytes());
        appended.push(acq.tick_at(at(i as i64)).sample());
    }
    assert_eq!(store.recent_window(10), appended[10..].to_vec());
    assert_eq!(store.len(), 15);
}

#[test]
fn spawned_acquisition_feeds_concurrent_readers() {
    let (port, acq, store) = pipeline();
    for i in 0..200 {
        port.send(format!("{i},0,0\n").as_bytes());
    }
    let handle = acq.spawn(Duration::from_millis(1)).unwrap();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = store.clone();
            std::thread::spawn(move || {
                for _ in 0..100 {
                    let window = store.recent_window(10);
                    assert!(!window.is_empty());
                    assert!(window.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
                    assert!(window.windows(2).all(|w| w[0].x <= w[1].x));
                    std::thread::sleep(Duration::from_millis(1));
                }
            })
        })
        .collect();
    for r in readers {
        r.join().unwrap();
    }

    let acq = handle.stop().unwrap();
    assert_eq!(acq.stats().ticks, store.total_appended());
}
