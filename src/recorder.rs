//! # Telemetry Recorder
//!
//! Turns raw fixes into telemetry points and gets them onto disk without
//! ever blocking the fix-delivery callback.
//!
//! Shape: one bounded FIFO queue fed by `RecorderHandle::submit` (callable
//! from any thread, never blocks), drained by a single writer thread that
//! owns the writing store handle. When the queue is full the oldest pending
//! point is dropped; capture continuity beats completeness. A failed insert
//! is retried once, then the point is dropped and the writer keeps going.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::error::{Result, TelemetryError};
use crate::persistence::TelemetryStore;
use crate::types::{RawFix, TelemetryPoint};

/// Derive a persisted point from a raw fix.
///
/// Sources report negative speeds when direction is unknown; clamp to zero
/// before converting m/s to km/h.
pub fn point_from_fix(journey_id: &str, fix: &RawFix) -> TelemetryPoint {
    TelemetryPoint {
        journey_id: journey_id.to_string(),
        latitude: fix.latitude,
        longitude: fix.longitude,
        speed_kmh: fix.speed_m_s.max(0.0) * 3.6,
        timestamp: fix.timestamp_ms,
    }
}

// ============================================================================
// Bounded queue
// ============================================================================

struct QueueState {
    pending: VecDeque<TelemetryPoint>,
    /// A point has been popped but its insert has not finished yet.
    in_flight: bool,
    shutdown: bool,
}

/// FIFO queue with drop-oldest overflow, shared between the producer side
/// (fix callbacks) and the single writer thread.
struct BoundedQueue {
    state: Mutex<QueueState>,
    cond: Condvar,
    capacity: usize,
    overflow: AtomicU64,
}

impl BoundedQueue {
    fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(QueueState {
                pending: VecDeque::with_capacity(capacity),
                in_flight: false,
                shutdown: false,
            }),
            cond: Condvar::new(),
            capacity,
            overflow: AtomicU64::new(0),
        }
    }

    /// Non-blocking enqueue. On overflow the oldest pending point is evicted
    /// and counted; the new point always gets in.
    fn push(&self, point: TelemetryPoint) {
        let mut state = self.state.lock().unwrap();
        if state.shutdown {
            // Late fix after the recorder shut down; nothing to do with it.
            return;
        }
        if state.pending.len() >= self.capacity {
            state.pending.pop_front();
            let dropped = self.overflow.fetch_add(1, Ordering::Relaxed) + 1;
            warn!(
                "[Recorder] queue full ({}), dropped oldest pending point ({} dropped so far)",
                self.capacity, dropped
            );
        }
        state.pending.push_back(point);
        self.cond.notify_all();
    }

    /// Writer side: block until a point is available or shutdown. Pending
    /// points are drained even after shutdown; `None` means done for good.
    fn pop_blocking(&self) -> Option<TelemetryPoint> {
        let mut state = self.state.lock().unwrap();
        loop {
            if let Some(point) = state.pending.pop_front() {
                state.in_flight = true;
                return Some(point);
            }
            if state.shutdown {
                return None;
            }
            state = self.cond.wait(state).unwrap();
        }
    }

    /// Writer side: the popped point's insert finished (or was dropped).
    fn mark_written(&self) {
        let mut state = self.state.lock().unwrap();
        state.in_flight = false;
        self.cond.notify_all();
    }

    /// Block until the queue is empty and no insert is in flight, bounded by
    /// `timeout`. On timeout the remaining points are discarded so shutdown
    /// never hangs on a stuck medium.
    fn flush(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock().unwrap();
        loop {
            if state.pending.is_empty() && !state.in_flight {
                return Ok(());
            }
            let now = Instant::now();
            if now >= deadline {
                let dropped = state.pending.len();
                state.pending.clear();
                return Err(TelemetryError::FlushTimeout {
                    waited_ms: timeout.as_millis() as u64,
                    dropped,
                });
            }
            let (guard, _) = self.cond.wait_timeout(state, deadline - now).unwrap();
            state = guard;
        }
    }

    fn shutdown(&self) {
        let mut state = self.state.lock().unwrap();
        state.shutdown = true;
        self.cond.notify_all();
    }

    fn overflow_count(&self) -> u64 {
        self.overflow.load(Ordering::Relaxed)
    }
}

// ============================================================================
// Recorder
// ============================================================================

/// Cheap producer-side handle; clonable into fix callbacks.
#[derive(Clone)]
pub struct RecorderHandle {
    queue: Arc<BoundedQueue>,
}

impl RecorderHandle {
    /// Derive a point from the fix and enqueue it. Never blocks the caller.
    pub fn submit(&self, journey_id: &str, fix: &RawFix) {
        self.queue.push(point_from_fix(journey_id, fix));
    }

    /// Points dropped so far because the queue was full.
    pub fn overflow_count(&self) -> u64 {
        self.queue.overflow_count()
    }
}

/// Owns the bounded queue and the writer thread. The writer thread owns the
/// writing store handle; nothing else in the process mutates the store.
pub struct Recorder {
    queue: Arc<BoundedQueue>,
    writer: Option<thread::JoinHandle<()>>,
}

impl Recorder {
    /// Spawn the writer thread over the given store handle.
    pub fn spawn(store: TelemetryStore, queue_capacity: usize) -> Result<Self> {
        let queue = Arc::new(BoundedQueue::new(queue_capacity));
        let writer_queue = Arc::clone(&queue);

        let writer = thread::Builder::new()
            .name("telemetry-writer".to_string())
            .spawn(move || writer_loop(writer_queue, store))?;

        Ok(Self {
            queue,
            writer: Some(writer),
        })
    }

    /// Producer-side handle for fix callbacks.
    pub fn handle(&self) -> RecorderHandle {
        RecorderHandle {
            queue: Arc::clone(&self.queue),
        }
    }

    /// Drain all pending writes, bounded by `timeout`.
    pub fn flush(&self, timeout: Duration) -> Result<()> {
        self.queue.flush(timeout)
    }

    /// Points dropped so far because the queue was full.
    pub fn overflow_count(&self) -> u64 {
        self.queue.overflow_count()
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        self.queue.shutdown();
        if let Some(writer) = self.writer.take() {
            let _ = writer.join();
        }
    }
}

fn writer_loop(queue: Arc<BoundedQueue>, store: TelemetryStore) {
    debug!("[Recorder] writer thread started over {:?}", store.path());

    while let Some(point) = queue.pop_blocking() {
        if let Err(first) = store.insert(&point) {
            warn!("[Recorder] insert failed, retrying once: {}", first);
            if let Err(second) = store.insert(&point) {
                warn!(
                    "[Recorder] retry failed, dropping point for journey {}: {}",
                    point.journey_id, second
                );
            }
        }
        queue.mark_written();
    }

    debug!("[Recorder] writer thread exiting");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fix(speed_m_s: f64, timestamp_ms: i64) -> RawFix {
        RawFix {
            latitude: -37.10,
            longitude: -72.01,
            speed_m_s,
            timestamp_ms,
        }
    }

    #[test]
    fn test_speed_conversion() {
        let p = point_from_fix("j1", &fix(5.0, 1000));
        assert_eq!(p.speed_kmh, 18.0);
        assert_eq!(p.journey_id, "j1");
        assert_eq!(p.timestamp, 1000);
    }

    #[test]
    fn test_negative_speed_clamps_to_zero() {
        let p = point_from_fix("j1", &fix(-1.0, 1000));
        assert_eq!(p.speed_kmh, 0.0);
    }

    #[test]
    fn test_overflow_drops_oldest() {
        let queue = BoundedQueue::new(2);
        queue.push(point_from_fix("j1", &fix(1.0, 1)));
        queue.push(point_from_fix("j1", &fix(2.0, 2)));
        queue.push(point_from_fix("j1", &fix(3.0, 3)));

        assert_eq!(queue.overflow_count(), 1);

        // The survivors are the two newest, in FIFO order
        let first = queue.pop_blocking().unwrap();
        queue.mark_written();
        let second = queue.pop_blocking().unwrap();
        queue.mark_written();
        assert_eq!(first.timestamp, 2);
        assert_eq!(second.timestamp, 3);
    }

    #[test]
    fn test_flush_empty_queue_is_immediate() {
        let queue = BoundedQueue::new(8);
        queue.flush(Duration::from_millis(10)).unwrap();
    }

    #[test]
    fn test_flush_times_out_and_discards() {
        let queue = BoundedQueue::new(8);
        queue.push(point_from_fix("j1", &fix(1.0, 1)));
        queue.push(point_from_fix("j1", &fix(2.0, 2)));

        // No writer is draining this queue
        let err = queue.flush(Duration::from_millis(20)).unwrap_err();
        match err {
            TelemetryError::FlushTimeout { dropped, .. } => assert_eq!(dropped, 2),
            other => panic!("expected FlushTimeout, got {other:?}"),
        }

        // Discard means a later flush finds nothing pending
        queue.flush(Duration::from_millis(10)).unwrap();
    }

    #[test]
    fn test_writer_persists_submitted_fixes() {
        let tmp = tempfile::TempDir::new().unwrap();
        let db_path = tmp.path().join("recorder.sqlite");

        let recorder =
            Recorder::spawn(TelemetryStore::open(&db_path).unwrap(), 8).unwrap();
        let handle = recorder.handle();

        handle.submit("j1", &fix(5.0, 1000));
        handle.submit("j1", &fix(10.0, 2000));
        recorder.flush(Duration::from_secs(5)).unwrap();

        let reader = TelemetryStore::open(&db_path).unwrap();
        let points = reader.query_by_journey("j1").unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].speed_kmh, 18.0);
        assert_eq!(points[1].speed_kmh, 36.0);
    }
}
