//! Core data types for the capture pipeline.
//!
//! `RawFix` is what the external location source delivers; `TelemetryPoint`
//! is the derived record the store persists. The store-assigned sequence
//! number is internal to the store and never appears here.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A raw reading from the external location source.
///
/// `speed_m_s` may be negative when the source cannot determine direction;
/// derivation clamps it to zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawFix {
    pub latitude: f64,
    pub longitude: f64,
    /// Instantaneous speed in meters per second.
    pub speed_m_s: f64,
    /// Capture time, epoch milliseconds.
    pub timestamp_ms: i64,
}

/// A persisted telemetry record, tagged with the journey it belongs to.
///
/// Serialized field names are the export wire format; do not rename them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryPoint {
    pub journey_id: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Derived speed in km/h, always >= 0.
    pub speed_kmh: f64,
    /// Capture time, epoch milliseconds.
    pub timestamp: i64,
}

/// Tunables for the capture pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Fix sampling interval requested from the location source.
    pub interval_ms: u64,
    /// Bounded recorder queue capacity; the oldest pending point is dropped
    /// when the queue is full.
    pub queue_capacity: usize,
    /// Budget for draining pending writes during `stop()`.
    pub flush_timeout_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            interval_ms: 2000,
            queue_capacity: 512,
            flush_timeout_ms: 5000,
        }
    }
}

impl CaptureConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn flush_timeout(&self) -> Duration {
        Duration::from_millis(self.flush_timeout_ms)
    }
}
