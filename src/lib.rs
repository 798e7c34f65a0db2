//! # blackbox
//!
//! Journey black-box recorder. Captures fixes from an external location
//! source, groups them into discrete journeys, derives telemetry points and
//! persists them durably in SQLite for later visualization or export.
//!
//! Pipeline: `JourneyTracker::start()` → sampler subscribes → each fix flows
//! through the recorder's bounded queue → single writer thread → store.
//! `stop()` severs the subscription, flushes, and finalizes the journey.
//! Export/query reads run independently of capture.

// Data model and capture tunables
pub mod types;
pub use types::{CaptureConfig, RawFix, TelemetryPoint};

// Error taxonomy
pub mod error;
pub use error::{Result, TelemetryError};

// Durable point store (SQLite)
pub mod persistence;
pub use persistence::TelemetryStore;

// Fix source seam and subscription wrapper
pub mod sampler;
pub use sampler::{FixCallback, LocationSampler, LocationSource};

// Fix -> point derivation and the single-writer queue
pub mod recorder;
pub use recorder::{point_from_fix, Recorder, RecorderHandle};

// Journey lifecycle state machine
pub mod lifecycle;
pub use lifecycle::JourneyTracker;

// JSON export and store snapshots
pub mod export;
pub use export::{export_journey, export_journey_to_file, snapshot_store};

// Read-only HTTP surface for the map viewer
#[cfg(feature = "http")]
pub mod http;
