//! Unified error handling for the telemetry pipeline.
//!
//! Only conditions a caller can act on are errors. Deliberately *not* errors:
//! recorder overflow (logged counter, capture continues) and queries for an
//! unknown journey id (empty result set).

use thiserror::Error;

/// Unified error type for telemetry operations.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The external fix source cannot deliver fixes (access not granted).
    /// Fatal to `start()` only; the tracker stays idle.
    #[error("location permission denied: {0}")]
    PermissionDenied(String),

    /// Unrecoverable storage medium failure. Duplicate points are valid and
    /// never produce this.
    #[error("store write failed: {0}")]
    StoreWrite(#[from] rusqlite::Error),

    /// Export requested for a journey with zero recorded points.
    #[error("journey '{journey_id}' has no recorded points")]
    EmptyDataset { journey_id: String },

    /// `stop()` could not drain pending writes within its budget. The
    /// remaining queued points were discarded and shutdown proceeded.
    #[error("flush timed out after {waited_ms} ms, {dropped} queued points discarded")]
    FlushTimeout { waited_ms: u64, dropped: usize },

    /// Export serialization failure.
    #[error("export failed: {0}")]
    Export(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type alias for telemetry operations.
pub type Result<T> = std::result::Result<T, TelemetryError>;
