//! # Export / Snapshot
//!
//! Read-only serialization of journeys for the viewer and for backups.
//! Export output is a pretty-printed JSON array in store order; parsing it
//! back reproduces `query_by_journey` field-for-field.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use log::info;
use rusqlite::backup::Backup;
use rusqlite::Connection;

use crate::error::{Result, TelemetryError};
use crate::persistence::TelemetryStore;

/// Serialize a journey's points as pretty-printed JSON, in store order.
/// Fails with `EmptyDataset` when the journey has zero points; the caller
/// decides whether that is an error or a no-op.
pub fn export_journey(store: &TelemetryStore, journey_id: &str) -> Result<Vec<u8>> {
    let points = store.query_by_journey(journey_id)?;
    if points.is_empty() {
        return Err(TelemetryError::EmptyDataset {
            journey_id: journey_id.to_string(),
        });
    }

    let mut bytes = serde_json::to_vec_pretty(&points)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Export a journey to `journey_<id>.json` in the given directory. The id in
/// the filename keeps repeated exports from clobbering each other.
pub fn export_journey_to_file(
    store: &TelemetryStore,
    journey_id: &str,
    dir: &Path,
) -> Result<PathBuf> {
    let bytes = export_journey(store, journey_id)?;
    let path = dir.join(format!("journey_{}.json", journey_id));
    fs::write(&path, bytes)?;

    info!("[Export] journey {} exported to {}", journey_id, path.display());
    Ok(path)
}

/// Write a consistent point-in-time copy of the whole store to
/// `journeys_backup_<epoch_ms>.snapshot` in the given directory.
///
/// Uses SQLite's online backup API rather than a raw file copy: the result
/// is a complete standalone database even under WAL, and it is consistent
/// with respect to the single writer: a point is either fully in the
/// snapshot or absent.
pub fn snapshot_store(store: &TelemetryStore, dir: &Path) -> Result<PathBuf> {
    let file_name = format!("journeys_backup_{}.snapshot", Utc::now().timestamp_millis());
    let dest = dir.join(file_name);

    let mut dst = Connection::open(&dest)?;
    {
        let backup = Backup::new(store.connection(), &mut dst)?;
        backup.run_to_completion(64, Duration::from_millis(50), None)?;
    }

    info!("[Export] store snapshot written to {}", dest.display());
    Ok(dest)
}
