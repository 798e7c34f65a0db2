//! # Telemetry Store
//!
//! SQLite-backed table of telemetry points, queryable by journey id.
//!
//! Concurrency discipline: exactly one connection (owned by the recorder's
//! writer thread) ever mutates the database. Readers (export, queries, the
//! HTTP surface) open their own connections to the same file and, under WAL,
//! observe committed whole points or nothing. `in_memory()` databases cannot
//! be shared between connections; reader/writer tests use a temp file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use log::info;
use rusqlite::{params, Connection, Result as SqlResult};

use crate::error::Result;
use crate::types::TelemetryPoint;

const BUSY_TIMEOUT_MS: u64 = 5000;

/// Durable store of telemetry points.
///
/// One handle wraps one SQLite connection. Construct a handle per role:
/// the recorder's writer thread takes ownership of the writing handle,
/// query/export callers open their own.
pub struct TelemetryStore {
    db: Connection,
    db_path: PathBuf,
}

impl TelemetryStore {
    // ========================================================================
    // Initialization
    // ========================================================================

    /// Open (creating if needed) the store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = Connection::open(path.as_ref())?;
        Self::configure(&db)?;
        Self::init_schema(&db)?;

        Ok(Self {
            db,
            db_path: path.as_ref().to_path_buf(),
        })
    }

    /// Create an in-memory store (for single-connection tests).
    pub fn in_memory() -> Result<Self> {
        Self::open(":memory:")
    }

    /// Path this store was opened with.
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn configure(conn: &Connection) -> SqlResult<()> {
        conn.busy_timeout(Duration::from_millis(BUSY_TIMEOUT_MS))?;
        // WAL lets readers run while the writer thread holds its connection.
        // ":memory:" databases report "memory" here, which is fine.
        let _mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
        Ok(())
    }

    /// Initialize the database schema.
    fn init_schema(conn: &Connection) -> SqlResult<()> {
        conn.execute_batch(
            r#"
            -- Telemetry points, append-only. seq gives stable ordering for
            -- equal timestamps and storage uniqueness for duplicate fixes.
            CREATE TABLE IF NOT EXISTS points (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                journey_id TEXT NOT NULL,
                latitude REAL NOT NULL,
                longitude REAL NOT NULL,
                speed_kmh REAL NOT NULL,
                timestamp INTEGER NOT NULL
            );

            -- Indexes
            CREATE INDEX IF NOT EXISTS idx_points_journey ON points(journey_id);
            CREATE INDEX IF NOT EXISTS idx_points_journey_time ON points(journey_id, timestamp);
            "#,
        )
    }

    // ========================================================================
    // Writes (single writer: only the recorder's writer thread calls these)
    // ========================================================================

    /// Append one point. The sequence number is assigned by the store.
    /// Duplicate data is valid; closely-spaced fixes can repeat exactly.
    pub fn insert(&self, point: &TelemetryPoint) -> Result<()> {
        self.db.execute(
            "INSERT INTO points (journey_id, latitude, longitude, speed_kmh, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                point.journey_id,
                point.latitude,
                point.longitude,
                point.speed_kmh,
                point.timestamp
            ],
        )?;
        Ok(())
    }

    /// Delete all points. Idempotent.
    pub fn clear_all(&self) -> Result<()> {
        let deleted = self.db.execute("DELETE FROM points", [])?;
        info!("[TelemetryStore] cleared {} points", deleted);
        Ok(())
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// All points for a journey, ordered by timestamp then sequence number.
    /// An unknown journey id yields an empty vec, not an error.
    pub fn query_by_journey(&self, journey_id: &str) -> Result<Vec<TelemetryPoint>> {
        let mut stmt = self.db.prepare(
            "SELECT journey_id, latitude, longitude, speed_kmh, timestamp
             FROM points
             WHERE journey_id = ?1
             ORDER BY timestamp ASC, seq ASC",
        )?;

        let points = stmt
            .query_map(params![journey_id], |row| {
                Ok(TelemetryPoint {
                    journey_id: row.get(0)?,
                    latitude: row.get(1)?,
                    longitude: row.get(2)?,
                    speed_kmh: row.get(3)?,
                    timestamp: row.get(4)?,
                })
            })?
            .collect::<SqlResult<Vec<_>>>()?;

        Ok(points)
    }

    /// Distinct journey ids across all stored points, ordered by first
    /// appearance. Backs journey selection UIs and `GET /journeys`.
    pub fn list_journey_ids(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .db
            .prepare("SELECT journey_id FROM points GROUP BY journey_id ORDER BY MIN(seq)")?;

        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<SqlResult<Vec<String>>>()?;

        Ok(ids)
    }

    /// Number of points recorded for a journey.
    pub fn count_points(&self, journey_id: &str) -> Result<u64> {
        let count: i64 = self.db.query_row(
            "SELECT COUNT(*) FROM points WHERE journey_id = ?1",
            params![journey_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Raw connection access for the snapshot backup.
    pub(crate) fn connection(&self) -> &Connection {
        &self.db
    }
}
