//! Durable session storage
//!
//! Persists the Session → Sensor → Measurement → Vector3 hierarchy in
//! SQLite and answers the derived-metric queries the presentation layer
//! charts: peak acceleration magnitude (in g) and peak roll angle (in
//! degrees, signed).
//!
//! Each measurement append is one transaction covering the measurement row
//! and its three vector rows; a failed append leaves previously committed
//! measurements untouched. There are no cross-measurement transactions.

mod migrations;

use crate::error::Result;
use crate::types::Vector3;
use chrono::{DateTime, Utc};
use migrations::run_migrations;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// Standard gravity used to express acceleration magnitudes in g
const STANDARD_GRAVITY: f64 = 9.81;

/// Handle to a persisted session row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub i64);

/// Handle to a persisted sensor row within a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SensorId(pub i64);

/// SQLite-backed session store
///
/// Writes go through the engine worker thread; readers may open their own
/// store instance on the same path for metric queries.
pub struct SessionStore {
    conn: Connection,
}

impl SessionStore {
    /// Open (or create) a session database at the given path
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::initialize(conn)
    }

    /// Open an in-memory store, used by tests
    pub fn open_in_memory() -> Result<Self> {
        Self::initialize(Connection::open_in_memory()?)
    }

    fn initialize(mut conn: Connection) -> Result<Self> {
        if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
            tracing::warn!("Failed to enable WAL mode: {err}");
        }
        conn.pragma_update(None, "foreign_keys", "ON")?;
        run_migrations(&mut conn)?;
        Ok(Self { conn })
    }

    /// Create a new session row
    ///
    /// The caller tracks the active handle; the store never deduplicates,
    /// so calling this twice within one recording occasion is a caller
    /// error.
    pub fn begin_session(&mut self, at: DateTime<Utc>) -> Result<SessionId> {
        self.conn.execute(
            "INSERT INTO sessions (started_at) VALUES (?1)",
            params![at.to_rfc3339()],
        )?;
        Ok(SessionId(self.conn.last_insert_rowid()))
    }

    /// Return the sensor row for a serial within a session, creating it on
    /// first use
    pub fn ensure_sensor(&mut self, session: SessionId, serial: &str) -> Result<SensorId> {
        let existing: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM sensors WHERE session_id = ?1 AND serial = ?2",
                params![session.0, serial],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(id) = existing {
            return Ok(SensorId(id));
        }

        self.conn.execute(
            "INSERT INTO sensors (session_id, serial) VALUES (?1, ?2)",
            params![session.0, serial],
        )?;
        Ok(SensorId(self.conn.last_insert_rowid()))
    }

    /// Append one measurement with its three vectors, atomically
    pub fn append_measurement(
        &mut self,
        sensor: SensorId,
        timestamp: f64,
        acc: Vector3,
        gyro: Vector3,
        magn: Vector3,
    ) -> Result<()> {
        let tx = self.conn.transaction()?;

        tx.execute(
            "INSERT INTO measurements (sensor_id, timestamp) VALUES (?1, ?2)",
            params![sensor.0, timestamp],
        )?;
        let measurement_id = tx.last_insert_rowid();

        for (kind, v) in [("acc", acc), ("gyro", gyro), ("magn", magn)] {
            tx.execute(
                "INSERT INTO vectors (measurement_id, kind, x, y, z)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![measurement_id, kind, v.x, v.y, v.z],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Peak acceleration magnitude across all sensors of a session, in g
    ///
    /// Per measurement: `sqrt(x² + y² + z²) / 9.81` over the acc vector.
    /// An empty session yields 0.
    pub fn max_acceleration_magnitude(&self, session: SessionId) -> Result<f64> {
        let vectors = self.acc_vectors(session, None)?;
        Ok(vectors
            .iter()
            .map(|v| v.magnitude() / STANDARD_GRAVITY)
            .fold(0.0, f64::max))
    }

    /// Peak roll angle across all measurements of a session, in degrees
    ///
    /// Per measurement: `atan2(acc_y, acc_z)`. The maximum is SIGNED; a
    /// large negative lean does not dominate a smaller positive roll.
    pub fn max_roll(&self, session: SessionId) -> Result<f64> {
        let vectors = self.acc_vectors(session, None)?;
        Ok(vectors
            .iter()
            .map(roll_degrees)
            .reduce(f64::max)
            .unwrap_or(0.0))
    }

    /// Ordered `(index, magnitude-in-g)` series for one sensor's chart
    pub fn accelerations(&self, session: SessionId, serial: &str) -> Result<Vec<(usize, f64)>> {
        let vectors = self.acc_vectors(session, Some(serial))?;
        Ok(vectors
            .iter()
            .map(|v| v.magnitude() / STANDARD_GRAVITY)
            .enumerate()
            .collect())
    }

    /// Ordered `(index, roll-in-degrees)` series for one sensor's chart
    pub fn rolls(&self, session: SessionId, serial: &str) -> Result<Vec<(usize, f64)>> {
        let vectors = self.acc_vectors(session, Some(serial))?;
        Ok(vectors
            .iter()
            .map(|v| roll_degrees(v))
            .enumerate()
            .collect())
    }

    /// All sessions with their start timestamps, newest first
    pub fn list_sessions(&self) -> Result<Vec<(SessionId, String)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, started_at FROM sessions ORDER BY started_at DESC")?;
        let mut rows = stmt.query([])?;
        let mut sessions = Vec::new();
        while let Some(row) = rows.next()? {
            sessions.push((SessionId(row.get(0)?), row.get(1)?));
        }
        Ok(sessions)
    }

    /// Acc vectors of a session in measurement order, optionally filtered
    /// to one sensor serial
    fn acc_vectors(&self, session: SessionId, serial: Option<&str>) -> Result<Vec<Vector3>> {
        let sql = "SELECT v.x, v.y, v.z
             FROM vectors v
             JOIN measurements m ON m.id = v.measurement_id
             JOIN sensors s ON s.id = m.sensor_id
             WHERE s.session_id = ?1
               AND v.kind = 'acc'
               AND (?2 IS NULL OR s.serial = ?2)
             ORDER BY m.id";
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params![session.0, serial])?;
        let mut vectors = Vec::new();
        while let Some(row) = rows.next()? {
            vectors.push(Vector3::new(row.get(0)?, row.get(1)?, row.get(2)?));
        }
        Ok(vectors)
    }
}

fn roll_degrees(acc: &Vector3) -> f64 {
    acc.y.atan2(acc.z).to_degrees()
}
