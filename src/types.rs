//! Core data types for the sensor session engine
//!
//! This module contains the fundamental data structures used throughout
//! the crate for representing discovered devices, established connections,
//! and decoded samples.
//!
//! # Main Types
//!
//! - [`DeviceRecord`] - A sensor found by a scan but not yet connected
//! - [`Connection`] - An established sensor connection with firmware info
//! - [`Sample`] - A single scaled, axis-labelled reading
//! - [`SignalGroup`] - The three signal groups a measurement event carries
//! - [`Vector3`] - One (x, y, z) reading in physical units
//!
//! # Identity
//!
//! Discovered devices are keyed by their transient transport identifier
//! (a UUID handed out by the discovery collaborator). Connections are keyed
//! by the sensor's serial number, which is stable across transports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Connection state of a discovered device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// Visible in a scan, not connected
    #[default]
    Unconnected,
    /// A transport connect request has been issued
    Connecting,
}

/// Whether a device scan is in progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanState {
    #[default]
    Off,
    On,
}

/// A sensor in close vicinity, found by a scan but not connected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRecord {
    /// Transport-level identifier for this device
    pub id: Uuid,
    /// Advertised display name, e.g. "Movesense 174630000192"
    pub name: String,
    /// Current connection state; preserved when the device is rediscovered
    pub state: ConnectionState,
}

impl DeviceRecord {
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            state: ConnectionState::Unconnected,
        }
    }
}

/// An established sensor connection
///
/// Created only after a presence event reported the connection and both
/// info queries (firmware app info, device info) succeeded. Keyed by serial
/// number; no two connections share a serial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    /// Stable business identifier of the physical sensor
    pub serial: String,
    /// Transport-level handle for disconnect requests
    pub handle: Uuid,
    /// Software version reported by the device info query
    pub bootloader_version: String,
    /// Firmware version reported by the app info query
    pub firmware_version: String,
    /// Firmware name reported by the app info query
    pub firmware_name: String,
    /// Firmware vendor reported by the app info query
    pub firmware_manufacturer: String,
    /// Wall-clock time of the most recent decoded measurement
    pub last_measurement: Option<DateTime<Utc>>,
}

impl Connection {
    /// Sentinel assigned when recording stops, so liveness displays can
    /// tell an idle connection from one that never produced a measurement.
    pub fn stale_sentinel() -> DateTime<Utc> {
        DateTime::<Utc>::MIN_UTC
    }

    /// Whether a measurement arrived within `window` of `now`
    pub fn is_live(&self, now: DateTime<Utc>, window: chrono::Duration) -> bool {
        match self.last_measurement {
            Some(ts) => now.signed_duration_since(ts) <= window,
            None => false,
        }
    }
}

/// The three signal groups carried by one measurement event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalGroup {
    /// Accelerometer (m/s² after scaling)
    Acc,
    /// Gyroscope (°/s after scaling)
    Gyro,
    /// Magnetometer (µT after scaling)
    Magn,
}

impl SignalGroup {
    /// All groups, in the order a measurement event lists them
    pub const ALL: [SignalGroup; 3] = [SignalGroup::Acc, SignalGroup::Gyro, SignalGroup::Magn];

    /// Per-axis labels used for display and charting
    pub fn axis_labels(&self) -> [&'static str; 3] {
        match self {
            SignalGroup::Acc => ["ax", "ay", "az"],
            SignalGroup::Gyro => ["gx", "gy", "gz"],
            SignalGroup::Magn => ["mx", "my", "mz"],
        }
    }
}

impl std::fmt::Display for SignalGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalGroup::Acc => write!(f, "acc"),
            SignalGroup::Gyro => write!(f, "gyro"),
            SignalGroup::Magn => write!(f, "magn"),
        }
    }
}

/// A single decoded reading, immutable once produced
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Seconds, derived from the event's millisecond timestamp
    pub timestamp: f64,
    /// Axis label, one of ax/ay/az, gx/gy/gz, mx/my/mz
    pub axis: &'static str,
    /// Scaled value in physical units
    pub value: f64,
}

/// One (x, y, z) reading in physical units
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean norm
    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}
