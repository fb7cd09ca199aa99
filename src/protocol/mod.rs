//! Vendor session protocol
//!
//! The protocol client collaborator exchanges request/response and
//! publish/subscribe messages against named resource paths, delivering
//! schema-tagged JSON payloads. This module owns the typed payload
//! definitions ([`types`]) and the decoding functions ([`decoder`]) that
//! turn raw payloads into those records.
//!
//! Resource paths follow the vendor convention:
//!
//! - `MDS/ConnectedDevices` — presence events for connects/disconnects
//! - `<serial>/Info` — device info (hardware, bootloader)
//! - `<serial>/Info/App` — firmware app info (name, version, company)
//! - `<serial>/Sample/IntAcc/13` — bundled acc/gyro/magn measurement feed

pub mod decoder;
pub mod types;

pub use decoder::{decode_device_event, decode_measurement, decode_response};
pub use types::{
    AddressInfo, AppInfo, ConnectionInfo, DeviceEvent, DeviceEventBody, DeviceInfo, Ecg,
    EventContainer, HeartRate, MeasurementEvent, Method, RawVector, ResponseCode,
    ResponseContainer, SensorInfo,
};

/// Presence subscription path
pub const CONNECTED_DEVICES_PATH: &str = "MDS/ConnectedDevices";

/// Measurement subscription path for a sensor serial
pub fn sample_path(serial: &str) -> String {
    format!("{}/Sample/IntAcc/13", serial)
}

/// Device info query path for a sensor serial
pub fn info_path(serial: &str) -> String {
    format!("{}/Info", serial)
}

/// Firmware app info query path for a sensor serial
pub fn app_info_path(serial: &str) -> String {
    format!("{}/Info/App", serial)
}
