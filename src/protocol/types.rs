//! Typed protocol payloads
//!
//! Field renames mirror the vendor's JSON schema exactly; the decoder
//! produces these records so downstream code never touches untyped
//! header dictionaries.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request/event method carried by protocol messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Method {
    #[serde(rename = "GET")]
    Get,
    #[serde(rename = "PUT")]
    Put,
    #[serde(rename = "DEL")]
    Delete,
    #[serde(rename = "POST")]
    Post,
    #[serde(rename = "subscribe")]
    Subscribe,
    #[serde(rename = "unsubscribe")]
    Unsubscribe,
}

/// Typed response status code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u16", into = "u16")]
pub enum ResponseCode {
    Ok,
    Created,
    BadRequest,
    NotFound,
    Conflict,
    Unknown(u16),
}

impl ResponseCode {
    /// Whether the code indicates success (2xx)
    pub fn is_success(&self) -> bool {
        u16::from(*self) < 300
    }
}

impl From<u16> for ResponseCode {
    fn from(code: u16) -> Self {
        match code {
            200 => ResponseCode::Ok,
            201 => ResponseCode::Created,
            400 => ResponseCode::BadRequest,
            404 => ResponseCode::NotFound,
            409 => ResponseCode::Conflict,
            other => ResponseCode::Unknown(other),
        }
    }
}

impl From<ResponseCode> for u16 {
    fn from(code: ResponseCode) -> u16 {
        match code {
            ResponseCode::Ok => 200,
            ResponseCode::Created => 201,
            ResponseCode::BadRequest => 400,
            ResponseCode::NotFound => 404,
            ResponseCode::Conflict => 409,
            ResponseCode::Unknown(other) => other,
        }
    }
}

/// Generic event envelope for subscription payloads
#[derive(Debug, Clone, Deserialize)]
pub struct EventContainer<T> {
    #[serde(rename = "Body")]
    pub body: T,
    #[serde(rename = "Uri")]
    pub uri: String,
    #[serde(rename = "Method")]
    pub method: Method,
}

/// Generic response envelope for GET payloads
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseContainer<T> {
    #[serde(rename = "Content")]
    pub content: T,
}

/// Transport details reported alongside a presence "post" event
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConnectionInfo {
    #[serde(rename = "Type")]
    pub connection_type: String,
    #[serde(rename = "UUID")]
    pub uuid: Uuid,
}

/// Body of a device presence event
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceEventBody {
    #[serde(rename = "Serial")]
    pub serial: String,
    #[serde(rename = "Connection")]
    pub connection: Option<ConnectionInfo>,
    #[serde(rename = "DeviceInfo")]
    pub device_info: Option<DeviceInfo>,
}

/// Status wrapper inside a presence event
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct DeviceEventStatus {
    #[serde(rename = "Status")]
    pub status: ResponseCode,
}

/// A device connected or disconnected at the transport layer
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceEvent {
    #[serde(rename = "Uri")]
    pub uri: String,
    #[serde(rename = "Response")]
    pub status: DeviceEventStatus,
    #[serde(rename = "Method")]
    pub method: Method,
    #[serde(rename = "Body")]
    pub body: DeviceEventBody,
}

/// One raw axis triple as delivered on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawVector {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

/// A bundled acc/gyro/magn measurement event body
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MeasurementEvent {
    #[serde(rename = "Acc")]
    pub acc: RawVector,
    #[serde(rename = "Gyro")]
    pub gyro: RawVector,
    #[serde(rename = "Magn")]
    pub magn: RawVector,
    #[serde(rename = "Timestamp")]
    pub timestamp_ms: i64,
}

impl MeasurementEvent {
    /// Event timestamp in seconds
    pub fn timestamp_secs(&self) -> f64 {
        self.timestamp_ms as f64 / 1000.0
    }
}

/// Firmware app info returned by `<serial>/Info/App`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AppInfo {
    pub name: String,
    pub version: String,
    pub company: String,
}

/// Address record inside device/sensor info
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AddressInfo {
    pub address: String,
    pub name: String,
}

/// Device info returned by `<serial>/Info`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SensorInfo {
    #[serde(rename = "manufacturerName")]
    pub manufacturer_name: String,
    #[serde(rename = "brandName")]
    pub brand_name: Option<String>,
    #[serde(rename = "productName")]
    pub product_name: String,
    #[serde(rename = "variant")]
    pub variant_name: String,
    pub design: Option<String>,
    #[serde(rename = "hwCompatibilityId")]
    pub hw_compatibility_id: String,
    pub serial: String,
    #[serde(rename = "pcbaSerial")]
    pub pcba_serial: String,
    #[serde(rename = "sw")]
    pub sw_version: String,
    #[serde(rename = "hw")]
    pub hw_version: String,
    #[serde(rename = "additionalVersionInfo")]
    pub additional_version_info: Option<String>,
    #[serde(rename = "addressInfo")]
    pub address_info: Vec<AddressInfo>,
    #[serde(rename = "apiLevel")]
    pub api_level: String,
}

/// Device info variant embedded in presence events
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeviceInfo {
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Mode")]
    pub mode: i32,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Serial")]
    pub serial: String,
    #[serde(rename = "SwVersion")]
    pub sw_version: String,
    #[serde(rename = "hw")]
    pub hw_version: String,
    #[serde(rename = "hwCompatibilityId")]
    pub hw_compatibility_id: String,
    #[serde(rename = "manufacturerName")]
    pub manufacturer_name: String,
    #[serde(rename = "pcbaSerial")]
    pub pcba_serial: String,
    #[serde(rename = "productName")]
    pub product_name: String,
    #[serde(rename = "variant")]
    pub variant_name: String,
    #[serde(rename = "addressInfo")]
    pub address_info: Vec<AddressInfo>,
}

/// Heart-rate channel payload. Decodes, but no pipeline consumes it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HeartRate {
    pub average: f32,
    #[serde(rename = "rrData")]
    pub rr_data: Vec<i32>,
}

/// ECG channel payload. Decodes, but no pipeline consumes it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Ecg {
    #[serde(rename = "Timestamp")]
    pub timestamp: u32,
    #[serde(rename = "Samples")]
    pub samples: Vec<i32>,
}
