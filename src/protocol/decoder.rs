//! Event and response decoding
//!
//! Pure transforms from raw payload bytes to the typed records in
//! [`super::types`]. A malformed payload yields [`EngineError::Decode`];
//! decoding never panics, and one bad event never blocks the next.

use crate::error::{EngineError, Result};
use crate::protocol::types::{DeviceEvent, EventContainer, MeasurementEvent, ResponseContainer};
use serde::de::DeserializeOwned;

/// Decode a presence event from the connected-devices subscription
pub fn decode_device_event(payload: &[u8]) -> Result<DeviceEvent> {
    serde_json::from_slice(payload).map_err(EngineError::from_json_error)
}

/// Decode a bundled measurement event from a sample subscription
///
/// Returns the envelope so callers can see the event uri and method along
/// with the raw axis triples.
pub fn decode_measurement(payload: &[u8]) -> Result<EventContainer<MeasurementEvent>> {
    serde_json::from_slice(payload).map_err(EngineError::from_json_error)
}

/// Decode a GET response body into its content type
pub fn decode_response<T: DeserializeOwned>(payload: &[u8]) -> Result<T> {
    let container: ResponseContainer<T> =
        serde_json::from_slice(payload).map_err(EngineError::from_json_error)?;
    Ok(container.content)
}
