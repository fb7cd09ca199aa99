//! Payload builders for protocol fixtures

use serde_json::json;

pub const TEST_UUID: &str = "6f9619ff-8b86-d011-b42d-00c04fc964ff";

/// Presence event announcing a connected sensor
pub fn presence_post(serial: &str) -> Vec<u8> {
    json!({
        "Uri": "MDS/ConnectedDevices",
        "Response": { "Status": 200 },
        "Method": "POST",
        "Body": {
            "Serial": serial,
            "Connection": { "Type": "BLE", "UUID": TEST_UUID }
        }
    })
    .to_string()
    .into_bytes()
}

/// Presence event announcing a disconnected sensor
pub fn presence_delete(serial: &str) -> Vec<u8> {
    json!({
        "Uri": "MDS/ConnectedDevices",
        "Response": { "Status": 200 },
        "Method": "DEL",
        "Body": { "Serial": serial }
    })
    .to_string()
    .into_bytes()
}

/// Combined inertial measurement event
pub fn measurement(
    serial: &str,
    timestamp_ms: i64,
    acc: (i16, i16, i16),
    gyro: (i16, i16, i16),
    magn: (i16, i16, i16),
) -> Vec<u8> {
    json!({
        "Uri": format!("{serial}/Sample/IntAcc/13"),
        "Method": "PUT",
        "Body": {
            "Acc": { "x": acc.0, "y": acc.1, "z": acc.2 },
            "Gyro": { "x": gyro.0, "y": gyro.1, "z": gyro.2 },
            "Magn": { "x": magn.0, "y": magn.1, "z": magn.2 },
            "Timestamp": timestamp_ms
        }
    })
    .to_string()
    .into_bytes()
}

/// Firmware application info, as returned by `<serial>/Info/App`
pub fn app_info(name: &str, version: &str, company: &str) -> Vec<u8> {
    json!({
        "Content": { "name": name, "version": version, "company": company }
    })
    .to_string()
    .into_bytes()
}

/// Device info, as returned by `<serial>/Info`
pub fn sensor_info(serial: &str, sw_version: &str) -> Vec<u8> {
    json!({
        "Content": {
            "manufacturerName": "Suunto",
            "productName": "SmartSensor2",
            "variant": "MS-2.0",
            "hwCompatibilityId": "C",
            "serial": serial,
            "pcbaSerial": "PCBA00001",
            "sw": sw_version,
            "hw": "2.0",
            "addressInfo": [
                { "address": "0C-8C-DC-00-00-01", "name": "BLE" }
            ],
            "apiLevel": "1"
        }
    })
    .to_string()
    .into_bytes()
}
