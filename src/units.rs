//! Raw-to-physical unit conversion
//!
//! Sensors deliver each axis as a signed 16-bit integer spanning the
//! instrument's full-scale range. Scaling maps `i16::MAX` onto the
//! full-scale physical magnitude: `value = raw / (32767 / full_scale)`.
//!
//! The full-scale constants match the firmware configuration the engine
//! subscribes to: an 8 g accelerometer range expressed in m/s² (using the
//! average of two local gravity references), a 500 °/s gyroscope range,
//! and a 5000 µT magnetometer range.

/// Largest raw axis reading
const RAW_FULL_SCALE: f64 = i16::MAX as f64;

/// Average local gravity, m/s²
const LOCAL_GRAVITY: f64 = (9.832 + 9.780) * 0.5;

/// Accelerometer full scale, m/s² (8 g range)
pub const ACC_FULL_SCALE: f64 = LOCAL_GRAVITY * 8.0;

/// Gyroscope full scale, °/s
pub const GYRO_FULL_SCALE: f64 = 500.0;

/// Magnetometer full scale, µT
pub const MAGN_FULL_SCALE: f64 = 5000.0;

/// Scale a raw accelerometer axis reading to m/s²
pub fn scale_acc(raw: i16) -> f64 {
    raw as f64 / (RAW_FULL_SCALE / ACC_FULL_SCALE)
}

/// Scale a raw gyroscope axis reading to °/s
pub fn scale_gyro(raw: i16) -> f64 {
    raw as f64 / (RAW_FULL_SCALE / GYRO_FULL_SCALE)
}

/// Scale a raw magnetometer axis reading to µT
pub fn scale_magn(raw: i16) -> f64 {
    raw as f64 / (RAW_FULL_SCALE / MAGN_FULL_SCALE)
}
