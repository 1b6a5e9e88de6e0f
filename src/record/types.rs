//! # Record Payload Types
//!
//! Sensor and estimator payloads carried by log records. Integer payloads
//! keep the raw units the flight controller logs (mm/s², mrad/s, mm, Pa,
//! mK, ...); the estimator state is stored in SI floating point.

use serde::Serialize;

/// Three-axis vector in sensor frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Vector3<T> {
    pub x: T,
    pub y: T,
    pub z: T,
}

impl<T> Vector3<T> {
    pub const fn new(x: T, y: T, z: T) -> Self {
        Self { x, y, z }
    }
}

/// North-East-Down coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Ned<T> {
    pub north: T,
    pub east: T,
    pub down: T,
}

impl<T> Ned<T> {
    pub const fn new(north: T, east: T, down: T) -> Self {
        Self { north, east, down }
    }
}

/// Geodetic position as reported by the GPS receiver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct GlobalPosition {
    /// Latitude in 1e-9 degrees
    pub latitude: i64,

    /// Longitude in 1e-9 degrees
    pub longitude: i64,

    /// Altitude above mean sea level in millimeters
    pub altitude: i32,
}

/// Attitude quaternion, scalar first
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Quaternion {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Quaternion {
    pub const IDENTITY: Quaternion = Quaternion::new(1.0, 0.0, 0.0, 0.0);

    pub const fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self { w, x, y, z }
    }

    /// Components in scalar-last order `[x, y, z, w]` for math libraries using that convention
    pub fn to_scalar_last(&self) -> [f64; 4] {
        [self.x, self.y, self.z, self.w]
    }

    /// Build from scalar-last components `[x, y, z, w]`
    pub fn from_scalar_last(xyzw: [f64; 4]) -> Self {
        Self::new(xyzw[3], xyzw[0], xyzw[1], xyzw[2])
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// IMU sample: accelerometer, gyroscope and magnetometer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ImuData {
    /// Acceleration in mm/s²
    pub accel: Vector3<i32>,

    /// Angular rate in mrad/s
    pub gyro: Vector3<i32>,

    /// Integrated angle since previous sample in µrad
    pub delta_angle: Vector3<u32>,

    /// Magnetic field in 1e-7 T
    pub mag: Vector3<i16>,
}

/// GPS fix sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct GpsData {
    pub position: GlobalPosition,

    /// Horizontal position accuracy in millimeters
    pub horizontal_accuracy: u32,

    /// Velocity accuracy in mm/s
    pub velocity_accuracy: u32,

    /// Receiver fix quality code
    pub fix: u8,

    /// Number of satellites used in the solution
    pub satellite_count: u8,

    /// Velocity in mm/s
    pub velocity: Ned<i32>,
}

/// Barometer sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BaroData {
    /// Pressure in Pa
    pub pressure: i32,

    /// Temperature in mK
    pub temperature: u32,
}

/// Estimator state snapshot
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct EkfStateData {
    pub attitude: Quaternion,

    /// Gyroscope bias in rad/s
    pub gyro_bias: Vector3<f64>,

    /// Velocity in m/s
    pub velocity: Ned<f64>,

    /// Accelerometer bias in m/s²
    pub accel_bias: Vector3<f64>,

    /// Position relative to the estimator origin in meters
    pub position: Ned<f64>,
}
