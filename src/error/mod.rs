// Error types for the pH calibration tool
//
// This module defines custom error types for sensor and calibration operations,
// providing structured error handling with error codes suitable for operator reporting.

mod calibration;
mod sensor;

pub use calibration::{log_calibration_error, CalibrationError, CalibrationErrorCodes};
pub use sensor::{log_sensor_error, SensorError, SensorErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling across
/// the tool's reporting surfaces.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
