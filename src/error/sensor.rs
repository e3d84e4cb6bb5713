// Sensor error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Sensor error code constants
///
/// These constants provide a single source of truth for error codes
/// reported by the probe I/O layer.
///
/// Error code range: 1001-1003
pub struct SensorErrorCodes {}

impl SensorErrorCodes {
    /// Serial port could not be opened
    pub const PORT_UNAVAILABLE: i32 = 1001;

    /// Device produced no response within the timeout
    pub const READ_TIMEOUT: i32 = 1002;

    /// Device response could not be parsed as a reading
    pub const MALFORMED_RESPONSE: i32 = 1003;
}

/// Log a sensor error with structured context
pub fn log_sensor_error(err: &SensorError, context: &str) {
    error!(
        "Sensor error in {}: code={}, component=PhSensor, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Sensor-related errors
///
/// These errors cover the probe I/O seam: opening the serial port,
/// requesting a reading, and parsing the device response. All of them
/// mean "no reading could be obtained"; the caller decides whether to
/// retry or abort.
///
/// Error code range: 1001-1003
#[derive(Debug, Clone, PartialEq)]
pub enum SensorError {
    /// Serial port could not be opened
    PortUnavailable { port: String, reason: String },

    /// Device produced no response within the timeout
    ReadTimeout { port: String },

    /// Device response could not be parsed as a reading
    MalformedResponse { response: String },
}

impl ErrorCode for SensorError {
    fn code(&self) -> i32 {
        match self {
            SensorError::PortUnavailable { .. } => SensorErrorCodes::PORT_UNAVAILABLE,
            SensorError::ReadTimeout { .. } => SensorErrorCodes::READ_TIMEOUT,
            SensorError::MalformedResponse { .. } => SensorErrorCodes::MALFORMED_RESPONSE,
        }
    }

    fn message(&self) -> String {
        match self {
            SensorError::PortUnavailable { port, reason } => {
                format!("Cannot open port {}: {}", port, reason)
            }
            SensorError::ReadTimeout { port } => {
                format!("No response from sensor on {}", port)
            }
            SensorError::MalformedResponse { response } => {
                format!("Unexpected sensor response: {:?}", response)
            }
        }
    }
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SensorError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for SensorError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_stable() {
        let port_err = SensorError::PortUnavailable {
            port: "/dev/ttyUSB0".to_string(),
            reason: "permission denied".to_string(),
        };
        assert_eq!(port_err.code(), 1001);

        let timeout_err = SensorError::ReadTimeout {
            port: "/dev/ttyUSB0".to_string(),
        };
        assert_eq!(timeout_err.code(), 1002);

        let parse_err = SensorError::MalformedResponse {
            response: "ERR".to_string(),
        };
        assert_eq!(parse_err.code(), 1003);
    }

    #[test]
    fn test_messages_carry_context() {
        let err = SensorError::PortUnavailable {
            port: "/dev/ttyUSB0".to_string(),
            reason: "permission denied".to_string(),
        };
        assert!(err.message().contains("/dev/ttyUSB0"));
        assert!(err.message().contains("permission denied"));

        let err = SensorError::MalformedResponse {
            response: "ERR".to_string(),
        };
        assert!(err.message().contains("ERR"));
    }

    #[test]
    fn test_display_includes_code_and_message() {
        let err = SensorError::ReadTimeout {
            port: "COM3".to_string(),
        };
        let display = format!("{}", err);
        assert!(display.contains("code 1002"));
        assert!(display.contains("COM3"));
    }
}
