// Calibration error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Calibration error code constants
///
/// These constants provide a single source of truth for error codes
/// reported by the calibration workflow and record persistence.
///
/// Error code range: 2001-2004
pub struct CalibrationErrorCodes {}

impl CalibrationErrorCodes {
    /// No calibration record exists at the configured path
    pub const NO_CALIBRATION_FILE: i32 = 2001;

    /// Calibration record exists but cannot be parsed
    pub const MALFORMED_CALIBRATION_FILE: i32 = 2002;

    /// Calibration record could not be read or written
    pub const FILE_IO: i32 = 2003;

    /// Session operation invoked in a state that does not allow it
    pub const UNEXPECTED_STATE: i32 = 2004;
}

/// Log a calibration error with structured context
///
/// This function logs calibration errors with structured fields including:
/// - error_code: Numeric error code for programmatic handling
/// - component: The component where the error occurred
/// - message: Human-readable error message
/// - context: Additional contextual information
///
/// The logging is non-blocking and will not panic on failure.
pub fn log_calibration_error(err: &CalibrationError, context: &str) {
    error!(
        "Calibration error in {}: code={}, component=CalibrationSession, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Calibration-related errors
///
/// These errors cover the calibration workflow: session state transitions
/// and persistence of the calibration record. Absence of a record is its
/// own variant, distinct from a record that exists but cannot be parsed,
/// so callers can degrade to raw readings in the first case and refuse to
/// in the second.
///
/// Error code range: 2001-2004
#[derive(Debug, Clone, PartialEq)]
pub enum CalibrationError {
    /// No calibration record exists at the configured path
    NoCalibrationFile { path: String },

    /// Calibration record exists but cannot be parsed into a complete model
    MalformedCalibrationFile { path: String, reason: String },

    /// Calibration record could not be read or written
    FileIo { path: String, reason: String },

    /// Session operation invoked in a state that does not allow it
    UnexpectedState { action: &'static str, state: String },
}

impl ErrorCode for CalibrationError {
    fn code(&self) -> i32 {
        match self {
            CalibrationError::NoCalibrationFile { .. } => {
                CalibrationErrorCodes::NO_CALIBRATION_FILE
            }
            CalibrationError::MalformedCalibrationFile { .. } => {
                CalibrationErrorCodes::MALFORMED_CALIBRATION_FILE
            }
            CalibrationError::FileIo { .. } => CalibrationErrorCodes::FILE_IO,
            CalibrationError::UnexpectedState { .. } => CalibrationErrorCodes::UNEXPECTED_STATE,
        }
    }

    fn message(&self) -> String {
        match self {
            CalibrationError::NoCalibrationFile { path } => {
                format!("No calibration file found: {}", path)
            }
            CalibrationError::MalformedCalibrationFile { path, reason } => {
                format!("Calibration file {} is malformed: {}", path, reason)
            }
            CalibrationError::FileIo { path, reason } => {
                format!("Calibration file I/O failed for {}: {}", path, reason)
            }
            CalibrationError::UnexpectedState { action, state } => {
                format!("Cannot {} in state {}", action, state)
            }
        }
    }
}

impl fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CalibrationError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for CalibrationError {}
