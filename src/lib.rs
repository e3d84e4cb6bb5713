// pH Probe Calibration Core
// Three-buffer calibration, stability detection, and calibrated reads

// Module declarations
pub mod calibration;
pub mod config;
pub mod error;
pub mod reader;
pub mod sensor;

// Re-exports for convenience
pub use calibration::{
    least_squares, AnchorPoint, BufferStage, CalibrationCurve, CalibrationModel,
    CalibrationPoints, CalibrationSession, CalibrationStore, Quality, SessionProgress,
    SessionState, StabilityDetector, StabilityOutcome,
};
pub use config::AppConfig;
pub use error::{CalibrationError, ErrorCode, SensorError};
pub use reader::{CalibratedReader, PhReading};
pub use sensor::{RawPhSource, SerialPhSensor, SimulatedPhSensor};
