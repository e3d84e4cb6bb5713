// Calibration module - three-buffer calibration workflow and record storage
//
// This module provides the calibration pipeline:
// 1. CalibrationSession: Walks the buffer stages pH 4 -> pH 7 -> pH 10
// 2. StabilityDetector: Judges when each stage's reading window has settled
// 3. least_squares: Turns the three anchors into a CalibrationCurve
// 4. CalibrationStore: Persists the resulting CalibrationModel as JSON

pub mod fit;
pub mod model;
pub mod session;
pub mod stability;
pub mod store;

pub use fit::least_squares;
pub use model::{AnchorPoint, CalibrationCurve, CalibrationModel, CalibrationPoints, Quality};
pub use session::{BufferStage, CalibrationSession, SessionProgress, SessionState};
pub use stability::{StabilityDetector, StabilityOutcome};
pub use store::CalibrationStore;
