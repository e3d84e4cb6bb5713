// Calibration model: anchors, fitted curve, and the persisted record
//
// The model mirrors the on-disk JSON record field for field: a calibration
// date, the three buffer anchor points, and the fitted curve. It is created
// once per successful calibration session and read-only afterwards; a new
// session overwrites the record wholesale.

use chrono::Local;

/// One buffer solution's settled raw value paired with its known true pH
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AnchorPoint {
    /// Settled raw sensor value in the buffer
    pub raw: f64,
    /// Known true pH of the buffer (4.0, 7.0, or 10.0)
    pub target: f64,
}

/// Linear raw-to-pH mapping with fit quality metrics
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CalibrationCurve {
    pub slope: f64,
    pub intercept: f64,
    /// Coefficient of determination of the fit
    pub r_squared: f64,
    /// Residual standard error of the fit
    pub std_error: f64,
}

impl CalibrationCurve {
    /// Map a raw sensor value through the curve
    pub fn apply(&self, raw: f64) -> f64 {
        self.slope * raw + self.intercept
    }
}

/// The three anchor points keyed by buffer solution
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CalibrationPoints {
    pub ph_4: AnchorPoint,
    pub ph_7: AnchorPoint,
    pub ph_10: AnchorPoint,
}

/// Fit quality verdict
///
/// Advisory only: a Poor model is still saved and applied, the verdict
/// tells the operator to consider recalibrating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quality {
    Good,
    Poor,
}

/// Persisted calibration record
///
/// Serialized field names are the record format: `calibration_date`,
/// `calibration_points.ph_4/ph_7/ph_10.{raw,target}` and
/// `calibration_curve.{slope,intercept,r_squared,std_error}`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CalibrationModel {
    /// Wall-clock time of the fit, formatted %Y-%m-%d %H:%M:%S
    pub calibration_date: String,
    pub calibration_points: CalibrationPoints,
    pub calibration_curve: CalibrationCurve,
}

impl CalibrationModel {
    /// Create a model stamped with the current local time
    pub fn new(points: CalibrationPoints, curve: CalibrationCurve) -> Self {
        Self {
            calibration_date: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            calibration_points: points,
            calibration_curve: curve,
        }
    }

    /// Map a raw sensor value through the fitted curve
    pub fn apply(&self, raw: f64) -> f64 {
        self.calibration_curve.apply(raw)
    }

    /// Judge fit quality against an R-squared threshold
    ///
    /// Strict inequality: a fit with `r_squared` exactly at the threshold
    /// is judged Poor.
    pub fn evaluate_quality(&self, min_r_squared: f64) -> Quality {
        if self.calibration_curve.r_squared > min_r_squared {
            Quality::Good
        } else {
            Quality::Poor
        }
    }
}
