// Least-squares curve fitting for the three-buffer calibration
//
// Ordinary least squares over the (raw, target) anchor pairs. The fit is
// total: degenerate inputs (no spread in the raw values, no spread in the
// targets, too few points) are guarded numerically and produce a
// zero-quality curve instead of failing.

use crate::calibration::model::{AnchorPoint, CalibrationCurve};
use crate::calibration::stability::mean;

/// Fit a linear calibration curve through the anchor points
///
/// Computes the ordinary least-squares slope and intercept over the
/// `(raw, target)` pairs, along with the coefficient of determination and
/// the residual standard error of the fit.
///
/// # Arguments
/// * `anchors` - Anchor points, one per buffer solution
///
/// # Returns
/// The fitted curve. Degenerate inputs (identical raw values, no anchors)
/// yield `slope = 0`, `intercept = mean(target)` and zeroed quality
/// metrics rather than an error.
pub fn least_squares(anchors: &[AnchorPoint]) -> CalibrationCurve {
    let raws: Vec<f64> = anchors.iter().map(|a| a.raw).collect();
    let targets: Vec<f64> = anchors.iter().map(|a| a.target).collect();

    let x_mean = mean(&raws);
    let y_mean = mean(&targets);

    let sxx: f64 = raws.iter().map(|x| (x - x_mean).powi(2)).sum();
    if sxx == 0.0 {
        // All raw values identical: no slope can be derived
        return CalibrationCurve {
            slope: 0.0,
            intercept: y_mean,
            r_squared: 0.0,
            std_error: 0.0,
        };
    }

    let sxy: f64 = raws
        .iter()
        .zip(&targets)
        .map(|(x, y)| (x - x_mean) * (y - y_mean))
        .sum();

    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;

    let ss_res: f64 = raws
        .iter()
        .zip(&targets)
        .map(|(x, y)| (y - (slope * x + intercept)).powi(2))
        .sum();
    let ss_tot: f64 = targets.iter().map(|y| (y - y_mean).powi(2)).sum();

    let r_squared = if ss_tot == 0.0 {
        0.0
    } else {
        1.0 - ss_res / ss_tot
    };

    // Residual standard error with n - 2 degrees of freedom
    let n = anchors.len();
    let std_error = if n > 2 {
        (ss_res / (n - 2) as f64).sqrt()
    } else {
        0.0
    };

    CalibrationCurve {
        slope,
        intercept,
        r_squared,
        std_error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchor(raw: f64, target: f64) -> AnchorPoint {
        AnchorPoint { raw, target }
    }

    #[test]
    fn test_perfect_line_recovers_slope_and_intercept() {
        // y = 2x + 1
        let anchors = [anchor(1.0, 3.0), anchor(2.0, 5.0), anchor(3.0, 7.0)];
        let curve = least_squares(&anchors);
        assert!((curve.slope - 2.0).abs() < 1e-9);
        assert!((curve.intercept - 1.0).abs() < 1e-9);
        assert!((curve.r_squared - 1.0).abs() < 1e-9);
        assert!(curve.std_error.abs() < 1e-9);
    }

    #[test]
    fn test_buffer_anchors_fit() {
        // Probe anchors for the 4/7/10 buffers on a slope-3 response
        let anchors = [anchor(1.0, 4.0), anchor(2.0, 7.0), anchor(3.0, 10.0)];
        let curve = least_squares(&anchors);
        assert!((curve.slope - 3.0).abs() < 1e-9);
        assert!((curve.intercept - 1.0).abs() < 1e-9);
        assert!((curve.r_squared - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_noisy_anchors_reduce_r_squared() {
        let anchors = [anchor(1.0, 4.0), anchor(2.0, 8.5), anchor(3.0, 10.0)];
        let curve = least_squares(&anchors);
        assert!(curve.r_squared < 1.0);
        assert!(curve.r_squared > 0.0);
        assert!(curve.std_error > 0.0);
    }

    #[test]
    fn test_identical_raw_values_are_degenerate() {
        // A dead probe reports the same figure in every buffer
        let anchors = [anchor(2.0, 4.0), anchor(2.0, 7.0), anchor(2.0, 10.0)];
        let curve = least_squares(&anchors);
        assert_eq!(curve.slope, 0.0);
        assert!((curve.intercept - 7.0).abs() < 1e-9);
        assert_eq!(curve.r_squared, 0.0);
        assert_eq!(curve.std_error, 0.0);
    }

    #[test]
    fn test_identical_targets_are_degenerate() {
        let anchors = [anchor(1.0, 7.0), anchor(2.0, 7.0), anchor(3.0, 7.0)];
        let curve = least_squares(&anchors);
        assert_eq!(curve.slope, 0.0);
        assert_eq!(curve.r_squared, 0.0);
    }

    #[test]
    fn test_two_points_have_no_residual_dof() {
        let anchors = [anchor(1.0, 4.0), anchor(3.0, 10.0)];
        let curve = least_squares(&anchors);
        assert!((curve.slope - 3.0).abs() < 1e-9);
        assert!((curve.intercept - 1.0).abs() < 1e-9);
        assert_eq!(curve.std_error, 0.0);
    }

    #[test]
    fn test_empty_anchors_do_not_crash() {
        let curve = least_squares(&[]);
        assert_eq!(curve.slope, 0.0);
        assert_eq!(curve.intercept, 0.0);
        assert_eq!(curve.r_squared, 0.0);
        assert_eq!(curve.std_error, 0.0);
    }

    #[test]
    fn test_descending_probe_response() {
        // Probes with an inverted response still fit cleanly
        let anchors = [anchor(3.0, 4.0), anchor(2.0, 7.0), anchor(1.0, 10.0)];
        let curve = least_squares(&anchors);
        assert!((curve.slope + 3.0).abs() < 1e-9);
        assert!((curve.r_squared - 1.0).abs() < 1e-9);
    }
}
