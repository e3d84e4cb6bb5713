// Sensor module - the raw-reading seam and its probe implementations
//
// The calibration core only needs "produce the next raw numeric reading":
// the RawPhSource trait is that seam. A serial adapter speaks the real
// probe protocol; a simulated probe stands in when no hardware is
// attached. Closures implement the trait directly, which keeps tests free
// of hand-written fakes.

pub mod serial;
pub mod simulated;

pub use serial::SerialPhSensor;
pub use simulated::SimulatedPhSensor;

use crate::error::SensorError;

/// Capability producing raw pH sensor readings
///
/// Implementations block until a reading is available or fail with a
/// `SensorError` when none can be obtained. The core never retries; retry
/// and cadence policy belong to the caller.
pub trait RawPhSource {
    /// Obtain the next raw reading from the probe
    fn next_raw_reading(&mut self) -> Result<f64, SensorError>;
}

impl<F> RawPhSource for F
where
    F: FnMut() -> Result<f64, SensorError>,
{
    fn next_raw_reading(&mut self) -> Result<f64, SensorError> {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_implements_source() {
        let mut readings = vec![7.2, 7.1, 7.0].into_iter();
        let mut source = move || {
            readings.next().ok_or(SensorError::ReadTimeout {
                port: "scripted".to_string(),
            })
        };
        assert_eq!(source.next_raw_reading(), Ok(7.2));
        assert_eq!(source.next_raw_reading(), Ok(7.1));
        assert_eq!(source.next_raw_reading(), Ok(7.0));
        assert!(source.next_raw_reading().is_err());
    }
}
