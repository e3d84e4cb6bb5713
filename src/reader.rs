// Calibrated reader: repeated raw reads mapped through the model
//
// Collects a fixed number of sequential raw readings from the probe seam
// and reports their mean with a population standard deviation as the
// dispersion estimate. With a model loaded each reading is mapped through
// the fitted curve first; without one the reader degrades to raw
// passthrough rather than failing.

use log::warn;

use crate::calibration::model::CalibrationModel;
use crate::calibration::stability::{mean, population_std_dev};
use crate::error::SensorError;
use crate::sensor::RawPhSource;

/// One reported measurement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhReading {
    /// Mean of the collected samples (calibrated when a model is loaded)
    pub value: f64,
    /// Population standard deviation of the collected samples
    pub dispersion: f64,
    /// Whether the value went through the calibration curve
    pub calibrated: bool,
}

/// Maps raw probe output into reported pH readings
pub struct CalibratedReader<S: RawPhSource> {
    source: S,
    model: Option<CalibrationModel>,
    samples_per_reading: usize,
}

impl<S: RawPhSource> CalibratedReader<S> {
    /// Create a reader over the given probe seam
    ///
    /// # Arguments
    /// * `source` - Raw-reading capability
    /// * `model` - Calibration model, or None to report raw values
    /// * `samples_per_reading` - Raw readings averaged per measurement (clamped to >= 1)
    pub fn new(source: S, model: Option<CalibrationModel>, samples_per_reading: usize) -> Self {
        if model.is_none() {
            warn!("[Reader] No calibration model loaded; reporting raw sensor values");
        }
        Self {
            source,
            model,
            samples_per_reading: samples_per_reading.max(1),
        }
    }

    /// Whether readings go through a calibration curve
    pub fn is_calibrated(&self) -> bool {
        self.model.is_some()
    }

    /// The loaded calibration model, if any
    pub fn model(&self) -> Option<&CalibrationModel> {
        self.model.as_ref()
    }

    /// Take one measurement: collect, map, and summarize
    ///
    /// Collects `samples_per_reading` sequential raw readings. With a
    /// model each reading is mapped through the curve before the mean and
    /// dispersion are computed; without one the raw values are summarized
    /// directly.
    ///
    /// # Errors
    /// A sensor failure mid-collection propagates immediately
    pub fn read(&mut self) -> Result<PhReading, SensorError> {
        let mut samples = Vec::with_capacity(self.samples_per_reading);
        for _ in 0..self.samples_per_reading {
            let raw = self.source.next_raw_reading()?;
            let sample = match &self.model {
                Some(model) => model.apply(raw),
                None => raw,
            };
            samples.push(sample);
        }

        Ok(PhReading {
            value: mean(&samples),
            dispersion: population_std_dev(&samples),
            calibrated: self.model.is_some(),
        })
    }

    /// Take a single raw reading, bypassing calibration entirely
    pub fn read_raw(&mut self) -> Result<f64, SensorError> {
        self.source.next_raw_reading()
    }
}
