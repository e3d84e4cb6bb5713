// Stability detection over a raw reading window
//
// The detector is a pure function over an accumulated sample window: the
// caller owns the sampling loop and poll cadence, the detector only judges
// whether the most recent readings have settled enough to serve as a
// calibration anchor.

use crate::config::StabilityConfig;

/// Verdict produced by [`StabilityDetector::assess`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StabilityOutcome {
    /// The judged window has settled; `value` is its arithmetic mean
    Stable { value: f64 },
    /// Not enough readings collected yet
    TooFewSamples { collected: usize, required: usize },
    /// Spread across the judged window exceeds the threshold
    TooNoisy { std_dev: f64, max_std_dev: f64 },
}

impl StabilityOutcome {
    /// Check whether the window was judged stable
    pub fn is_stable(&self) -> bool {
        matches!(self, StabilityOutcome::Stable { .. })
    }
}

/// Judges when a raw reading stream has settled
#[derive(Debug, Clone)]
pub struct StabilityDetector {
    /// Number of most recent samples judged per assessment
    min_samples: usize,
    /// Maximum population standard deviation for a stable window
    max_std_dev: f64,
}

impl StabilityDetector {
    /// Create a detector with explicit parameters
    ///
    /// # Arguments
    /// * `min_samples` - Number of most recent samples to judge (clamped to >= 1)
    /// * `max_std_dev` - Maximum standard deviation for a stable window
    pub fn new(min_samples: usize, max_std_dev: f64) -> Self {
        Self {
            min_samples: min_samples.max(1),
            max_std_dev,
        }
    }

    /// Create a detector from the stability configuration section
    pub fn from_config(config: &StabilityConfig) -> Self {
        Self::new(config.min_samples, config.max_std_dev)
    }

    /// Number of most recent samples judged per assessment
    pub fn min_samples(&self) -> usize {
        self.min_samples
    }

    /// Judge whether the accumulated window has settled
    ///
    /// Only the most recent `min_samples` readings are judged: the window
    /// is stable when it holds at least that many readings and their
    /// standard deviation is within `max_std_dev`. A constant window of
    /// exactly `min_samples` readings is immediately stable.
    ///
    /// # Arguments
    /// * `samples` - Readings accumulated so far, oldest first
    ///
    /// # Returns
    /// `Stable` with the window mean, or the reason the window is not usable
    pub fn assess(&self, samples: &[f64]) -> StabilityOutcome {
        if samples.len() < self.min_samples {
            return StabilityOutcome::TooFewSamples {
                collected: samples.len(),
                required: self.min_samples,
            };
        }

        let window = &samples[samples.len() - self.min_samples..];
        let std_dev = population_std_dev(window);
        if std_dev <= self.max_std_dev {
            StabilityOutcome::Stable {
                value: mean(window),
            }
        } else {
            StabilityOutcome::TooNoisy {
                std_dev,
                max_std_dev: self.max_std_dev,
            }
        }
    }
}

impl Default for StabilityDetector {
    fn default() -> Self {
        Self::from_config(&StabilityConfig::default())
    }
}

/// Arithmetic mean of the values (0.0 for an empty slice)
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation of the values (0.0 for an empty slice)
pub fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}
