//! Configuration management for calibration parameter tuning
//!
//! This module provides runtime configuration loading from JSON files,
//! enabling per-probe adjustment without recompilation. Stability
//! thresholds, sampling counts, and serial port settings can all be
//! adjusted via the config file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub stability: StabilityConfig,
    pub session: SessionConfig,
    pub reader: ReaderConfig,
    pub quality: QualityConfig,
    pub sensor: SensorConfig,
}

/// Stability detector parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StabilityConfig {
    /// Number of most recent readings judged per stability assessment
    pub min_samples: usize,
    /// Maximum standard deviation (pH units) across the judged window
    pub max_std_dev: f64,
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            min_samples: 3,
            max_std_dev: 0.1,
        }
    }
}

/// Calibration session polling parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Maximum probe polls per buffer stage before asking the operator to retry
    pub max_polls_per_stage: usize,
    /// Delay between probe polls in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_polls_per_stage: 15,
            poll_interval_ms: 2000,
        }
    }
}

/// Calibrated reader parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// Number of raw readings averaged into one reported measurement
    pub samples_per_reading: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            samples_per_reading: 5,
        }
    }
}

/// Fit quality thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityConfig {
    /// R-squared above which a fit is reported as good (strict inequality)
    pub min_r_squared: f64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            min_r_squared: 0.95,
        }
    }
}

/// Serial probe parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorConfig {
    /// Serial device path (e.g. /dev/ttyUSB0 or COM3)
    pub port: String,
    /// Baud rate of the probe interface
    pub baud_rate: u32,
    /// Serial read timeout in milliseconds
    pub timeout_ms: u64,
    /// Delay between sending the read command and reading the response
    pub response_delay_ms: u64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".to_string(),
            baud_rate: 9600,
            timeout_ms: 1000,
            // The probe takes about a second to produce a measurement
            response_delay_ms: 1000,
        }
    }
}

impl Default for AppConfig {
    /// Default configuration values (fallback if config file not found)
    fn default() -> Self {
        Self {
            stability: StabilityConfig::default(),
            session: SessionConfig::default(),
            reader: ReaderConfig::default(),
            quality: QualityConfig::default(),
            sensor: SensorConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// * `Ok(AppConfig)` - Loaded configuration
    /// * `Err` - If file doesn't exist or JSON is invalid, returns default config
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }
}
