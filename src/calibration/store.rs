// Persistence for the calibration record
//
// Absence of the file is a valid state (no calibration yet) and is reported
// as its own error variant so callers can fall back to raw readings. A file
// that exists but cannot be parsed into a complete record is a hard error:
// the operator must recalibrate.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::calibration::model::CalibrationModel;
use crate::error::CalibrationError;

/// Loads and saves the calibration record at a fixed path
#[derive(Debug, Clone)]
pub struct CalibrationStore {
    path: PathBuf,
}

impl CalibrationStore {
    /// Create a store for the given record path
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Path of the calibration record
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist the model, overwriting any previous record
    ///
    /// # Errors
    /// `CalibrationError::FileIo` when the record cannot be written
    pub fn save(&self, model: &CalibrationModel) -> Result<(), CalibrationError> {
        let json = serde_json::to_string_pretty(model).map_err(|err| CalibrationError::FileIo {
            path: self.path.display().to_string(),
            reason: err.to_string(),
        })?;
        fs::write(&self.path, json).map_err(|err| CalibrationError::FileIo {
            path: self.path.display().to_string(),
            reason: err.to_string(),
        })?;
        log::info!("[Store] Calibration data saved to {}", self.path.display());
        Ok(())
    }

    /// Load the persisted model
    ///
    /// # Returns
    /// * `Ok(CalibrationModel)` - Record loaded
    /// * `Err(NoCalibrationFile)` - No record exists yet
    /// * `Err(MalformedCalibrationFile)` - Record exists but is not a complete calibration
    /// * `Err(FileIo)` - Other I/O failure
    pub fn load(&self) -> Result<CalibrationModel, CalibrationError> {
        let contents = fs::read_to_string(&self.path).map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                CalibrationError::NoCalibrationFile {
                    path: self.path.display().to_string(),
                }
            } else {
                CalibrationError::FileIo {
                    path: self.path.display().to_string(),
                    reason: err.to_string(),
                }
            }
        })?;

        let model = serde_json::from_str(&contents).map_err(|err| {
            CalibrationError::MalformedCalibrationFile {
                path: self.path.display().to_string(),
                reason: err.to_string(),
            }
        })?;
        log::info!(
            "[Store] Calibration data loaded from {}",
            self.path.display()
        );
        Ok(model)
    }

    /// Load the model if a record exists
    ///
    /// Absence of the file yields `Ok(None)` so callers can degrade to raw
    /// readings; malformed records and I/O failures remain hard errors.
    pub fn load_optional(&self) -> Result<Option<CalibrationModel>, CalibrationError> {
        match self.load() {
            Ok(model) => Ok(Some(model)),
            Err(CalibrationError::NoCalibrationFile { .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }
}
