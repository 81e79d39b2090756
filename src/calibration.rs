//! Gas sensor calibration baselines and their persistent store.
//!
//! Two unsigned 16-bit baselines keep the gas sensor accurate across power
//! cycles. They are loaded once at startup, re-read from the sensor
//! periodically, and written back to the store so a restart can resume
//! from the last known-good values.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

use crate::error::{NodeError, Result};

/// Uninitialized-slot sentinel (erased non-volatile memory reads all-ones).
const SENTINEL: u16 = u16::MAX;

/// Calibration baselines for the gas sensor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalibrationState {
    /// TVOC baseline.
    pub tvoc_baseline: u16,
    /// CO2-equivalent baseline.
    pub eco2_baseline: u16,
}

impl CalibrationState {
    /// Replace all-ones sentinel values with zero.
    ///
    /// A slot that was never written reads back as `0xFFFF`; the sensor
    /// expects zero to mean "no baseline yet".
    pub fn normalized(self) -> Self {
        Self {
            tvoc_baseline: if self.tvoc_baseline == SENTINEL {
                0
            } else {
                self.tvoc_baseline
            },
            eco2_baseline: if self.eco2_baseline == SENTINEL {
                0
            } else {
                self.eco2_baseline
            },
        }
    }
}

/// Persistent key/value store for the calibration baselines.
///
/// Treated as an opaque store with bounded write endurance; wear-leveling
/// is the implementation's concern.
pub trait CalibrationStore {
    /// Load the stored baselines. An uninitialized store yields zeros.
    fn load(&mut self) -> Result<CalibrationState>;
    /// Write the baselines to the store.
    fn save(&mut self, state: CalibrationState) -> Result<()>;
    /// Reset the stored baselines to zero.
    fn clear(&mut self) -> Result<()>;
}

/// Calibration store backed by a JSON file.
pub struct FileCalibrationStore {
    path: PathBuf,
}

impl FileCalibrationStore {
    /// Create a store at the given path. The file is created on first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CalibrationStore for FileCalibrationStore {
    fn load(&mut self) -> Result<CalibrationState> {
        let bytes = match std::fs::read(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("no calibration file at {}, starting from zero", self.path.display());
                return Ok(CalibrationState::default());
            }
            Err(e) => {
                return Err(NodeError::Storage(format!("cannot read calibration: {e}")));
            }
        };

        let state: CalibrationState = serde_json::from_slice(&bytes)
            .map_err(|e| NodeError::Storage(format!("cannot parse calibration: {e}")))?;
        Ok(state.normalized())
    }

    fn save(&mut self, state: CalibrationState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| NodeError::Storage(format!("cannot create store dir: {e}")))?;
        }
        let json = serde_json::to_string(&state)
            .map_err(|e| NodeError::Storage(format!("cannot serialize calibration: {e}")))?;
        std::fs::write(&self.path, json)
            .map_err(|e| NodeError::Storage(format!("cannot write calibration: {e}")))?;
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.save(CalibrationState::default())
    }
}
