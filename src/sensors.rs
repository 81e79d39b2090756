//! Sensor source trait and a simulated implementation.
//!
//! Real hardware drivers (BME280 climate, SGP30 gas, PMS5003 particulate)
//! live outside this crate; the core consumes them through
//! [`SensorSource`].

use rand::Rng;

use crate::calibration::CalibrationState;
use crate::error::Result;
use crate::reading::{Reading, SubsystemFailures};

/// Produces raw readings and calibration state.
pub trait SensorSource {
    /// Refresh the channels of `reading` for every subsystem that reads
    /// successfully and return the mask of subsystems that failed.
    ///
    /// Channels of a failed subsystem must be left untouched so the
    /// previous value is retained.
    fn read(&mut self, reading: &mut Reading) -> SubsystemFailures;

    /// Read the current calibration baselines from the gas sensor.
    fn read_calibration(&mut self) -> Result<CalibrationState>;

    /// Apply calibration baselines to the gas sensor.
    fn apply_calibration(&mut self, state: CalibrationState) -> Result<()>;
}

/// Simulated sensor source for bring-up without hardware.
///
/// Produces a slow diurnal-ish drift with random jitter and never fails.
pub struct SimulatedSensor {
    calibration: CalibrationState,
    step: u64,
}

impl SimulatedSensor {
    /// Create a simulated source with zeroed calibration.
    pub fn new() -> Self {
        Self {
            calibration: CalibrationState::default(),
            step: 0,
        }
    }
}

impl Default for SimulatedSensor {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorSource for SimulatedSensor {
    fn read(&mut self, reading: &mut Reading) -> SubsystemFailures {
        let mut rng = rand::thread_rng();
        self.step += 1;
        let phase = (self.step as f64 / 300.0).sin();

        reading.temperature = 21.5 + 2.0 * phase + rng.gen_range(-0.2..0.2);
        reading.pressure = 101_325.0 + 120.0 * phase + rng.gen_range(-10.0..10.0);
        reading.humidity = 45.0 + 5.0 * phase + rng.gen_range(-0.5..0.5);

        reading.tvoc = (12.0 + 6.0 * (1.0 + phase)) as u16 + rng.gen_range(0..4);
        reading.eco2 = 400 + (40.0 * (1.0 + phase)) as u16 + rng.gen_range(0..10);

        reading.pm10 = 4 + rng.gen_range(0..3);
        reading.pm25 = 6 + rng.gen_range(0..4);
        reading.pm100 = 7 + rng.gen_range(0..4);

        reading.particles03 = 900 + rng.gen_range(0..120);
        reading.particles05 = 260 + rng.gen_range(0..60);
        reading.particles10 = 40 + rng.gen_range(0..16);
        reading.particles25 = 4 + rng.gen_range(0..4);
        reading.particles50 = rng.gen_range(0..3);
        reading.particles100 = rng.gen_range(0..2);

        SubsystemFailures::empty()
    }

    fn read_calibration(&mut self) -> Result<CalibrationState> {
        // Baselines creep upward as the simulated sensor "ages".
        self.calibration.tvoc_baseline = self.calibration.tvoc_baseline.wrapping_add(1);
        self.calibration.eco2_baseline = self.calibration.eco2_baseline.wrapping_add(1);
        Ok(self.calibration)
    }

    fn apply_calibration(&mut self, state: CalibrationState) -> Result<()> {
        self.calibration = state;
        Ok(())
    }
}
