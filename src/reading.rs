//! Current sensor reading, subsystem failure mask, and error tallies.

use bitflags::bitflags;

bitflags! {
    /// Which sensor subsystem(s) failed on a read attempt.
    ///
    /// An empty mask means every channel was refreshed. Channels belonging
    /// to a failed subsystem keep their previous value in the shared
    /// [`Reading`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SubsystemFailures: u8 {
        /// Gas sensor (TVOC / eCO2) read failed.
        const GAS = 1 << 0;
        /// Particulate sensor (PM mass + particle counts) read failed.
        const PARTICULATE = 1 << 1;
    }
}

/// Latest snapshot of all sensor channels.
///
/// One mutable instance is owned by the node and overwritten in place by
/// the sampling task; no history is retained.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reading {
    /// Temperature in °C.
    pub temperature: f64,
    /// Pressure in Pa.
    pub pressure: f64,
    /// Relative humidity in %.
    pub humidity: f64,

    /// Total volatile organic compounds in ppb.
    pub tvoc: u16,
    /// CO2 equivalent in ppm.
    pub eco2: u16,

    /// PM1.0 mass concentration in µg/m³.
    pub pm10: u16,
    /// PM2.5 mass concentration in µg/m³.
    pub pm25: u16,
    /// PM10 mass concentration in µg/m³.
    pub pm100: u16,

    /// Particles > 0.3 µm per 0.1 L of air.
    pub particles03: u16,
    /// Particles > 0.5 µm per 0.1 L of air.
    pub particles05: u16,
    /// Particles > 1.0 µm per 0.1 L of air.
    pub particles10: u16,
    /// Particles > 2.5 µm per 0.1 L of air.
    pub particles25: u16,
    /// Particles > 5.0 µm per 0.1 L of air.
    pub particles50: u16,
    /// Particles > 10.0 µm per 0.1 L of air.
    pub particles100: u16,
}

/// Process-lifetime counters of failed reads per sensor subsystem.
///
/// Incremented only by the sampling task, never decremented, reset on
/// restart. Included in every status report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ErrorTallies {
    /// Failed gas sensor reads.
    pub gas: u32,
    /// Failed particulate sensor reads.
    pub particulate: u32,
}

impl ErrorTallies {
    /// Bump the tally for each subsystem in the failure mask.
    pub fn record(&mut self, failures: SubsystemFailures) {
        if failures.contains(SubsystemFailures::GAS) {
            self.gas += 1;
        }
        if failures.contains(SubsystemFailures::PARTICULATE) {
            self.particulate += 1;
        }
    }
}
