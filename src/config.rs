//! Configuration types for the sensor node.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level configuration for the node.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Device identity settings.
    pub device: DeviceConfig,
    /// Telemetry broker connection settings.
    pub transport: TransportConfig,
    /// Task periods and the main-loop tick interval.
    pub schedule: ScheduleConfig,
    /// Connect retry and backoff policy.
    pub connection: ConnectionConfig,
    /// Reporting behavior.
    pub reporting: ReportingConfig,
}

/// Device identity, used for topics and capability announcements.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Module serial number (12-character hex string read from the gas
    /// sensor on real hardware).
    pub serial: String,
    /// Base topic prefix for all node topics.
    pub base_topic: String,
    /// Manufacturer name in the announced device descriptor.
    pub manufacturer: String,
    /// Model name in the announced device descriptor.
    pub model: String,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            serial: "000000000000".to_owned(),
            base_topic: "sensor/aq".to_owned(),
            manufacturer: "Asymworks, LLC".to_owned(),
            model: "AirQualityESP".to_owned(),
        }
    }
}

/// Telemetry broker connection settings.
///
/// Consumed by whichever [`Transport`](crate::telemetry::Transport)
/// implementation the node is wired with; the core never dials the broker
/// itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Broker hostname.
    pub host: String,
    /// Broker port.
    pub port: u16,
    /// Broker username.
    pub username: String,
    /// Broker password.
    pub password: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_owned(),
            port: 8883,
            username: String::new(),
            password: String::new(),
        }
    }
}

/// Task periods and the main-loop tick interval.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Capability announcement retry period in seconds.
    pub announce_secs: u64,
    /// Sensor sampling period in seconds.
    pub sample_secs: u64,
    /// Data reporting period in seconds.
    pub report_secs: u64,
    /// Calibration persistence period in seconds.
    pub calibration_secs: u64,
    /// Main loop tick interval in milliseconds.
    pub tick_millis: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            announce_secs: 1,
            sample_secs: 1,
            report_secs: 30,
            calibration_secs: 120,
            tick_millis: 1000,
        }
    }
}

impl ScheduleConfig {
    /// Announcement retry period.
    pub fn announce_period(&self) -> Duration {
        Duration::from_secs(self.announce_secs)
    }

    /// Sampling period.
    pub fn sample_period(&self) -> Duration {
        Duration::from_secs(self.sample_secs)
    }

    /// Reporting period.
    pub fn report_period(&self) -> Duration {
        Duration::from_secs(self.report_secs)
    }

    /// Calibration persistence period.
    pub fn calibration_period(&self) -> Duration {
        Duration::from_secs(self.calibration_secs)
    }

    /// Main loop tick interval.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_millis)
    }
}

/// Connect retry and backoff policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Connect attempts per `ensure_connected` call before surfacing a
    /// connect failure.
    pub retry_budget: u32,
    /// Delay between connect attempts within one call, in seconds.
    pub retry_delay_secs: u64,
    /// Cap for the cross-call reconnect backoff, in seconds.
    pub max_backoff_secs: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            retry_budget: 3,
            retry_delay_secs: 5,
            max_backoff_secs: 300,
        }
    }
}

impl ConnectionConfig {
    /// Delay between connect attempts within one call.
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    /// Cap for the cross-call reconnect backoff.
    pub fn max_backoff(&self) -> Duration {
        Duration::from_secs(self.max_backoff_secs)
    }
}

/// Reporting behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportingConfig {
    /// Publish a status record whenever a sampling attempt has subsystem
    /// failures. Off by default to avoid flooding the status topic.
    pub publish_error_counts: bool,
    /// Publish capability announcements with the retain flag so the hub
    /// sees them after a restart.
    pub retain_discovery: bool,
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            publish_error_counts: false,
            retain_discovery: true,
        }
    }
}

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::error::NodeError::Config(format!("cannot read config: {e}")))?;
        toml::from_str(&content).map_err(|e| crate::error::NodeError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file.
    pub fn save_to_file(&self, path: &std::path::Path) -> crate::error::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::NodeError::Config(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }
}
