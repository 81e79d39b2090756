//! Wire payload shapes.
//!
//! Typed serde structs replace the original firmware's printf-templated
//! JSON buffers; key names are part of the wire contract and must not
//! change.

use serde::{Serialize, Serializer};

use crate::calibration::CalibrationState;
use crate::reading::{ErrorTallies, Reading};
use crate::telemetry::topics::TopicSet;

/// Serialize a climate float with one-decimal precision.
fn one_decimal<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64((value * 10.0).round() / 10.0)
}

/// Periodic data report, published to the data topic.
#[derive(Debug, Clone, Serialize)]
pub struct DataReport {
    #[serde(rename = "t", serialize_with = "one_decimal")]
    temperature: f64,
    #[serde(rename = "p", serialize_with = "one_decimal")]
    pressure: f64,
    #[serde(rename = "rh", serialize_with = "one_decimal")]
    humidity: f64,
    tvoc: u16,
    #[serde(rename = "co2")]
    eco2: u16,
    pm10: u16,
    pm25: u16,
    pm100: u16,
    particles03: u16,
    particles05: u16,
    particles10: u16,
    particles25: u16,
    particles50: u16,
    particles100: u16,
}

impl From<&Reading> for DataReport {
    fn from(reading: &Reading) -> Self {
        Self {
            temperature: reading.temperature,
            pressure: reading.pressure,
            humidity: reading.humidity,
            tvoc: reading.tvoc,
            eco2: reading.eco2,
            pm10: reading.pm10,
            pm25: reading.pm25,
            pm100: reading.pm100,
            particles03: reading.particles03,
            particles05: reading.particles05,
            particles10: reading.particles10,
            particles25: reading.particles25,
            particles50: reading.particles50,
            particles100: reading.particles100,
        }
    }
}

/// Status report, published to the status topic.
///
/// The first status publish after a reconnect doubles as the device's
/// online beacon.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport<'a> {
    status: &'a str,
    sgp30_errors: u32,
    pms5003_errors: u32,
    bl_tvoc: u16,
    bl_eco2: u16,
}

impl<'a> StatusReport<'a> {
    /// Build a status report from the current tallies and baselines.
    pub fn new(status: &'a str, tallies: &ErrorTallies, calibration: &CalibrationState) -> Self {
        Self {
            status,
            sgp30_errors: tallies.gas,
            pms5003_errors: tallies.particulate,
            bl_tvoc: calibration.tvoc_baseline,
            bl_eco2: calibration.eco2_baseline,
        }
    }
}

/// Nested device descriptor shared by all announced channels.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceDescriptor {
    ids: Vec<String>,
    mf: String,
    mdl: String,
    name: String,
}

/// Capability announcement for one reported channel.
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveryConfig {
    #[serde(rename = "dev_cla", skip_serializing_if = "Option::is_none")]
    device_class: Option<&'static str>,
    name: String,
    #[serde(rename = "uniq_id")]
    unique_id: String,
    #[serde(rename = "unit_of_meas")]
    unit: &'static str,
    #[serde(rename = "stat_t")]
    state_topic: String,
    #[serde(rename = "val_tpl")]
    value_template: String,
    #[serde(rename = "dev")]
    device: DeviceDescriptor,
}

impl DiscoveryConfig {
    /// Unique identifier of this announced channel.
    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }
}

/// One announced channel: short name, unit, optional semantic class, the
/// value key into its report payload, and whether it reads off the status
/// topic instead of the data topic.
struct ChannelSpec {
    name: &'static str,
    unit: &'static str,
    device_class: Option<&'static str>,
    value_key: &'static str,
    on_status_topic: bool,
}

/// Every channel the node announces, in publish order.
const CHANNELS: &[ChannelSpec] = &[
    ChannelSpec {
        name: "temperature",
        unit: "°C",
        device_class: Some("temperature"),
        value_key: "t",
        on_status_topic: false,
    },
    ChannelSpec {
        name: "pressure",
        unit: "Pa",
        device_class: Some("pressure"),
        value_key: "p",
        on_status_topic: false,
    },
    ChannelSpec {
        name: "humidity",
        unit: "%",
        device_class: Some("humidity"),
        value_key: "rh",
        on_status_topic: false,
    },
    ChannelSpec {
        name: "tvoc",
        unit: "ppb",
        device_class: None,
        value_key: "tvoc",
        on_status_topic: false,
    },
    ChannelSpec {
        name: "eco2",
        unit: "ppm",
        device_class: Some("carbon_dioxide"),
        value_key: "co2",
        on_status_topic: false,
    },
    ChannelSpec {
        name: "pm10",
        unit: "µg/m³",
        device_class: None,
        value_key: "pm10",
        on_status_topic: false,
    },
    ChannelSpec {
        name: "pm25",
        unit: "µg/m³",
        device_class: None,
        value_key: "pm25",
        on_status_topic: false,
    },
    ChannelSpec {
        name: "pm100",
        unit: "µg/m³",
        device_class: None,
        value_key: "pm100",
        on_status_topic: false,
    },
    ChannelSpec {
        name: "sgp_errors",
        unit: " ",
        device_class: None,
        value_key: "sgp30_errors",
        on_status_topic: true,
    },
    ChannelSpec {
        name: "aqi_errors",
        unit: " ",
        device_class: None,
        value_key: "pms5003_errors",
        on_status_topic: true,
    },
    ChannelSpec {
        name: "baseline_eco2",
        unit: " ",
        device_class: None,
        value_key: "bl_eco2",
        on_status_topic: true,
    },
    ChannelSpec {
        name: "baseline_tvoc",
        unit: " ",
        device_class: None,
        value_key: "bl_tvoc",
        on_status_topic: true,
    },
];

/// Build the full capability-announcement batch for a device.
///
/// Returns `(config_topic, payload)` pairs, one per announced channel.
pub fn discovery_batch(
    serial: &str,
    manufacturer: &str,
    model: &str,
    topics: &TopicSet,
) -> Vec<(String, DiscoveryConfig)> {
    let device = DeviceDescriptor {
        ids: vec![format!("aq_{serial}")],
        mf: manufacturer.to_owned(),
        mdl: model.to_owned(),
        name: format!("AirQuality ESP {serial}"),
    };

    CHANNELS
        .iter()
        .map(|spec| {
            let unique_id = format!("aq_{serial}_{}", spec.name);
            let state_topic = if spec.on_status_topic {
                topics.status()
            } else {
                topics.data()
            };
            let config = DiscoveryConfig {
                device_class: spec.device_class,
                name: unique_id.clone(),
                unique_id: unique_id.clone(),
                unit: spec.unit,
                state_topic: state_topic.to_owned(),
                value_template: format!("{{{{ value_json.{} }}}}", spec.value_key),
                device: device.clone(),
            };
            (topics.discovery_config(&unique_id), config)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn data_report_uses_wire_keys() {
        let reading = Reading {
            temperature: 21.55,
            pressure: 101325.04,
            humidity: 45.0,
            tvoc: 12,
            eco2: 412,
            pm10: 4,
            pm25: 6,
            pm100: 7,
            particles03: 900,
            particles05: 260,
            particles10: 40,
            particles25: 4,
            particles50: 1,
            particles100: 0,
        };
        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&DataReport::from(&reading)).unwrap())
                .unwrap();

        assert_eq!(json["t"], 21.6);
        assert_eq!(json["p"], 101325.0);
        assert_eq!(json["rh"], 45.0);
        assert_eq!(json["co2"], 412);
        assert_eq!(json["particles03"], 900);
        // eCO2 is published under `co2`, never under its struct name.
        assert!(json.get("eco2").is_none());
    }

    #[test]
    fn status_report_uses_wire_keys() {
        let tallies = ErrorTallies {
            gas: 3,
            particulate: 1,
        };
        let calibration = CalibrationState {
            tvoc_baseline: 100,
            eco2_baseline: 200,
        };
        let report = StatusReport::new("online", &tallies, &calibration);
        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&report).unwrap()).unwrap();

        assert_eq!(json["status"], "online");
        assert_eq!(json["sgp30_errors"], 3);
        assert_eq!(json["pms5003_errors"], 1);
        assert_eq!(json["bl_tvoc"], 100);
        assert_eq!(json["bl_eco2"], 200);
    }

    #[test]
    fn discovery_batch_announces_twelve_channels() {
        let topics = TopicSet::new("sensor/aq", "0123456789ab");
        let batch = discovery_batch("0123456789ab", "Asymworks, LLC", "AirQualityESP", &topics);
        assert_eq!(batch.len(), 12);

        let (topic, config) = &batch[0];
        assert_eq!(topic, "homeassistant/sensor/aq_0123456789ab_temperature/config");
        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(config).unwrap()).unwrap();
        assert_eq!(json["dev_cla"], "temperature");
        assert_eq!(json["uniq_id"], "aq_0123456789ab_temperature");
        assert_eq!(json["unit_of_meas"], "°C");
        assert_eq!(json["stat_t"], "sensor/aq/0123456789ab/data");
        assert_eq!(json["val_tpl"], "{{ value_json.t }}");
        assert_eq!(json["dev"]["ids"][0], "aq_0123456789ab");
        assert_eq!(json["dev"]["mdl"], "AirQualityESP");
        assert_eq!(json["dev"]["name"], "AirQuality ESP 0123456789ab");
    }

    #[test]
    fn discovery_omits_device_class_when_absent() {
        let topics = TopicSet::new("sensor/aq", "abc");
        let batch = discovery_batch("abc", "mf", "mdl", &topics);
        let tvoc = batch
            .iter()
            .find(|(_, c)| c.unique_id() == "aq_abc_tvoc")
            .expect("tvoc channel");
        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&tvoc.1).unwrap()).unwrap();
        assert!(json.get("dev_cla").is_none());
    }

    #[test]
    fn error_and_baseline_channels_read_off_status_topic() {
        let topics = TopicSet::new("sensor/aq", "abc");
        let batch = discovery_batch("abc", "mf", "mdl", &topics);
        let errors = batch
            .iter()
            .find(|(_, c)| c.unique_id() == "aq_abc_sgp_errors")
            .expect("sgp_errors channel");
        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&errors.1).unwrap()).unwrap();
        assert_eq!(json["stat_t"], "sensor/aq/abc/status");
        assert_eq!(json["val_tpl"], "{{ value_json.sgp30_errors }}");
    }
}
