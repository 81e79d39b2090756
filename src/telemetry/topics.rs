//! Typed topic builder.
//!
//! Replaces the fixed-size formatted topic buffers of the original
//! firmware with owned strings built once at startup.

/// Discovery-convention prefix expected by the automation hub.
const DISCOVERY_PREFIX: &str = "homeassistant/sensor";

/// All topics used by one node, derived from the base prefix and the
/// device serial.
#[derive(Debug, Clone)]
pub struct TopicSet {
    data: String,
    status: String,
    cmd: String,
    echo: String,
    echo_reply: String,
}

impl TopicSet {
    /// Build the topic set for a device.
    pub fn new(base: &str, serial: &str) -> Self {
        Self {
            data: format!("{base}/{serial}/data"),
            status: format!("{base}/{serial}/status"),
            cmd: format!("{base}/{serial}/cmd"),
            echo: format!("{base}/{serial}/echo"),
            echo_reply: format!("{base}/{serial}/echo/reply"),
        }
    }

    /// Topic for periodic data reports.
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Topic for status reports (also the online beacon).
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Inbound free-text command topic.
    pub fn cmd(&self) -> &str {
        &self.cmd
    }

    /// Inbound echo-request topic.
    pub fn echo(&self) -> &str {
        &self.echo
    }

    /// Topic echoed payloads are replied on.
    pub fn echo_reply(&self) -> &str {
        &self.echo_reply
    }

    /// Discovery config topic for one announced channel.
    pub fn discovery_config(&self, uniq_id: &str) -> String {
        format!("{DISCOVERY_PREFIX}/{uniq_id}/config")
    }
}
