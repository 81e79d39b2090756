//! aqnode: scheduling and connection-lifecycle core for an always-on
//! air-quality sensor node.
//!
//! The node periodically samples climate and air-quality sensors and
//! reports results to a telemetry broker, announcing its reporting schema
//! to an automation hub on startup:
//!
//! Sensors → Sampling → Reading → Reporting → Telemetry broker
//!
//! # Architecture
//!
//! Everything runs on one logical thread of control, driven tick by tick:
//! - **Scheduler**: cooperative, fixed-period dispatcher of the four
//!   periodic tasks (announce, calibration persist, sample, report) with
//!   an explicit unlock graph between them
//! - **Connection manager**: owns the transport connect/retry/backoff
//!   policy and gates every tick's task dispatch
//! - **Node**: owns all mutable state (current reading, error tallies,
//!   calibration) and composes the tasks on top of the scheduler
//!
//! Sensor drivers, the broker wire protocol, and the persistent store are
//! consumed through traits ([`sensors::SensorSource`],
//! [`telemetry::Transport`], [`calibration::CalibrationStore`]) and are
//! not implemented here.

pub mod calibration;
pub mod config;
pub mod error;
pub mod node;
pub mod reading;
pub mod scheduler;
pub mod sensors;
pub mod telemetry;

pub use calibration::{CalibrationState, CalibrationStore, FileCalibrationStore};
pub use config::NodeConfig;
pub use error::{NodeError, Result};
pub use node::Node;
pub use reading::{ErrorTallies, Reading, SubsystemFailures};
pub use scheduler::{Scheduler, TaskDescriptor, TaskId, TaskOutcome};
pub use sensors::SensorSource;
pub use telemetry::{ConnectionState, Transport};
