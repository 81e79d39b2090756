//! Node composition: owned state, task bodies, and the tick loop.

use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::calibration::{CalibrationState, CalibrationStore};
use crate::config::NodeConfig;
use crate::error::{NodeError, Result};
use crate::reading::{ErrorTallies, Reading};
use crate::scheduler::{OneShot, Scheduler, TaskDescriptor, TaskId, TaskOutcome};
use crate::sensors::SensorSource;
use crate::telemetry::payload::{DataReport, StatusReport, discovery_batch};
use crate::telemetry::topics::TopicSet;
use crate::telemetry::{ConnectionManager, ConnectionState, Transport};

/// All mutable state owned by the core. Passed by exclusive reference into
/// each task invocation; there are no ambient globals.
#[derive(Debug, Default)]
pub struct AppState {
    /// Latest snapshot of all sensor channels.
    pub reading: Reading,
    /// Per-subsystem failed-read counters.
    pub tallies: ErrorTallies,
    /// Current calibration baselines.
    pub calibration: CalibrationState,
}

/// The sensor node core: scheduler, connection lifecycle, and the four
/// periodic tasks, running on one logical thread.
pub struct Node<T: Transport, S: SensorSource, P: CalibrationStore> {
    config: NodeConfig,
    topics: TopicSet,
    state: AppState,
    scheduler: Scheduler,
    connection: ConnectionManager,
    transport: T,
    sensors: S,
    store: P,
}

impl<T: Transport, S: SensorSource, P: CalibrationStore> Node<T, S, P> {
    /// Build a node: load and apply persisted calibration, then register
    /// the task set with the announcement task due immediately.
    ///
    /// Task ordering is strict by construction: announcement unlocks
    /// calibration persistence and sampling, and the first completed
    /// sampling attempt unlocks reporting.
    pub fn new(config: NodeConfig, transport: T, sensors: S, mut store: P) -> Result<Self> {
        let now = Instant::now();
        let topics = TopicSet::new(&config.device.base_topic, &config.device.serial);

        let calibration = store.load()?.normalized();
        let mut sensors = sensors;
        sensors.apply_calibration(calibration)?;
        info!(
            bl_tvoc = calibration.tvoc_baseline,
            bl_eco2 = calibration.eco2_baseline,
            "calibration baselines restored"
        );

        let mut scheduler = Scheduler::new();

        let mut announce =
            TaskDescriptor::new(TaskId::Announce, config.schedule.announce_period(), now);
        announce.one_shot = OneShot::OnSuccess;
        announce.unlocks = vec![TaskId::PersistCalibration, TaskId::Sample];
        scheduler.register(announce)?;

        scheduler.register(TaskDescriptor::new(
            TaskId::PersistCalibration,
            config.schedule.calibration_period(),
            now,
        ))?;

        let mut sample = TaskDescriptor::new(TaskId::Sample, config.schedule.sample_period(), now);
        sample.unlocks = vec![TaskId::Report];
        scheduler.register(sample)?;

        scheduler.register(TaskDescriptor::new(
            TaskId::Report,
            config.schedule.report_period(),
            now,
        ))?;

        scheduler.enable_immediately(TaskId::Announce, now);

        let connection = ConnectionManager::new(&config.connection);
        Ok(Self {
            config,
            topics,
            state: AppState {
                calibration,
                ..AppState::default()
            },
            scheduler,
            connection,
            transport,
            sensors,
            store,
        })
    }

    /// Run one cycle of the main loop.
    ///
    /// Connectivity is checked first; when the transport is unavailable
    /// the entire tick's task dispatch is skipped (no partial dispatch).
    pub fn run_tick(&mut self, now: Instant) {
        if let Err(e) = self.connection.ensure_connected(now, &mut self.transport) {
            match e {
                NodeError::ConnectFailed(_) => error!("{e}, backing off"),
                _ => warn!("skipping tick: {e}"),
            }
            return;
        }

        self.process_incoming();

        // The scheduler is taken out for the duration of the tick so task
        // bodies can borrow the node exclusively; bodies never touch the
        // scheduler, cross-task gating goes through declared unlocks.
        let mut scheduler = std::mem::take(&mut self.scheduler);
        scheduler.tick(now, self, |id, node| node.execute(id));
        self.scheduler = scheduler;
    }

    /// Run the main loop forever: tick, then sleep one tick interval.
    pub fn run(&mut self) -> ! {
        let tick = self.config.schedule.tick_interval();
        info!(serial = %self.config.device.serial, "node loop started");
        loop {
            self.run_tick(Instant::now());
            std::thread::sleep(tick);
        }
    }

    fn execute(&mut self, id: TaskId) -> TaskOutcome {
        match id {
            TaskId::Announce => self.run_announce(),
            TaskId::PersistCalibration => self.run_persist_calibration(),
            TaskId::Sample => self.run_sample(),
            TaskId::Report => self.run_report(),
        }
    }

    /// Publish the capability-announcement batch. Retries on its short
    /// period until the whole batch goes out, then retires itself.
    fn run_announce(&mut self) -> TaskOutcome {
        if !self.transport.is_connected() {
            debug!("announcement deferred, transport not connected");
            return TaskOutcome::Failure;
        }

        let batch = discovery_batch(
            &self.config.device.serial,
            &self.config.device.manufacturer,
            &self.config.device.model,
            &self.topics,
        );
        let retain = self.config.reporting.retain_discovery;
        for (topic, channel) in &batch {
            let payload = match serde_json::to_string(channel) {
                Ok(payload) => payload,
                Err(e) => {
                    error!("cannot encode capability announcement: {e}");
                    return TaskOutcome::Failure;
                }
            };
            if let Err(e) = self.transport.publish(topic, &payload, retain) {
                warn!("capability announcement failed, retrying next period: {e}");
                return TaskOutcome::Failure;
            }
        }

        info!(channels = batch.len(), "capability announcement published");
        TaskOutcome::Success
    }

    /// Read calibration back from the sensor, persist it, and publish a
    /// status record. The status publish doubles as the online beacon.
    fn run_persist_calibration(&mut self) -> TaskOutcome {
        let calibration = match self.sensors.read_calibration() {
            Ok(calibration) => calibration,
            Err(e) => {
                // Not a sampling failure: no tally, silently retried.
                debug!("calibration read failed, retrying next period: {e}");
                return TaskOutcome::Failure;
            }
        };

        self.state.calibration = calibration;
        if let Err(e) = self.store.save(calibration) {
            warn!("cannot persist calibration: {e}");
            return TaskOutcome::Failure;
        }
        debug!(
            bl_tvoc = calibration.tvoc_baseline,
            bl_eco2 = calibration.eco2_baseline,
            "calibration persisted"
        );

        if self.transport.is_connected() {
            self.publish_status("online");
        }
        TaskOutcome::Success
    }

    /// Take one sampling attempt. Always completes: subsystem failures
    /// are tallied and their channels keep the previous value.
    fn run_sample(&mut self) -> TaskOutcome {
        let failures = self.sensors.read(&mut self.state.reading);
        self.state.tallies.record(failures);

        if !failures.is_empty() {
            warn!(?failures, "sampling attempt had subsystem failures");
            if self.config.reporting.publish_error_counts && self.transport.is_connected() {
                self.publish_status("sensor_error");
            }
        }

        TaskOutcome::Success
    }

    /// Publish the current reading. No local retry; the next period
    /// resends the then-current reading.
    fn run_report(&mut self) -> TaskOutcome {
        if !self.transport.is_connected() {
            return TaskOutcome::Failure;
        }

        let report = DataReport::from(&self.state.reading);
        let payload = match serde_json::to_string(&report) {
            Ok(payload) => payload,
            Err(e) => {
                error!("cannot encode data report: {e}");
                return TaskOutcome::Failure;
            }
        };
        if let Err(e) = self.transport.publish(self.topics.data(), &payload, false) {
            warn!("data report publish failed, resending next period: {e}");
            return TaskOutcome::Failure;
        }
        debug!("data report published");
        TaskOutcome::Success
    }

    fn publish_status(&mut self, status: &str) {
        let report = StatusReport::new(status, &self.state.tallies, &self.state.calibration);
        let payload = match serde_json::to_string(&report) {
            Ok(payload) => payload,
            Err(e) => {
                error!("cannot encode status report: {e}");
                return;
            }
        };
        if let Err(e) = self.transport.publish(self.topics.status(), &payload, false) {
            warn!("status publish failed: {e}");
        }
    }

    /// Drain inbound messages and dispatch them synchronously by topic.
    fn process_incoming(&mut self) {
        for msg in self.transport.poll_incoming() {
            if msg.topic == self.topics.cmd() {
                self.handle_command(&msg.payload);
            } else if msg.topic == self.topics.echo() {
                debug!("echo: {}", msg.payload);
                if let Err(e) = self.transport.publish(self.topics.echo_reply(), &msg.payload, false)
                {
                    warn!("echo reply failed: {e}");
                }
            } else {
                debug!(topic = %msg.topic, "message on unhandled topic");
            }
        }
    }

    /// Handle a free-text command. Unknown commands are logged and
    /// ignored; nothing is surfaced to the transport.
    fn handle_command(&mut self, payload: &str) {
        if payload.trim().eq_ignore_ascii_case("resetBaseline") {
            info!("resetting calibration baselines");
            let zero = CalibrationState::default();
            if let Err(e) = self.sensors.apply_calibration(zero) {
                warn!("cannot zero sensor baselines: {e}");
                return;
            }
            if let Err(e) = self.store.clear() {
                warn!("cannot clear calibration store: {e}");
                return;
            }
            self.state.calibration = zero;
        } else {
            warn!("ignoring unknown command: {payload:?}");
        }
    }

    /// Latest sensor reading.
    pub fn reading(&self) -> &Reading {
        &self.state.reading
    }

    /// Current error tallies.
    pub fn tallies(&self) -> ErrorTallies {
        self.state.tallies
    }

    /// Current calibration baselines.
    pub fn calibration(&self) -> CalibrationState {
        self.state.calibration
    }

    /// Current transport connection state.
    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Whether a task is currently enabled.
    pub fn task_enabled(&self, id: TaskId) -> bool {
        self.scheduler.is_enabled(id)
    }
}
