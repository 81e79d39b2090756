//! Task descriptors and scheduling metadata.

use std::time::{Duration, Instant};

/// Identity of each periodic activity, in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskId {
    /// Capability announcement to the automation hub.
    Announce,
    /// Calibration read-back and persistence.
    PersistCalibration,
    /// Sensor sampling into the shared reading.
    Sample,
    /// Data report publish.
    Report,
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Announce => "announce",
            Self::PersistCalibration => "persist_calibration",
            Self::Sample => "sample",
            Self::Report => "report",
        };
        f.write_str(name)
    }
}

/// Whether a task disables itself after firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OneShot {
    /// Repeats every period.
    No,
    /// Disables after the body returns, whatever the outcome.
    Always,
    /// Disables only after a successful body; failures leave it enabled
    /// to retry on the next period.
    OnSuccess,
}

/// Outcome of one task body invocation.
///
/// A sampling attempt that tallies subsystem failures still counts as
/// `Success`: the attempt completed, which is what downstream tasks wait
/// for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The body did its work; unlock targets are enabled.
    Success,
    /// The body could not do its work this period.
    Failure,
}

/// One periodic activity known to the scheduler.
///
/// Created at startup with a fixed period; the enabled flag is the only
/// state that changes at runtime (besides the due time). Cross-task
/// dependencies are declared up front through `unlocks` instead of task
/// bodies reaching into sibling state.
#[derive(Debug, Clone)]
pub struct TaskDescriptor {
    /// Task identity.
    pub id: TaskId,
    /// Fixed period between firings.
    pub period: Duration,
    /// Whether the task is considered for dispatch.
    pub enabled: bool,
    /// Self-disable behavior.
    pub one_shot: OneShot,
    /// Tasks enabled (idempotently) when this task first succeeds.
    pub unlocks: Vec<TaskId>,
    /// Next instant the task is due.
    pub next_due: Instant,
}

impl TaskDescriptor {
    /// Create a disabled, repeating descriptor first due one period from
    /// `now`.
    pub fn new(id: TaskId, period: Duration, now: Instant) -> Self {
        Self {
            id,
            period,
            enabled: false,
            one_shot: OneShot::No,
            unlocks: Vec::new(),
            next_due: now + period,
        }
    }

    /// Whether the task should fire at `now`.
    pub fn is_due(&self, now: Instant) -> bool {
        self.enabled && self.next_due <= now
    }
}
