//! Scheduler dispatch loop.

use std::time::Instant;
use tracing::debug;

use crate::error::{NodeError, Result};
use crate::scheduler::tasks::{OneShot, TaskDescriptor, TaskId, TaskOutcome};

/// Cooperative dispatcher of the registered periodic tasks.
///
/// Scheduling is fixed-period: after a task fires its due time advances by
/// exactly one period, with no compensation for overrun. A tick that runs
/// long can therefore cause an immediate re-fire on the following tick;
/// that catch-up behavior is intentional and keeps the average cadence.
#[derive(Debug, Default)]
pub struct Scheduler {
    tasks: Vec<TaskDescriptor>,
}

impl Scheduler {
    /// Create an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task. Dispatch within a tick follows registration order.
    pub fn register(&mut self, descriptor: TaskDescriptor) -> Result<()> {
        if self.tasks.iter().any(|t| t.id == descriptor.id) {
            return Err(NodeError::Scheduler(format!(
                "duplicate task: {}",
                descriptor.id
            )));
        }
        self.tasks.push(descriptor);
        Ok(())
    }

    /// Look up a registered task.
    pub fn task(&self, id: TaskId) -> Option<&TaskDescriptor> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Whether a task is registered and enabled.
    pub fn is_enabled(&self, id: TaskId) -> bool {
        self.task(id).is_some_and(|t| t.enabled)
    }

    /// Enable a task with its next firing one period from `now`.
    ///
    /// No-op when the task is already enabled (the due time is not
    /// reset).
    pub fn enable(&mut self, id: TaskId, now: Instant) {
        if let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) {
            if !task.enabled {
                task.enabled = true;
                task.next_due = now + task.period;
                debug!(task = %id, "task enabled");
            }
        }
    }

    /// Enable a task due immediately. Used for the startup kick-off of
    /// the announcement task.
    pub fn enable_immediately(&mut self, id: TaskId, now: Instant) {
        if let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) {
            if !task.enabled {
                task.enabled = true;
                task.next_due = now;
                debug!(task = %id, "task enabled, due now");
            }
        }
    }

    /// Disable a task. No-op when already disabled.
    pub fn disable(&mut self, id: TaskId) {
        if let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) {
            if task.enabled {
                task.enabled = false;
                debug!(task = %id, "task disabled");
            }
        }
    }

    /// Run one tick: invoke every enabled task whose due time has been
    /// reached, once each, in registration order.
    ///
    /// On a [`TaskOutcome::Success`] the task's unlock targets are
    /// enabled (idempotently) and a one-shot task retires itself.
    pub fn tick<C>(
        &mut self,
        now: Instant,
        ctx: &mut C,
        mut exec: impl FnMut(TaskId, &mut C) -> TaskOutcome,
    ) {
        let due: Vec<TaskId> = self
            .tasks
            .iter()
            .filter(|t| t.is_due(now))
            .map(|t| t.id)
            .collect();

        for id in due {
            let Some(idx) = self.tasks.iter().position(|t| t.id == id) else {
                continue;
            };
            // An earlier task this tick may have retired this one.
            if !self.tasks[idx].enabled {
                continue;
            }

            debug!(task = %id, "dispatching");
            let outcome = exec(id, ctx);

            let task = &mut self.tasks[idx];
            task.next_due += task.period;

            let retire = match task.one_shot {
                OneShot::Always => true,
                OneShot::OnSuccess => outcome == TaskOutcome::Success,
                OneShot::No => false,
            };
            if retire {
                task.enabled = false;
                debug!(task = %id, "one-shot task retired");
            }

            if outcome == TaskOutcome::Success {
                let unlocks = self.tasks[idx].unlocks.clone();
                for target in unlocks {
                    self.enable(target, now);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use std::time::Duration;

    const SEC: Duration = Duration::from_secs(1);

    fn descriptor(id: TaskId, period_secs: u64, now: Instant) -> TaskDescriptor {
        let mut task = TaskDescriptor::new(id, Duration::from_secs(period_secs), now);
        task.enabled = true;
        task
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let now = Instant::now();
        let mut scheduler = Scheduler::new();
        scheduler.register(descriptor(TaskId::Sample, 1, now)).unwrap();
        let err = scheduler
            .register(descriptor(TaskId::Sample, 5, now))
            .unwrap_err();
        assert!(matches!(err, NodeError::Scheduler(_)));
    }

    #[test]
    fn dispatch_follows_registration_order() {
        let now = Instant::now();
        let mut scheduler = Scheduler::new();
        scheduler.register(descriptor(TaskId::Report, 1, now)).unwrap();
        scheduler.register(descriptor(TaskId::Sample, 1, now)).unwrap();

        let mut order: Vec<TaskId> = Vec::new();
        scheduler.tick(now + SEC, &mut order, |id, order| {
            order.push(id);
            TaskOutcome::Success
        });
        assert_eq!(order, vec![TaskId::Report, TaskId::Sample]);
    }

    #[test]
    fn task_fires_once_per_tick_and_advances_by_period() {
        let now = Instant::now();
        let mut scheduler = Scheduler::new();
        scheduler.register(descriptor(TaskId::Sample, 1, now)).unwrap();

        let mut fires = 0_u32;
        scheduler.tick(now + SEC, &mut fires, |_, fires| {
            *fires += 1;
            TaskOutcome::Success
        });
        assert_eq!(fires, 1);
        assert_eq!(
            scheduler.task(TaskId::Sample).unwrap().next_due,
            now + 2 * SEC
        );

        // Not due again until the next period boundary.
        scheduler.tick(now + SEC, &mut fires, |_, fires| {
            *fires += 1;
            TaskOutcome::Success
        });
        assert_eq!(fires, 1);
    }

    #[test]
    fn overrun_causes_catch_up_firing() {
        let now = Instant::now();
        let mut scheduler = Scheduler::new();
        scheduler.register(descriptor(TaskId::Sample, 10, now)).unwrap();

        let mut fires = 0_u32;
        // A slow tick arrives 25 s late: one fire, due time moves to +20 s,
        // which is already in the past, so the next tick fires again.
        scheduler.tick(now + 25 * SEC, &mut fires, |_, fires| {
            *fires += 1;
            TaskOutcome::Success
        });
        assert_eq!(fires, 1);
        scheduler.tick(now + 26 * SEC, &mut fires, |_, fires| {
            *fires += 1;
            TaskOutcome::Success
        });
        assert_eq!(fires, 2);
    }

    #[test]
    fn enable_is_idempotent_and_does_not_reset_due_time() {
        let now = Instant::now();
        let mut scheduler = Scheduler::new();
        scheduler.register(descriptor(TaskId::Sample, 10, now)).unwrap();
        let due_before = scheduler.task(TaskId::Sample).unwrap().next_due;

        scheduler.enable(TaskId::Sample, now + 5 * SEC);
        assert_eq!(scheduler.task(TaskId::Sample).unwrap().next_due, due_before);
    }

    #[test]
    fn enabling_a_disabled_task_resets_due_time() {
        let now = Instant::now();
        let mut scheduler = Scheduler::new();
        let mut task = TaskDescriptor::new(TaskId::Report, Duration::from_secs(30), now);
        task.enabled = false;
        scheduler.register(task).unwrap();

        scheduler.enable(TaskId::Report, now + 5 * SEC);
        assert!(scheduler.is_enabled(TaskId::Report));
        assert_eq!(
            scheduler.task(TaskId::Report).unwrap().next_due,
            now + 35 * SEC
        );
    }

    #[test]
    fn enable_immediately_makes_task_due_this_tick() {
        let now = Instant::now();
        let mut scheduler = Scheduler::new();
        let task = TaskDescriptor::new(TaskId::Announce, SEC, now);
        scheduler.register(task).unwrap();

        scheduler.enable_immediately(TaskId::Announce, now);
        let mut fires = 0_u32;
        scheduler.tick(now, &mut fires, |_, fires| {
            *fires += 1;
            TaskOutcome::Success
        });
        assert_eq!(fires, 1);
    }

    #[test]
    fn disable_is_idempotent() {
        let now = Instant::now();
        let mut scheduler = Scheduler::new();
        scheduler.register(descriptor(TaskId::Sample, 1, now)).unwrap();
        scheduler.disable(TaskId::Sample);
        scheduler.disable(TaskId::Sample);
        assert!(!scheduler.is_enabled(TaskId::Sample));
    }

    #[test]
    fn one_shot_always_retires_even_on_failure() {
        let now = Instant::now();
        let mut scheduler = Scheduler::new();
        let mut task = descriptor(TaskId::Report, 1, now);
        task.one_shot = OneShot::Always;
        scheduler.register(task).unwrap();

        scheduler.tick(now + SEC, &mut (), |_, ()| TaskOutcome::Failure);
        assert!(!scheduler.is_enabled(TaskId::Report));
    }

    #[test]
    fn one_shot_on_success_retries_after_failure() {
        let now = Instant::now();
        let mut scheduler = Scheduler::new();
        let mut task = descriptor(TaskId::Announce, 1, now);
        task.one_shot = OneShot::OnSuccess;
        scheduler.register(task).unwrap();

        scheduler.tick(now + SEC, &mut (), |_, ()| TaskOutcome::Failure);
        assert!(scheduler.is_enabled(TaskId::Announce));

        scheduler.tick(now + 2 * SEC, &mut (), |_, ()| TaskOutcome::Success);
        assert!(!scheduler.is_enabled(TaskId::Announce));
    }

    #[test]
    fn success_enables_unlock_targets_one_period_out() {
        let now = Instant::now();
        let mut scheduler = Scheduler::new();
        let mut announce = descriptor(TaskId::Announce, 1, now);
        announce.unlocks = vec![TaskId::Sample];
        scheduler.register(announce).unwrap();
        scheduler
            .register(TaskDescriptor::new(TaskId::Sample, SEC, now))
            .unwrap();

        let tick_at = now + SEC;
        scheduler.tick(tick_at, &mut (), |_, ()| TaskOutcome::Success);

        assert!(scheduler.is_enabled(TaskId::Sample));
        // Unlocked, not immediately due: first fire is one period out.
        assert_eq!(
            scheduler.task(TaskId::Sample).unwrap().next_due,
            tick_at + SEC
        );
    }

    #[test]
    fn failure_does_not_unlock() {
        let now = Instant::now();
        let mut scheduler = Scheduler::new();
        let mut announce = descriptor(TaskId::Announce, 1, now);
        announce.unlocks = vec![TaskId::Sample];
        scheduler.register(announce).unwrap();
        scheduler
            .register(TaskDescriptor::new(TaskId::Sample, SEC, now))
            .unwrap();

        scheduler.tick(now + SEC, &mut (), |_, ()| TaskOutcome::Failure);
        assert!(!scheduler.is_enabled(TaskId::Sample));
    }
}
