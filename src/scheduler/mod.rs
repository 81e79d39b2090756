//! Cooperative tick-driven task scheduler.
//!
//! Single logical thread of control: the node's main loop calls
//! [`Scheduler::tick`] once per cycle and the scheduler invokes each due
//! task body to completion before evaluating the next. No preemption, no
//! locks.

pub mod runner;
pub mod tasks;

pub use runner::Scheduler;
pub use tasks::{OneShot, TaskDescriptor, TaskId, TaskOutcome};
