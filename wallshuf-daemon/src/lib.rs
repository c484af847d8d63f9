pub mod control;
pub mod scheduler;
pub mod startup;

pub use control::{await_start, dispatch, run, spawn_signal_listeners, Command, Flow};
pub use scheduler::{Scheduler, SchedulerState, SchedulerStatus};
pub use startup::{report, start_scheduler};
