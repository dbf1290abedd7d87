//! Cooperative micro-task scheduling for the player and shell.
//!
//! Everything runs on one thread. Tasks are keyed by a virtual clock that
//! jumps to the next task's queue time, so a frame loop at 24 fps runs as
//! fast as the host can execute it.
//!
//! - [`MicroTasksQueue`] - the scheduler and its `run` driver
//! - [`MicroTask`] - one-shot or repeating work
//! - [`StopHandle`] - stops a run at the next dequeue boundary
//!
//! # Examples
//!
//! ```
//! use async_runtime::{MicroTask, MicroTasksQueue, RunEnd};
//!
//! let mut queue = MicroTasksQueue::new();
//! queue.schedule(MicroTask::new(|ctx| {
//!     ctx.stop();
//!     Ok(())
//! }));
//! queue.schedule(MicroTask::new(|_| Ok(())));
//!
//! let summary = queue.run(0, 0, false).unwrap();
//! assert_eq!(summary.executed, 1);
//! assert_eq!(summary.end, RunEnd::Stopped);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod event_loop;
pub mod task_queue;

// Re-export main types at crate root
pub use event_loop::{MicroTaskContext, MicroTasksQueue, RunEnd, RunSummary, VIRTUAL_EPOCH_MS};
pub use task_queue::{MicroTask, StopHandle, TaskId, TaskQueue};
