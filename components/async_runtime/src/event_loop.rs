//! Micro-task scheduler driver.
//!
//! [`MicroTasksQueue`] runs tasks in virtual-time order. Each dequeue moves
//! the virtual clock forward to the task's queue time, so interval tasks
//! never wait in real time. A run is bounded by wall-clock duration, by task
//! count, or by the stop signal.

use crate::task_queue::{MicroTask, StopHandle, TaskId, TaskQueue};
use core_types::VmError;
use std::time::{Duration, Instant};

/// Virtual clock value when a queue is created (2014-01-01 UTC, in ms)
pub const VIRTUAL_EPOCH_MS: f64 = 1_388_556_000_000.0;

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEnd {
    /// No tasks were left
    Empty,
    /// The task count limit was reached
    CountReached,
    /// The wall-clock duration elapsed
    DurationElapsed,
    /// The stop signal was raised
    Stopped,
}

/// Outcome of [`MicroTasksQueue::run`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Tasks executed during the run
    pub executed: usize,
    /// Why the run ended
    pub end: RunEnd,
    /// Tasks still queued after the run
    pub remaining: usize,
}

impl RunSummary {
    /// Whether the run ended on the stop signal
    pub fn stopped(&self) -> bool {
        self.end == RunEnd::Stopped
    }
}

/// What a running task can do to its queue
pub struct MicroTaskContext<'a> {
    now: f64,
    id: TaskId,
    cancelled: bool,
    queue: &'a mut TaskQueue,
    next_id: &'a mut u64,
    stop: &'a StopHandle,
}

impl<'a> MicroTaskContext<'a> {
    /// Current virtual time in milliseconds
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Identifier of the running task
    pub fn task_id(&self) -> TaskId {
        self.id
    }

    /// Schedule a task relative to the current virtual time
    pub fn schedule(&mut self, task: MicroTask) -> TaskId {
        let id = TaskId(*self.next_id);
        *self.next_id += 1;
        self.queue.push(id, self.now + task.delay(), task);
        id
    }

    /// Cancel a queued task, or the running one when `id` is its own
    pub fn cancel(&mut self, id: TaskId) -> bool {
        if id == self.id {
            self.cancelled = true;
            return true;
        }
        self.queue.remove(id)
    }

    /// Keep the running repeating task from being queued again
    pub fn cancel_current(&mut self) {
        self.cancelled = true;
    }

    /// Raise the queue's stop signal
    pub fn stop(&self) {
        self.stop.stop();
    }

    /// A handle on the queue's stop signal
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }
}

/// The cooperative micro-task scheduler.
///
/// # Examples
///
/// ```
/// use async_runtime::{MicroTask, MicroTasksQueue};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let ticks = Rc::new(Cell::new(0));
/// let mut queue = MicroTasksQueue::new();
/// let counter = Rc::clone(&ticks);
/// queue.schedule(MicroTask::repeating(16.0, move |ctx| {
///     counter.set(counter.get() + 1);
///     if counter.get() == 3 {
///         ctx.cancel_current();
///     }
///     Ok(())
/// }));
///
/// let summary = queue.run(0, 0, false).unwrap();
/// assert_eq!(summary.executed, 3);
/// assert_eq!(ticks.get(), 3);
/// ```
#[derive(Debug)]
pub struct MicroTasksQueue {
    queue: TaskQueue,
    next_id: u64,
    time: f64,
    stop: StopHandle,
}

impl Default for MicroTasksQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl MicroTasksQueue {
    /// Creates an empty queue with the clock at [`VIRTUAL_EPOCH_MS`].
    pub fn new() -> Self {
        Self {
            queue: TaskQueue::new(),
            next_id: 1,
            time: VIRTUAL_EPOCH_MS,
            stop: StopHandle::new(),
        }
    }

    /// Current virtual time in milliseconds
    pub fn now(&self) -> f64 {
        self.time
    }

    /// Schedule a task relative to the current virtual time
    pub fn schedule(&mut self, task: MicroTask) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.queue.push(id, self.time + task.delay(), task);
        id
    }

    /// Remove a queued task
    pub fn cancel(&mut self, id: TaskId) -> bool {
        self.queue.remove(id)
    }

    /// Drop every queued task
    pub fn clear(&mut self) {
        self.queue.clear();
    }

    /// Returns true if no task is queued.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of queued tasks
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// A handle on the stop signal, for hosted code
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Raise the stop signal
    pub fn stop(&self) {
        self.stop.stop();
    }

    /// Run queued tasks.
    ///
    /// `duration_ms` bounds wall-clock time and `count` the number of tasks;
    /// zero means unlimited for both. The stop signal is lowered when the
    /// run starts and checked before every dequeue, so it never interrupts
    /// a task. With `clear_on_exit` the remaining tasks are dropped.
    ///
    /// # Errors
    ///
    /// The first task error ends the run and is returned.
    pub fn run(
        &mut self,
        duration_ms: u64,
        count: usize,
        clear_on_exit: bool,
    ) -> Result<RunSummary, VmError> {
        self.stop.reset();
        let started = Instant::now();
        let limit = Duration::from_millis(duration_ms);
        let mut executed = 0;

        let end = loop {
            if self.stop.is_stopped() {
                break RunEnd::Stopped;
            }
            if self.queue.is_empty() {
                break RunEnd::Empty;
            }
            if count > 0 && executed >= count {
                break RunEnd::CountReached;
            }
            if duration_ms > 0 && started.elapsed() >= limit {
                break RunEnd::DurationElapsed;
            }
            let mut scheduled = match self.queue.pop() {
                Some(scheduled) => scheduled,
                None => break RunEnd::Empty,
            };
            self.time = self.time.max(scheduled.queue_time);

            let mut ctx = MicroTaskContext {
                now: self.time,
                id: scheduled.id,
                cancelled: false,
                queue: &mut self.queue,
                next_id: &mut self.next_id,
                stop: &self.stop,
            };
            let result = scheduled.task.run(&mut ctx);
            let cancelled = ctx.cancelled;
            executed += 1;

            if let Err(error) = result {
                if clear_on_exit {
                    self.queue.clear();
                }
                return Err(error);
            }
            if let Some(interval) = scheduled.task.interval() {
                if !cancelled {
                    self.queue.push(
                        scheduled.id,
                        scheduled.queue_time + interval,
                        scheduled.task,
                    );
                }
            }
        };

        if clear_on_exit {
            self.queue.clear();
        }
        Ok(RunSummary {
            executed,
            end,
            remaining: self.queue.len(),
        })
    }
}
