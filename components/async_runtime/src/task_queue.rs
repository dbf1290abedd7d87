//! Micro-tasks and the time-ordered queue holding them.
//!
//! Tasks are keyed by their virtual queue time. Tasks due at the same time
//! run in the order they were scheduled.

use crate::event_loop::MicroTaskContext;
use core_types::VmError;
use std::cell::Cell;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::rc::Rc;

/// Identifier of a scheduled task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub u64);

type Callback = Box<dyn FnMut(&mut MicroTaskContext<'_>) -> Result<(), VmError>>;

/// A unit of cooperative work.
///
/// A task runs once after an optional delay, or repeatedly every `interval`
/// milliseconds of virtual time until it cancels itself.
pub struct MicroTask {
    callback: Callback,
    delay: f64,
    interval: Option<f64>,
}

impl MicroTask {
    /// Creates a task that runs once.
    pub fn new<F>(f: F) -> Self
    where
        F: FnMut(&mut MicroTaskContext<'_>) -> Result<(), VmError> + 'static,
    {
        Self {
            callback: Box::new(f),
            delay: 0.0,
            interval: None,
        }
    }

    /// Creates a task that runs every `interval_ms` of virtual time.
    ///
    /// The first run is due immediately unless a delay is set.
    pub fn repeating<F>(interval_ms: f64, f: F) -> Self
    where
        F: FnMut(&mut MicroTaskContext<'_>) -> Result<(), VmError> + 'static,
    {
        Self {
            callback: Box::new(f),
            delay: 0.0,
            interval: Some(interval_ms.max(0.0)),
        }
    }

    /// Delay the first run by `delay_ms`
    pub fn with_delay(mut self, delay_ms: f64) -> Self {
        self.delay = delay_ms.max(0.0);
        self
    }

    /// Repeat interval, if the task repeats
    pub fn interval(&self) -> Option<f64> {
        self.interval
    }

    pub(crate) fn delay(&self) -> f64 {
        self.delay
    }

    pub(crate) fn run(&mut self, ctx: &mut MicroTaskContext<'_>) -> Result<(), VmError> {
        (self.callback)(ctx)
    }
}

impl std::fmt::Debug for MicroTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "MicroTask {{ delay: {}, interval: {:?} }}",
            self.delay, self.interval
        )
    }
}

/// A task with its place in the queue
#[derive(Debug)]
pub(crate) struct ScheduledTask {
    pub(crate) id: TaskId,
    pub(crate) queue_time: f64,
    seq: u64,
    pub(crate) task: MicroTask,
}

impl PartialEq for ScheduledTask {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ScheduledTask {}

impl PartialOrd for ScheduledTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledTask {
    // Reversed so the max-heap pops the earliest task first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .queue_time
            .total_cmp(&self.queue_time)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Queue of tasks ordered by queue time, FIFO among equal times
#[derive(Debug, Default)]
pub struct TaskQueue {
    heap: BinaryHeap<ScheduledTask>,
    next_seq: u64,
}

impl TaskQueue {
    /// Creates a new empty TaskQueue.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, id: TaskId, queue_time: f64, task: MicroTask) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(ScheduledTask {
            id,
            queue_time,
            seq,
            task,
        });
    }

    pub(crate) fn pop(&mut self) -> Option<ScheduledTask> {
        self.heap.pop()
    }

    /// Queue time of the next task
    pub fn peek_time(&self) -> Option<f64> {
        self.heap.peek().map(|t| t.queue_time)
    }

    /// Drop task `id` if it is queued
    pub fn remove(&mut self, id: TaskId) -> bool {
        let before = self.heap.len();
        self.heap.retain(|t| t.id != id);
        self.heap.len() != before
    }

    /// Drop every task
    pub fn clear(&mut self) {
        self.heap.clear();
    }

    /// Returns true if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Returns the number of tasks in the queue.
    pub fn len(&self) -> usize {
        self.heap.len()
    }
}

/// Capability to stop a running queue at its next dequeue boundary.
///
/// Clones share the flag.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    flag: Rc<Cell<bool>>,
}

impl StopHandle {
    /// Creates a lowered flag
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the stop signal
    pub fn stop(&self) {
        self.flag.set(true);
    }

    /// Whether the signal is raised
    pub fn is_stopped(&self) -> bool {
        self.flag.get()
    }

    pub(crate) fn reset(&self) {
        self.flag.set(false);
    }
}
