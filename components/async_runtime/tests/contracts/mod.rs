//! Contract tests for async_runtime
//!
//! These pin the scheduling surface used by the player and the shell.

use async_runtime::{
    MicroTask, MicroTaskContext, MicroTasksQueue, RunEnd, RunSummary, StopHandle, TaskId,
    TaskQueue,
};
use core_types::VmError;

#[test]
fn test_queue_new_is_empty() {
    let queue = MicroTasksQueue::default();
    assert!(queue.is_empty());
    assert_eq!(queue.len(), 0);
}

#[test]
fn test_schedule_returns_distinct_ids() {
    let mut queue = MicroTasksQueue::new();
    let a: TaskId = queue.schedule(MicroTask::new(|_| Ok(())));
    let b: TaskId = queue.schedule(MicroTask::new(|_| Ok(())));
    assert_ne!(a, b);
    assert_eq!(queue.len(), 2);
}

#[test]
fn test_run_returns_summary() {
    let mut queue = MicroTasksQueue::new();
    queue.schedule(MicroTask::new(|_| Ok(())));
    let summary: RunSummary = queue.run(0, 0, false).unwrap();
    assert_eq!(
        summary,
        RunSummary {
            executed: 1,
            end: RunEnd::Empty,
            remaining: 0
        }
    );
}

#[test]
fn test_callback_signature() {
    fn callback(ctx: &mut MicroTaskContext<'_>) -> Result<(), VmError> {
        let _: TaskId = ctx.task_id();
        let _: StopHandle = ctx.stop_handle();
        ctx.cancel_current();
        Ok(())
    }
    let mut queue = MicroTasksQueue::new();
    queue.schedule(MicroTask::repeating(5.0, callback));
    let summary = queue.run(0, 10, false).unwrap();
    assert_eq!(summary.executed, 1);
    assert!(queue.is_empty());
}

#[test]
fn test_interval_accessor() {
    assert_eq!(MicroTask::new(|_| Ok(())).interval(), None);
    assert_eq!(MicroTask::repeating(-3.0, |_| Ok(())).interval(), Some(0.0));
}

#[test]
fn test_task_queue_public_surface() {
    let mut queue = TaskQueue::new();
    assert!(queue.is_empty());
    assert_eq!(queue.peek_time(), None);
    assert!(!queue.remove(TaskId(9)));
    queue.clear();
    assert_eq!(queue.len(), 0);
}
