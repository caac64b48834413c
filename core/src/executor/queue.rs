use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use super::types::Task;

/// Attempt history carried by a queue entry across re-submissions.
#[derive(Debug, Clone)]
pub struct RetryState {
    /// Attempts already made.
    pub attempts: u32,
    /// Index of the step the next attempt starts at.
    pub resume_step: usize,
    /// Execution time spent in earlier attempts.
    pub elapsed_ms: u64,
    pub first_enqueued: Instant,
}

impl RetryState {
    fn fresh() -> Self {
        Self {
            attempts: 0,
            resume_step: 0,
            elapsed_ms: 0,
            first_enqueued: Instant::now(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct QueuedTask {
    pub task: Arc<Task>,
    pub retry: RetryState,
}

impl QueuedTask {
    pub fn new(task: Arc<Task>) -> Self {
        Self {
            task,
            retry: RetryState::fresh(),
        }
    }

    /// Entry for the next attempt, resuming at `resume_step`.
    pub fn requeue(mut self, resume_step: usize, elapsed_ms: u64) -> Self {
        self.retry.attempts += 1;
        self.retry.resume_step = resume_step;
        self.retry.elapsed_ms = elapsed_ms;
        self
    }
}

/// FIFO of pending entries. Every access goes through the mutex.
#[derive(Debug, Default)]
pub struct TaskQueue {
    inner: Mutex<VecDeque<QueuedTask>>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<QueuedTask>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn push_back(&self, entry: QueuedTask) {
        self.lock().push_back(entry);
    }

    pub fn extend(&self, entries: impl IntoIterator<Item = QueuedTask>) {
        self.lock().extend(entries);
    }

    pub fn pop_front(&self) -> Option<QueuedTask> {
        self.lock().pop_front()
    }

    pub fn peek(&self) -> Option<Arc<Task>> {
        self.lock().front().map(|e| e.task.clone())
    }

    pub fn snapshot(&self) -> Vec<Arc<Task>> {
        self.lock().iter().map(|e| e.task.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::types::{CommandSpec, TaskId, TaskSpec};

    fn entry(id: u64) -> QueuedTask {
        let spec = TaskSpec::command("t", CommandSpec::new("true", Vec::<String>::new()));
        QueuedTask::new(Arc::new(Task::new(TaskId(id), spec).unwrap()))
    }

    #[test]
    fn fifo_with_requeue_at_tail() {
        let q = TaskQueue::new();
        q.push_back(entry(1));
        q.push_back(entry(2));
        assert_eq!(q.peek().map(|t| t.id), Some(TaskId(1)));

        let first = q.pop_front().unwrap();
        assert_eq!(q.len(), 1);
        q.push_back(first.requeue(1, 40));

        let ids: Vec<_> = q.snapshot().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![TaskId(2), TaskId(1)]);

        q.pop_front();
        let retried = q.pop_front().unwrap();
        assert_eq!(retried.retry.attempts, 1);
        assert_eq!(retried.retry.resume_step, 1);
        assert_eq!(retried.retry.elapsed_ms, 40);
        assert!(q.is_empty());
    }
}
