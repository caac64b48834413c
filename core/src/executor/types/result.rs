use serde::Serialize;

use super::task::TaskId;

/// How one step's process ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum StepStatus {
    /// The process ran and exited with this code.
    Exited(i32),
    /// The process was killed by a signal and has no exit code.
    Terminated,
    /// The process could not be started at all.
    SpawnFailed(String),
}

/// Result of running one step of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepResult {
    pub status: StepStatus,

    /// Combined stdout/stderr tail.
    pub output: String,

    pub duration_ms: u64,
}

impl StepResult {
    pub fn exited(code: i32, output: impl Into<String>) -> Self {
        Self {
            status: StepStatus::Exited(code),
            output: output.into(),
            duration_ms: 0,
        }
    }

    pub fn spawn_failed(message: impl Into<String>) -> Self {
        Self {
            status: StepStatus::SpawnFailed(message.into()),
            output: String::new(),
            duration_ms: 0,
        }
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn success(&self) -> bool {
        self.status == StepStatus::Exited(0)
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self.status {
            StepStatus::Exited(code) => Some(code),
            _ => None,
        }
    }

    /// Short error text, without the captured output.
    pub fn error_message(&self) -> String {
        match &self.status {
            StepStatus::Exited(code) => format!("exit status {code}"),
            StepStatus::Terminated => "terminated by signal".to_string(),
            StepStatus::SpawnFailed(msg) => msg.clone(),
        }
    }

    /// Error text followed by the last non-empty output line, if any.
    pub fn summary(&self) -> String {
        let err = self.error_message();
        match self.output.lines().rev().map(str::trim).find(|l| !l.is_empty()) {
            Some(last) => format!("{err}: {last}"),
            None => err,
        }
    }
}

/// Terminal result for one task. Produced once and never modified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub task_id: TaskId,
    pub task_name: String,

    /// Repository URL or command line the task acted on.
    pub identity: String,

    /// Step label that produced the result, or "Completed".
    pub stage: String,

    pub success: bool,

    /// Error text, empty on success.
    pub message: String,

    /// Number of attempts made, including the final one.
    pub attempts: u32,

    pub exit_code: Option<i32>,

    /// Wall time across all attempts, cooldowns excluded.
    pub duration_ms: u64,

    /// Time from first enqueue until the task settled, queue waits and cooldowns included.
    pub queued_ms: u64,
}

/// Everything a drained run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,

    /// One outcome per terminated task, in submission order.
    pub outcomes: Vec<Outcome>,

    /// Number of transient failures that were re-queued.
    pub retries: u32,

    pub duration_ms: u64,

    /// True when a cancellation signal stopped the run early.
    pub cancelled: bool,

    /// Tasks left in the queue when the run returned.
    pub pending: usize,
}

impl RunReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.success).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.success).count()
    }

    pub fn all_succeeded(&self) -> bool {
        !self.cancelled && self.failed() == 0
    }

    pub fn outcome(&self, id: TaskId) -> Option<&Outcome> {
        self.outcomes.iter().find(|o| o.task_id == id)
    }
}
