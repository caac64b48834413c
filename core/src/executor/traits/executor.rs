use async_trait::async_trait;

use crate::executor::types::{Step, StepResult, Task};

/// Runs task steps as external processes.
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    fn name(&self) -> &str;

    /// Runs `step` of `task` until the process exits.
    ///
    /// Never fails: a process that cannot be started is reported as
    /// [`StepStatus::SpawnFailed`](crate::executor::types::StepStatus::SpawnFailed).
    async fn run_step(&self, task: &Task, step: &Step) -> StepResult;
}
