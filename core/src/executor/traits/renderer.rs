use crate::executor::types::{Outcome, RunReport, TaskId};

/// Output renderer plugin (controls how run events are displayed).
pub trait OutputRendererPlugin: Send + Sync {
    fn name(&self) -> &str;
    fn format(&self) -> &str;
    fn render(&self, event: &RenderEvent);
}

/// Run events, in the order the dispatcher emits them.
#[derive(Debug, Clone)]
pub enum RenderEvent {
    RunStart {
        run_id: String,
        total_tasks: usize,
        concurrency: usize,
    },
    TaskStart {
        run_id: String,
        task_id: TaskId,
        name: String,
        attempt: u32,
    },
    TaskRetry {
        run_id: String,
        task_id: TaskId,
        name: String,
        attempt: u32,
        delay_ms: u64,
        reason: String,
    },
    TaskComplete {
        run_id: String,
        outcome: Outcome,
    },
    RunEnd {
        run_id: String,
        report: RunReport,
    },
}
