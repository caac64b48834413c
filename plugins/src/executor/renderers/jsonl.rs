use chrono::Local;
use jobq_core::api::{OutputRendererPlugin, RenderEvent};
use serde_json::{json, Value};

/// One JSON object per run event on stdout, one event per line.
#[derive(Debug, Default)]
pub struct JsonlRendererPlugin;

impl JsonlRendererPlugin {
    pub fn new() -> Self {
        Self
    }

    fn event_to_json(&self, event: &RenderEvent) -> Value {
        let ts = Local::now().to_rfc3339();
        match event {
            RenderEvent::RunStart {
                run_id,
                total_tasks,
                concurrency,
            } => json!({
                "v": 1,
                "event_type": "run.start",
                "ts": ts,
                "run_id": run_id,
                "metadata": {
                    "total_tasks": total_tasks,
                    "concurrency": concurrency,
                }
            }),
            RenderEvent::TaskStart {
                run_id,
                task_id,
                name,
                attempt,
            } => json!({
                "v": 1,
                "event_type": "task.start",
                "ts": ts,
                "run_id": run_id,
                "task_id": task_id,
                "metadata": {
                    "name": name,
                    "attempt": attempt,
                }
            }),
            RenderEvent::TaskRetry {
                run_id,
                task_id,
                name,
                attempt,
                delay_ms,
                reason,
            } => json!({
                "v": 1,
                "event_type": "task.retry",
                "ts": ts,
                "run_id": run_id,
                "task_id": task_id,
                "metadata": {
                    "name": name,
                    "attempt": attempt,
                    "delay_ms": delay_ms,
                    "reason": reason,
                }
            }),
            RenderEvent::TaskComplete { run_id, outcome } => json!({
                "v": 1,
                "event_type": "task.end",
                "ts": ts,
                "run_id": run_id,
                "task_id": outcome.task_id,
                "code": outcome.exit_code,
                "metadata": outcome,
            }),
            RenderEvent::RunEnd { run_id, report } => json!({
                "v": 1,
                "event_type": "run.end",
                "ts": ts,
                "run_id": run_id,
                "metadata": {
                    "succeeded": report.succeeded(),
                    "failed": report.failed(),
                    "retries": report.retries,
                    "pending": report.pending,
                    "cancelled": report.cancelled,
                    "duration_ms": report.duration_ms,
                }
            }),
        }
    }
}

impl OutputRendererPlugin for JsonlRendererPlugin {
    fn name(&self) -> &str {
        "jsonl-renderer"
    }

    fn format(&self) -> &str {
        "jsonl"
    }

    fn render(&self, event: &RenderEvent) {
        let value = self.event_to_json(event);
        println!("{}", serde_json::to_string(&value).unwrap_or_else(|_| "{}".into()));
    }
}
