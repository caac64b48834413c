use jobq_core::api::{OutputRendererPlugin, RenderEvent};

/// Human-readable run log on stdout.
pub struct TextRendererPlugin {
    ascii_only: bool,
    verbose: bool,
}

impl TextRendererPlugin {
    /// `verbose` adds a line per attempt start.
    pub fn new(ascii_only: bool, verbose: bool) -> Self {
        Self {
            ascii_only,
            verbose,
        }
    }

    fn mark(&self, success: bool) -> &'static str {
        match (success, self.ascii_only) {
            (true, true) => "[OK]",
            (false, true) => "[FAIL]",
            (true, false) => "✅",
            (false, false) => "❌",
        }
    }

    fn format_event(&self, event: &RenderEvent) -> Option<String> {
        let line = match event {
            RenderEvent::RunStart {
                run_id,
                total_tasks,
                concurrency,
            } => format!(
                "Executing queue: {} task(s), concurrency {} (run {})",
                total_tasks, concurrency, run_id
            ),
            RenderEvent::TaskStart {
                task_id,
                name,
                attempt,
                ..
            } => {
                if !self.verbose {
                    return None;
                }
                if *attempt > 1 {
                    format!("Executing {} ({}), attempt {}", name, task_id, attempt)
                } else {
                    format!("Executing {} ({})", name, task_id)
                }
            }
            RenderEvent::TaskRetry {
                task_id,
                name,
                attempt,
                delay_ms,
                reason,
                ..
            } => format!(
                "Resource locked for '{}' ({}) after attempt {}, retrying in {}ms: {}",
                name, task_id, attempt, delay_ms, reason
            ),
            RenderEvent::TaskComplete { outcome, .. } => {
                if outcome.success {
                    format!(
                        "{} {} ({}) finished in {}ms, attempts {}",
                        self.mark(true),
                        outcome.task_name,
                        outcome.task_id,
                        outcome.duration_ms,
                        outcome.attempts
                    )
                } else {
                    format!(
                        "{} {} ({}) failed at {}: {}",
                        self.mark(false),
                        outcome.task_name,
                        outcome.task_id,
                        outcome.stage,
                        outcome.message
                    )
                }
            }
            RenderEvent::RunEnd { run_id, report } => {
                let mut line = format!(
                    "Run {} finished: {} succeeded, {} failed, {} retried, {} pending ({}ms)",
                    run_id,
                    report.succeeded(),
                    report.failed(),
                    report.retries,
                    report.pending,
                    report.duration_ms
                );
                if report.cancelled {
                    line.push_str(" [cancelled]");
                }
                line
            }
        };
        Some(line)
    }
}

impl OutputRendererPlugin for TextRendererPlugin {
    fn name(&self) -> &str {
        "text-renderer"
    }

    fn format(&self) -> &str {
        "text"
    }

    fn render(&self, event: &RenderEvent) {
        if let Some(line) = self.format_event(event) {
            println!("{}", line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobq_core::api::{Outcome, RunReport, TaskId};

    fn outcome(success: bool) -> Outcome {
        Outcome {
            task_id: TaskId(2),
            task_name: "ArchInstall".to_string(),
            identity: "/usr/bin/pacman -S htop".to_string(),
            stage: if success { "Completed" } else { "Running" }.to_string(),
            success,
            message: if success {
                String::new()
            } else {
                "exit status 1: error: target not found: htop".to_string()
            },
            attempts: 2,
            exit_code: Some(if success { 0 } else { 1 }),
            duration_ms: 5,
            queued_ms: 5,
        }
    }

    #[test]
    fn test_text_renderer_task_complete() {
        let renderer = TextRendererPlugin::new(true, false);
        let ok = renderer
            .format_event(&RenderEvent::TaskComplete {
                run_id: "run".to_string(),
                outcome: outcome(true),
            })
            .unwrap();
        assert_eq!(ok, "[OK] ArchInstall (#2) finished in 5ms, attempts 2");

        let failed = renderer
            .format_event(&RenderEvent::TaskComplete {
                run_id: "run".to_string(),
                outcome: outcome(false),
            })
            .unwrap();
        assert!(failed.starts_with("[FAIL] ArchInstall (#2) failed at Running"));
        assert!(failed.contains("target not found"));
    }

    #[test]
    fn test_text_renderer_task_start_needs_verbose() {
        let event = RenderEvent::TaskStart {
            run_id: "run".to_string(),
            task_id: TaskId(1),
            name: "SystemUpdate".to_string(),
            attempt: 2,
        };
        assert!(TextRendererPlugin::new(true, false).format_event(&event).is_none());
        assert_eq!(
            TextRendererPlugin::new(true, true).format_event(&event).unwrap(),
            "Executing SystemUpdate (#1), attempt 2"
        );
    }

    #[test]
    fn test_text_renderer_run_end_cancelled() {
        let renderer = TextRendererPlugin::new(true, false);
        let report = RunReport {
            run_id: "run".to_string(),
            outcomes: vec![outcome(true)],
            retries: 1,
            duration_ms: 10,
            cancelled: true,
            pending: 3,
        };
        let line = renderer
            .format_event(&RenderEvent::RunEnd {
                run_id: "run".to_string(),
                report,
            })
            .unwrap();
        assert_eq!(
            line,
            "Run run finished: 1 succeeded, 0 failed, 1 retried, 3 pending (10ms) [cancelled]"
        );
    }
}
