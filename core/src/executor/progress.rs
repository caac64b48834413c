use std::collections::HashMap;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Visual progress monitor for a dispatcher run
///
/// Provides an overall bar and one spinner per in-flight task
pub struct ProgressMonitor {
    /// Multi-progress container
    multi: MultiProgress,
    /// Overall progress bar
    overall: ProgressBar,
    /// Per-task progress spinners
    task_bars: HashMap<String, ProgressBar>,
    /// Whether monitoring is enabled
    enabled: bool,
}

impl ProgressMonitor {
    /// Create a new progress monitor
    ///
    /// # Arguments
    ///
    /// * `total_tasks` - Number of tasks queued when the run starts
    /// * `enabled` - Whether to draw anything (disabled when child output is echoed)
    pub fn new(total_tasks: usize, enabled: bool) -> Self {
        if !enabled {
            return Self {
                multi: MultiProgress::new(),
                overall: ProgressBar::hidden(),
                task_bars: HashMap::new(),
                enabled: false,
            };
        }

        let multi = MultiProgress::new();
        let overall = multi.add(ProgressBar::new(total_tasks as u64));

        overall.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} tasks ({percent}%) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓▒░  "),
        );

        overall.set_message("Starting...");

        Self {
            multi,
            overall,
            task_bars: HashMap::new(),
            enabled: true,
        }
    }

    /// Show a spinner for a task attempt
    pub fn start_task(&mut self, key: &str, attempt: u32) {
        if !self.enabled {
            return;
        }

        let bar = self.multi.add(ProgressBar::new_spinner());
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("  {spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        if attempt > 1 {
            bar.set_message(format!("⏳ {} (attempt {})", key, attempt));
        } else {
            bar.set_message(format!("⏳ {}", key));
        }
        bar.enable_steady_tick(Duration::from_millis(100));

        self.task_bars.insert(key.to_string(), bar);
    }

    /// Mark a task attempt as requeued after a transient failure
    pub fn retry_task(&mut self, key: &str) {
        if !self.enabled {
            return;
        }

        if let Some(bar) = self.task_bars.remove(key) {
            bar.finish_with_message(format!("🔁 {} (requeued)", key));
        }
    }

    /// Mark a task as finished
    pub fn complete_task(&mut self, key: &str, success: bool, duration_ms: u64) {
        if !self.enabled {
            return;
        }

        if let Some(bar) = self.task_bars.remove(key) {
            let icon = if success { "✅" } else { "❌" };
            bar.finish_with_message(format!("{} {} ({}ms)", icon, key, duration_ms));
        }

        self.overall.inc(1);
    }

    /// Finish overall progress
    pub fn finish(&self, success: bool) {
        if !self.enabled {
            return;
        }

        let msg = if success {
            "✅ All tasks completed"
        } else {
            "❌ Some tasks failed"
        };

        self.overall.finish_with_message(msg.to_string());
    }
}

impl Drop for ProgressMonitor {
    fn drop(&mut self) {
        for (_, bar) in self.task_bars.drain() {
            bar.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_monitor_disabled() {
        let mut monitor = ProgressMonitor::new(3, false);

        monitor.start_task("#1 a", 1);
        monitor.retry_task("#1 a");
        monitor.complete_task("#1 a", true, 100);
        monitor.finish(true);
    }

    #[test]
    fn test_progress_monitor_enabled() {
        let mut monitor = ProgressMonitor::new(2, true);

        monitor.start_task("#1 a", 1);
        monitor.start_task("#2 b", 1);
        monitor.retry_task("#2 b");
        monitor.start_task("#2 b", 2);

        monitor.complete_task("#1 a", true, 100);
        monitor.complete_task("#2 b", false, 200);
        monitor.finish(false);
    }
}
