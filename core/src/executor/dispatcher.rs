use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinError;
use uuid::Uuid;

use crate::error::SubmitError;

use super::classifier::ClassifierRegistry;
use super::progress::ProgressMonitor;
use super::queue::{QueuedTask, TaskQueue};
use super::retry::FixedCooldown;
use super::traits::{
    Classification, Failure, OutputRendererPlugin, RenderEvent, RetryStrategyPlugin, TaskExecutor,
};
use super::types::{
    Outcome, RunReport, StepStatus, Task, TaskId, TaskSpec, COMPLETED_STAGE,
};

/// What one attempt decided about its task.
enum Verdict {
    Done(Outcome),
    Retry(QueuedTask),
}

/// Everything a spawned attempt needs, detached from the dispatcher's lifetime.
#[derive(Clone)]
struct AttemptContext {
    executor: Arc<dyn TaskExecutor>,
    classifiers: Arc<ClassifierRegistry>,
    retry_strategy: Arc<dyn RetryStrategyPlugin>,
    renderer: Option<Arc<dyn OutputRendererPlugin>>,
}

impl AttemptContext {
    fn emit(&self, event: RenderEvent) {
        if let Some(renderer) = &self.renderer {
            renderer.render(&event);
        }
    }
}

/// Owns the pending queue and drains it with a bounded pool of attempts.
///
/// A single driver loop does all scheduling: it pops entries while fewer than
/// `concurrency` attempts are in flight, and re-appends transient failures to
/// the tail once their cooldown has elapsed. The run ends only when the queue
/// is empty and no attempt is in flight.
pub struct Dispatcher {
    queue: TaskQueue,
    next_id: AtomicU64,
    ctx: AttemptContext,
    progress_bar: bool,
}

pub struct DispatcherBuilder {
    executor: Arc<dyn TaskExecutor>,
    classifiers: ClassifierRegistry,
    retry_strategy: Arc<dyn RetryStrategyPlugin>,
    renderer: Option<Arc<dyn OutputRendererPlugin>>,
    progress_bar: bool,
}

impl DispatcherBuilder {
    pub fn new(executor: Arc<dyn TaskExecutor>) -> Self {
        Self {
            executor,
            classifiers: ClassifierRegistry::default(),
            retry_strategy: Arc::new(FixedCooldown::default()),
            renderer: None,
            progress_bar: false,
        }
    }

    pub fn classifiers(mut self, classifiers: ClassifierRegistry) -> Self {
        self.classifiers = classifiers;
        self
    }

    pub fn retry_strategy(mut self, strategy: Arc<dyn RetryStrategyPlugin>) -> Self {
        self.retry_strategy = strategy;
        self
    }

    pub fn renderer(mut self, renderer: Arc<dyn OutputRendererPlugin>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn progress_bar(mut self, enabled: bool) -> Self {
        self.progress_bar = enabled;
        self
    }

    pub fn build(self) -> Dispatcher {
        Dispatcher {
            queue: TaskQueue::new(),
            next_id: AtomicU64::new(1),
            ctx: AttemptContext {
                executor: self.executor,
                classifiers: Arc::new(self.classifiers),
                retry_strategy: self.retry_strategy,
                renderer: self.renderer,
            },
            progress_bar: self.progress_bar,
        }
    }
}

impl Dispatcher {
    pub fn builder(executor: Arc<dyn TaskExecutor>) -> DispatcherBuilder {
        DispatcherBuilder::new(executor)
    }

    /// Validates `spec` and appends it to the tail of the queue.
    pub fn enqueue(&self, spec: TaskSpec) -> Result<TaskId, SubmitError> {
        spec.validate()?;
        let id = TaskId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let task = Task::new(id, spec)?;
        tracing::debug!(task_id = %id, task = %task.name, family = %task.family, "task enqueued");
        self.queue.push_back(QueuedTask::new(Arc::new(task)));
        Ok(id)
    }

    /// Enqueues every spec, or none of them if any is invalid.
    pub fn enqueue_all(
        &self,
        specs: impl IntoIterator<Item = TaskSpec>,
    ) -> Result<Vec<TaskId>, SubmitError> {
        let specs: Vec<TaskSpec> = specs.into_iter().collect();
        for spec in &specs {
            spec.validate()?;
        }
        let mut entries = Vec::with_capacity(specs.len());
        let mut ids = Vec::with_capacity(specs.len());
        for spec in specs {
            let id = TaskId(self.next_id.fetch_add(1, Ordering::Relaxed));
            entries.push(QueuedTask::new(Arc::new(Task::new(id, spec)?)));
            ids.push(id);
        }
        self.queue.extend(entries);
        tracing::debug!(count = ids.len(), "tasks enqueued");
        Ok(ids)
    }

    /// Snapshot of pending tasks in queue order. May be stale immediately.
    pub fn list(&self) -> Vec<Arc<Task>> {
        self.queue.snapshot()
    }

    pub fn peek(&self) -> Option<Arc<Task>> {
        self.queue.peek()
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Drains the queue and returns one outcome per task.
    pub async fn run_to_completion(&self, concurrency: usize) -> RunReport {
        let (_cancel_tx, cancel_rx) = watch::channel(false);
        self.run_until_cancelled(concurrency, cancel_rx).await
    }

    /// Drains the queue until it is empty or `cancel` turns true.
    ///
    /// After cancellation no new attempt starts; in-flight attempts finish and
    /// their outcomes are included. Tasks still queued stay queued and are
    /// counted in [`RunReport::pending`].
    #[tracing::instrument(name = "dispatcher.run", skip(self, cancel))]
    pub async fn run_until_cancelled(
        &self,
        concurrency: usize,
        mut cancel: watch::Receiver<bool>,
    ) -> RunReport {
        let concurrency = concurrency.max(1);
        let run_id = Uuid::new_v4().to_string();
        let started = Instant::now();
        let total_tasks = self.queue.len();

        tracing::info!(run_id = %run_id, total_tasks, concurrency, "run started");
        self.ctx.emit(RenderEvent::RunStart {
            run_id: run_id.clone(),
            total_tasks,
            concurrency,
        });

        let mut progress = ProgressMonitor::new(total_tasks, self.progress_bar);
        let mut in_flight = FuturesUnordered::new();
        let mut outcomes: Vec<Outcome> = Vec::with_capacity(total_tasks);
        let mut retries: u32 = 0;
        let mut cancelled = *cancel.borrow();
        let mut watching = true;

        loop {
            if !cancelled {
                while in_flight.len() < concurrency {
                    let Some(entry) = self.queue.pop_front() else {
                        break;
                    };
                    progress.start_task(&progress_key(&entry.task), entry.retry.attempts + 1);
                    in_flight.push(self.spawn_attempt(&run_id, entry, cancel.clone()));
                }
            }

            if in_flight.is_empty() {
                break;
            }

            tokio::select! {
                Some((entry, joined)) = in_flight.next() => {
                    let verdict = joined.unwrap_or_else(|e| Verdict::Done(panicked(&entry, e)));
                    match verdict {
                        Verdict::Retry(next) => {
                            retries += 1;
                            progress.retry_task(&progress_key(&next.task));
                            self.queue.push_back(next);
                        }
                        Verdict::Done(outcome) => {
                            progress.complete_task(
                                &progress_key(&entry.task),
                                outcome.success,
                                outcome.duration_ms,
                            );
                            self.ctx.emit(RenderEvent::TaskComplete {
                                run_id: run_id.clone(),
                                outcome: outcome.clone(),
                            });
                            outcomes.push(outcome);
                        }
                    }
                }
                changed = cancel.changed(), if watching && !cancelled => {
                    match changed {
                        Ok(()) => {
                            if *cancel.borrow() {
                                cancelled = true;
                                tracing::warn!(
                                    run_id = %run_id,
                                    in_flight = in_flight.len(),
                                    "cancellation requested, waiting for in-flight tasks"
                                );
                            }
                        }
                        Err(_) => watching = false,
                    }
                }
            }
        }

        outcomes.sort_by_key(|o| o.task_id);
        let report = RunReport {
            run_id: run_id.clone(),
            outcomes,
            retries,
            duration_ms: started.elapsed().as_millis() as u64,
            cancelled,
            pending: self.queue.len(),
        };
        progress.finish(report.all_succeeded());

        tracing::info!(
            run_id = %run_id,
            succeeded = report.succeeded(),
            failed = report.failed(),
            retries = report.retries,
            pending = report.pending,
            cancelled = report.cancelled,
            duration_ms = report.duration_ms,
            "run finished"
        );
        self.ctx.emit(RenderEvent::RunEnd {
            run_id,
            report: report.clone(),
        });
        report
    }

    fn spawn_attempt(
        &self,
        run_id: &str,
        entry: QueuedTask,
        cancel: watch::Receiver<bool>,
    ) -> impl Future<Output = (QueuedTask, Result<Verdict, JoinError>)> {
        let handle = tokio::spawn(run_attempt(
            self.ctx.clone(),
            run_id.to_string(),
            entry.clone(),
            cancel,
        ));
        async move { (entry, handle.await) }
    }
}

/// Resolves once `cancel` reads true; never resolves if the sender is gone.
async fn cancel_requested(cancel: &mut watch::Receiver<bool>) {
    if cancel.wait_for(|cancelled| *cancelled).await.is_err() {
        std::future::pending::<()>().await;
    }
}

fn progress_key(task: &Task) -> String {
    format!("{} {}", task.id, task.name)
}

fn elapsed_ms(since: Instant) -> u64 {
    since.elapsed().as_millis() as u64
}

fn outcome(
    entry: &QueuedTask,
    stage: &str,
    success: bool,
    message: String,
    attempts: u32,
    exit_code: Option<i32>,
    duration_ms: u64,
) -> Outcome {
    let task = &entry.task;
    Outcome {
        task_id: task.id,
        task_name: task.name.clone(),
        identity: task.identity(),
        stage: stage.to_string(),
        success,
        message,
        attempts,
        exit_code,
        duration_ms,
        queued_ms: elapsed_ms(entry.retry.first_enqueued),
    }
}

fn panicked(entry: &QueuedTask, err: JoinError) -> Outcome {
    let task = &entry.task;
    let stage = task
        .steps
        .get(entry.retry.resume_step)
        .map(|s| s.stage.as_str())
        .unwrap_or(COMPLETED_STAGE);
    tracing::error!(task_id = %task.id, task = %task.name, "executor aborted: {err}");
    Outcome {
        task_id: task.id,
        task_name: task.name.clone(),
        identity: task.identity(),
        stage: stage.to_string(),
        success: false,
        message: format!("executor aborted: {err}"),
        attempts: entry.retry.attempts + 1,
        exit_code: None,
        duration_ms: entry.retry.elapsed_ms,
        queued_ms: elapsed_ms(entry.retry.first_enqueued),
    }
}

/// Runs the remaining steps of one entry and classifies the first failure.
async fn run_attempt(
    ctx: AttemptContext,
    run_id: String,
    entry: QueuedTask,
    mut cancel: watch::Receiver<bool>,
) -> Verdict {
    let task = entry.task.clone();
    let attempt = entry.retry.attempts + 1;
    let started = Instant::now();

    tracing::info!(task_id = %task.id, task = %task.name, attempt, "task started");
    ctx.emit(RenderEvent::TaskStart {
        run_id: run_id.clone(),
        task_id: task.id,
        name: task.name.clone(),
        attempt,
    });

    for (index, step) in task.steps.iter().enumerate().skip(entry.retry.resume_step) {
        tracing::debug!(task_id = %task.id, stage = %step.stage, command = %step.command.display(), "step started");
        let result = ctx.executor.run_step(&task, step).await;
        if result.success() {
            tracing::debug!(task_id = %task.id, stage = %step.stage, duration_ms = result.duration_ms, "step succeeded");
            continue;
        }

        let total_ms = entry.retry.elapsed_ms + elapsed_ms(started);
        let message = result.summary();

        if let StepStatus::SpawnFailed(_) = result.status {
            tracing::error!(task_id = %task.id, task = %task.name, stage = %step.stage, "failed to start: {message}");
            return Verdict::Done(outcome(&entry, &step.stage, false, message, attempt, None, total_ms));
        }

        let error = result.error_message();
        let failure = Failure {
            exit_code: result.exit_code(),
            error: &error,
            output: &result.output,
            attempt,
        };
        let classifier = ctx.classifiers.for_family(&task.family);
        let classification = classifier.classify(&failure);
        tracing::debug!(
            task_id = %task.id,
            classifier = classifier.name(),
            ?classification,
            "failure classified"
        );

        if classification == Classification::Permanent {
            tracing::error!(task_id = %task.id, task = %task.name, stage = %step.stage, "task failed permanently: {message}");
            return Verdict::Done(outcome(
                &entry,
                &step.stage,
                false,
                message,
                attempt,
                result.exit_code(),
                total_ms,
            ));
        }

        let delay = if ctx.retry_strategy.should_retry(attempt, &message) {
            ctx.retry_strategy.next_delay(attempt, &message)
        } else {
            None
        };
        let Some(delay) = delay else {
            tracing::error!(task_id = %task.id, task = %task.name, attempt, "retry limit reached: {message}");
            return Verdict::Done(outcome(
                &entry,
                &step.stage,
                false,
                format!("giving up after {attempt} attempt(s): {message}"),
                attempt,
                result.exit_code(),
                total_ms,
            ));
        };

        tracing::warn!(
            task_id = %task.id,
            task = %task.name,
            stage = %step.stage,
            attempt,
            delay_ms = delay.as_millis() as u64,
            queued_ms = elapsed_ms(entry.retry.first_enqueued),
            "resource locked, retrying later: {message}"
        );
        ctx.emit(RenderEvent::TaskRetry {
            run_id,
            task_id: task.id,
            name: task.name.clone(),
            attempt,
            delay_ms: delay.as_millis() as u64,
            reason: message,
        });
        // The slot stays occupied for the cooldown; cancellation ends it early.
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = cancel_requested(&mut cancel) => {
                tracing::debug!(task_id = %task.id, "cooldown cut short by cancellation");
            }
        }
        return Verdict::Retry(entry.requeue(index, total_ms));
    }

    let total_ms = entry.retry.elapsed_ms + elapsed_ms(started);
    tracing::info!(task_id = %task.id, task = %task.name, attempt, duration_ms = total_ms, "task completed");
    Verdict::Done(outcome(
        &entry,
        COMPLETED_STAGE,
        true,
        String::new(),
        attempt,
        Some(0),
        total_ms,
    ))
}
