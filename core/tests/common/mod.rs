#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use jobq_core::api::{
    CommandSpec, OutputRendererPlugin, RenderEvent, Step, StepResult, Task, TaskExecutor,
    TaskId, TaskSpec,
};

/// Executor that replays scripted results per `name/stage` and records calls.
///
/// Steps without a script succeed. A task named `panic` panics. A step that
/// starts while another step of the same task is still running is counted in
/// [`ScriptedExecutor::overlaps`].
pub struct ScriptedExecutor {
    scripts: Mutex<HashMap<String, VecDeque<StepResult>>>,
    delay: Duration,
    active: AtomicUsize,
    max_active: AtomicUsize,
    running: Mutex<HashSet<TaskId>>,
    overlaps: AtomicUsize,
    calls: Mutex<Vec<String>>,
}

impl ScriptedExecutor {
    pub fn new(delay: Duration) -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            delay,
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
            running: Mutex::new(HashSet::new()),
            overlaps: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn script(self, key: &str, results: impl IntoIterator<Item = StepResult>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(key.to_string(), results.into_iter().collect());
        self
    }

    /// `name/stage` of every step run, in start order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Names of the tasks whose steps started, in start order.
    pub fn started(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .map(|c| c.split('/').next().unwrap_or_default().to_string())
            .collect()
    }

    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    pub fn overlaps(&self) -> usize {
        self.overlaps.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TaskExecutor for ScriptedExecutor {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn run_step(&self, task: &Task, step: &Step) -> StepResult {
        let key = format!("{}/{}", task.name, step.stage);
        self.calls.lock().unwrap().push(key.clone());

        if !self.running.lock().unwrap().insert(task.id) {
            self.overlaps.fetch_add(1, Ordering::SeqCst);
        }
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.active.fetch_sub(1, Ordering::SeqCst);
        self.running.lock().unwrap().remove(&task.id);

        if task.name == "panic" {
            panic!("scripted panic");
        }

        self.scripts
            .lock()
            .unwrap()
            .get_mut(&key)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| StepResult::exited(0, "ok"))
    }
}

/// Renderer that keeps every event it receives.
#[derive(Default)]
pub struct RecordingRenderer {
    events: Mutex<Vec<RenderEvent>>,
}

impl RecordingRenderer {
    pub fn kinds(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|e| match e {
                RenderEvent::RunStart { .. } => "run_start",
                RenderEvent::TaskStart { .. } => "task_start",
                RenderEvent::TaskRetry { .. } => "task_retry",
                RenderEvent::TaskComplete { .. } => "task_complete",
                RenderEvent::RunEnd { .. } => "run_end",
            })
            .collect()
    }
}

impl OutputRendererPlugin for RecordingRenderer {
    fn name(&self) -> &str {
        "recording"
    }

    fn format(&self) -> &str {
        "test"
    }

    fn render(&self, event: &RenderEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

pub fn task(name: &str) -> TaskSpec {
    TaskSpec::command(name, CommandSpec::new("/bin/true", Vec::<String>::new()))
}

pub fn locked() -> StepResult {
    StepResult::exited(1, "error: failed to lock database")
}

pub fn broken() -> StepResult {
    StepResult::exited(2, "error: target not found: nosuchpkg")
}

pub fn shared<T>(value: T) -> Arc<T> {
    Arc::new(value)
}
