//! Dispatch and retry engine for queued external-process tasks.
//!
//! # Architecture
//!
//! ```text
//! TaskSpec ──enqueue()──▶ TaskQueue (FIFO, mutex)
//!                            │ pop while in_flight < concurrency
//!                            ▼
//!                      run_attempt()  ×N  (tokio tasks)
//!                            │ TaskExecutor::run_step() per step
//!                            ▼
//!              OutcomeClassifier (per family)
//!               │ Transient                  │ Permanent / success
//!               ▼                            ▼
//!    cooldown, push_back to tail       Outcome ──▶ OutputRendererPlugin
//! ```
//!
//! The driver loop in [`Dispatcher`] returns once the queue is empty and no
//! attempt is in flight, so a task that is cooling down is never lost.

pub mod classifier;
mod dispatcher;
pub mod invocation;
mod progress;
pub mod queue;
pub mod retry;
pub mod traits;
pub mod types;

pub use classifier::{
    ClassifierRegistry, LockPatternClassifier, PermanentClassifier, PredicateClassifier,
};
pub use dispatcher::{Dispatcher, DispatcherBuilder};
pub use invocation::Invocation;
pub use progress::ProgressMonitor;
pub use retry::{FixedCooldown, DEFAULT_COOLDOWN};
pub use types::{
    CommandSpec, Outcome, RunReport, Step, StepResult, StepStatus, Task, TaskId, TaskSpec,
};
