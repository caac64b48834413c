//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `jobq_core::api` instead of reaching into internal modules.

pub use crate::config::{
    load, AppConfig, ClassifierConfig, DispatcherConfig, ElevationConfig,
    LoggingConfig, RepositoryConfig, RetryConfig,
};
pub use crate::error::{CliError, ConfigError, SubmitError, TemplateError};
pub use crate::executor::traits::{
    Classification, Failure, OutcomeClassifier, OutputRendererPlugin, RenderEvent,
    RetryStrategyPlugin, TaskExecutor,
};
pub use crate::executor::{
    ClassifierRegistry, CommandSpec, Dispatcher, DispatcherBuilder, FixedCooldown, Invocation,
    LockPatternClassifier, Outcome, PermanentClassifier, PredicateClassifier, RunReport, Step,
    StepResult, StepStatus, Task, TaskId, TaskSpec, DEFAULT_COOLDOWN,
};
pub use crate::executor::types::{COMPLETED_STAGE, DEFAULT_FAMILY, DEFAULT_STAGE};
pub use crate::template::{PromptKind, PromptSpec, TaskTemplate};
pub use crate::util::RingBytes;
