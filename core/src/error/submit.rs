use thiserror::Error;

/// Reasons a task is rejected before it reaches the queue.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error("task '{task}' has no steps")]
    NoSteps { task: String },

    #[error("task '{task}' step '{stage}' has an empty program path")]
    EmptyProgram { task: String, stage: String },

    #[error("task '{task}' step {index} has an empty stage label")]
    EmptyStage { task: String, index: usize },

    #[error("task '{task}' contains a NUL byte in {field}")]
    NulByte { task: String, field: &'static str },
}

/// Errors raised while turning a template plus answers into a task.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unknown template: {0}")]
    UnknownTemplate(String),

    #[error("template '{template}' is missing a value for '{key}'")]
    MissingValue { template: String, key: String },

    #[error("template '{template}' references undeclared prompt '{key}'")]
    UndeclaredPrompt { template: String, key: String },

    #[error("invalid yes/no answer for '{key}': {value}")]
    InvalidAnswer { key: String, value: String },

    #[error(transparent)]
    Submit(#[from] SubmitError),
}
