use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::SubmitError;

/// Stage label for single-command tasks.
pub const DEFAULT_STAGE: &str = "Running";
/// Stage label reported once every step of a task has succeeded.
pub const COMPLETED_STAGE: &str = "Completed";
/// Family used when a task does not name one.
pub const DEFAULT_FAMILY: &str = "default";

/// Queue identity assigned at enqueue time, in submission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One external program invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub cwd: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new<P, I, S>(program: P, args: I) -> Self
    where
        P: Into<String>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            cwd: None,
        }
    }

    pub fn in_dir(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Space-joined command line, for display only.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub stage: String,
    pub command: CommandSpec,
}

/// A task as submitted by a caller, before it is admitted to a queue.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskSpec {
    pub name: String,
    pub steps: Vec<Step>,
    pub needs_elevation: bool,
    pub family: String,
    pub metadata: BTreeMap<String, String>,
}

impl TaskSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            family: DEFAULT_FAMILY.to_string(),
            ..Default::default()
        }
    }

    /// Single-step task running `command`.
    pub fn command(name: impl Into<String>, command: CommandSpec) -> Self {
        Self::new(name).step(DEFAULT_STAGE, command)
    }

    pub fn step(mut self, stage: impl Into<String>, command: CommandSpec) -> Self {
        self.steps.push(Step {
            stage: stage.into(),
            command,
        });
        self
    }

    pub fn elevated(mut self, needs_elevation: bool) -> Self {
        self.needs_elevation = needs_elevation;
        self
    }

    pub fn family(mut self, family: impl Into<String>) -> Self {
        self.family = family.into();
        self
    }

    pub fn meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn validate(&self) -> Result<(), SubmitError> {
        let task = || self.name.clone();
        if self.steps.is_empty() {
            return Err(SubmitError::NoSteps { task: task() });
        }
        if self.name.contains('\0') {
            return Err(SubmitError::NulByte {
                task: task(),
                field: "name",
            });
        }
        for (index, step) in self.steps.iter().enumerate() {
            if step.stage.trim().is_empty() {
                return Err(SubmitError::EmptyStage {
                    task: task(),
                    index,
                });
            }
            if step.command.program.trim().is_empty() {
                return Err(SubmitError::EmptyProgram {
                    task: task(),
                    stage: step.stage.clone(),
                });
            }
            if step.command.program.contains('\0') {
                return Err(SubmitError::NulByte {
                    task: task(),
                    field: "program",
                });
            }
            if step.command.args.iter().any(|a| a.contains('\0')) {
                return Err(SubmitError::NulByte {
                    task: task(),
                    field: "arguments",
                });
            }
        }
        Ok(())
    }
}

/// An admitted, immutable unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    pub steps: Vec<Step>,
    pub needs_elevation: bool,
    pub family: String,
    pub metadata: BTreeMap<String, String>,
}

impl Task {
    pub fn new(id: TaskId, spec: TaskSpec) -> Result<Self, SubmitError> {
        spec.validate()?;
        let TaskSpec {
            name,
            steps,
            needs_elevation,
            family,
            metadata,
        } = spec;

        let name = if name.trim().is_empty() {
            steps[0].command.program.clone()
        } else {
            name
        };
        let family = if family.trim().is_empty() {
            DEFAULT_FAMILY.to_string()
        } else {
            family
        };

        Ok(Self {
            id,
            name,
            steps,
            needs_elevation,
            family,
            metadata,
        })
    }

    /// The first command of the task.
    pub fn command(&self) -> &CommandSpec {
        &self.steps[0].command
    }

    /// What the task acts on: the repository URL when present, else its first command line.
    pub fn identity(&self) -> String {
        self.metadata
            .get("repository")
            .cloned()
            .unwrap_or_else(|| self.command().display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_specs() {
        let err = Task::new(TaskId(1), TaskSpec::new("empty")).unwrap_err();
        assert!(matches!(err, SubmitError::NoSteps { .. }));

        let spec = TaskSpec::command("blank", CommandSpec::new("  ", ["x"]));
        assert!(matches!(
            spec.validate(),
            Err(SubmitError::EmptyProgram { .. })
        ));

        let spec = TaskSpec::command("nul", CommandSpec::new("echo", ["a\0b"]));
        assert!(matches!(
            spec.validate(),
            Err(SubmitError::NulByte {
                field: "arguments",
                ..
            })
        ));

        let spec = TaskSpec::new("stage").step(" ", CommandSpec::new("true", Vec::<String>::new()));
        assert!(matches!(
            spec.validate(),
            Err(SubmitError::EmptyStage { index: 0, .. })
        ));
    }

    #[test]
    fn fills_in_name_and_family() {
        let spec = TaskSpec::command("", CommandSpec::new("/usr/bin/pacman", ["-Syu"])).family("");
        let task = Task::new(TaskId(7), spec).unwrap();
        assert_eq!(task.name, "/usr/bin/pacman");
        assert_eq!(task.family, DEFAULT_FAMILY);
        assert_eq!(task.identity(), "/usr/bin/pacman -Syu");
        assert_eq!(task.id.to_string(), "#7");
    }

    #[test]
    fn identity_prefers_repository() {
        let spec = TaskSpec::command("clone", CommandSpec::new("git", ["clone", "u"]))
            .meta("repository", "https://example.com/r.git");
        let task = Task::new(TaskId(1), spec).unwrap();
        assert_eq!(task.identity(), "https://example.com/r.git");
    }
}
