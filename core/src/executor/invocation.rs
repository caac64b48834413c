use std::path::PathBuf;

use crate::config::ElevationConfig;

use super::types::{Step, Task};

/// The exact process an executor starts for one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

impl Invocation {
    /// Wraps the step in the elevation tool when the task needs elevation.
    pub fn plan(task: &Task, step: &Step, elevation: &ElevationConfig) -> Self {
        let command = &step.command;
        if task.needs_elevation {
            let mut args = Vec::with_capacity(elevation.args.len() + 1 + command.args.len());
            args.extend(elevation.args.iter().cloned());
            args.push(command.program.clone());
            args.extend(command.args.iter().cloned());
            Self {
                program: elevation.program.clone(),
                args,
                cwd: command.cwd.clone(),
            }
        } else {
            Self {
                program: command.program.clone(),
                args: command.args.clone(),
                cwd: command.cwd.clone(),
            }
        }
    }

    pub fn argv(&self) -> Vec<&str> {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect()
    }
}
