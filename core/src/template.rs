//! Declarative task templates.
//!
//! A template names a command whose program and arguments may contain
//! `{key}` placeholders, plus the prompts that supply those keys. An argument
//! written as `{key...}` expands to the whitespace-separated words of the
//! answer; an argument that is exactly `{key}` with an empty answer is dropped.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::TemplateError;
use crate::executor::types::{CommandSpec, TaskSpec, DEFAULT_FAMILY};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptKind {
    #[default]
    Text,
    /// Whitespace-separated list.
    List,
    /// yes/no question.
    YesNo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptSpec {
    pub key: String,
    pub label: String,
    #[serde(default)]
    pub kind: PromptKind,
    #[serde(default)]
    pub optional: bool,
}

impl PromptSpec {
    pub fn text(key: &str, label: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            kind: PromptKind::Text,
            optional: false,
        }
    }

    pub fn list(key: &str, label: &str) -> Self {
        Self {
            kind: PromptKind::List,
            optional: true,
            ..Self::text(key, label)
        }
    }

    pub fn yes_no(key: &str, label: &str) -> Self {
        Self {
            kind: PromptKind::YesNo,
            optional: true,
            ..Self::text(key, label)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskTemplate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_family")]
    pub family: String,
    /// Name given to created tasks; may contain placeholders. Defaults to `name`.
    #[serde(default)]
    pub task_name: Option<String>,
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub needs_elevation: bool,
    /// Key of a yes/no prompt whose answer overrides `needs_elevation`.
    #[serde(default)]
    pub elevation_prompt: Option<String>,
    #[serde(default)]
    pub prompts: Vec<PromptSpec>,
}

fn default_family() -> String {
    DEFAULT_FAMILY.to_string()
}

impl TaskTemplate {
    /// Builds a task from this template and the prompt answers.
    pub fn instantiate(&self, answers: &HashMap<String, String>) -> Result<TaskSpec, TemplateError> {
        let mut values: HashMap<&str, String> = HashMap::new();
        let mut flags: HashMap<&str, bool> = HashMap::new();

        for prompt in &self.prompts {
            let raw = answers
                .get(&prompt.key)
                .map(|v| v.trim().to_string())
                .unwrap_or_default();
            if raw.is_empty() && !prompt.optional {
                return Err(TemplateError::MissingValue {
                    template: self.name.clone(),
                    key: prompt.key.clone(),
                });
            }
            if prompt.kind == PromptKind::YesNo {
                flags.insert(prompt.key.as_str(), parse_yes_no(&prompt.key, &raw)?);
            }
            values.insert(prompt.key.as_str(), raw);
        }

        let program = self.render(&self.program, &values)?;
        let mut args = Vec::with_capacity(self.args.len());
        for arg in &self.args {
            if let Some(key) = whole_placeholder(arg) {
                if let Some(list_key) = key.strip_suffix("...") {
                    let value = self.lookup(list_key, &values)?;
                    args.extend(value.split_whitespace().map(str::to_string));
                    continue;
                }
                if self.lookup(key, &values)?.is_empty() {
                    continue;
                }
            }
            args.push(self.render(arg, &values)?);
        }

        let name = match &self.task_name {
            Some(t) => self.render(t, &values)?,
            None => self.name.clone(),
        };

        let needs_elevation = match &self.elevation_prompt {
            Some(key) => *flags.get(key.as_str()).ok_or_else(|| TemplateError::UndeclaredPrompt {
                template: self.name.clone(),
                key: key.clone(),
            })?,
            None => self.needs_elevation,
        };

        let spec = TaskSpec::command(name, CommandSpec::new(program, args))
            .elevated(needs_elevation)
            .family(self.family.clone())
            .meta("template", self.name.clone());
        spec.validate()?;
        Ok(spec)
    }

    fn lookup<'v>(&self, key: &str, values: &'v HashMap<&str, String>) -> Result<&'v str, TemplateError> {
        values
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| TemplateError::UndeclaredPrompt {
                template: self.name.clone(),
                key: key.to_string(),
            })
    }

    fn render(&self, input: &str, values: &HashMap<&str, String>) -> Result<String, TemplateError> {
        let mut out = String::with_capacity(input.len());
        let mut rest = input;
        while let Some(start) = rest.find('{') {
            let Some(len) = rest[start..].find('}') else {
                break;
            };
            let key = &rest[start + 1..start + len];
            if !is_key(key) {
                out.push_str(&rest[..start + 1]);
                rest = &rest[start + 1..];
                continue;
            }
            out.push_str(&rest[..start]);
            out.push_str(self.lookup(key, values)?);
            rest = &rest[start + len + 1..];
        }
        out.push_str(rest);
        Ok(out)
    }
}

fn is_key(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// `{key}` or `{key...}` occupying the whole argument.
fn whole_placeholder(arg: &str) -> Option<&str> {
    let inner = arg.strip_prefix('{')?.strip_suffix('}')?;
    is_key(inner.strip_suffix("...").unwrap_or(inner)).then_some(inner)
}

fn parse_yes_no(key: &str, value: &str) -> Result<bool, TemplateError> {
    match value.to_ascii_lowercase().as_str() {
        "y" | "yes" | "true" | "1" => Ok(true),
        "" | "n" | "no" | "false" | "0" => Ok(false),
        _ => Err(TemplateError::InvalidAnswer {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Finds a template by 1-based position or case-insensitive name.
pub fn find<'a>(templates: &'a [TaskTemplate], choice: &str) -> Option<&'a TaskTemplate> {
    let choice = choice.trim();
    if let Ok(n) = choice.parse::<usize>() {
        return n.checked_sub(1).and_then(|i| templates.get(i));
    }
    templates.iter().find(|t| t.name.eq_ignore_ascii_case(choice))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn install() -> TaskTemplate {
        TaskTemplate {
            name: "ArchInstall".to_string(),
            description: String::new(),
            family: "pacman".to_string(),
            task_name: Some("install {package}".to_string()),
            program: "/usr/bin/pacman".to_string(),
            args: vec!["-S".into(), "--noconfirm".into(), "{package}".into()],
            needs_elevation: true,
            elevation_prompt: None,
            prompts: vec![PromptSpec::text("package", "Enter package to install")],
        }
    }

    fn custom() -> TaskTemplate {
        TaskTemplate {
            name: "Custom".to_string(),
            description: String::new(),
            family: DEFAULT_FAMILY.to_string(),
            task_name: Some("{name}".to_string()),
            program: "{path}".to_string(),
            args: vec!["{args...}".into()],
            needs_elevation: false,
            elevation_prompt: Some("sudo".to_string()),
            prompts: vec![
                PromptSpec::text("name", "Enter custom program name"),
                PromptSpec::text("path", "Enter custom program path"),
                PromptSpec::list("args", "Enter custom program arguments (space-separated)"),
                PromptSpec::yes_no("sudo", "Does this program require sudo? (yes/no)"),
            ],
        }
    }

    fn answers(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn fills_placeholders() {
        let spec = install()
            .instantiate(&answers(&[("package", " htop ")]))
            .unwrap();
        assert_eq!(spec.name, "install htop");
        assert!(spec.needs_elevation);
        assert_eq!(spec.family, "pacman");
        assert_eq!(spec.steps[0].command.args, vec!["-S", "--noconfirm", "htop"]);
        assert_eq!(spec.metadata["template"], "ArchInstall");
    }

    #[test]
    fn missing_required_value() {
        let err = install().instantiate(&answers(&[])).unwrap_err();
        assert_eq!(
            err,
            TemplateError::MissingValue {
                template: "ArchInstall".to_string(),
                key: "package".to_string()
            }
        );
    }

    #[test]
    fn splats_lists_and_reads_elevation_answer() {
        let spec = custom()
            .instantiate(&answers(&[
                ("name", "listing"),
                ("path", "/bin/ls"),
                ("args", "-l   -a /tmp"),
                ("sudo", "YES"),
            ]))
            .unwrap();
        assert_eq!(spec.name, "listing");
        assert_eq!(spec.steps[0].command.program, "/bin/ls");
        assert_eq!(spec.steps[0].command.args, vec!["-l", "-a", "/tmp"]);
        assert!(spec.needs_elevation);

        let spec = custom()
            .instantiate(&answers(&[("name", "n"), ("path", "/bin/true")]))
            .unwrap();
        assert!(spec.steps[0].command.args.is_empty());
        assert!(!spec.needs_elevation);
    }

    #[test]
    fn rejects_bad_yes_no_and_unknown_keys() {
        let err = custom()
            .instantiate(&answers(&[("name", "n"), ("path", "p"), ("sudo", "perhaps")]))
            .unwrap_err();
        assert!(matches!(err, TemplateError::InvalidAnswer { .. }));

        let mut t = install();
        t.args.push("{version}".to_string());
        let err = t.instantiate(&answers(&[("package", "htop")])).unwrap_err();
        assert!(matches!(err, TemplateError::UndeclaredPrompt { key, .. } if key == "version"));
    }

    #[test]
    fn braces_that_are_not_keys_are_kept() {
        let mut t = install();
        t.args = vec!["--format={not a key}".into(), "{package}".into()];
        let spec = t.instantiate(&answers(&[("package", "x")])).unwrap();
        assert_eq!(spec.steps[0].command.args, vec!["--format={not a key}", "x"]);
    }

    #[test]
    fn find_by_index_or_name() {
        let all = vec![install(), custom()];
        assert_eq!(find(&all, "2").map(|t| t.name.as_str()), Some("Custom"));
        assert_eq!(find(&all, "archinstall").map(|t| t.name.as_str()), Some("ArchInstall"));
        assert!(find(&all, "0").is_none());
        assert!(find(&all, "3").is_none());
        assert!(find(&all, "nope").is_none());
    }
}
