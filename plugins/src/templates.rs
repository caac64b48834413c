//! Templates offered by the interactive shell's `add` command.

use jobq_core::api::{PromptSpec, TaskTemplate, DEFAULT_FAMILY};

use crate::classifier::PACMAN_FAMILY;

const PACMAN: &str = "/usr/bin/pacman";

fn pacman(name: &str, description: &str, args: &[&str], prompts: Vec<PromptSpec>) -> TaskTemplate {
    TaskTemplate {
        name: name.to_string(),
        description: description.to_string(),
        family: PACMAN_FAMILY.to_string(),
        task_name: None,
        program: PACMAN.to_string(),
        args: args.iter().map(|a| a.to_string()).collect(),
        needs_elevation: true,
        elevation_prompt: None,
        prompts,
    }
}

pub fn builtin_templates() -> Vec<TaskTemplate> {
    vec![
        pacman("SystemUpdate", "Update all packages", &["-Syu"], Vec::new()),
        pacman(
            "ArchInstall",
            "Install a package",
            &["-S", "--noconfirm", "{package}"],
            vec![PromptSpec::text("package", "Enter package to install")],
        ),
        pacman(
            "ArchRemove",
            "Remove a package",
            &["-R", "{package}"],
            vec![PromptSpec::text("package", "Enter package to remove")],
        ),
        TaskTemplate {
            name: "Custom".to_string(),
            description: "Any program".to_string(),
            family: DEFAULT_FAMILY.to_string(),
            task_name: Some("{name}".to_string()),
            program: "{path}".to_string(),
            args: vec!["{args...}".to_string()],
            needs_elevation: false,
            elevation_prompt: Some("sudo".to_string()),
            prompts: vec![
                PromptSpec::text("name", "Enter custom program name"),
                PromptSpec::text("path", "Enter custom program path"),
                PromptSpec::list("args", "Enter custom program arguments (space-separated)"),
                PromptSpec::yes_no("sudo", "Does this program require sudo? (yes/no)"),
            ],
        },
    ]
}

/// Built-ins followed by configured templates; a configured template
/// replaces the built-in of the same name in place.
pub fn catalog(configured: &[TaskTemplate]) -> Vec<TaskTemplate> {
    let mut all = builtin_templates();
    for t in configured {
        match all.iter_mut().find(|b| b.name.eq_ignore_ascii_case(&t.name)) {
            Some(slot) => *slot = t.clone(),
            None => all.push(t.clone()),
        }
    }
    all
}

/// Numbered table, one template per line.
pub fn render_table(templates: &[TaskTemplate]) -> String {
    let width = templates.iter().map(|t| t.name.len()).max().unwrap_or(0);
    templates
        .iter()
        .enumerate()
        .map(|(i, t)| {
            let sudo = if t.needs_elevation { " [sudo]" } else { "" };
            if t.description.is_empty() {
                format!("{}. {}{}", i + 1, t.name, sudo)
            } else {
                format!("{}. {:<width$}  {}{}", i + 1, t.name, t.description, sudo)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn answers(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn builtins_build_pacman_commands() {
        let all = builtin_templates();
        let names: Vec<&str> = all.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["SystemUpdate", "ArchInstall", "ArchRemove", "Custom"]);

        let update = all[0].instantiate(&HashMap::new()).unwrap();
        assert_eq!(update.name, "SystemUpdate");
        assert!(update.needs_elevation);
        assert_eq!(update.steps[0].command.display(), "/usr/bin/pacman -Syu");

        let remove = all[2].instantiate(&answers(&[("package", "htop")])).unwrap();
        assert_eq!(remove.steps[0].command.display(), "/usr/bin/pacman -R htop");
        assert_eq!(remove.family, PACMAN_FAMILY);
    }

    #[test]
    fn configured_templates_extend_and_replace() {
        let mut update = builtin_templates().remove(0);
        update.args = vec!["-Syyu".to_string()];
        let mut apt = builtin_templates().remove(0);
        apt.name = "AptUpgrade".to_string();
        apt.program = "/usr/bin/apt-get".to_string();

        let all = catalog(&[update, apt]);
        assert_eq!(all.len(), 5);
        assert_eq!(all[0].args, vec!["-Syyu"]);
        assert_eq!(all[4].name, "AptUpgrade");
    }

    #[test]
    fn table_is_numbered() {
        let table = render_table(&builtin_templates());
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "1. SystemUpdate  Update all packages [sudo]");
        assert_eq!(lines[3], "4. Custom        Any program");
    }
}
