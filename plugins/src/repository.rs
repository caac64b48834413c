//! Repository jobs: clone into the work directory, then report status.

use std::path::Path;

use jobq_core::api::{CommandSpec, RepositoryConfig, TaskSpec};

use crate::classifier::GIT_FAMILY;

pub const CLONE_STAGE: &str = "Cloning";
pub const STATUS_STAGE: &str = "Status";

/// Directory name a repository is cloned into, taken from the last URL segment.
pub fn checkout_name(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    let last = trimmed
        .rsplit(|c| c == '/' || c == ':')
        .next()
        .unwrap_or_default();
    let name = last.strip_suffix(".git").unwrap_or(last);
    if name.is_empty() {
        "repository".to_string()
    } else {
        name.to_string()
    }
}

/// Two-step git task for one configured repository.
pub fn repository_task(repo: &RepositoryConfig, workdir: &Path) -> TaskSpec {
    let name = checkout_name(&repo.url);
    let dest = workdir.join(&name);
    let dest_arg = dest.to_string_lossy().into_owned();

    let mut clone = vec!["clone".to_string(), repo.url.clone()];
    if let Some(branch) = repo.branch() {
        clone.push("-b".to_string());
        clone.push(branch.to_string());
    }
    clone.push(dest_arg.clone());

    let mut spec = TaskSpec::new(name)
        .step(CLONE_STAGE, CommandSpec::new("git", clone))
        .step(
            STATUS_STAGE,
            CommandSpec::new("git", ["-C".to_string(), dest_arg, "status".to_string()]),
        )
        .family(GIT_FAMILY)
        .meta("repository", repo.url.clone());
    if let Some(branch) = repo.branch() {
        spec = spec.meta("branch", branch);
    }
    spec
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn derives_checkout_name() {
        assert_eq!(checkout_name("https://github.com/rust-lang/cargo.git"), "cargo");
        assert_eq!(checkout_name("https://example.com/team/tool/"), "tool");
        assert_eq!(checkout_name("git@github.com:owner/dots.git"), "dots");
        assert_eq!(checkout_name("git@host:solo.git"), "solo");
        assert_eq!(checkout_name(""), "repository");
    }

    #[test]
    fn builds_clone_then_status() {
        let repo = RepositoryConfig {
            url: "https://example.com/team/tool.git".to_string(),
            branch: Some("dev".to_string()),
        };
        let spec = repository_task(&repo, Path::new("/work"));

        assert_eq!(spec.name, "tool");
        assert_eq!(spec.family, GIT_FAMILY);
        assert_eq!(spec.steps.len(), 2);
        assert_eq!(spec.steps[0].stage, CLONE_STAGE);
        assert_eq!(
            spec.steps[0].command.display(),
            "git clone https://example.com/team/tool.git -b dev /work/tool"
        );
        assert_eq!(spec.steps[1].stage, STATUS_STAGE);
        assert_eq!(spec.steps[1].command.display(), "git -C /work/tool status");
        assert_eq!(spec.metadata["repository"], repo.url);
        assert_eq!(spec.metadata["branch"], "dev");
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn empty_branch_is_omitted() {
        let repo = RepositoryConfig {
            url: "https://example.com/r".to_string(),
            branch: Some(String::new()),
        };
        let spec = repository_task(&repo, Path::new("/w"));
        assert_eq!(spec.steps[0].command.args, vec!["clone", "https://example.com/r", "/w/r"]);
        assert!(!spec.metadata.contains_key("branch"));
    }
}
