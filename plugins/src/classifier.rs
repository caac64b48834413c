//! Lock-contention rules for the task families jobq knows about.

use std::collections::BTreeMap;

use jobq_core::api::ClassifierConfig;
use jobq_core::executor::classifier::{GENERIC_LOCK_FILE_PATTERNS, GENERIC_LOCK_SUBSTRINGS};

pub const PACMAN_FAMILY: &str = "pacman";
pub const GIT_FAMILY: &str = "git";

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// pacman exits 1 when its database is locked, among other failures.
pub fn pacman() -> ClassifierConfig {
    let mut patterns = vec![r"/var/lib/pacman/db\.lck".to_string()];
    patterns.extend(strings(GENERIC_LOCK_FILE_PATTERNS));
    ClassifierConfig {
        busy_exit_codes: vec![1],
        lock_substrings: strings(GENERIC_LOCK_SUBSTRINGS),
        lock_file_patterns: patterns,
    }
}

/// git reports a held index or ref lock in its output; exit codes are not telling.
pub fn git() -> ClassifierConfig {
    let mut substrings = strings(GENERIC_LOCK_SUBSTRINGS);
    substrings.extend(strings(&[
        "another git process seems to be running",
        "cannot lock ref",
    ]));
    let mut patterns = vec![r"index\.lock".to_string(), r"\.git/.*\.lock".to_string()];
    patterns.extend(strings(GENERIC_LOCK_FILE_PATTERNS));
    ClassifierConfig {
        busy_exit_codes: Vec::new(),
        lock_substrings: substrings,
        lock_file_patterns: patterns,
    }
}

/// Built-in presets merged with the configured families. A configured family
/// replaces the preset of the same name.
pub fn merged(overrides: &BTreeMap<String, ClassifierConfig>) -> BTreeMap<String, ClassifierConfig> {
    let mut all = BTreeMap::from([
        (PACMAN_FAMILY.to_string(), pacman()),
        (GIT_FAMILY.to_string(), git()),
    ]);
    all.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
    all
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobq_core::api::{Classification, Failure, LockPatternClassifier, OutcomeClassifier};
    use Classification::{Permanent, Transient};

    fn classify(cfg: ClassifierConfig, exit_code: Option<i32>, output: &str) -> Classification {
        let c = LockPatternClassifier::from_config("t", &cfg).unwrap();
        let error = exit_code.map(|c| format!("exit status {c}")).unwrap_or_default();
        c.classify(&Failure {
            exit_code,
            error: &error,
            output,
            attempt: 1,
        })
    }

    #[test]
    fn pacman_rules() {
        let cases = [
            (Some(1), "", Transient),
            (Some(8), "error: failed to init transaction (unable to lock database)", Transient),
            (Some(8), "error: could not lock database: File exists\n  if you're sure a package manager is not already\n  running, you can remove /var/lib/pacman/db.lck", Transient),
            (Some(8), "error: target not found: nosuchpkg", Permanent),
            (None, "", Permanent),
        ];
        for (code, output, expected) in cases {
            assert_eq!(classify(pacman(), code, output), expected, "{code:?} {output}");
        }
    }

    #[test]
    fn git_rules() {
        let cases = [
            (Some(128), "fatal: Unable to create '/src/r/.git/index.lock': File exists.", Transient),
            (Some(128), "Another git process seems to be running in this repository", Transient),
            (Some(1), "error: cannot lock ref 'refs/heads/main'", Transient),
            (Some(1), "", Permanent),
            (Some(128), "fatal: repository 'https://example.com/missing.git/' not found", Permanent),
        ];
        for (code, output, expected) in cases {
            assert_eq!(classify(git(), code, output), expected, "{code:?} {output}");
        }
    }

    #[test]
    fn configured_family_replaces_preset() {
        let overrides = BTreeMap::from([
            (
                "pacman".to_string(),
                ClassifierConfig {
                    busy_exit_codes: Vec::new(),
                    lock_substrings: vec!["busy".to_string()],
                    lock_file_patterns: Vec::new(),
                },
            ),
            ("apt".to_string(), ClassifierConfig::default()),
        ]);
        let all = merged(&overrides);
        assert_eq!(all.keys().collect::<Vec<_>>(), vec!["apt", "git", "pacman"]);
        assert_eq!(classify(all["pacman"].clone(), Some(1), ""), Permanent);
        assert_eq!(classify(all["pacman"].clone(), Some(1), "BUSY"), Transient);
    }
}
