use std::collections::HashMap;
use std::sync::Arc;

use regex::Regex;

use crate::config::ClassifierConfig;
use crate::error::ConfigError;

use super::traits::{Classification, Failure, OutcomeClassifier};

/// Lock messages common to most tools.
pub const GENERIC_LOCK_SUBSTRINGS: &[&str] = &[
    "unable to lock database",
    "failed to lock",
    "resource temporarily unavailable",
];

/// Lock files common to most tools.
pub const GENERIC_LOCK_FILE_PATTERNS: &[&str] = &[r"/tmp/lockfile", r"/var/lock/.*"];

/// Classifies a failure as transient when it looks like lock contention.
///
/// A failure is transient if its exit code is one of `busy_exit_codes`, if the
/// combined error and output text contains one of `lock_substrings`
/// (case-insensitive), or if that text matches one of `lock_file_patterns`.
#[derive(Debug, Clone)]
pub struct LockPatternClassifier {
    name: String,
    busy_exit_codes: Vec<i32>,
    lock_substrings: Vec<String>,
    lock_file_patterns: Vec<Regex>,
}

impl LockPatternClassifier {
    pub fn from_config(name: impl Into<String>, cfg: &ClassifierConfig) -> Result<Self, ConfigError> {
        let name = name.into();
        let lock_file_patterns = cfg
            .lock_file_patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|source| ConfigError::InvalidPattern {
                    family: name.clone(),
                    pattern: p.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name,
            busy_exit_codes: cfg.busy_exit_codes.clone(),
            lock_substrings: cfg
                .lock_substrings
                .iter()
                .map(|s| s.to_lowercase())
                .collect(),
            lock_file_patterns,
        })
    }

    /// Text-only rules, no exit code heuristic. Used for families without their own rules.
    pub fn generic() -> Self {
        let cfg = ClassifierConfig {
            busy_exit_codes: Vec::new(),
            lock_substrings: GENERIC_LOCK_SUBSTRINGS.iter().map(|s| s.to_string()).collect(),
            lock_file_patterns: GENERIC_LOCK_FILE_PATTERNS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        };
        Self::from_config("generic", &cfg).unwrap_or_else(|_| Self {
            name: "generic".to_string(),
            busy_exit_codes: Vec::new(),
            lock_substrings: Vec::new(),
            lock_file_patterns: Vec::new(),
        })
    }
}

impl OutcomeClassifier for LockPatternClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn classify(&self, failure: &Failure<'_>) -> Classification {
        if failure
            .exit_code
            .is_some_and(|code| self.busy_exit_codes.contains(&code))
        {
            return Classification::Transient;
        }

        let text = failure.combined_text();
        let lowered = text.to_lowercase();
        if self.lock_substrings.iter().any(|s| lowered.contains(s.as_str())) {
            return Classification::Transient;
        }
        if self.lock_file_patterns.iter().any(|re| re.is_match(&text)) {
            return Classification::Transient;
        }
        Classification::Permanent
    }
}

/// Treats every failure as permanent.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermanentClassifier;

impl OutcomeClassifier for PermanentClassifier {
    fn name(&self) -> &str {
        "permanent"
    }

    fn classify(&self, _failure: &Failure<'_>) -> Classification {
        Classification::Permanent
    }
}

/// Transient whenever `predicate` returns true.
pub struct PredicateClassifier<F> {
    name: String,
    predicate: F,
}

impl<F> PredicateClassifier<F>
where
    F: Fn(&Failure<'_>) -> bool + Send + Sync,
{
    pub fn new(name: impl Into<String>, predicate: F) -> Self {
        Self {
            name: name.into(),
            predicate,
        }
    }
}

impl<F> OutcomeClassifier for PredicateClassifier<F>
where
    F: Fn(&Failure<'_>) -> bool + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn classify(&self, failure: &Failure<'_>) -> Classification {
        if (self.predicate)(failure) {
            Classification::Transient
        } else {
            Classification::Permanent
        }
    }
}

/// Classifier lookup by task family, with a fallback for unknown families.
#[derive(Clone)]
pub struct ClassifierRegistry {
    families: HashMap<String, Arc<dyn OutcomeClassifier>>,
    fallback: Arc<dyn OutcomeClassifier>,
}

impl ClassifierRegistry {
    pub fn new(fallback: Arc<dyn OutcomeClassifier>) -> Self {
        Self {
            families: HashMap::new(),
            fallback,
        }
    }

    pub fn with(mut self, family: impl Into<String>, classifier: Arc<dyn OutcomeClassifier>) -> Self {
        self.insert(family, classifier);
        self
    }

    pub fn insert(&mut self, family: impl Into<String>, classifier: Arc<dyn OutcomeClassifier>) {
        self.families.insert(family.into(), classifier);
    }

    pub fn for_family(&self, family: &str) -> &Arc<dyn OutcomeClassifier> {
        self.families.get(family).unwrap_or(&self.fallback)
    }

    pub fn families(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.families.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for ClassifierRegistry {
    fn default() -> Self {
        Self::new(Arc::new(LockPatternClassifier::generic()))
    }
}

impl std::fmt::Debug for ClassifierRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassifierRegistry")
            .field("families", &self.families())
            .field("fallback", &self.fallback.name())
            .finish()
    }
}
