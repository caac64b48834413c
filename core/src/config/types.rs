use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::template::TaskTemplate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory repositories are cloned into. `~` is expanded.
    #[serde(default = "default_workdir")]
    pub workdir: String,

    /// Print per-task start lines in addition to completions.
    #[serde(default)]
    pub verbose: bool,

    /// Forces the log level to `debug`.
    #[serde(default)]
    pub debug: bool,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub dispatcher: DispatcherConfig,

    #[serde(default)]
    pub elevation: ElevationConfig,

    /// Per-family classifier overrides, keyed by task family (`pacman`, `git`, ...).
    #[serde(default)]
    pub classifiers: BTreeMap<String, ClassifierConfig>,

    #[serde(default)]
    pub repositories: Vec<RepositoryConfig>,

    /// Extra task templates offered by the interactive shell.
    #[serde(default)]
    pub templates: Vec<TaskTemplate>,
}

fn default_workdir() -> String {
    "~/.jobq/work".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workdir: default_workdir(),
            verbose: false,
            debug: false,
            logging: LoggingConfig::default(),
            dispatcher: DispatcherConfig::default(),
            elevation: ElevationConfig::default(),
            classifiers: BTreeMap::new(),
            repositories: Vec::new(),
            templates: Vec::new(),
        }
    }
}

impl AppConfig {
    pub fn workdir_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.workdir).into_owned())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or OS temp dir if unset).
    #[serde(default = "default_logging_file")]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "jobq_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    /// Optional directory for log files. If empty or unset, uses OS temp dir.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_file() -> bool {
    true
}

fn default_logging_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: default_logging_file(),
            level: default_logging_level(),
            directory: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatcherConfig {
    /// Number of attempts allowed in flight at once. 1 runs the queue sequentially.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Renderer for run events: "text" or "jsonl".
    #[serde(default = "default_output_format")]
    pub output: String,

    /// Forward child stdout/stderr to the console while it runs.
    #[serde(default = "default_echo_output")]
    pub echo_output: bool,

    /// Bytes of combined child output kept for classification and reporting.
    #[serde(default = "default_capture_bytes")]
    pub capture_bytes: usize,

    /// Show an indicatif progress bar (only honoured when output is not echoed).
    #[serde(default)]
    pub progress_bar: bool,

    /// Plain `[OK]` / `[FAIL]` markers instead of emoji in text output.
    #[serde(default)]
    pub ascii_output: bool,

    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_concurrency() -> usize {
    4
}

fn default_output_format() -> String {
    "text".to_string()
}

fn default_echo_output() -> bool {
    true
}

fn default_capture_bytes() -> usize {
    64 * 1024
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            output: default_output_format(),
            echo_output: default_echo_output(),
            capture_bytes: default_capture_bytes(),
            progress_bar: false,
            ascii_output: false,
            retry: RetryConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// "fixed", "linear" or "exponential-backoff".
    #[serde(default = "default_retry_strategy")]
    pub strategy: String,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Total attempts allowed per task. 0 retries transient failures forever.
    #[serde(default)]
    pub max_attempts: u32,
}

fn default_retry_strategy() -> String {
    "fixed".to_string()
}

fn default_base_delay_ms() -> u64 {
    5_000
}

fn default_max_delay_ms() -> u64 {
    60_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            strategy: default_retry_strategy(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            max_attempts: 0,
        }
    }
}

/// Wrapper used for tasks that need elevated privileges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElevationConfig {
    #[serde(default = "default_elevation_program")]
    pub program: String,
    /// Arguments placed between the wrapper and the wrapped program, e.g. `["-n"]`.
    #[serde(default)]
    pub args: Vec<String>,
}

fn default_elevation_program() -> String {
    "sudo".to_string()
}

impl Default for ElevationConfig {
    fn default() -> Self {
        Self {
            program: default_elevation_program(),
            args: Vec::new(),
        }
    }
}

/// Rules that mark a failure as transient lock contention.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default)]
    pub busy_exit_codes: Vec<i32>,
    #[serde(default)]
    pub lock_substrings: Vec<String>,
    /// Regular expressions matched against the combined error text and output.
    #[serde(default)]
    pub lock_file_patterns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryConfig {
    pub url: String,
    #[serde(default)]
    pub branch: Option<String>,
}

impl RepositoryConfig {
    pub fn branch(&self) -> Option<&str> {
        self.branch
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())
    }
}
