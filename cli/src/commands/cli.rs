use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Jsonl,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Jsonl => "jsonl",
        }
    }
}

/// Runs queues of external commands with bounded concurrency and lock-aware retry.
#[derive(Parser, Debug)]
#[command(name = "jobq", version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config file to use instead of ~/.jobq/config.toml or ./config.toml.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Format of run events.
    #[arg(long, value_enum, global = true)]
    pub output: Option<OutputFormat>,

    /// Print a line when each attempt starts.
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Total attempts per task; 0 retries lock failures forever.
    #[arg(long, global = true)]
    pub max_attempts: Option<u32>,
}

#[derive(ClapArgs, Debug, Clone, Default)]
pub struct RunArgs {
    /// Repositories processed at once.
    #[arg(long)]
    pub threads: Option<usize>,

    /// Directory repositories are cloned into.
    #[arg(long)]
    pub workdir: Option<String>,

    /// Do not forward git output to the console.
    #[arg(long)]
    pub quiet_output: bool,
}

#[derive(ClapArgs, Debug, Clone, Default)]
pub struct ShellArgs {
    /// Tasks run at once by `run`; the shell is sequential by default.
    #[arg(long)]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Clone and check every configured repository.
    Run(RunArgs),
    /// Interactive queue: add, run, list, exit.
    Shell(ShellArgs),
    /// List the templates available to `add`.
    Templates,
}
