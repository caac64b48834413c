//! Assembly layer: merge CLI overrides into the config and pick a flow.
use jobq_core::api::{AppConfig, CliError, ConfigError};
use jobq_plugins::templates;

use crate::commands::cli::{Args, Commands, RunArgs};
use crate::flow;

/// Concurrency of the interactive shell unless `--threads` says otherwise.
pub const SHELL_CONCURRENCY: usize = 1;

pub fn apply_global_args(cfg: &mut AppConfig, args: &Args) {
    if let Some(output) = args.output {
        cfg.dispatcher.output = output.as_str().to_string();
    }
    if args.verbose {
        cfg.verbose = true;
    }
    if let Some(max) = args.max_attempts {
        cfg.dispatcher.retry.max_attempts = max;
    }
}

pub fn apply_run_args(cfg: &mut AppConfig, run: &RunArgs) {
    if let Some(threads) = run.threads.filter(|t| *t > 0) {
        cfg.dispatcher.concurrency = threads;
    }
    if let Some(workdir) = run.workdir.as_deref().map(str::trim).filter(|w| !w.is_empty()) {
        cfg.workdir = workdir.to_string();
    }
    if run.quiet_output {
        cfg.dispatcher.echo_output = false;
    }
}

pub fn exit_code_for_error(e: &CliError) -> i32 {
    // 0: success
    // 1: some task failed (returned as a normal exit code)
    // 11: config error
    // 20: io / command error
    // 50: internal/uncategorized
    match e {
        CliError::Config(ce) => config_exit_code(ce),
        CliError::Io(_) => 20,
        CliError::Command(_) => 20,
        CliError::Submit(_) => 20,
        CliError::Anyhow(err) => err.downcast_ref::<ConfigError>().map_or(50, config_exit_code),
    }
}

fn config_exit_code(e: &ConfigError) -> i32 {
    match e {
        ConfigError::Read { .. } => 20,
        _ => 11,
    }
}

#[tracing::instrument(name = "cli.run_app", skip(args, cfg))]
pub async fn run_app_with_config(args: Args, mut cfg: AppConfig) -> Result<i32, CliError> {
    apply_global_args(&mut cfg, &args);

    match args.command {
        Some(Commands::Run(run)) => {
            apply_run_args(&mut cfg, &run);
            flow::run_batch_flow(&cfg).await
        }
        Some(Commands::Templates) => {
            println!("{}", templates::render_table(&templates::catalog(&cfg.templates)));
            Ok(0)
        }
        Some(Commands::Shell(shell)) => {
            let threads = shell.threads.filter(|t| *t > 0).unwrap_or(SHELL_CONCURRENCY);
            flow::run_shell_flow(&cfg, threads).await
        }
        None => flow::run_shell_flow(&cfg, SHELL_CONCURRENCY).await,
    }
}
