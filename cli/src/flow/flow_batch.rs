//! Bulk mode: every configured repository becomes a task, drained in parallel.
use jobq_core::api::{AppConfig, CliError, Outcome, RunReport};
use jobq_plugins::{factory, repository};
use tokio::sync::watch;

/// Exit status when Ctrl-C stopped the run.
pub const EXIT_CANCELLED: i32 = 130;

#[tracing::instrument(name = "cli.run_batch", skip(cfg))]
pub async fn run_batch_flow(cfg: &AppConfig) -> Result<i32, CliError> {
    if cfg.repositories.is_empty() {
        println!("No repositories configured.");
        return Ok(0);
    }

    let workdir = cfg.workdir_path();
    std::fs::create_dir_all(&workdir)?;
    tracing::info!(workdir = %workdir.display(), repositories = cfg.repositories.len(), "starting bulk run");

    let dispatcher = factory::build_dispatcher(cfg)?;
    dispatcher.enqueue_all(
        cfg.repositories
            .iter()
            .map(|repo| repository::repository_task(repo, &workdir)),
    )?;

    let (cancel_tx, cancel_rx) = watch::channel(false);
    let ctrl_c = tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if *cancel_tx.borrow() {
                eprintln!("Still waiting for running tasks to finish.");
                continue;
            }
            tracing::warn!("interrupt received, finishing in-flight tasks");
            let _ = cancel_tx.send(true);
        }
    });

    let report = dispatcher
        .run_until_cancelled(cfg.dispatcher.concurrency, cancel_rx)
        .await;
    ctrl_c.abort();

    if cfg.dispatcher.output != "jsonl" {
        for outcome in &report.outcomes {
            println!("{}", summary_line(outcome));
        }
        if report.cancelled {
            println!("Cancelled with {} task(s) not started.", report.pending);
        }
    }

    Ok(exit_code(&report))
}

pub fn summary_line(outcome: &Outcome) -> String {
    format!(
        "Repository: {}, Stage: {}, Success: {}, Message: {}",
        outcome.identity, outcome.stage, outcome.success, outcome.message
    )
}

pub fn exit_code(report: &RunReport) -> i32 {
    if report.cancelled {
        EXIT_CANCELLED
    } else if report.all_succeeded() {
        0
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobq_core::api::TaskId;
    use pretty_assertions::assert_eq;

    fn outcome(success: bool) -> Outcome {
        Outcome {
            task_id: TaskId(1),
            task_name: "tool".to_string(),
            identity: "https://example.com/team/tool.git".to_string(),
            stage: if success { "Completed" } else { "Cloning" }.to_string(),
            success,
            message: if success {
                String::new()
            } else {
                "exit status 128: fatal: repository not found".to_string()
            },
            attempts: 1,
            exit_code: Some(if success { 0 } else { 128 }),
            duration_ms: 3,
            queued_ms: 3,
        }
    }

    fn report(outcomes: Vec<Outcome>, cancelled: bool) -> RunReport {
        RunReport {
            run_id: "run".to_string(),
            outcomes,
            retries: 0,
            duration_ms: 10,
            cancelled,
            pending: 0,
        }
    }

    #[test]
    fn formats_summary_lines() {
        assert_eq!(
            summary_line(&outcome(true)),
            "Repository: https://example.com/team/tool.git, Stage: Completed, Success: true, Message: "
        );
        assert_eq!(
            summary_line(&outcome(false)),
            "Repository: https://example.com/team/tool.git, Stage: Cloning, Success: false, Message: exit status 128: fatal: repository not found"
        );
    }

    #[test]
    fn exit_codes() {
        assert_eq!(exit_code(&report(vec![outcome(true)], false)), 0);
        assert_eq!(exit_code(&report(vec![outcome(true), outcome(false)], false)), 1);
        assert_eq!(exit_code(&report(vec![outcome(true)], true)), EXIT_CANCELLED);
    }

    #[tokio::test]
    async fn empty_config_is_a_no_op() {
        let cfg = AppConfig::default();
        assert_eq!(run_batch_flow(&cfg).await.unwrap(), 0);
    }
}
