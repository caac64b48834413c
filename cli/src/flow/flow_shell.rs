//! Interactive queue: `add` tasks from templates, `run` them, `list` what is pending.
use std::collections::HashMap;

use jobq_core::api::{AppConfig, CliError, Dispatcher, TaskTemplate};
use jobq_core::template;
use jobq_plugins::{factory, templates};
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Lines};
use tokio::sync::{mpsc, watch};

const BANNER: &str = "jobq shell started. Type 'add' to add tasks or 'run' to execute the queue.";
const USAGE: &str = "Unknown command. Available commands: add, run, list, exit.";
const GOODBYE: &str = "Exiting.";

pub struct Shell<'a, R, W> {
    input: Lines<R>,
    out: W,
    dispatcher: &'a Dispatcher,
    templates: Vec<TaskTemplate>,
    concurrency: usize,
    interrupts: Option<mpsc::UnboundedReceiver<()>>,
}

impl<'a, R, W> Shell<'a, R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(
        input: R,
        out: W,
        dispatcher: &'a Dispatcher,
        templates: Vec<TaskTemplate>,
        concurrency: usize,
    ) -> Self {
        Self {
            input: input.lines(),
            out,
            dispatcher,
            templates,
            concurrency: concurrency.max(1),
            interrupts: None,
        }
    }

    /// Each message cancels the current run, or ends the shell when idle.
    pub fn with_interrupts(mut self, interrupts: mpsc::UnboundedReceiver<()>) -> Self {
        self.interrupts = Some(interrupts);
        self
    }

    async fn say(&mut self, text: &str) -> io::Result<()> {
        self.out.write_all(text.as_bytes()).await?;
        self.out.write_all(b"\n").await?;
        self.out.flush().await
    }

    /// Prints `prompt` and reads one line; `None` on end of input or interrupt.
    async fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        self.out.write_all(prompt.as_bytes()).await?;
        self.out.flush().await?;
        tokio::select! {
            line = self.input.next_line() => line,
            _ = next_interrupt(&mut self.interrupts) => {
                tracing::debug!("interrupted at prompt");
                self.out.write_all(b"\n").await?;
                Ok(None)
            }
        }
    }

    /// Reads commands until `exit` or end of input.
    pub async fn run(&mut self) -> io::Result<()> {
        self.say(BANNER).await?;
        loop {
            let Some(line) = self.ask("> ").await? else {
                break;
            };
            match line.trim() {
                "" => continue,
                "add" => {
                    if !self.add().await? {
                        break;
                    }
                }
                "run" => self.run_queue().await?,
                "list" => self.list().await?,
                "exit" => break,
                other => {
                    tracing::debug!(command = other, "unknown shell command");
                    self.say(USAGE).await?;
                }
            }
        }
        self.say(GOODBYE).await
    }

    /// Returns false when input ended mid-dialogue.
    async fn add(&mut self) -> io::Result<bool> {
        self.say("Select a template to add:").await?;
        let table = templates::render_table(&self.templates);
        self.say(&table).await?;

        let Some(choice) = self.ask("Enter choice: ").await? else {
            return Ok(false);
        };
        let Some(chosen) = template::find(&self.templates, &choice).cloned() else {
            self.say("Invalid choice.").await?;
            return Ok(true);
        };

        let mut answers = HashMap::new();
        for prompt in &chosen.prompts {
            let Some(answer) = self.ask(&format!("{}: ", prompt.label)).await? else {
                return Ok(false);
            };
            answers.insert(prompt.key.clone(), answer);
        }

        let added = chosen
            .instantiate(&answers)
            .map_err(|e| e.to_string())
            .and_then(|spec| {
                let name = spec.name.clone();
                self.dispatcher
                    .enqueue(spec)
                    .map(|id| (name, id))
                    .map_err(|e| e.to_string())
            });
        match added {
            Ok((name, id)) => {
                tracing::info!(task_id = %id, task = %name, template = %chosen.name, "task added");
                self.say(&format!("Task '{name}' added to queue as {id}.")).await?;
            }
            Err(e) => self.say(&format!("Could not add task: {e}")).await?,
        }
        Ok(true)
    }

    async fn run_queue(&mut self) -> io::Result<()> {
        if self.dispatcher.pending() == 0 {
            return self.say("Queue is empty.").await;
        }
        self.say("Executing queue...").await?;

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let dispatcher = self.dispatcher;
        let run = dispatcher.run_until_cancelled(self.concurrency, cancel_rx);
        tokio::pin!(run);
        let report = loop {
            tokio::select! {
                report = &mut run => break report,
                _ = next_interrupt(&mut self.interrupts) => {
                    tracing::warn!("interrupt received, finishing in-flight tasks");
                    let _ = cancel_tx.send(true);
                }
            }
        };

        for failed in report.outcomes.iter().filter(|o| !o.success) {
            let line = format!(
                "  {} {} failed at {}: {}",
                failed.task_id, failed.task_name, failed.stage, failed.message
            );
            self.say(&line).await?;
        }
        self.say(&format!(
            "Run finished: {} succeeded, {} failed.",
            report.succeeded(),
            report.failed()
        ))
        .await?;
        if report.cancelled {
            self.say(&format!(
                "Run cancelled, {} task(s) left in queue.",
                report.pending
            ))
            .await?;
        }
        Ok(())
    }

    async fn list(&mut self) -> io::Result<()> {
        let pending = self.dispatcher.list();
        if pending.is_empty() {
            return self.say("Queue is empty.").await;
        }
        for (i, task) in pending.iter().enumerate() {
            let sudo = if task.needs_elevation { " [sudo]" } else { "" };
            let line = format!("{}. {}: {}{}", i + 1, task.name, task.command().display(), sudo);
            self.say(&line).await?;
        }
        Ok(())
    }
}

/// Resolves on the next interrupt; never resolves without a source.
async fn next_interrupt(interrupts: &mut Option<mpsc::UnboundedReceiver<()>>) {
    if let Some(rx) = interrupts {
        if rx.recv().await.is_some() {
            return;
        }
    }
    std::future::pending::<()>().await
}

#[tracing::instrument(name = "cli.run_shell", skip(cfg))]
pub async fn run_shell_flow(cfg: &AppConfig, concurrency: usize) -> Result<i32, CliError> {
    let dispatcher = factory::build_dispatcher(cfg)?;
    let catalog = templates::catalog(&cfg.templates);

    // One handler for the whole session; the shell decides what an interrupt means.
    let (interrupt_tx, interrupt_rx) = mpsc::unbounded_channel();
    let ctrl_c = tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if interrupt_tx.send(()).is_err() {
                break;
            }
        }
    });

    let mut shell = Shell::new(
        BufReader::new(io::stdin()),
        io::stdout(),
        &dispatcher,
        catalog,
        concurrency,
    )
    .with_interrupts(interrupt_rx);
    let result = shell.run().await;
    ctrl_c.abort();
    result?;
    Ok(0)
}
