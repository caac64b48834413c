use std::process::Stdio;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use jobq_core::api::{ElevationConfig, Invocation, RingBytes, Step, StepResult, StepStatus, Task, TaskExecutor};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::process::Command;
use tokio::task::JoinHandle;

/// Runs each step as a child process and captures the tail of its output.
pub struct ProcessExecutor {
    elevation: ElevationConfig,
    capture_bytes: usize,
    echo: bool,
}

impl ProcessExecutor {
    pub fn new(elevation: ElevationConfig, capture_bytes: usize, echo: bool) -> Self {
        Self {
            elevation,
            capture_bytes: capture_bytes.max(1),
            echo,
        }
    }
}

#[async_trait]
impl TaskExecutor for ProcessExecutor {
    fn name(&self) -> &str {
        "process"
    }

    async fn run_step(&self, task: &Task, step: &Step) -> StepResult {
        let inv = Invocation::plan(task, step, &self.elevation);
        let started = Instant::now();

        let mut cmd = Command::new(&inv.program);
        cmd.args(&inv.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // The elevation tool may need the terminal to ask for a password.
        cmd.stdin(if task.needs_elevation {
            Stdio::inherit()
        } else {
            Stdio::null()
        });
        if let Some(cwd) = &inv.cwd {
            cmd.current_dir(cwd);
        }

        tracing::debug!(task_id = %task.id, argv = ?inv.argv(), cwd = ?inv.cwd, "spawning process");
        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                return StepResult::spawn_failed(format!("failed to start {}: {e}", inv.program))
                    .with_duration(started.elapsed().as_millis() as u64);
            }
        };

        let ring = RingBytes::new(self.capture_bytes);
        let mut pumps = Vec::with_capacity(2);
        if let Some(rd) = child.stdout.take() {
            pumps.push(pump(rd, tokio::io::stdout(), ring.clone(), self.echo));
        }
        if let Some(rd) = child.stderr.take() {
            pumps.push(pump(rd, tokio::io::stderr(), ring.clone(), self.echo));
        }

        let waited = child.wait().await;
        for handle in pumps {
            if let Err(e) = handle.await {
                tracing::debug!(task_id = %task.id, "output pump aborted: {e}");
            }
        }

        let mut output = ring.to_string_lossy();
        let status = match waited {
            Ok(status) => match status.code() {
                Some(code) => StepStatus::Exited(code),
                None => StepStatus::Terminated,
            },
            Err(e) => {
                tracing::warn!(task_id = %task.id, "failed to wait for child: {e}");
                output.push_str(&format!("\nwait failed: {e}"));
                StepStatus::Terminated
            }
        };

        StepResult {
            status,
            output,
            duration_ms: started.elapsed().as_millis() as u64,
        }
    }
}

/// Copies `rd` into `ring`, echoing to `wr` while `echo` holds.
fn pump<R, W>(mut rd: R, mut wr: W, ring: Arc<RingBytes>, mut echo: bool) -> JoinHandle<u64>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = vec![0u8; 16 * 1024];
        let mut total = 0u64;
        loop {
            let n = match rd.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    tracing::debug!("child output read failed: {e}");
                    break;
                }
            };
            ring.push(&buf[..n]);
            if echo && wr.write_all(&buf[..n]).await.is_err() {
                echo = false;
            }
            total += n as u64;
        }
        if echo {
            let _ = wr.flush().await;
        }
        total
    })
}
