//! External process runner
//!
//! Spawns one child process whose stdout and stderr share a single pipe, so
//! the child's writes arrive as one stream in the order they were made. Every
//! line is handed to a callback before the next one is taken. The future
//! completes once the pipe reached EOF and the child has been reaped, or once
//! the cancellation token fired and the child was killed.

use async_trait::async_trait;
use std::io::{PipeReader, Read};
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::core::command_line::CommandLine;
use crate::core::models::{AppError, AppResult, RunOutcome};

/// Lines the reader may run ahead of the callback
pub const LINE_CHANNEL_CAPACITY: usize = 64;

const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Runs a command and streams its merged output, line by line
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(
        &self,
        command: &CommandLine,
        cancel: CancellationToken,
        on_line: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> AppResult<RunOutcome>;
}

/// Runner backed by real OS processes
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcessRunner;

#[async_trait]
impl ProcessRunner for SystemProcessRunner {
    async fn run(
        &self,
        command: &CommandLine,
        cancel: CancellationToken,
        on_line: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> AppResult<RunOutcome> {
        run_console_app(command, &cancel, |line| on_line(line)).await
    }
}

/// Spawn `command` and deliver each line of its combined output to `on_line`
pub async fn run_console_app<F>(
    command: &CommandLine,
    cancel: &CancellationToken,
    mut on_line: F,
) -> AppResult<RunOutcome>
where
    F: FnMut(&str),
{
    let started = Instant::now();

    // stdout 和 stderr 共用同一个管道写端，输出顺序与子进程写入顺序一致
    let (reader, writer) = std::io::pipe()?;
    let stderr_writer = writer.try_clone()?;

    // The Command temporary owns the parent's write ends and drops them here,
    // so EOF arrives once the child and its descendants close theirs.
    let mut child = Command::new(command.program())
        .args(command.args())
        .stdin(Stdio::null())
        .stdout(Stdio::from(writer))
        .stderr(Stdio::from(stderr_writer))
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| AppError::Spawn {
            program: command.program().to_string(),
            source,
        })?;

    info!("🚀 Spawned {} (pid {:?})", command.program(), child.id());

    let (tx, mut rx) = mpsc::channel::<String>(LINE_CHANNEL_CAPACITY);
    let forwarder = tokio::task::spawn_blocking(move || forward_lines(reader, tx));

    let mut lines = 0usize;
    let cancelled = tokio::select! {
        _ = cancel.cancelled() => true,
        _ = async {
            while let Some(line) = rx.recv().await {
                on_line(&line);
                lines += 1;
            }
        } => false,
    };

    if cancelled {
        warn!("⏹️ Cancelling {} after {} lines", command.program(), lines);
        // 关闭接收端，阻塞中的读取线程在下一次发送时退出
        drop(rx);
        if let Err(e) = child.kill().await {
            warn!("Failed to kill {}: {}", command.program(), e);
        }
    }

    let status = child.wait().await?;
    if !cancelled {
        if let Err(e) = forwarder.await {
            warn!("Output reader for {} failed: {}", command.program(), e);
        }
    }

    let outcome = RunOutcome {
        exit_code: status.code(),
        lines,
        cancelled,
        elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
    };

    if outcome.success() {
        info!(
            "✅ {} finished: {} lines in {}ms",
            command.program(),
            outcome.lines,
            outcome.elapsed_ms
        );
    } else {
        warn!(
            "⚠️ {} ended with {} (cancelled: {})",
            command.program(),
            outcome.describe_exit(),
            outcome.cancelled
        );
    }

    Ok(outcome)
}

/// Blocking read loop over the shared pipe, run on the blocking pool
fn forward_lines(mut reader: PipeReader, tx: mpsc::Sender<String>) {
    let mut decoder = LineDecoder::default();
    let mut chunk = vec![0u8; READ_CHUNK_SIZE];
    let mut lines = Vec::new();

    loop {
        let read = match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!("Failed to read child output: {}", e);
                break;
            }
        };

        decoder.feed(&chunk[..read], &mut lines);
        for line in lines.drain(..) {
            trace!("{}", line);
            if tx.blocking_send(line).is_err() {
                debug!("Line consumer went away");
                return;
            }
        }
    }

    if let Some(line) = decoder.finish() {
        trace!("{}", line);
        let _ = tx.blocking_send(line);
    }
}

/// Incremental splitter for `\n`, `\r` and `\r\n` terminated text
///
/// Progress output from downloaders rewrites the same terminal row with `\r`,
/// so a bare carriage return ends a line as well. Invalid UTF-8 is replaced.
#[derive(Debug, Default)]
pub struct LineDecoder {
    pending: Vec<u8>,
    after_cr: bool,
}

impl LineDecoder {
    /// Push bytes, appending every completed line to `out`
    pub fn feed(&mut self, bytes: &[u8], out: &mut Vec<String>) {
        for &byte in bytes {
            if self.after_cr {
                self.after_cr = false;
                if byte == b'\n' {
                    continue;
                }
            }
            match byte {
                b'\n' => out.push(self.take_line()),
                b'\r' => {
                    out.push(self.take_line());
                    self.after_cr = true;
                }
                other => self.pending.push(other),
            }
        }
    }

    /// Flush an unterminated trailing line at end of stream
    pub fn finish(&mut self) -> Option<String> {
        self.after_cr = false;
        if self.pending.is_empty() {
            None
        } else {
            Some(self.take_line())
        }
    }

    fn take_line(&mut self) -> String {
        let line = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        line
    }
}
