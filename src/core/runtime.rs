//! Download runtime command router.
//!
//! A thin async command queue that owns the single in-flight invocation,
//! serializes start/cancel/status calls and keeps the blocking read loop off
//! whichever thread drives the terminal.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::core::command_line::CommandLine;
use crate::core::models::{
    AppError, AppResult, InvocationId, InvocationSummary, RunOutcome, RuntimeEvent,
};
use crate::core::output_buffer::OutputBuffer;
use crate::core::process_runner::ProcessRunner;

const COMMAND_QUEUE_CAPACITY: usize = 32;
const EVENT_CAPACITY: usize = 64;

/// Commands understood by the runtime router.
#[derive(Debug)]
pub enum RuntimeCommand {
    Start {
        command: CommandLine,
        respond_to: oneshot::Sender<AppResult<InvocationTicket>>,
    },
    Cancel {
        respond_to: oneshot::Sender<AppResult<bool>>,
    },
    Status {
        respond_to: oneshot::Sender<AppResult<Option<InvocationSummary>>>,
    },
}

/// Awaitable handle on one started invocation
#[derive(Debug)]
pub struct InvocationTicket {
    id: InvocationId,
    outcome: oneshot::Receiver<AppResult<RunOutcome>>,
}

impl InvocationTicket {
    pub fn id(&self) -> InvocationId {
        self.id
    }

    /// Wait until the child exited and all of its output reached the buffer
    pub async fn wait(self) -> AppResult<RunOutcome> {
        self.outcome
            .await
            .map_err(|_| AppError::System("Download runtime dropped the invocation".into()))?
    }
}

/// Handle exposed to the shell and the rest of the backend.
#[derive(Clone)]
pub struct DownloadRuntimeHandle {
    sender: mpsc::Sender<RuntimeCommand>,
    events: broadcast::Sender<RuntimeEvent>,
}

impl DownloadRuntimeHandle {
    async fn send_command<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<AppResult<T>>) -> RuntimeCommand,
    ) -> AppResult<T> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(build(tx))
            .await
            .map_err(|e| AppError::System(format!("Download runtime unavailable: {}", e)))?;
        rx.await
            .map_err(|_| AppError::System("Download runtime dropped response".into()))?
    }

    /// Start `command`; refused with [`AppError::Busy`] while another run is active
    pub async fn start(&self, command: CommandLine) -> AppResult<InvocationTicket> {
        self.send_command(|tx| RuntimeCommand::Start {
            command,
            respond_to: tx,
        })
        .await
    }

    /// Returns `true` when an active invocation was signalled
    pub async fn cancel(&self) -> AppResult<bool> {
        self.send_command(|tx| RuntimeCommand::Cancel { respond_to: tx })
            .await
    }

    pub async fn status(&self) -> AppResult<Option<InvocationSummary>> {
        self.send_command(|tx| RuntimeCommand::Status { respond_to: tx })
            .await
    }

    pub async fn is_busy(&self) -> AppResult<bool> {
        Ok(self.status().await?.is_some())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RuntimeEvent> {
        self.events.subscribe()
    }
}

/// Spawn the router loop on the current tokio runtime.
pub fn spawn_download_runtime(
    runner: Arc<dyn ProcessRunner>,
    buffer: OutputBuffer,
) -> AppResult<DownloadRuntimeHandle> {
    let handle = Handle::try_current()
        .map_err(|e| AppError::System(format!("No tokio runtime available: {}", e)))?;

    let (tx, rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
    let (events, _) = broadcast::channel(EVENT_CAPACITY);

    let router = Router {
        runner,
        buffer,
        events: events.clone(),
        active: None,
    };
    handle.spawn(router.run(rx));
    info!("[RUNTIME] Download router spawned");

    Ok(DownloadRuntimeHandle { sender: tx, events })
}

struct ActiveInvocation {
    summary: InvocationSummary,
    cancel: CancellationToken,
    respond_to: oneshot::Sender<AppResult<RunOutcome>>,
}

struct Completion {
    id: InvocationId,
    result: AppResult<RunOutcome>,
}

struct Router {
    runner: Arc<dyn ProcessRunner>,
    buffer: OutputBuffer,
    events: broadcast::Sender<RuntimeEvent>,
    active: Option<ActiveInvocation>,
}

impl Router {
    async fn run(mut self, mut rx: mpsc::Receiver<RuntimeCommand>) {
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<Completion>();

        loop {
            tokio::select! {
                command = rx.recv() => match command {
                    Some(command) => self.handle_command(command, &done_tx),
                    None => break,
                },
                Some(done) = done_rx.recv() => self.complete(done),
            }
        }

        debug!("Download runtime channel closed, exiting router loop");
        if let Some(active) = self.active.take() {
            // 所有句柄都已释放，终止仍在运行的子进程
            active.cancel.cancel();
        }
    }

    #[instrument(skip(self, command, done_tx), fields(?command))]
    fn handle_command(
        &mut self,
        command: RuntimeCommand,
        done_tx: &mpsc::UnboundedSender<Completion>,
    ) {
        match command {
            RuntimeCommand::Start {
                command,
                respond_to,
            } => {
                let result = self.start(command, done_tx);
                let _ = respond_to.send(result);
            }
            RuntimeCommand::Cancel { respond_to } => {
                let signalled = match &self.active {
                    Some(active) => {
                        info!("[RUNTIME_CMD] Cancelling invocation {}", active.summary.id);
                        active.cancel.cancel();
                        true
                    }
                    None => false,
                };
                let _ = respond_to.send(Ok(signalled));
            }
            RuntimeCommand::Status { respond_to } => {
                let summary = self.active.as_ref().map(|active| active.summary.clone());
                let _ = respond_to.send(Ok(summary));
            }
        }
    }

    fn start(
        &mut self,
        command: CommandLine,
        done_tx: &mpsc::UnboundedSender<Completion>,
    ) -> AppResult<InvocationTicket> {
        if let Some(active) = &self.active {
            warn!(
                "[RUNTIME_CMD] Refusing start, invocation {} still running",
                active.summary.id
            );
            return Err(AppError::Busy);
        }

        let id = InvocationId::new();
        let cancel = CancellationToken::new();
        let (outcome_tx, outcome_rx) = oneshot::channel();
        let summary = InvocationSummary {
            id,
            command: command.to_string(),
            started_at: chrono::Utc::now(),
        };

        self.buffer.clear();
        info!("[RUNTIME_CMD] Starting invocation {}: {}", id, summary.command);
        let _ = self.events.send(RuntimeEvent::Started {
            id,
            command: summary.command.clone(),
        });

        let runner = self.runner.clone();
        let buffer = self.buffer.clone();
        let token = cancel.clone();
        let done_tx = done_tx.clone();
        tokio::spawn(async move {
            let result = run_invocation(runner.as_ref(), &command, &buffer, token).await;
            let _ = done_tx.send(Completion { id, result });
        });

        self.active = Some(ActiveInvocation {
            summary,
            cancel,
            respond_to: outcome_tx,
        });

        Ok(InvocationTicket {
            id,
            outcome: outcome_rx,
        })
    }

    fn complete(&mut self, done: Completion) {
        let active = match self.active.take() {
            Some(active) if active.summary.id == done.id => active,
            other => {
                error!("[RUNTIME] Completion for unknown invocation {}", done.id);
                self.active = other;
                return;
            }
        };

        let event = match &done.result {
            Ok(outcome) => RuntimeEvent::Finished {
                id: done.id,
                outcome: outcome.clone(),
            },
            Err(e) => RuntimeEvent::Failed {
                id: done.id,
                error: e.to_string(),
            },
        };
        let _ = self.events.send(event);
        let _ = active.respond_to.send(done.result);
    }
}

/// Stream one command into the buffer and append a closing note for failures
async fn run_invocation(
    runner: &dyn ProcessRunner,
    command: &CommandLine,
    buffer: &OutputBuffer,
    cancel: CancellationToken,
) -> AppResult<RunOutcome> {
    let sink = buffer.clone();
    let mut on_line = move |line: &str| sink.append_line(line);

    let result = runner.run(command, cancel, &mut on_line).await;
    match &result {
        Ok(outcome) if outcome.cancelled => buffer.append_line("Download cancelled"),
        Ok(outcome) if !outcome.success() => buffer.append_line(&format!(
            "Downloader exited with {}",
            outcome.describe_exit()
        )),
        Ok(_) => {}
        Err(e) => {
            error!("❌ Invocation failed: {}", e);
            buffer.append_line(&e.to_string());
        }
    }
    result
}
