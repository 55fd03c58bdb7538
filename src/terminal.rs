//! Terminal front end
//!
//! Stands in for the downloader window: a banner with the window title and
//! input label, a prompt whose Enter key acts as the Download button, and a
//! renderer that prints buffer events as they arrive.

use std::io::{self, Write};

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::{debug, warn};

use crate::core::config::UiConfig;
use crate::core::controller::{ClickOutcome, DownloadController};
use crate::core::models::{AppResult, RuntimeEvent};
use crate::core::output_buffer::BufferEvent;

const PROMPT: &str = "> ";

const HELP: &str = "\
Paste a link such as https://www.youtube.com/watch?v=XXXX and press Enter to download.
  :cancel   stop the running download
  :status   show the running download
  :help     show this help
  :quit     leave (also :q, :exit)";

/// One line typed at the prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellInput {
    Download(String),
    Cancel,
    Status,
    Help,
    Quit,
    Unknown(String),
}

/// Anything that does not start with `:` is handed to validation untouched
pub fn parse_input(line: &str) -> ShellInput {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let command = line.trim();
    if !command.starts_with(':') {
        return ShellInput::Download(line.to_string());
    }
    match command {
        ":cancel" => ShellInput::Cancel,
        ":status" => ShellInput::Status,
        ":help" | ":h" | ":?" => ShellInput::Help,
        ":quit" | ":q" | ":exit" => ShellInput::Quit,
        other => ShellInput::Unknown(other.to_string()),
    }
}

/// Prints buffer events to a writer
pub struct TerminalRenderer<W: Write> {
    out: W,
    events: broadcast::Receiver<BufferEvent>,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W, events: broadcast::Receiver<BufferEvent>) -> Self {
        Self { out, events }
    }

    pub fn render(&mut self, event: &BufferEvent) -> io::Result<()> {
        match event {
            // Already printed text stays on screen; a new run simply continues below it.
            BufferEvent::Cleared => return Ok(()),
            BufferEvent::Replaced(text) => writeln!(self.out, "{}", text)?,
            BufferEvent::Appended(line) => writeln!(self.out, "{}", line)?,
        }
        self.out.flush()
    }

    /// Wait for the next event and print it; `None` once the buffer is gone
    pub async fn next(&mut self) -> Option<io::Result<()>> {
        loop {
            match self.events.recv().await {
                Ok(event) => return Some(self.render(&event)),
                Err(RecvError::Lagged(skipped)) => {
                    if let Err(e) = self.report_lag(skipped) {
                        return Some(Err(e));
                    }
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Print everything already queued without waiting
    pub fn drain(&mut self) -> io::Result<()> {
        loop {
            match self.events.try_recv() {
                Ok(event) => self.render(&event)?,
                Err(TryRecvError::Lagged(skipped)) => self.report_lag(skipped)?,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return Ok(()),
            }
        }
    }

    pub fn writer(&mut self) -> &mut W {
        &mut self.out
    }

    fn report_lag(&mut self, skipped: u64) -> io::Result<()> {
        warn!("Renderer fell behind by {} events", skipped);
        writeln!(self.out, "[{} lines not shown]", skipped)?;
        self.out.flush()
    }
}

pub fn print_banner(ui: &UiConfig) {
    println!("{}", ui.window_title);
    println!("{}", ui.input_label);
    println!("Type :help for commands.");
}

fn print_prompt() {
    print!("{}", PROMPT);
    let _ = io::stdout().flush();
}

/// Interactive loop; returns when stdin closes or `:quit` is entered
pub async fn run_shell(controller: &DownloadController, ui: &UiConfig) -> AppResult<()> {
    let runtime = controller.runtime();
    let mut renderer = TerminalRenderer::new(io::stdout(), controller.buffer().subscribe());
    let mut runtime_events = runtime.subscribe();
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    print_banner(ui);
    print_prompt();

    loop {
        tokio::select! {
            line = input.next_line() => {
                let Some(line) = line? else { break };
                match parse_input(&line) {
                    ShellInput::Quit => break,
                    ShellInput::Help => println!("{}", HELP),
                    ShellInput::Unknown(command) => println!("Unknown command {}, try :help", command),
                    ShellInput::Cancel => {
                        if !runtime.cancel().await? {
                            println!("No download in progress");
                        }
                    }
                    ShellInput::Status => match runtime.status().await? {
                        Some(summary) => println!(
                            "Downloading since {} [{}]: {}",
                            summary.started_at.with_timezone(&chrono::Local).format("%H:%M:%S"),
                            summary.id,
                            summary.command
                        ),
                        None => println!("No download in progress"),
                    },
                    ShellInput::Download(url) => {
                        match controller.on_download_clicked(&url).await? {
                            ClickOutcome::Started(ticket) => {
                                debug!("Invocation {} started from the prompt", ticket.id());
                                if ui.echo_command {
                                    println!("$ {}", controller.request_for(&url).command_string());
                                }
                                continue;
                            }
                            ClickOutcome::Rejected(_) => renderer.drain()?,
                            ClickOutcome::Busy => {
                                println!("A download is already running, type :cancel to stop it")
                            }
                        }
                    }
                }
                print_prompt();
            }
            rendered = renderer.next() => match rendered {
                Some(result) => result?,
                None => break,
            },
            event = runtime_events.recv() => match event {
                Ok(RuntimeEvent::Finished { .. }) | Ok(RuntimeEvent::Failed { .. }) => {
                    renderer.drain()?;
                    print_prompt();
                }
                Ok(RuntimeEvent::Started { .. }) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => break,
            },
            signal = tokio::signal::ctrl_c() => {
                signal?;
                if !runtime.cancel().await? {
                    break;
                }
            }
        }
    }

    // 退出时不留下孤儿下载进程
    runtime.cancel().await?;
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::output_buffer::OutputBuffer;

    #[test]
    fn test_links_are_passed_through_verbatim() {
        assert_eq!(
            parse_input("https://www.youtube.com/watch?v=abc123"),
            ShellInput::Download("https://www.youtube.com/watch?v=abc123".to_string())
        );
        assert_eq!(parse_input(""), ShellInput::Download(String::new()));
        assert_eq!(parse_input("  "), ShellInput::Download("  ".to_string()));
        assert_eq!(
            parse_input("https://www.youtube.com/watch?v=abc123\r"),
            ShellInput::Download("https://www.youtube.com/watch?v=abc123".to_string())
        );
    }

    #[test]
    fn test_shell_commands() {
        assert_eq!(parse_input(":cancel"), ShellInput::Cancel);
        assert_eq!(parse_input(" :status "), ShellInput::Status);
        assert_eq!(parse_input(":help"), ShellInput::Help);
        assert_eq!(parse_input(":q"), ShellInput::Quit);
        assert_eq!(parse_input(":exit"), ShellInput::Quit);
        assert_eq!(
            parse_input(":download"),
            ShellInput::Unknown(":download".to_string())
        );
    }

    #[test]
    fn test_renderer_prints_replacements_and_lines() {
        let buffer = OutputBuffer::default();
        let mut renderer = TerminalRenderer::new(Vec::new(), buffer.subscribe());

        buffer.clear();
        buffer.append_line("[youtube] abc123: Downloading webpage");
        buffer.append_line("[download] 100% of 3.00MiB");
        buffer.replace("Input is blank. Please provide a valid youtube link");
        renderer.drain().unwrap();

        let printed = String::from_utf8(renderer.writer().clone()).unwrap();
        assert_eq!(
            printed,
            "[youtube] abc123: Downloading webpage\n[download] 100% of 3.00MiB\nInput is blank. Please provide a valid youtube link\n"
        );
    }

    #[test]
    fn test_renderer_reports_lag() {
        let buffer = OutputBuffer::new(2);
        let mut renderer = TerminalRenderer::new(Vec::new(), buffer.subscribe());

        for i in 0..5 {
            buffer.append_line(&i.to_string());
        }
        renderer.drain().unwrap();

        let printed = String::from_utf8(renderer.writer().clone()).unwrap();
        assert_eq!(printed, "[3 lines not shown]\n3\n4\n");
    }

    #[tokio::test]
    async fn test_next_returns_none_when_buffer_is_dropped() {
        let buffer = OutputBuffer::default();
        let mut renderer = TerminalRenderer::new(Vec::new(), buffer.subscribe());

        buffer.append_line("last");
        drop(buffer);

        assert!(matches!(renderer.next().await, Some(Ok(()))));
        assert!(renderer.next().await.is_none());
        assert_eq!(renderer.writer().as_slice(), b"last\n");
    }
}
