//! Interactive command shell.
//!
//! Maps typed commands onto buffer mutations and controller operations.
//! `load` and `save` run as background tasks so a slow filesystem never
//! blocks the prompt.

mod command;
mod console;

use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tokio::task::JoinSet;

use crate::buffer::BUFFER_CAPACITY;
use crate::controller::{Controller, KillOutcome, StartOutcome, WorkerStatus};
use crate::files::{self, SaveMode};
use crate::render::presets::{self, PRESETS};
use crate::render::Mode;

pub use command::{parse_line, Command, CommandError, USAGE};
pub use console::Console;

const PROMPT: &str = "> ";
const BLOCK_PROMPT: &str = "[W] > ";
const BLOCK_END: &str = ".";

/// Exit code used by the `tb` command.
pub const SHUSH_EXIT_CODE: i32 = 42;

/// How the shell session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellExit {
    /// `quit` or end of input.
    Quit,
    /// `tb`: leave immediately with a distinct code.
    Shush,
}

impl ShellExit {
    pub fn code(self) -> i32 {
        match self {
            ShellExit::Quit => 0,
            ShellExit::Shush => SHUSH_EXIT_CODE,
        }
    }
}

pub struct Shell {
    controller: Arc<Controller>,
    console: Console,
    aux: JoinSet<()>,
}

impl Shell {
    pub fn new(controller: Arc<Controller>, console: Console) -> Self {
        Self {
            controller,
            console,
            aux: JoinSet::new(),
        }
    }

    /// Read and execute commands until `quit`, `tb` or end of input.
    pub async fn run<R>(&mut self, input: R) -> ShellExit
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();

        loop {
            self.console.prompt(PROMPT);
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(err) => {
                    tracing::warn!(error = %err, "Failed to read input");
                    break;
                }
            };

            let command = match parse_line(&line) {
                Ok(Some(command)) => command,
                Ok(None) => continue,
                Err(err) => {
                    self.console.line(&format!("[!] {err}"));
                    continue;
                }
            };

            match command {
                Command::Quit => break,
                Command::Shush => {
                    self.console.line("TOI TA BOUCHE.");
                    return ShellExit::Shush;
                }
                Command::WriteBlock => self.write_block(&mut lines).await,
                other => self.execute(other).await,
            }
        }

        self.shutdown().await;
        ShellExit::Quit
    }

    async fn execute(&mut self, command: Command) {
        match command {
            Command::Help => self.console.line(&format!("[*] {USAGE}")),
            Command::Print => self.print(),
            Command::Write(text) => {
                self.write(text.into_bytes());
            }
            Command::Start => match self.controller.start() {
                StartOutcome::Started => self.console.line("[*] Started."),
                StartOutcome::AlreadyRunning => self.console.line("[*] Already running."),
            },
            Command::Status => self.status(),
            Command::Kill => match self.controller.kill().await {
                KillOutcome::Stopped => self.console.line("[*] Terminated."),
                KillOutcome::NotRunning => self.console.line("[-] Worker is not running."),
            },
            Command::Change(mode) => self.change(mode),
            Command::Preset(number) => self.preset(number),
            Command::Load(path) => self.spawn_load(path),
            Command::Save(path, mode) => self.spawn_save(path, mode),
            Command::Clear => {
                if let Err(err) = self.console.clear_screen() {
                    self.console.line(&format!("[!] Cannot clear the screen: {err}"));
                }
            }
            // Handled by the read loop.
            Command::WriteBlock | Command::Quit | Command::Shush => {}
        }
    }

    fn print(&self) {
        let snapshot = self.controller.buffer().snapshot();
        let label = Mode::try_from(snapshot.mode).map_or("unknown", Mode::label);
        self.console.line(&format!(
            "[*] Mode {} ({}), {} bytes:",
            snapshot.mode,
            label,
            snapshot.content.len()
        ));
        self.console.line(&String::from_utf8_lossy(&snapshot.content));
    }

    fn status(&self) {
        match self.controller.status() {
            WorkerStatus::Running => self.console.line("[+] Worker is running."),
            WorkerStatus::Terminated(reason) => self
                .console
                .line(&format!("[!] Worker exited with error {reason}")),
            WorkerStatus::Idle => self.console.line("[-] Worker is not running."),
        }
    }

    /// Replace the message. Templates keep their mode, anything else
    /// falls back to passthrough.
    fn write(&self, bytes: Vec<u8>) -> bool {
        let buffer = self.controller.buffer();
        let mode = match buffer.mode() {
            m if m == Mode::Templated.code() => m,
            _ => Mode::Passthrough.code(),
        };
        match buffer.replace(&bytes, mode) {
            Ok(()) => true,
            Err(err) => {
                self.console.line(&format!("[!] Cannot write message: {err}"));
                false
            }
        }
    }

    async fn write_block<R>(&mut self, lines: &mut Lines<R>)
    where
        R: AsyncBufRead + Unpin,
    {
        let mut block = Vec::new();
        loop {
            self.console.prompt(BLOCK_PROMPT);
            match lines.next_line().await {
                Ok(Some(line)) if line == BLOCK_END => break,
                Ok(Some(line)) => {
                    block.extend_from_slice(line.as_bytes());
                    block.push(b'\n');
                }
                Ok(None) => break,
                Err(err) => {
                    tracing::warn!(error = %err, "Failed to read message block");
                    break;
                }
            }
        }

        if block.len() > BUFFER_CAPACITY {
            self.console.line(&format!(
                "[!] Message block is {} bytes, the buffer holds at most {}.",
                block.len(),
                BUFFER_CAPACITY
            ));
            return;
        }
        if self.write(block) {
            self.console.line("[*] Message block written.");
        }
    }

    fn change(&self, mode: i32) {
        self.controller.buffer().set_mode(mode);
        match Mode::try_from(mode) {
            Ok(known) => self
                .console
                .line(&format!("[*] Mode set to {mode} ({}).", known.label())),
            Err(_) => self.console.line(&format!(
                "[*] Mode set to {mode}, which is unknown: a running worker will stop on its next tick."
            )),
        }
    }

    fn preset(&self, number: Option<usize>) {
        let Some(number) = number else {
            for (index, preset) in PRESETS.iter().enumerate() {
                self.console.line(&format!("[*] {}: {}", index + 1, preset.name));
            }
            return;
        };

        let Some(preset) = presets::by_number(number) else {
            self.console.line(&format!(
                "[!] Invalid preset, must be between 1 and {}.",
                PRESETS.len()
            ));
            return;
        };

        match self
            .controller
            .buffer()
            .replace(preset.template.as_bytes(), Mode::Templated.code())
        {
            Ok(()) => self
                .console
                .line(&format!("[*] Preset '{}' loaded.", preset.name)),
            Err(err) => self.console.line(&format!("[!] Cannot load preset: {err}")),
        }
    }

    fn spawn_load(&mut self, path: PathBuf) {
        let buffer = self.controller.buffer().clone();
        let console = self.console.clone();
        self.aux.spawn(async move {
            match files::load_into(&buffer, &path).await {
                Ok(len) => console.line(&format!("[*] File loaded. ({len}) bytes.")),
                Err(err) => console.line(&format!("[!] {err}")),
            }
        });
    }

    fn spawn_save(&mut self, path: PathBuf, mode: SaveMode) {
        let buffer = self.controller.buffer().clone();
        let console = self.console.clone();
        self.aux.spawn(async move {
            match files::save_from(&buffer, &path, mode).await {
                Ok(len) => console.line(&format!("[*] File saved. ({len}) bytes.")),
                Err(err) => console.line(&format!("[!] {err}")),
            }
        });
    }

    /// Let pending file tasks finish and stop the worker.
    async fn shutdown(&mut self) {
        while let Some(result) = self.aux.join_next().await {
            if let Err(err) = result {
                tracing::warn!(error = %err, "File task failed");
            }
        }
        self.controller.kill().await;
    }
}
