//! The Kernel — the heart of chirsh.
//!
//! The Kernel owns and coordinates all core components:
//! - Signal dispositions and the shell's process group
//! - Job table (background and stopped jobs)
//! - Reaper thread
//! - Executor and builtins
//! - Last status and history
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                          Kernel                            │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────┐  │
//! │  │   Lexer      │─▶│   Executor   │─▶│  JobTable        │  │
//! │  │ (line → AST) │  │  (builtins,  │  │  (one Mutex)     │  │
//! │  │              │  │   processes) │  │                  │  │
//! │  └──────────────┘  └──────────────┘  └──────────────────┘  │
//! │  ┌──────────────────────────────┐           ▲              │
//! │  │  ExecutionContext ($?, exit) │    Reaper ┘              │
//! │  └──────────────────────────────┘                          │
//! └────────────────────────────────────────────────────────────┘
//! ```

use std::io::IsTerminal;
use std::sync::Arc;
use std::time::Duration;

use nix::errno::Errno;
use thiserror::Error;

use crate::lexer::tokenize;
use crate::scheduler::{Executor, JobTable, NoticeSink, Reaper, StdoutNotices};
use crate::signals::{self, SignalError};
use crate::terminal::{self, ControllingTerminal, Terminal};

/// Configuration for kernel initialization.
#[derive(Debug, Clone)]
pub struct KernelConfig {
    /// Prefix for diagnostics (`chirsh: ...`).
    pub name: String,

    /// Install the shell's signal dispositions and become a process-group
    /// leader.
    pub interactive: bool,

    /// Manage the controlling terminal's foreground group.
    pub job_control: bool,

    /// Longest the reaper sleeps between collection passes.
    pub reaper_interval: Duration,

    /// Maximum number of history entries kept in memory.
    pub history_limit: usize,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            name: "chirsh".to_string(),
            interactive: false,
            job_control: false,
            reaper_interval: Duration::from_millis(200),
            history_limit: 1000,
        }
    }
}

impl KernelConfig {
    /// Config for the interactive REPL. Job control is on when stdin is a
    /// terminal.
    pub fn repl() -> Self {
        let tty = std::io::stdin().is_terminal();
        Self {
            interactive: tty,
            job_control: tty,
            ..Self::default()
        }
    }

    /// Config for `chirsh -c`. Foreground programs still need the terminal
    /// when there is one, so job control follows stdin as for the REPL.
    /// Lines are not kept in history.
    pub fn command() -> Self {
        Self {
            history_limit: 0,
            ..Self::repl()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    pub fn with_job_control(mut self, job_control: bool) -> Self {
        self.job_control = job_control;
        self
    }

    pub fn with_reaper_interval(mut self, interval: Duration) -> Self {
        self.reaper_interval = interval;
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }
}

/// State the read loop polls between commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionContext {
    /// Status of the last pipeline (`$?`).
    pub last_status: i32,
    /// Set once `exit` has run.
    pub should_exit: bool,
}

/// Fatal startup failures.
#[derive(Debug, Error)]
pub enum KernelError {
    #[error(transparent)]
    Signals(#[from] SignalError),
    #[error("failed to set up shell process group: {0}")]
    ProcessGroup(#[source] Errno),
    #[error("failed to start reaper thread: {0}")]
    Reaper(#[source] std::io::Error),
}

/// The Kernel — executes chirsh lines.
pub struct Kernel {
    config: KernelConfig,
    jobs: Arc<JobTable>,
    executor: Executor,
    ctx: ExecutionContext,
    history: Vec<String>,
    reaper: Option<Reaper>,
    /// Terminal to hand back to its original owner when the kernel goes away.
    terminal: Option<ControllingTerminal>,
}

impl Kernel {
    /// Start a kernel: signal table, process group, terminal, job table,
    /// reaper.
    pub fn new(config: KernelConfig) -> Result<Self, KernelError> {
        if config.interactive {
            signals::install()?;
            let pgid = terminal::init_shell_process_group().map_err(KernelError::ProcessGroup)?;
            tracing::debug!(%pgid, "shell process group ready");
        }

        let terminal = if config.job_control {
            ControllingTerminal::detect()
        } else {
            ControllingTerminal::detached()
        };
        if let Err(e) = terminal.reclaim() {
            tracing::warn!("failed to claim terminal: {}", e);
        }

        let mut kernel = Self::with_parts(config, Arc::new(terminal), Arc::new(StdoutNotices))?;
        kernel.terminal = Some(terminal);
        Ok(kernel)
    }

    /// Start a kernel around the given terminal and notice sink, without
    /// touching process-wide signal state.
    pub fn with_parts(
        config: KernelConfig,
        terminal: Arc<dyn Terminal>,
        notices: Arc<dyn NoticeSink>,
    ) -> Result<Self, KernelError> {
        let jobs = Arc::new(JobTable::new(terminal, notices));
        let reaper = Reaper::spawn(Arc::clone(&jobs), config.reaper_interval).map_err(KernelError::Reaper)?;
        let executor = Executor::new(config.name.clone(), Arc::clone(&jobs));

        tracing::debug!(name = %config.name, interactive = config.interactive, "kernel started");
        Ok(Self {
            config,
            jobs,
            executor,
            ctx: ExecutionContext::default(),
            history: Vec::new(),
            reaper: Some(reaper),
            terminal: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    /// Run one input line and return its status.
    pub fn execute(&mut self, line: &str) -> i32 {
        self.record_history(line);
        let pipeline = tokenize(line);
        tracing::trace!(%pipeline, "executing");
        self.executor.execute(&pipeline, line, &self.history, &mut self.ctx)
    }

    fn record_history(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() || self.config.history_limit == 0 {
            return;
        }
        if self.history.len() >= self.config.history_limit {
            let excess = self.history.len() + 1 - self.config.history_limit;
            self.history.drain(..excess);
        }
        self.history.push(line.to_string());
    }

    pub fn last_status(&self) -> i32 {
        self.ctx.last_status
    }

    pub fn should_exit(&self) -> bool {
        self.ctx.should_exit
    }

    pub fn jobs(&self) -> &Arc<JobTable> {
        &self.jobs
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Stop the reaper after a final collection pass and give the terminal
    /// back to whoever owned it at startup.
    pub fn shutdown(mut self) {
        if let Some(reaper) = self.reaper.take() {
            reaper.shutdown();
        }
    }
}

impl Drop for Kernel {
    fn drop(&mut self) {
        if let Some(terminal) = self.terminal.take() {
            if let Err(e) = terminal.release() {
                tracing::warn!("failed to hand terminal back: {}", e);
            }
        }
    }
}
