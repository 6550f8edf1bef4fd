//! Controlling-terminal ownership and the shell's process-group identity.
//!
//! Exactly one process group owns the terminal at a time. Every hand-over
//! to a job must be paired with a hand-back to the shell, on every path;
//! [`ForegroundGuard`] makes that pairing structural.

use std::io::IsTerminal;
use std::sync::OnceLock;

use nix::errno::Errno;
use nix::unistd::{Pid, getpgrp, getpid, setpgid, tcgetpgrp, tcsetpgrp};

static SHELL_PGID: OnceLock<Pid> = OnceLock::new();

/// Make the shell its own process-group leader and remember that group.
///
/// EPERM means the shell is already a session leader, which also makes it a
/// group leader; that is not an error.
pub fn init_shell_process_group() -> nix::Result<Pid> {
    let pid = getpid();
    match setpgid(pid, pid) {
        Ok(()) | Err(Errno::EPERM) => {}
        Err(e) => return Err(e),
    }
    Ok(*SHELL_PGID.get_or_init(getpgrp))
}

/// The shell's own process group. Falls back to the current group if
/// [`init_shell_process_group`] was never called.
pub fn shell_pgid() -> Pid {
    *SHELL_PGID.get_or_init(getpgrp)
}

/// Who owns the controlling terminal.
pub trait Terminal: Send + Sync {
    /// Make `pgid` the terminal's foreground process group.
    fn give_to(&self, pgid: Pid) -> nix::Result<()>;

    /// Make the shell's own group the foreground group again.
    fn reclaim(&self) -> nix::Result<()>;

    /// Whether a controlling terminal is attached at all.
    fn is_attached(&self) -> bool;
}

/// The real terminal on stdin, driven with `tcsetpgrp`.
///
/// When stdin is not a terminal every operation is a successful no-op.
#[derive(Debug, Clone, Copy)]
pub struct ControllingTerminal {
    attached: bool,
    shell_pgid: Pid,
    /// Foreground group when the terminal was first inspected.
    original: Option<Pid>,
}

impl ControllingTerminal {
    /// Inspect stdin and capture the shell's process group along with the
    /// group that currently owns the terminal.
    pub fn detect() -> Self {
        let stdin = std::io::stdin();
        let attached = stdin.is_terminal();
        Self {
            attached,
            shell_pgid: shell_pgid(),
            original: if attached { tcgetpgrp(stdin).ok() } else { None },
        }
    }

    /// A terminal handle that never touches the real terminal.
    pub fn detached() -> Self {
        Self {
            attached: false,
            shell_pgid: shell_pgid(),
            original: None,
        }
    }

    /// Hand the terminal back to the group that owned it at [`detect`].
    ///
    /// [`detect`]: ControllingTerminal::detect
    pub fn release(&self) -> nix::Result<()> {
        match self.original {
            Some(pgid) if pgid != self.shell_pgid => self.give_to(pgid),
            _ => Ok(()),
        }
    }
}

impl Terminal for ControllingTerminal {
    fn give_to(&self, pgid: Pid) -> nix::Result<()> {
        if !self.attached {
            return Ok(());
        }
        match tcsetpgrp(std::io::stdin(), pgid) {
            Ok(()) | Err(Errno::ENOTTY) => Ok(()),
            Err(e) => Err(e),
        }
    }

    fn reclaim(&self) -> nix::Result<()> {
        self.give_to(self.shell_pgid)
    }

    fn is_attached(&self) -> bool {
        self.attached
    }
}

/// Holds the terminal for a job's process group; hands it back on drop.
#[must_use = "the terminal is reclaimed as soon as the guard is dropped"]
pub struct ForegroundGuard<'a> {
    terminal: &'a dyn Terminal,
    pgid: Pid,
}

impl<'a> ForegroundGuard<'a> {
    /// Give the terminal to `pgid`. A failed hand-over is logged, not fatal:
    /// the job still runs and the hand-back still happens.
    pub fn new(terminal: &'a dyn Terminal, pgid: Pid) -> Self {
        if let Err(e) = terminal.give_to(pgid) {
            tracing::warn!(%pgid, "failed to give terminal to job: {}", e);
        } else {
            tracing::debug!(%pgid, "terminal handed to job");
        }
        Self { terminal, pgid }
    }

    pub fn pgid(&self) -> Pid {
        self.pgid
    }
}

impl Drop for ForegroundGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.terminal.reclaim() {
            tracing::warn!(pgid = %self.pgid, "failed to reclaim terminal: {}", e);
        }
    }
}
