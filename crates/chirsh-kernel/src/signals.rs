//! Signal dispositions for the shell process.
//!
//! Installed once at startup. The SIGCHLD handler only sets an atomic flag;
//! the reaper polls and clears it with [`take_child_exited`]. Nothing that
//! runs in signal context allocates, locks, or touches the job table.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use nix::errno::Errno;
use nix::libc;
use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, sigaction};
use thiserror::Error;

/// Set from signal context when a child changes state.
static CHILD_EXITED: AtomicBool = AtomicBool::new(false);

static INSTALLED: OnceLock<Result<(), SignalError>> = OnceLock::new();

/// Failure to install a disposition. Fatal at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("failed to install handler for {signal}: {source}")]
pub struct SignalError {
    pub signal: Signal,
    #[source]
    pub source: Errno,
}

extern "C" fn on_child(_: libc::c_int) {
    CHILD_EXITED.store(true, Ordering::Release);
}

extern "C" fn on_interrupt(_: libc::c_int) {
    let newline = b"\n";
    // SAFETY: write(2) is async-signal-safe; the buffer is static.
    unsafe {
        libc::write(libc::STDOUT_FILENO, newline.as_ptr().cast(), newline.len());
    }
}

fn set(signal: Signal, handler: SigHandler) -> Result<(), SignalError> {
    let action = SigAction::new(handler, SaFlags::SA_RESTART, SigSet::empty());
    // SAFETY: the handlers above only touch an atomic or call write(2).
    unsafe { sigaction(signal, &action) }
        .map(drop)
        .map_err(|source| SignalError { signal, source })
}

/// Install the shell's signal table. Only the first call does any work;
/// later calls return the first call's outcome.
pub fn install() -> Result<(), SignalError> {
    *INSTALLED.get_or_init(|| {
        set(Signal::SIGCHLD, SigHandler::Handler(on_child))?;
        set(Signal::SIGINT, SigHandler::Handler(on_interrupt))?;
        set(Signal::SIGTSTP, SigHandler::SigIgn)?;
        set(Signal::SIGTTOU, SigHandler::SigIgn)?;
        tracing::debug!("signal dispositions installed");
        Ok(())
    })
}

/// Consume and clear the child-state-changed flag.
pub fn take_child_exited() -> bool {
    CHILD_EXITED.swap(false, Ordering::AcqRel)
}

/// Put SIGINT and SIGQUIT back to their default disposition.
pub fn restore_interactive_defaults() -> Result<(), SignalError> {
    set(Signal::SIGINT, SigHandler::SigDfl)?;
    set(Signal::SIGQUIT, SigHandler::SigDfl)
}

/// Ignore SIGINT and SIGQUIT.
pub fn ignore_interactive_signals() -> Result<(), SignalError> {
    set(Signal::SIGINT, SigHandler::SigIgn)?;
    set(Signal::SIGQUIT, SigHandler::SigIgn)
}

/// Reset dispositions in a freshly forked child before exec.
///
/// Foreground children take the terminal's interrupts; background children
/// ignore them. Every child gets default job-control signals so it can be
/// stopped and continued.
///
/// # Safety
///
/// Must only be called in the child between `fork` and `exec`. Uses nothing
/// but `signal(2)`, which is async-signal-safe.
pub(crate) unsafe fn reset_in_child(foreground: bool) {
    let interactive = if foreground { libc::SIG_DFL } else { libc::SIG_IGN };
    unsafe {
        libc::signal(libc::SIGINT, interactive);
        libc::signal(libc::SIGQUIT, interactive);
        libc::signal(libc::SIGTSTP, libc::SIG_DFL);
        libc::signal(libc::SIGTTIN, libc::SIG_DFL);
        libc::signal(libc::SIGTTOU, libc::SIG_DFL);
        libc::signal(libc::SIGCHLD, libc::SIG_DFL);
    }
}
