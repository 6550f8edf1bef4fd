//! Blocking wait on a whole process group.
//!
//! Used for foreground pipelines and for `fg`. Returns as soon as the group
//! stops, or once every expected process has terminated.

use chirsh_types::ExitStatus;
use nix::errno::Errno;
use nix::sys::signal::Signal;
use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
use nix::unistd::Pid;

/// Translate a wait status into an exit status. `None` for stops,
/// continues, and ptrace events.
pub fn exit_status_of(status: &WaitStatus) -> Option<ExitStatus> {
    match *status {
        WaitStatus::Exited(_, code) => Some(ExitStatus::Exited(code)),
        WaitStatus::Signaled(_, signal, _) => Some(ExitStatus::Signaled(signal as i32)),
        _ => None,
    }
}

/// What to wait for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupWait {
    pub pgid: Pid,
    /// Processes in the group that have not been collected yet.
    pub expected: usize,
    /// Process whose status becomes the group's status (the last stage).
    /// `None` means the last process collected.
    pub status_pid: Option<Pid>,
}

/// How a foreground wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForegroundOutcome {
    /// Every process terminated.
    Finished(ExitStatus),
    /// The group was stopped; `live` processes remain.
    Stopped { signal: Signal, live: usize },
}

impl ForegroundOutcome {
    /// Shell status: the finished status, or `128 + signal` for a stop.
    pub fn code(&self) -> i32 {
        match self {
            ForegroundOutcome::Finished(status) => status.code(),
            ForegroundOutcome::Stopped { signal, .. } => 128 + *signal as i32,
        }
    }
}

/// Block until the group stops or all `expected` processes terminate.
///
/// ECHILD ends the wait early: the remaining children were already
/// collected somewhere else, and their statuses are gone.
pub fn wait_for_group(group: &GroupWait) -> nix::Result<ForegroundOutcome> {
    let target = Pid::from_raw(-group.pgid.as_raw());
    let mut reaped = 0;
    let mut status = ExitStatus::Unknown;

    while reaped < group.expected {
        let event = match waitpid(target, Some(WaitPidFlag::WUNTRACED)) {
            Ok(event) => event,
            Err(Errno::EINTR) => continue,
            Err(Errno::ECHILD) => {
                tracing::debug!(pgid = %group.pgid, reaped, "group has no more children");
                break;
            }
            Err(e) => return Err(e),
        };

        if let WaitStatus::Stopped(pid, signal) = event {
            tracing::debug!(%pid, ?signal, "foreground process stopped");
            return Ok(ForegroundOutcome::Stopped {
                signal,
                live: group.expected - reaped,
            });
        }

        if let Some(exit) = exit_status_of(&event) {
            reaped += 1;
            let pid = event.pid();
            tracing::debug!(?pid, ?exit, "foreground process collected");
            if group.status_pid.is_none() || pid == group.status_pid {
                status = exit;
            }
        }
    }

    Ok(ForegroundOutcome::Finished(status))
}
