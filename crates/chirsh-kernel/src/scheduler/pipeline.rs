//! Pipeline execution.
//!
//! Turns a [`Pipeline`] into running processes: one child per stage, all in
//! one process group, stdout of each stage piped into stdin of the next.
//! Foreground pipelines get the terminal and are waited on; background
//! pipelines are registered with the job table and left to the reaper.

use std::ffi::{CString, NulError};
use std::io::Write;
use std::os::fd::{OwnedFd, RawFd};
use std::sync::Arc;

use chirsh_types::{ExecResult, Notice, Pipeline, Stage};
use nix::errno::Errno;
use nix::libc;
use nix::sys::signal::{Signal, killpg};
use nix::sys::wait::waitpid;
use nix::unistd::{ForkResult, Pid, fork, setpgid};
use thiserror::Error;

use super::job::JobTable;
use super::pipes::PipeSet;
use super::wait::{ForegroundOutcome, GroupWait, wait_for_group};
use crate::kernel::ExecutionContext;
use crate::signals;
use crate::terminal::ForegroundGuard;
use crate::tools::{BuiltinContext, BuiltinRegistry};

/// Failures while launching or waiting on a pipeline.
///
/// None of these are fatal to the shell: the executor reports them and the
/// pipeline's status becomes 1.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("empty pipeline")]
    Empty,
    #[error("{program}: argument contains a NUL byte")]
    InvalidArgument {
        program: String,
        #[source]
        source: NulError,
    },
    #[error("cannot create pipe: {0}")]
    Pipe(#[source] Errno),
    #[error("cannot fork: {0}")]
    Fork(#[source] Errno),
    #[error("wait failed: {0}")]
    Wait(#[source] Errno),
}

/// The processes of a launched pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchedPipeline {
    /// Process group shared by every stage; the first child's pid.
    pub pgid: Pid,
    /// Child pids in stage order.
    pub pids: Vec<Pid>,
}

/// Everything a child needs for `execvp`, built before forking so the child
/// never allocates.
struct PreparedStage {
    // Owns the strings `argv` points into.
    _args: Vec<CString>,
    argv: Vec<*const libc::c_char>,
    not_found: Vec<u8>,
    cannot_execute: Vec<u8>,
}

impl PreparedStage {
    fn new(name: &str, stage: &Stage) -> Result<Self, ExecError> {
        let args = stage
            .args()
            .iter()
            .map(|arg| CString::new(arg.as_bytes()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| ExecError::InvalidArgument {
                program: stage.program().to_string(),
                source,
            })?;
        let mut argv: Vec<*const libc::c_char> = args.iter().map(|arg| arg.as_ptr()).collect();
        argv.push(std::ptr::null());

        let program = stage.program();
        Ok(Self {
            _args: args,
            argv,
            not_found: format!("{name}: {program}: command not found\n").into_bytes(),
            cannot_execute: format!("{name}: {program}: cannot execute\n").into_bytes(),
        })
    }
}

/// Per-child process setup, computed in the parent.
struct ChildSetup<'a> {
    /// Group to join; 0 makes the child its own group leader.
    pgid: libc::pid_t,
    foreground: bool,
    claim_terminal: bool,
    stdin: Option<RawFd>,
    stdout: Option<RawFd>,
    close: &'a [RawFd],
}

/// Set up a forked child and replace it with the stage's program.
///
/// # Safety
///
/// Must only run in the child between `fork` and `exec`. Only
/// async-signal-safe libc calls are made; nothing allocates.
unsafe fn exec_child(stage: &PreparedStage, setup: &ChildSetup<'_>) -> ! {
    unsafe {
        libc::setpgid(0, setup.pgid);
        // SIGTTOU is still ignored here, so claiming the terminal cannot stop us.
        if setup.claim_terminal {
            libc::tcsetpgrp(libc::STDIN_FILENO, libc::getpgrp());
        }
        signals::reset_in_child(setup.foreground);

        if let Some(fd) = setup.stdin {
            libc::dup2(fd, libc::STDIN_FILENO);
        }
        if let Some(fd) = setup.stdout {
            libc::dup2(fd, libc::STDOUT_FILENO);
        }
        for &fd in setup.close {
            libc::close(fd);
        }

        libc::execvp(stage.argv[0], stage.argv.as_ptr());

        let message = if Errno::last() == Errno::ENOENT {
            &stage.not_found
        } else {
            &stage.cannot_execute
        };
        libc::write(libc::STDERR_FILENO, message.as_ptr().cast(), message.len());
        libc::_exit(127)
    }
}

/// Text shown for a job: the line as typed, without the trailing `&`.
fn display_command(raw: &str, pipeline: &Pipeline) -> String {
    let trimmed = raw.trim().trim_end_matches('&').trim_end();
    if trimmed.is_empty() {
        pipeline
            .stages()
            .iter()
            .map(|stage| stage.args().join(" "))
            .collect::<Vec<_>>()
            .join(" | ")
    } else {
        trimmed.to_string()
    }
}

fn emit(result: &ExecResult) {
    if !result.out.is_empty() {
        let mut out = std::io::stdout().lock();
        if let Err(e) = out.write_all(result.out.as_bytes()).and_then(|()| out.flush()) {
            tracing::warn!("failed to write builtin output: {}", e);
        }
    }
    if !result.err.is_empty() {
        let mut err = std::io::stderr().lock();
        let _ = err.write_all(result.err.as_bytes());
        if !result.err.ends_with('\n') {
            let _ = err.write_all(b"\n");
        }
    }
}

/// Runs pipelines on behalf of the kernel.
pub struct Executor {
    name: String,
    jobs: Arc<JobTable>,
    builtins: BuiltinRegistry,
}

impl Executor {
    /// Create an executor with every builtin registered.
    pub fn new(name: impl Into<String>, jobs: Arc<JobTable>) -> Self {
        Self::with_builtins(name, jobs, BuiltinRegistry::with_builtins())
    }

    pub fn with_builtins(name: impl Into<String>, jobs: Arc<JobTable>, builtins: BuiltinRegistry) -> Self {
        Self {
            name: name.into(),
            jobs,
            builtins,
        }
    }

    pub fn jobs(&self) -> &Arc<JobTable> {
        &self.jobs
    }

    pub fn builtins(&self) -> &BuiltinRegistry {
        &self.builtins
    }

    /// Run a pipeline to completion (foreground) or launch it (background).
    ///
    /// Returns the pipeline's status and records it in `ctx`. An empty
    /// pipeline returns 0 and leaves `ctx` untouched.
    pub fn execute(
        &self,
        pipeline: &Pipeline,
        raw: &str,
        history: &[String],
        ctx: &mut ExecutionContext,
    ) -> i32 {
        if pipeline.is_empty() {
            return 0;
        }

        let status = match pipeline.single().filter(|stage| self.builtins.is_builtin(stage)) {
            Some(stage) => self.run_builtin(stage, history, ctx),
            None => self.run_processes(pipeline, &display_command(raw, pipeline)),
        };
        ctx.last_status = status;
        status
    }

    fn run_builtin(&self, stage: &Stage, history: &[String], ctx: &mut ExecutionContext) -> i32 {
        let mut builtin_ctx = BuiltinContext::new(&self.jobs, history);
        let result = self.builtins.run(stage, &mut builtin_ctx);
        ctx.should_exit |= builtin_ctx.should_exit;
        emit(&result);
        result.code
    }

    fn run_processes(&self, pipeline: &Pipeline, command: &str) -> i32 {
        let launched = match self.launch(pipeline) {
            Ok(launched) => launched,
            Err(e) => {
                self.report(&e);
                return 1;
            }
        };

        if pipeline.is_background() {
            let id = self.jobs.add_pipeline(launched.pgid, command, true, &launched.pids);
            self.jobs.announce(&Notice::Started {
                id,
                pgid: launched.pgid.as_raw(),
                command: command.to_string(),
            });
            return 0;
        }

        match self.wait_foreground(&launched) {
            Ok(ForegroundOutcome::Finished(status)) => {
                self.jobs.mark_finished(launched.pgid, status);
                status.code()
            }
            Ok(outcome @ ForegroundOutcome::Stopped { live, .. }) => {
                self.jobs.track_stopped(launched.pgid, command, live, &launched.pids);
                outcome.code()
            }
            Err(e) => {
                self.report(&e);
                1
            }
        }
    }

    fn wait_foreground(&self, launched: &LaunchedPipeline) -> Result<ForegroundOutcome, ExecError> {
        let group = GroupWait {
            pgid: launched.pgid,
            expected: launched.pids.len(),
            status_pid: launched.pids.last().copied(),
        };
        let _guard = ForegroundGuard::new(self.jobs.terminal(), launched.pgid);
        wait_for_group(&group).map_err(ExecError::Wait)
    }

    fn report(&self, error: &ExecError) {
        tracing::debug!(?error, "pipeline failed");
        eprintln!("{}: {}", self.name, error);
    }

    /// Fork every stage into one process group, with pipes from `pipe(2)`.
    pub fn launch(&self, pipeline: &Pipeline) -> Result<LaunchedPipeline, ExecError> {
        self.launch_with_pipes(pipeline, nix::unistd::pipe)
    }

    /// Fork every stage into one process group, creating the inter-stage
    /// pipes with `make_pipe`.
    ///
    /// Pipes are all created before anything is forked; if that fails
    /// nothing is spawned. If a fork fails part way, the children already
    /// spawned are killed and collected before the error is returned.
    pub fn launch_with_pipes<F>(&self, pipeline: &Pipeline, make_pipe: F) -> Result<LaunchedPipeline, ExecError>
    where
        F: FnMut() -> nix::Result<(OwnedFd, OwnedFd)>,
    {
        if pipeline.is_empty() {
            return Err(ExecError::Empty);
        }
        let stages = pipeline
            .stages()
            .iter()
            .map(|stage| PreparedStage::new(&self.name, stage))
            .collect::<Result<Vec<_>, _>>()?;
        let mut pipes = PipeSet::open_with(stages.len() - 1, make_pipe).map_err(ExecError::Pipe)?;

        let foreground = !pipeline.is_background();
        let claim_terminal = foreground && self.jobs.terminal().is_attached();
        let mut pgid: Option<Pid> = None;
        let mut pids = Vec::with_capacity(stages.len());

        for (index, stage) in stages.iter().enumerate() {
            let close = pipes.open_fds();
            let setup = ChildSetup {
                pgid: pgid.map_or(0, Pid::as_raw),
                foreground,
                claim_terminal,
                stdin: pipes.stdin_for(index),
                stdout: pipes.stdout_for(index),
                close: &close,
            };

            // SAFETY: the child only runs exec_child, which is async-signal-safe.
            match unsafe { fork() } {
                Ok(ForkResult::Child) => unsafe { exec_child(stage, &setup) },
                Ok(ForkResult::Parent { child }) => {
                    let group = *pgid.get_or_insert(child);
                    // Also done in the child; whichever runs first wins. EACCES
                    // means the child already exec'd, having joined the group.
                    match setpgid(child, group) {
                        Ok(()) | Err(Errno::EACCES) | Err(Errno::ESRCH) => {}
                        Err(e) => tracing::warn!(%child, %group, "setpgid failed: {}", e),
                    }
                    pids.push(child);
                    if let Some(previous) = index.checked_sub(1) {
                        pipes.release(previous);
                    }
                }
                Err(e) => {
                    abandon(pgid, &pids);
                    return Err(ExecError::Fork(e));
                }
            }
        }
        drop(pipes);

        let pgid = pgid.ok_or(ExecError::Empty)?;
        tracing::debug!(%pgid, stages = pids.len(), foreground, "pipeline launched");
        Ok(LaunchedPipeline { pgid, pids })
    }
}

/// Kill and collect a partially launched pipeline.
fn abandon(pgid: Option<Pid>, pids: &[Pid]) {
    let Some(pgid) = pgid else {
        return;
    };
    if let Err(e) = killpg(pgid, Signal::SIGKILL) {
        tracing::warn!(%pgid, "failed to kill partial pipeline: {}", e);
    }
    for &pid in pids {
        while let Err(Errno::EINTR) = waitpid(pid, None) {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_command_strips_background_marker() {
        let pipeline = Pipeline::new([vec!["sleep".to_string(), "5".to_string()]], true);
        assert_eq!(display_command("  sleep 5 &  ", &pipeline), "sleep 5");
        assert_eq!(display_command("sleep 5&", &pipeline), "sleep 5");
        assert_eq!(display_command("", &pipeline), "sleep 5");

        let piped = Pipeline::new(
            [vec!["yes".to_string()], vec!["head".to_string(), "-n1".to_string()]],
            true,
        );
        assert_eq!(display_command("   ", &piped), "yes | head -n1");
    }

    #[test]
    fn prepared_stage_is_null_terminated() {
        let stage = Stage::new(vec!["ls".into(), "-l".into()]).unwrap();
        let prepared = PreparedStage::new("chirsh", &stage).unwrap();
        assert_eq!(prepared.argv.len(), 3);
        assert!(prepared.argv[2].is_null());
        assert_eq!(prepared.not_found, b"chirsh: ls: command not found\n");
    }

    #[test]
    fn nul_in_argument_is_rejected() {
        let stage = Stage::new(vec!["echo".into(), "a\0b".into()]).unwrap();
        let err = PreparedStage::new("chirsh", &stage).err().unwrap();
        assert!(matches!(err, ExecError::InvalidArgument { ref program, .. } if program == "echo"));
    }
}
