//! Job table for chirsh.
//!
//! The single source of truth for job bookkeeping. Every read and write goes
//! through one mutex, held only for in-memory work: process-group ids are
//! copied out under the lock, and signal delivery, terminal hand-over, and
//! blocking waits all happen after it is released. Notices are emitted after
//! the lock is released too.

use std::collections::BTreeMap;
use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chirsh_types::{ExitStatus, JobId, JobInfo, JobState, Notice};
use nix::errno::Errno;
use nix::sys::signal::{Signal, killpg};
use nix::sys::wait::WaitStatus;
use nix::unistd::{Pid, getpgid};
use thiserror::Error;

use super::wait::{ForegroundOutcome, GroupWait, exit_status_of, wait_for_group};
use crate::terminal::{ForegroundGuard, Terminal};

/// Where job notices go.
pub trait NoticeSink: Send + Sync {
    fn notify(&self, notice: &Notice);
}

/// Prints each notice as one line on stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutNotices;

impl NoticeSink for StdoutNotices {
    fn notify(&self, notice: &Notice) {
        let mut out = std::io::stdout().lock();
        if let Err(e) = writeln!(out, "{notice}").and_then(|()| out.flush()) {
            tracing::warn!("failed to write job notice: {}", e);
        }
    }
}

/// Failures of job-control operations on existing jobs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    #[error("job not found: %{0}")]
    NotFound(JobId),
    #[error("%{id}: {source}")]
    Signal {
        id: JobId,
        #[source]
        source: Errno,
    },
    #[error("wait failed: {0}")]
    Wait(#[source] Errno),
}

struct Job {
    id: JobId,
    pgid: Pid,
    command: String,
    state: JobState,
    background: bool,
    live: usize,
    /// Member pids in stage order, when known.
    members: Vec<Pid>,
    /// A foreground wait currently owns this group; the reaper keeps off.
    waited: bool,
}

impl Job {
    fn info(&self) -> JobInfo {
        JobInfo {
            id: self.id,
            pgid: self.pgid.as_raw(),
            command: self.command.clone(),
            state: self.state,
            background: self.background,
            live_processes: self.live,
        }
    }
}

#[derive(Default)]
struct Jobs {
    last_id: u64,
    jobs: BTreeMap<JobId, Job>,
}

impl Jobs {
    fn insert(&mut self, pgid: Pid, command: &str, background: bool, live: usize, members: &[Pid]) -> JobId {
        self.last_id += 1;
        let id = JobId(self.last_id);
        self.jobs.insert(id, Job {
            id,
            pgid,
            command: command.to_string(),
            state: JobState::Running,
            background,
            live,
            members: members.to_vec(),
            waited: false,
        });
        id
    }

    fn by_pgid(&mut self, pgid: Pid) -> Option<&mut Job> {
        self.jobs
            .values_mut()
            .find(|j| j.pgid == pgid && j.state != JobState::Done)
    }

    /// Find the job owning `pid`: by recorded membership first, then by
    /// process group.
    fn owner_of(&mut self, pid: Pid, pgid: Pid) -> Option<&mut Job> {
        let id = self
            .jobs
            .values()
            .find(|j| j.state != JobState::Done && j.members.contains(&pid))
            .or_else(|| {
                self.jobs
                    .values()
                    .find(|j| j.state != JobState::Done && j.pgid == pgid)
            })
            .map(|j| j.id)?;
        self.jobs.get_mut(&id)
    }

    fn sweep(&mut self) {
        self.jobs.retain(|_, job| job.state != JobState::Done);
    }
}

/// Finish a job; only background jobs announce their completion.
fn finish(job: &mut Job, status: ExitStatus) -> Option<Notice> {
    job.live = 0;
    job.state = JobState::Done;
    job.waited = false;
    job.background.then(|| Notice::Finished {
        id: job.id,
        command: job.command.clone(),
        status,
    })
}

/// Thread-safe table of jobs, keyed by [`JobId`].
pub struct JobTable {
    inner: Mutex<Jobs>,
    /// Held for the length of a reaper pass. Taken before `inner`.
    collection: Mutex<()>,
    terminal: Arc<dyn Terminal>,
    notices: Arc<dyn NoticeSink>,
}

impl JobTable {
    pub fn new(terminal: Arc<dyn Terminal>, notices: Arc<dyn NoticeSink>) -> Self {
        Self {
            inner: Mutex::new(Jobs::default()),
            collection: Mutex::new(()),
            terminal,
            notices,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Jobs> {
        // Plain data behind the lock; a panicked holder cannot leave it torn.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Exclude reaper passes. A group marked as foreground-owned while this
    /// is held will not be waited on by any later pass.
    pub(crate) fn hold_collection(&self) -> MutexGuard<'_, ()> {
        self.collection.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The terminal this table hands to jobs brought to the foreground.
    pub fn terminal(&self) -> &dyn Terminal {
        self.terminal.as_ref()
    }

    /// Emit a notice to the interactive surface.
    pub fn announce(&self, notice: &Notice) {
        self.notices.notify(notice);
    }

    /// Register a running job of `process_count` processes.
    pub fn add(&self, pgid: Pid, command: &str, background: bool, process_count: usize) -> JobId {
        self.add_pipeline_inner(pgid, command, background, process_count, &[])
    }

    /// Register a running job and remember its member pids, so exits can be
    /// attributed after the pids are gone.
    pub fn add_pipeline(&self, pgid: Pid, command: &str, background: bool, members: &[Pid]) -> JobId {
        self.add_pipeline_inner(pgid, command, background, members.len(), members)
    }

    fn add_pipeline_inner(
        &self,
        pgid: Pid,
        command: &str,
        background: bool,
        live: usize,
        members: &[Pid],
    ) -> JobId {
        let id = self.lock().insert(pgid, command, background, live, members);
        tracing::debug!(%id, %pgid, live, background, "job added");
        id
    }

    /// Finish the job for `pgid` outright. No-op for untracked groups, which
    /// is the normal case for plain foreground pipelines.
    pub fn mark_finished(&self, pgid: Pid, status: ExitStatus) {
        let notice = {
            let mut jobs = self.lock();
            let notice = jobs.by_pgid(pgid).and_then(|job| finish(job, status));
            jobs.sweep();
            notice
        };
        if let Some(notice) = notice {
            self.notices.notify(&notice);
        }
    }

    /// Account for one terminated child. The job finishes only when its
    /// last process has been collected.
    pub fn handle_child_exit(&self, pid: Pid, status: ExitStatus) {
        let pgid = getpgid(Some(pid)).unwrap_or(pid);
        let notice = {
            let mut jobs = self.lock();
            let Some(job) = jobs.owner_of(pid, pgid) else {
                tracing::debug!(%pid, "exit of untracked child");
                return;
            };
            job.live = job.live.saturating_sub(1);
            tracing::debug!(id = %job.id, %pid, live = job.live, "job process exited");
            let notice = if job.live == 0 { finish(job, status) } else { None };
            jobs.sweep();
            notice
        };
        if let Some(notice) = notice {
            self.notices.notify(&notice);
        }
    }

    /// Reaper entry point: route any wait status to the right bookkeeping.
    pub fn handle_child_status(&self, status: WaitStatus) {
        match status {
            WaitStatus::Stopped(pid, _) => self.set_state_of(pid, JobState::Stopped),
            WaitStatus::Continued(pid) => self.set_state_of(pid, JobState::Running),
            other => {
                if let (Some(pid), Some(exit)) = (other.pid(), exit_status_of(&other)) {
                    self.handle_child_exit(pid, exit);
                }
            }
        }
    }

    fn set_state_of(&self, pid: Pid, state: JobState) {
        let pgid = getpgid(Some(pid)).unwrap_or(pid);
        let notice = {
            let mut jobs = self.lock();
            let Some(job) = jobs.owner_of(pid, pgid) else {
                return;
            };
            let changed = job.state != state;
            job.state = state;
            (changed && state == JobState::Stopped).then(|| Notice::Stopped {
                id: job.id,
                command: job.command.clone(),
            })
        };
        if let Some(notice) = notice {
            self.notices.notify(&notice);
        }
    }

    /// Record a group that stopped while in the foreground, registering it
    /// if it was never tracked.
    pub fn track_stopped(&self, pgid: Pid, command: &str, live: usize, members: &[Pid]) -> JobId {
        let (id, notice) = {
            let mut jobs = self.lock();
            let id = match jobs.by_pgid(pgid).map(|j| j.id) {
                Some(id) => id,
                None => jobs.insert(pgid, command, false, live, members),
            };
            let notice = jobs.jobs.get_mut(&id).map(|job| {
                job.state = JobState::Stopped;
                job.background = false;
                job.waited = false;
                job.live = live;
                Notice::Stopped {
                    id,
                    command: job.command.clone(),
                }
            });
            (id, notice)
        };
        if let Some(notice) = notice {
            self.notices.notify(&notice);
        }
        id
    }

    /// Snapshot of every live job, in id order.
    pub fn list(&self) -> Vec<JobInfo> {
        let mut jobs = self.lock();
        jobs.sweep();
        jobs.jobs.values().map(Job::info).collect()
    }

    /// Snapshot of one job.
    pub fn get(&self, id: JobId) -> Option<JobInfo> {
        self.lock().jobs.get(&id).map(Job::info)
    }

    /// The most recently created job still tracked.
    pub fn current(&self) -> Option<JobId> {
        self.lock().jobs.keys().next_back().copied()
    }

    pub fn len(&self) -> usize {
        self.lock().jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Process groups the reaper may collect: tracked and not owned by a
    /// foreground wait.
    pub fn background_groups(&self) -> Vec<Pid> {
        self.lock()
            .jobs
            .values()
            .filter(|j| !j.waited && j.state != JobState::Done)
            .map(|j| j.pgid)
            .collect()
    }

    /// Continue a job in the foreground and wait for it to stop or finish.
    pub fn bring_to_foreground(&self, id: JobId) -> Result<ForegroundOutcome, JobError> {
        let (pgid, command, group, previous) = {
            let _pass = self.hold_collection();
            let mut jobs = self.lock();
            let job = jobs.jobs.get_mut(&id).ok_or(JobError::NotFound(id))?;
            let previous = (job.background, job.state);
            job.background = false;
            job.state = JobState::Running;
            job.waited = true;
            let group = GroupWait {
                pgid: job.pgid,
                expected: job.live,
                status_pid: job.members.last().copied(),
            };
            (job.pgid, job.command.clone(), group, previous)
        };

        let guard = ForegroundGuard::new(self.terminal.as_ref(), pgid);
        if let Err(source) = killpg(pgid, Signal::SIGCONT) {
            drop(guard);
            self.restore(id, previous);
            return Err(JobError::Signal { id, source });
        }
        let waited = wait_for_group(&group);
        drop(guard);

        match waited {
            Ok(outcome @ ForegroundOutcome::Finished(status)) => {
                self.mark_finished(pgid, status);
                Ok(outcome)
            }
            Ok(outcome @ ForegroundOutcome::Stopped { live, .. }) => {
                self.track_stopped(pgid, &command, live, &[]);
                Ok(outcome)
            }
            Err(e) => {
                self.restore(id, previous);
                Err(JobError::Wait(e))
            }
        }
    }

    fn restore(&self, id: JobId, (background, state): (bool, JobState)) {
        if let Some(job) = self.lock().jobs.get_mut(&id) {
            job.background = background;
            job.state = state;
            job.waited = false;
        }
    }

    /// Continue a job in the background.
    pub fn send_to_background(&self, id: JobId) -> Result<(), JobError> {
        let pgid = self
            .lock()
            .jobs
            .get(&id)
            .map(|j| j.pgid)
            .ok_or(JobError::NotFound(id))?;

        killpg(pgid, Signal::SIGCONT).map_err(|source| JobError::Signal { id, source })?;

        let notice = {
            let mut jobs = self.lock();
            let job = jobs.jobs.get_mut(&id).ok_or(JobError::NotFound(id))?;
            job.background = true;
            job.state = JobState::Running;
            Notice::Resumed {
                id,
                command: job.command.clone(),
            }
        };
        self.notices.notify(&notice);
        Ok(())
    }

    /// Deliver `signal` to every process in the job's group.
    ///
    /// The job is not finalized here; that happens when the reaper collects
    /// the terminated processes. A stopped job is continued after a
    /// terminating signal so it can act on it.
    pub fn kill(&self, id: JobId, signal: Signal) -> Result<(), JobError> {
        let (pgid, stopped) = self
            .lock()
            .jobs
            .get(&id)
            .map(|j| (j.pgid, j.state == JobState::Stopped))
            .ok_or(JobError::NotFound(id))?;

        killpg(pgid, signal).map_err(|source| JobError::Signal { id, source })?;

        let terminating = matches!(
            signal,
            Signal::SIGTERM | Signal::SIGHUP | Signal::SIGINT | Signal::SIGQUIT
        );
        if stopped && terminating {
            if let Err(e) = killpg(pgid, Signal::SIGCONT) {
                tracing::warn!(%id, "failed to continue stopped job after {}: {}", signal, e);
            }
        }
        Ok(())
    }
}
