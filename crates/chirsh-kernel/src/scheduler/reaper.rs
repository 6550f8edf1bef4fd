//! The reaper thread.
//!
//! Collects terminated, stopped, and continued children of background jobs
//! and feeds their statuses to the job table. Woken early by the SIGCHLD
//! flag, otherwise polls on a bounded interval so a missed signal is never
//! a lost status.
//!
//! Only groups the job table hands out are waited on. Foreground groups are
//! collected by their own blocking wait and never appear here.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chirsh_types::ExitStatus;
use nix::errno::Errno;
use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
use nix::unistd::Pid;

use super::job::JobTable;
use crate::signals;

/// Handle to the running reaper. Dropping it stops and joins the thread.
pub struct Reaper {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Reaper {
    /// Start the reaper on its own named thread.
    pub fn spawn(jobs: Arc<JobTable>, interval: Duration) -> std::io::Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let handle = thread::Builder::new().name("chirsh-reaper".into()).spawn({
            let stop = Arc::clone(&stop);
            move || run(&jobs, &stop, interval)
        })?;
        tracing::debug!(?interval, "reaper started");
        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }

    /// Stop the thread after one final collection pass.
    pub fn shutdown(mut self) {
        self.stop_and_join();
    }

    fn stop_and_join(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        self.stop.store(true, Ordering::Release);
        handle.thread().unpark();
        if handle.join().is_err() {
            tracing::error!("reaper thread panicked");
        }
    }
}

impl Drop for Reaper {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}

fn run(jobs: &JobTable, stop: &AtomicBool, interval: Duration) {
    while !stop.load(Ordering::Acquire) {
        let signalled = signals::take_child_exited();
        reap_pass(jobs);
        if !signalled {
            thread::park_timeout(interval);
        }
    }
    reap_pass(jobs);
    tracing::debug!("reaper stopped");
}

/// One non-blocking collection pass over every background group.
///
/// Returns the number of status changes collected. A group with no
/// children left to wait for is finished with an unknown status.
pub fn reap_pass(jobs: &JobTable) -> usize {
    let _pass = jobs.hold_collection();
    let flags = WaitPidFlag::WNOHANG | WaitPidFlag::WUNTRACED | WaitPidFlag::WCONTINUED;
    let mut collected = 0;

    for pgid in jobs.background_groups() {
        let target = Pid::from_raw(-pgid.as_raw());
        loop {
            match waitpid(target, Some(flags)) {
                Ok(WaitStatus::StillAlive) => break,
                Ok(status) => {
                    collected += 1;
                    jobs.handle_child_status(status);
                }
                Err(Errno::EINTR) => continue,
                Err(Errno::ECHILD) => {
                    tracing::debug!(%pgid, "background group has no children left");
                    jobs.mark_finished(pgid, ExitStatus::Unknown);
                    break;
                }
                Err(e) => {
                    tracing::warn!(%pgid, "waitpid failed: {}", e);
                    break;
                }
            }
        }
    }

    collected
}
