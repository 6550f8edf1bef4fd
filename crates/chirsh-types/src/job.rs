//! Job identification, status, and the notices jobs produce.

use std::fmt;

/// Unique identifier for a job. Monotonic, never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// At least one process in the group is running.
    Running,
    /// The group was suspended by a stop signal (e.g., Ctrl-Z / SIGTSTP).
    Stopped,
    /// Every process in the group has terminated. Done jobs are swept.
    Done,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Running => write!(f, "Running"),
            JobState::Stopped => write!(f, "Stopped"),
            JobState::Done => write!(f, "Done"),
        }
    }
}

/// How a process or job ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Normal exit with the given code.
    Exited(i32),
    /// Terminated by the given signal number.
    Signaled(i32),
    /// Ended without an observable status (already collected elsewhere).
    Unknown,
}

impl ExitStatus {
    /// Shell-visible status code: the exit code, or `128 + signal`.
    pub fn code(&self) -> i32 {
        match self {
            ExitStatus::Exited(code) => *code,
            ExitStatus::Signaled(sig) => 128 + sig,
            ExitStatus::Unknown => 0,
        }
    }
}

/// Snapshot of a job for listing and lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobInfo {
    pub id: JobId,
    /// Process group id shared by every stage of the job.
    pub pgid: i32,
    /// Command text as the user typed it.
    pub command: String,
    pub state: JobState,
    pub background: bool,
    /// Processes in the group that have not terminated yet.
    pub live_processes: usize,
}

impl JobInfo {
    pub fn is_running(&self) -> bool {
        self.state == JobState::Running
    }
}

/// Renders the `jobs` listing line: `[id] Running|Stopped command [&]`.
impl fmt::Display for JobInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} {}", self.id, self.state, self.command)?;
        if self.background {
            write!(f, " &")?;
        }
        Ok(())
    }
}

/// A one-line message about a job's lifecycle, shown at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// A background job was launched.
    Started { id: JobId, pgid: i32, command: String },
    /// A job finished; every process in its group has been collected.
    Finished { id: JobId, command: String, status: ExitStatus },
    /// A job was suspended by a stop signal.
    Stopped { id: JobId, command: String },
    /// A stopped job was continued in the background.
    Resumed { id: JobId, command: String },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Started { id, pgid, command } => write!(f, "[{id}] {pgid} {command}"),
            Notice::Finished { id, command, status } => match status {
                ExitStatus::Exited(_) => write!(f, "[{id}] Done {command}"),
                ExitStatus::Signaled(sig) => write!(f, "[{id}] Killed ({sig}) {command}"),
                ExitStatus::Unknown => write!(f, "[{id}] Finished {command}"),
            },
            Notice::Stopped { id, command } => write!(f, "[{id}]+ Stopped {command}"),
            Notice::Resumed { id, command } => write!(f, "[{id}] {command} &"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(state: JobState, background: bool) -> JobInfo {
        JobInfo {
            id: JobId(3),
            pgid: 4242,
            command: "sleep 10".to_string(),
            state,
            background,
            live_processes: 1,
        }
    }

    #[test]
    fn status_codes_follow_shell_convention() {
        assert_eq!(ExitStatus::Exited(0).code(), 0);
        assert_eq!(ExitStatus::Exited(3).code(), 3);
        assert_eq!(ExitStatus::Signaled(9).code(), 137);
        assert_eq!(ExitStatus::Unknown.code(), 0);
    }

    #[test]
    fn listing_line_has_background_marker() {
        assert_eq!(info(JobState::Running, true).to_string(), "[3] Running sleep 10 &");
        assert_eq!(info(JobState::Stopped, false).to_string(), "[3] Stopped sleep 10");
    }

    #[test]
    fn notice_lines() {
        let started = Notice::Started { id: JobId(1), pgid: 77, command: "sleep 1".into() };
        assert_eq!(started.to_string(), "[1] 77 sleep 1");

        let done = Notice::Finished {
            id: JobId(1),
            command: "sleep 1".into(),
            status: ExitStatus::Exited(0),
        };
        assert_eq!(done.to_string(), "[1] Done sleep 1");

        let killed = Notice::Finished {
            id: JobId(2),
            command: "yes".into(),
            status: ExitStatus::Signaled(15),
        };
        assert_eq!(killed.to_string(), "[2] Killed (15) yes");

        let finished = Notice::Finished {
            id: JobId(4),
            command: "x".into(),
            status: ExitStatus::Unknown,
        };
        assert_eq!(finished.to_string(), "[4] Finished x");
    }
}
