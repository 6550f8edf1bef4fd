//! Executor tests against real processes.
//!
//! Every test builds its own job table around a recording terminal, so no
//! test ever touches the real controlling terminal. Nothing here runs a
//! reaper: foreground groups are collected by their own wait, and background
//! groups are collected explicitly with `reap_pass`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chirsh_kernel::lexer::tokenize;
use chirsh_kernel::scheduler::{ForegroundOutcome, GroupWait, reap_pass, wait_for_group};
use chirsh_kernel::testing::{RecordingNotices, RecordingTerminal, TerminalEvent};
use chirsh_kernel::{ExecutionContext, Executor, ExitStatus, JobId, JobState, JobTable, Notice};
use nix::sys::signal::Signal;
use nix::unistd::{Pid, getpgid};

struct Harness {
    executor: Executor,
    terminal: Arc<RecordingTerminal>,
    notices: Arc<RecordingNotices>,
    ctx: ExecutionContext,
}

impl Harness {
    fn new() -> Self {
        let terminal = Arc::new(RecordingTerminal::new());
        let notices = Arc::new(RecordingNotices::new());
        let jobs = Arc::new(JobTable::new(terminal.clone(), notices.clone()));
        Self {
            executor: Executor::new("chirsh", jobs),
            terminal,
            notices,
            ctx: ExecutionContext::default(),
        }
    }

    fn run(&mut self, line: &str) -> i32 {
        self.executor.execute(&tokenize(line), line, &[], &mut self.ctx)
    }

    fn jobs(&self) -> &JobTable {
        self.executor.jobs()
    }

    /// Collect background statuses until `done` holds.
    fn reap_until(&self, done: impl Fn(&JobTable) -> bool) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while !done(self.jobs()) {
            assert!(Instant::now() < deadline, "timed out waiting for jobs: {:?}", self.jobs().list());
            reap_pass(self.jobs());
            std::thread::sleep(Duration::from_millis(10));
        }
    }
}

// ============================================================================
// Foreground status
// ============================================================================

#[test]
fn foreground_true_is_zero_and_leaves_no_job() {
    let mut h = Harness::new();
    assert_eq!(h.run("true"), 0);
    assert_eq!(h.ctx.last_status, 0);
    assert!(h.jobs().is_empty());
}

#[test]
fn foreground_false_is_one() {
    let mut h = Harness::new();
    assert_eq!(h.run("false"), 1);
    assert_eq!(h.ctx.last_status, 1);
}

#[test]
fn foreground_exit_code_is_passed_through() {
    let mut h = Harness::new();
    assert_eq!(h.run("sh -c 'exit 42'"), 42);
}

#[test]
fn killed_by_signal_is_128_plus_signal() {
    let mut h = Harness::new();
    assert_eq!(h.run("sh -c 'kill -9 $$'"), 128 + Signal::SIGKILL as i32);
}

#[test]
fn missing_program_is_127() {
    let mut h = Harness::new();
    assert_eq!(h.run("definitely_not_a_real_command_12345"), 127);
    assert!(h.jobs().is_empty());
}

#[test]
fn foreground_hands_terminal_over_and_back() {
    let mut h = Harness::new();
    h.run("true");
    let events = h.terminal.events();
    assert_eq!(events.len(), 2);
    assert!(matches!(events[0], TerminalEvent::GiveTo(_)));
    assert_eq!(events[1], TerminalEvent::Reclaim);
}

// ============================================================================
// Pipelines
// ============================================================================

#[test]
fn pipe_carries_data_between_stages() {
    let mut h = Harness::new();
    assert_eq!(h.run("printf x | cat | grep -q x"), 0);
    assert_eq!(h.run("printf x | cat | grep -q y"), 1);
}

#[test]
fn status_is_last_stage() {
    let mut h = Harness::new();
    assert_eq!(h.run("false | true"), 0);
    assert_eq!(h.run("true | false"), 1);
}

#[test]
fn upstream_sees_eof_and_pipe_close() {
    // `yes` only ends once `head` has exited and every write end is closed.
    let mut h = Harness::new();
    assert_eq!(h.run("yes | head -n 1"), 0);
}

#[test]
fn launch_spawns_one_process_per_stage_in_one_group() {
    let h = Harness::new();
    let pipeline = tokenize("sleep 1 | sleep 1 | sleep 1");
    let launched = h.executor.launch(&pipeline).unwrap();

    assert_eq!(launched.pids.len(), 3);
    assert_eq!(launched.pgid, launched.pids[0]);
    for pid in &launched.pids {
        assert_eq!(getpgid(Some(*pid)).unwrap(), launched.pgid);
    }

    let outcome = wait_for_group(&GroupWait {
        pgid: launched.pgid,
        expected: 3,
        status_pid: launched.pids.last().copied(),
    })
    .unwrap();
    assert_eq!(outcome, ForegroundOutcome::Finished(ExitStatus::Exited(0)));
}

#[test]
fn builtin_runs_in_process() {
    let mut h = Harness::new();
    assert_eq!(h.run("exit 7"), 7);
    assert!(h.ctx.should_exit);
    assert!(h.terminal.events().is_empty());
}

#[test]
fn builtin_inside_pipeline_is_a_program() {
    let mut h = Harness::new();
    // `echo` here is /bin/echo: builtins only run as the sole stage.
    assert_eq!(h.run("echo hi | grep -q hi"), 0);
}

#[test]
fn empty_line_is_noop() {
    let mut h = Harness::new();
    h.run("false");
    assert_eq!(h.run(""), 0);
    assert_eq!(h.ctx.last_status, 1);
}

// ============================================================================
// Background jobs and job control
// ============================================================================

#[test]
fn background_job_is_registered_and_announced() {
    let mut h = Harness::new();
    assert_eq!(h.run("sleep 0.2 &"), 0);

    let info = h.jobs().get(JobId(1)).unwrap();
    assert_eq!(info.command, "sleep 0.2");
    assert!(info.background);
    assert_eq!(info.state, JobState::Running);
    assert!(h.terminal.events().is_empty());

    assert_eq!(
        h.notices.notices()[0],
        Notice::Started {
            id: JobId(1),
            pgid: info.pgid,
            command: "sleep 0.2".into(),
        }
    );

    h.reap_until(JobTable::is_empty);
    assert_eq!(
        h.notices.notices()[1],
        Notice::Finished {
            id: JobId(1),
            command: "sleep 0.2".into(),
            status: ExitStatus::Exited(0),
        }
    );
}

#[test]
fn background_pipeline_is_done_only_after_last_stage() {
    let mut h = Harness::new();
    h.run("true | sleep 30 &");
    let id = JobId(1);

    h.reap_until(|jobs| jobs.get(id).is_some_and(|j| j.live_processes == 1));
    assert!(h.jobs().get(id).unwrap().is_running());

    h.jobs().kill(id, Signal::SIGTERM).unwrap();
    h.reap_until(JobTable::is_empty);
    assert_eq!(
        h.notices.notices().last().unwrap().to_string(),
        "[1] Killed (15) true | sleep 30"
    );
}

#[test]
fn fg_moves_terminal_to_job_and_back() {
    let mut h = Harness::new();
    h.run("sleep 0.3 &");
    let id = JobId(1);
    let pgid = Pid::from_raw(h.jobs().get(id).unwrap().pgid);

    let outcome = h.jobs().bring_to_foreground(id).unwrap();
    assert_eq!(outcome, ForegroundOutcome::Finished(ExitStatus::Exited(0)));
    assert_eq!(
        h.terminal.events(),
        vec![TerminalEvent::GiveTo(pgid), TerminalEvent::Reclaim]
    );
    assert!(h.jobs().get(id).is_none());
}

#[test]
fn stopped_foreground_job_can_be_resumed() {
    let mut h = Harness::new();
    let status = h.run("sh -c 'kill -STOP $$; exit 5'");
    assert_eq!(status, 128 + Signal::SIGSTOP as i32);

    let id = JobId(1);
    let info = h.jobs().get(id).unwrap();
    assert_eq!(info.state, JobState::Stopped);
    assert!(!info.background);
    assert!(h.notices.notices().contains(&Notice::Stopped {
        id,
        command: "sh -c 'kill -STOP $$; exit 5'".into(),
    }));

    let outcome = h.jobs().bring_to_foreground(id).unwrap();
    assert_eq!(outcome, ForegroundOutcome::Finished(ExitStatus::Exited(5)));
    assert!(h.jobs().is_empty());
}

#[test]
fn bg_continues_stopped_job() {
    let mut h = Harness::new();
    h.run("sh -c 'kill -STOP $$; exit 0'");
    let id = JobId(1);

    h.jobs().send_to_background(id).unwrap();
    assert!(h.jobs().get(id).is_none_or(|j| j.background));
    assert!(h.notices.notices().iter().any(|n| matches!(n, Notice::Resumed { .. })));

    h.reap_until(JobTable::is_empty);
}

#[test]
fn kill_stopped_job_terminates_it() {
    let mut h = Harness::new();
    h.run("sh -c 'kill -STOP $$; exit 0'");
    let id = JobId(1);

    assert_eq!(h.jobs().get(id).map(|j| j.state), Some(JobState::Stopped));

    // SIGTERM alone would stay pending on a stopped process.
    h.jobs().kill(id, Signal::SIGTERM).unwrap();
    h.reap_until(JobTable::is_empty);
}
