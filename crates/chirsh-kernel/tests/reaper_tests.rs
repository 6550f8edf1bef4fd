//! Reaper thread tests.
//!
//! Serialized: the reaper and the SIGCHLD flag are process-wide concerns.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chirsh_kernel::lexer::tokenize;
use chirsh_kernel::signals;
use chirsh_kernel::testing::{RecordingNotices, RecordingTerminal};
use chirsh_kernel::{ExecutionContext, Executor, ExitStatus, JobId, JobTable, Notice, Reaper};
use serial_test::serial;

fn setup() -> (Arc<JobTable>, Executor, Arc<RecordingNotices>) {
    let notices = Arc::new(RecordingNotices::new());
    let jobs = Arc::new(JobTable::new(Arc::new(RecordingTerminal::new()), notices.clone()));
    let executor = Executor::new("chirsh", Arc::clone(&jobs));
    (jobs, executor, notices)
}

fn run(executor: &Executor, line: &str) -> i32 {
    executor.execute(&tokenize(line), line, &[], &mut ExecutionContext::default())
}

fn wait_until(what: &str, done: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while !done() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        std::thread::sleep(Duration::from_millis(10));
    }
}

#[test]
#[serial]
fn reaper_collects_background_job() {
    let (jobs, executor, notices) = setup();
    let reaper = Reaper::spawn(Arc::clone(&jobs), Duration::from_millis(10)).unwrap();

    run(&executor, "sh -c 'exit 3' &");
    wait_until("job to finish", || jobs.is_empty());
    reaper.shutdown();

    assert_eq!(
        notices.notices().last(),
        Some(&Notice::Finished {
            id: JobId(1),
            command: "sh -c 'exit 3'".into(),
            status: ExitStatus::Exited(3),
        })
    );
}

#[test]
#[serial]
fn reaper_never_steals_foreground_status() {
    let (jobs, executor, _) = setup();
    let reaper = Reaper::spawn(Arc::clone(&jobs), Duration::from_millis(1)).unwrap();

    run(&executor, "sleep 5 &");
    for _ in 0..20 {
        assert_eq!(run(&executor, "sh -c 'exit 9'"), 9);
    }

    jobs.kill(JobId(1), nix::sys::signal::Signal::SIGKILL).unwrap();
    wait_until("background job to be killed", || jobs.is_empty());
    reaper.shutdown();
}

#[test]
#[serial]
fn shutdown_runs_final_pass() {
    let (jobs, executor, _) = setup();
    // Long enough that only the final pass can collect the job.
    let reaper = Reaper::spawn(Arc::clone(&jobs), Duration::from_secs(60)).unwrap();
    std::thread::sleep(Duration::from_millis(50));

    run(&executor, "true &");
    std::thread::sleep(Duration::from_millis(300));

    reaper.shutdown();
    assert!(jobs.is_empty());
}

#[test]
#[serial]
fn dropping_handle_stops_thread() {
    let (jobs, executor, _) = setup();
    {
        let _reaper = Reaper::spawn(Arc::clone(&jobs), Duration::from_secs(60)).unwrap();
        run(&executor, "true &");
        std::thread::sleep(Duration::from_millis(300));
    }
    assert!(jobs.is_empty());
}

#[test]
#[serial]
fn signal_table_installs_once() {
    assert_eq!(signals::install(), Ok(()));
    assert_eq!(signals::install(), Ok(()));

    let (jobs, executor, _) = setup();
    run(&executor, "true");
    // The foreground child's SIGCHLD raised the flag.
    assert!(signals::take_child_exited());
    assert!(!signals::take_child_exited());
    assert!(jobs.is_empty());
}
