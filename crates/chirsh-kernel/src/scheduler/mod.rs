//! Scheduler module for chirsh — process pipelines and job control.
//!
//! This module provides:
//! - **Pipeline execution**: Fork one process per stage, wire their standard
//!   streams with pipes, and place them all in one process group.
//! - **Job table**: The single source of truth for job bookkeeping, shared by
//!   the interactive thread and the reaper.
//! - **Reaper**: A background thread that collects terminated and stopped
//!   children of background jobs.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          Executor                            │
//! │  ┌─────────┐   pipe    ┌─────────┐   pipe    ┌─────────┐     │
//! │  │ stage 0 │──────────▶│ stage 1 │──────────▶│ stage 2 │     │
//! │  │ (leader)│  stdout   │         │  stdout   │         │     │
//! │  └─────────┘           └─────────┘           └─────────┘     │
//! │        one process group; foreground → wait, bg → register   │
//! └──────────────────────────────────────────────────────────────┘
//!                 │ add / mark_finished
//!                 ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    JobTable (one Mutex)                      │
//! │  jobs: BTreeMap<JobId, Job>                                  │
//! │  - add / get / list / kill                                   │
//! │  - bring_to_foreground / send_to_background                  │
//! │  - handle_child_exit ◀──────── Reaper thread                 │
//! └──────────────────────────────────────────────────────────────┘
//!                                       ▲
//!                SIGCHLD → AtomicBool ──┘ (polled, never locked)
//! ```

mod job;
mod pipeline;
mod pipes;
mod reaper;
mod wait;

pub use job::{JobError, JobTable, NoticeSink, StdoutNotices};
pub use pipeline::{ExecError, Executor, LaunchedPipeline};
pub use pipes::PipeSet;
pub use reaper::{Reaper, reap_pass};
pub use wait::{ForegroundOutcome, GroupWait, exit_status_of, wait_for_group};
