//! chirsh-kernel: the pipeline execution and job-control engine of chirsh.
//!
//! This crate provides:
//!
//! - **Lexer**: Turns a raw input line into a [`Pipeline`]
//! - **Signals**: Process-wide signal dispositions and the SIGCHLD hand-off flag
//! - **Terminal**: Shell process-group identity and controlling-terminal ownership
//! - **Scheduler**: Process spawning, pipe wiring, the job table, and the reaper
//! - **Tools**: Builtin commands executed in-process
//! - **Kernel**: The façade tying it all together for the REPL

pub mod kernel;
pub mod lexer;
pub mod scheduler;
pub mod signals;
pub mod terminal;
pub mod testing;
pub mod tools;

pub use chirsh_types::{ExecResult, ExitStatus, JobId, JobInfo, JobState, Notice, Pipeline, Stage};
pub use kernel::{ExecutionContext, Kernel, KernelConfig, KernelError};
pub use scheduler::{
    ExecError, Executor, ForegroundOutcome, JobError, JobTable, LaunchedPipeline, NoticeSink, Reaper,
    StdoutNotices,
};
pub use terminal::{ControllingTerminal, ForegroundGuard, Terminal};
pub use tools::{Builtin, BuiltinContext, BuiltinRegistry};
