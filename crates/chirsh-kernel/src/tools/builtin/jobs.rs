//! jobs — List jobs.

use chirsh_types::ExecResult;

use crate::tools::{Builtin, BuiltinContext};

/// Jobs builtin: one `[id] Running|Stopped command [&]` line per job.
pub struct Jobs;

impl Builtin for Jobs {
    fn name(&self) -> &str {
        "jobs"
    }

    fn run(&self, _args: &[String], ctx: &mut BuiltinContext<'_>) -> ExecResult {
        let out: String = ctx.jobs.list().iter().map(|job| format!("{job}\n")).collect();
        ExecResult::success(out)
    }
}
