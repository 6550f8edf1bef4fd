//! fg — Resume a job in the foreground.

use chirsh_types::ExecResult;

use super::target_job;
use crate::tools::{Builtin, BuiltinContext};

/// Fg builtin: `fg [%N]`. Continues the job with the terminal and waits for
/// it to finish or stop again; the job's status becomes fg's status.
pub struct Fg;

impl Builtin for Fg {
    fn name(&self) -> &str {
        "fg"
    }

    fn run(&self, args: &[String], ctx: &mut BuiltinContext<'_>) -> ExecResult {
        let id = match target_job("fg", args, ctx) {
            Ok(id) => id,
            Err(result) => return result,
        };
        match ctx.jobs.bring_to_foreground(id) {
            Ok(outcome) => ExecResult::from_code(outcome.code()),
            Err(e) => ExecResult::failure(1, format!("fg: {e}")),
        }
    }
}
