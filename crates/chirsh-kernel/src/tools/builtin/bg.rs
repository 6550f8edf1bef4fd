//! bg — Resume a job in the background.

use chirsh_types::ExecResult;

use super::target_job;
use crate::tools::{Builtin, BuiltinContext};

/// Bg builtin: `bg [%N]`.
pub struct Bg;

impl Builtin for Bg {
    fn name(&self) -> &str {
        "bg"
    }

    fn run(&self, args: &[String], ctx: &mut BuiltinContext<'_>) -> ExecResult {
        let id = match target_job("bg", args, ctx) {
            Ok(id) => id,
            Err(result) => return result,
        };
        match ctx.jobs.send_to_background(id) {
            Ok(()) => ExecResult::success(""),
            Err(e) => ExecResult::failure(1, format!("bg: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[test]
    fn test_bg_unknown_job() {
        let jobs = testing::job_table();
        let mut ctx = BuiltinContext::new(&jobs, &[]);
        let result = Bg.run(&["2".to_string()], &mut ctx);
        assert_eq!(result.code, 1);
        assert_eq!(result.err, "bg: job not found: %2");
    }

    #[test]
    fn test_bg_without_jobs() {
        let jobs = testing::job_table();
        let mut ctx = BuiltinContext::new(&jobs, &[]);
        assert_eq!(Bg.run(&[], &mut ctx).err, "bg: no current job");
    }
}
