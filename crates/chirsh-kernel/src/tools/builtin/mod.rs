//! Built-in commands for chirsh.

mod bg;
mod cd;
mod echo;
mod env;
mod exit;
mod export;
mod fg;
mod history;
mod jobs;
mod kill;
mod pwd;
mod unset;

use chirsh_types::{ExecResult, JobId};

use super::{BuiltinContext, BuiltinRegistry};

/// Register all built-in commands with the registry.
pub fn register_builtins(registry: &mut BuiltinRegistry) {
    registry.register(bg::Bg);
    registry.register(cd::Cd);
    registry.register(echo::Echo);
    registry.register(env::Env);
    registry.register(exit::Exit);
    registry.register(export::Export);
    registry.register(fg::Fg);
    registry.register(history::History);
    registry.register(jobs::Jobs);
    registry.register(kill::Kill);
    registry.register(pwd::Pwd);
    registry.register(unset::Unset);
}

/// Parse a job specification: `%N` or `N`, with `N > 0`.
fn parse_job_spec(spec: &str) -> Option<JobId> {
    let digits = spec.strip_prefix('%').unwrap_or(spec);
    digits.parse::<u64>().ok().filter(|&n| n > 0).map(JobId)
}

/// The job named by the first argument, or the current job.
fn target_job(name: &str, args: &[String], ctx: &BuiltinContext<'_>) -> Result<JobId, ExecResult> {
    match args.first() {
        Some(spec) => parse_job_spec(spec)
            .ok_or_else(|| ExecResult::failure(1, format!("{name}: {spec}: invalid job specification"))),
        None => ctx
            .jobs
            .current()
            .ok_or_else(|| ExecResult::failure(1, format!("{name}: no current job"))),
    }
}
