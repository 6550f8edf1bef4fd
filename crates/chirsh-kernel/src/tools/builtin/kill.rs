//! kill — Send signals to jobs or processes.

use std::str::FromStr;

use chirsh_types::ExecResult;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;

use super::parse_job_spec;
use crate::tools::{Builtin, BuiltinContext};

/// Kill builtin: `kill [-SIG | -s SIG] %N|pid...`.
///
/// `%N` names a job and signals its whole process group; a bare number is a
/// process id. The default signal is SIGTERM.
pub struct Kill;

const USAGE: &str = "kill: usage: kill [-s SIG | -SIG] %job|pid...";

/// Parse a signal name (`TERM`, `SIGTERM`, `term`) or number.
fn parse_signal(name: &str) -> Option<Signal> {
    if let Ok(number) = name.parse::<i32>() {
        return Signal::try_from(number).ok();
    }
    let upper = name.to_ascii_uppercase();
    let full = if upper.starts_with("SIG") { upper } else { format!("SIG{upper}") };
    Signal::from_str(&full).ok()
}

/// Split off the signal option, returning it and the remaining targets.
fn parse_options(args: &[String]) -> Result<(Signal, &[String]), String> {
    match args {
        [flag, name, rest @ ..] if flag == "-s" => parse_signal(name)
            .map(|signal| (signal, rest))
            .ok_or_else(|| format!("kill: {name}: invalid signal specification")),
        [flag, rest @ ..] if flag.len() > 1 && flag.starts_with('-') => parse_signal(&flag[1..])
            .map(|signal| (signal, rest))
            .ok_or_else(|| format!("kill: {}: invalid signal specification", &flag[1..])),
        _ => Ok((Signal::SIGTERM, args)),
    }
}

impl Builtin for Kill {
    fn name(&self) -> &str {
        "kill"
    }

    fn run(&self, args: &[String], ctx: &mut BuiltinContext<'_>) -> ExecResult {
        let (signal, targets) = match parse_options(args) {
            Ok(parsed) => parsed,
            Err(message) => return ExecResult::failure(1, message),
        };
        if targets.is_empty() {
            return ExecResult::failure(1, USAGE);
        }

        let mut errors = Vec::new();
        for target in targets {
            let outcome = if target.starts_with('%') {
                match parse_job_spec(target) {
                    Some(id) => ctx.jobs.kill(id, signal).map_err(|e| e.to_string()),
                    None => Err(format!("{target}: invalid job specification")),
                }
            } else {
                match target.parse::<i32>() {
                    Ok(pid) if pid > 0 => {
                        signal::kill(Pid::from_raw(pid), signal).map_err(|e| format!("({pid}): {e}"))
                    }
                    _ => Err(format!("{target}: arguments must be process or job IDs")),
                }
            };
            if let Err(message) = outcome {
                errors.push(format!("kill: {message}"));
            }
        }

        if errors.is_empty() {
            ExecResult::success("")
        } else {
            ExecResult::failure(1, errors.join("\n"))
        }
    }
}
