//! history — List entered lines.

use chirsh_types::ExecResult;

use crate::tools::{Builtin, BuiltinContext};

/// History builtin: print every remembered line, numbered from 1.
pub struct History;

impl Builtin for History {
    fn name(&self) -> &str {
        "history"
    }

    fn run(&self, _args: &[String], ctx: &mut BuiltinContext<'_>) -> ExecResult {
        let out: String = ctx
            .history
            .iter()
            .enumerate()
            .map(|(i, line)| format!("{} {}\n", i + 1, line))
            .collect();
        ExecResult::success(out)
    }
}
