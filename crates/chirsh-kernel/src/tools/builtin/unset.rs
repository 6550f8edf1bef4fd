//! unset — Remove environment variables.

use chirsh_types::ExecResult;

use crate::tools::{Builtin, BuiltinContext};

/// Unset builtin: `unset NAME...`.
pub struct Unset;

impl Builtin for Unset {
    fn name(&self) -> &str {
        "unset"
    }

    fn run(&self, args: &[String], _ctx: &mut BuiltinContext<'_>) -> ExecResult {
        if args.is_empty() {
            return ExecResult::failure(1, "unset: missing variable name");
        }

        let mut errors = Vec::new();
        for name in args {
            if name.is_empty() || name.contains(['=', '\0']) {
                errors.push(format!("unset: {name}: invalid variable name"));
                continue;
            }
            // SAFETY: builtins run on the interactive thread, and no other
            // chirsh thread reads the environment.
            unsafe { std::env::remove_var(name) };
        }

        if errors.is_empty() {
            ExecResult::success("")
        } else {
            ExecResult::failure(1, errors.join("\n"))
        }
    }
}
