//! export — Set environment variables.

use chirsh_types::ExecResult;

use crate::tools::{Builtin, BuiltinContext};

/// Export builtin: `export NAME=value...`.
///
/// Every valid assignment is applied; any invalid one makes the status 1.
pub struct Export;

fn split_assignment(assignment: &str) -> Option<(&str, &str)> {
    let (name, value) = assignment.split_once('=')?;
    let valid = !name.is_empty() && !name.contains('\0') && !value.contains('\0');
    valid.then_some((name, value))
}

impl Builtin for Export {
    fn name(&self) -> &str {
        "export"
    }

    fn run(&self, args: &[String], _ctx: &mut BuiltinContext<'_>) -> ExecResult {
        if args.is_empty() {
            return ExecResult::failure(1, "export: usage: export NAME=value...");
        }

        let mut errors = Vec::new();
        for arg in args {
            match split_assignment(arg) {
                // SAFETY: builtins run on the interactive thread, and no other
                // chirsh thread reads the environment.
                Some((name, value)) => unsafe { std::env::set_var(name, value) },
                None => errors.push(format!("export: {arg}: invalid assignment")),
            }
        }

        if errors.is_empty() {
            ExecResult::success("")
        } else {
            ExecResult::failure(1, errors.join("\n"))
        }
    }
}
