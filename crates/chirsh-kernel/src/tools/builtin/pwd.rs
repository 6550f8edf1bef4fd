//! pwd — Print working directory.

use chirsh_types::ExecResult;

use crate::tools::{Builtin, BuiltinContext};

/// Pwd builtin: print the shell's working directory.
pub struct Pwd;

impl Builtin for Pwd {
    fn name(&self) -> &str {
        "pwd"
    }

    fn run(&self, _args: &[String], _ctx: &mut BuiltinContext<'_>) -> ExecResult {
        match std::env::current_dir() {
            Ok(dir) => ExecResult::success(format!("{}\n", dir.display())),
            Err(e) => ExecResult::failure(1, format!("pwd: {e}")),
        }
    }
}
