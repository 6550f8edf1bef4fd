//! Core builtin trait.

use chirsh_types::ExecResult;

use super::context::BuiltinContext;

/// A command executed in the shell process.
pub trait Builtin: Send + Sync {
    /// The builtin's name (used for lookup).
    fn name(&self) -> &str;

    /// Run with the arguments after the command name.
    fn run(&self, args: &[String], ctx: &mut BuiltinContext<'_>) -> ExecResult;
}
