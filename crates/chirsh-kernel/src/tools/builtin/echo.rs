//! echo — Print arguments.

use chirsh_types::ExecResult;

use crate::tools::{Builtin, BuiltinContext};

/// Echo builtin: print arguments separated by spaces.
///
/// A leading `-n` suppresses the trailing newline.
pub struct Echo;

impl Builtin for Echo {
    fn name(&self) -> &str {
        "echo"
    }

    fn run(&self, args: &[String], _ctx: &mut BuiltinContext<'_>) -> ExecResult {
        let (newline, words) = match args.split_first() {
            Some((flag, rest)) if flag == "-n" => (false, rest),
            _ => (true, args),
        };
        let mut out = words.join(" ");
        if newline {
            out.push('\n');
        }
        ExecResult::success(out)
    }
}
