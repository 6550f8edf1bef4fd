//! exit — Leave the shell.

use chirsh_types::ExecResult;

use crate::tools::{Builtin, BuiltinContext};

/// Exit builtin: `exit [n]`. Requests shutdown; the read loop stops after
/// this command. The status is `n` modulo 256, or 0.
pub struct Exit;

impl Builtin for Exit {
    fn name(&self) -> &str {
        "exit"
    }

    fn run(&self, args: &[String], ctx: &mut BuiltinContext<'_>) -> ExecResult {
        ctx.should_exit = true;
        match args.first() {
            None => ExecResult::from_code(0),
            Some(arg) => match arg.parse::<i64>() {
                Ok(n) => ExecResult::from_code(n.rem_euclid(256) as i32),
                Err(_) => ExecResult::failure(2, format!("exit: {arg}: numeric argument required")),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    fn exit(args: &[&str]) -> (ExecResult, bool) {
        let jobs = testing::job_table();
        let mut ctx = BuiltinContext::new(&jobs, &[]);
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        let result = Exit.run(&args, &mut ctx);
        (result, ctx.should_exit)
    }

    #[test]
    fn test_exit_sets_flag() {
        let (result, should_exit) = exit(&[]);
        assert_eq!(result.code, 0);
        assert!(should_exit);
    }

    #[test]
    fn test_exit_with_code() {
        assert_eq!(exit(&["3"]).0.code, 3);
        assert_eq!(exit(&["256"]).0.code, 0);
        assert_eq!(exit(&["-1"]).0.code, 255);
    }

    #[test]
    fn test_exit_non_numeric() {
        let (result, should_exit) = exit(&["soon"]);
        assert_eq!(result.code, 2);
        assert!(should_exit);
    }
}
