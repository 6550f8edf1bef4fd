//! cd — Change working directory.

use std::env;
use std::path::PathBuf;

use chirsh_types::ExecResult;

use crate::tools::{Builtin, BuiltinContext};

/// Cd builtin: change the shell's working directory.
///
/// With no argument goes to `$HOME`; `cd -` goes to `$OLDPWD` and prints it.
/// Keeps `PWD` and `OLDPWD` up to date.
pub struct Cd;

impl Builtin for Cd {
    fn name(&self) -> &str {
        "cd"
    }

    fn run(&self, args: &[String], _ctx: &mut BuiltinContext<'_>) -> ExecResult {
        let dash = args.first().is_some_and(|arg| arg == "-");
        let target = match args.first() {
            None => match env::var_os("HOME") {
                Some(home) => PathBuf::from(home),
                None => return ExecResult::failure(1, "cd: HOME not set"),
            },
            Some(_) if dash => match env::var_os("OLDPWD") {
                Some(previous) => PathBuf::from(previous),
                None => return ExecResult::failure(1, "cd: OLDPWD not set"),
            },
            Some(dir) => PathBuf::from(dir),
        };

        let previous = env::current_dir().ok();
        if let Err(e) = env::set_current_dir(&target) {
            return ExecResult::failure(1, format!("cd: {}: {}", target.display(), e));
        }
        let current = env::current_dir().unwrap_or(target);

        // SAFETY: builtins run on the interactive thread, and no other
        // chirsh thread reads the environment.
        unsafe {
            if let Some(previous) = &previous {
                env::set_var("OLDPWD", previous);
            }
            env::set_var("PWD", &current);
        }

        if dash {
            ExecResult::success(format!("{}\n", current.display()))
        } else {
            ExecResult::success("")
        }
    }
}
