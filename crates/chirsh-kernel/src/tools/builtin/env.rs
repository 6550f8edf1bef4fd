//! env — Print the environment.

use chirsh_types::ExecResult;

use crate::tools::{Builtin, BuiltinContext};

/// Env builtin: print every environment variable as `NAME=value`.
pub struct Env;

impl Builtin for Env {
    fn name(&self) -> &str {
        "env"
    }

    fn run(&self, _args: &[String], _ctx: &mut BuiltinContext<'_>) -> ExecResult {
        let out: String = std::env::vars_os()
            .map(|(key, value)| format!("{}={}\n", key.to_string_lossy(), value.to_string_lossy()))
            .collect();
        ExecResult::success(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_env_lists_variables() {
        unsafe { std::env::set_var("CHIRSH_ENV_TEST", "visible") };
        let jobs = testing::job_table();
        let mut ctx = BuiltinContext::new(&jobs, &[]);
        let result = Env.run(&[], &mut ctx);
        unsafe { std::env::remove_var("CHIRSH_ENV_TEST") };

        assert!(result.ok());
        assert!(result.out.lines().any(|line| line == "CHIRSH_ENV_TEST=visible"));
    }
}
