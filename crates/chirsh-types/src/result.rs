//! ExecResult — what an in-process builtin hands back to the executor.

/// The result of running a builtin.
///
/// The executor writes `out` to stdout and `err` to stderr, then records
/// `code` as the last status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecResult {
    /// Exit code. 0 means success.
    pub code: i32,
    /// Text for standard output.
    pub out: String,
    /// Text for standard error.
    pub err: String,
}

impl ExecResult {
    /// Create a successful result with output.
    pub fn success(out: impl Into<String>) -> Self {
        Self {
            code: 0,
            out: out.into(),
            err: String::new(),
        }
    }

    /// Create a failed result with an error message.
    pub fn failure(code: i32, err: impl Into<String>) -> Self {
        Self {
            code,
            out: String::new(),
            err: err.into(),
        }
    }

    /// Create a result from a status code with no output.
    pub fn from_code(code: i32) -> Self {
        Self {
            code,
            ..Self::default()
        }
    }

    /// True if the command succeeded (exit code 0).
    pub fn ok(&self) -> bool {
        self.code == 0
    }
}
