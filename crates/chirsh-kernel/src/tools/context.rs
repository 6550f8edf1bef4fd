//! Execution context for builtins.

use crate::scheduler::JobTable;

/// Shell state a builtin may read or change.
pub struct BuiltinContext<'a> {
    /// Job table for `jobs`, `fg`, `bg` and `kill`.
    pub jobs: &'a JobTable,
    /// Lines entered so far, oldest first.
    pub history: &'a [String],
    /// Set by `exit`; the read loop stops once it sees it.
    pub should_exit: bool,
}

impl<'a> BuiltinContext<'a> {
    pub fn new(jobs: &'a JobTable, history: &'a [String]) -> Self {
        Self {
            jobs,
            history,
            should_exit: false,
        }
    }
}
