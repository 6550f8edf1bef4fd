//! Builtin registry: name lookup and dispatch.

use std::collections::HashMap;
use std::sync::Arc;

use chirsh_types::{ExecResult, Stage};

use super::builtin::register_builtins;
use super::context::BuiltinContext;
use super::traits::Builtin;

/// Maps command names to builtins.
#[derive(Default)]
pub struct BuiltinRegistry {
    builtins: HashMap<String, Arc<dyn Builtin>>,
}

impl BuiltinRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every builtin chirsh ships.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        register_builtins(&mut registry);
        registry
    }

    /// Register a builtin, replacing any previous one with the same name.
    pub fn register(&mut self, builtin: impl Builtin + 'static) {
        self.builtins.insert(builtin.name().to_string(), Arc::new(builtin));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Builtin>> {
        self.builtins.get(name).cloned()
    }

    /// Whether the stage's program is a builtin.
    pub fn is_builtin(&self, stage: &Stage) -> bool {
        self.builtins.contains_key(stage.program())
    }

    /// Run the builtin named by the stage's program.
    pub fn run(&self, stage: &Stage, ctx: &mut BuiltinContext<'_>) -> ExecResult {
        match self.builtins.get(stage.program()) {
            Some(builtin) => builtin.run(stage.operands(), ctx),
            None => ExecResult::failure(127, format!("{}: not a builtin", stage.program())),
        }
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.builtins.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
