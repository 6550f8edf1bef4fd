//! Builtin commands for chirsh.
//!
//! A builtin runs inside the shell process instead of being forked, because
//! it changes shell state (working directory, environment, job table) or
//! reads it (history, job listing). Builtins only run as the sole stage of a
//! pipeline; anywhere else the name is looked up on `PATH` like any program.
//!
//! # Architecture
//!
//! ```text
//! BuiltinRegistry
//! ├── Environment   (cd, pwd, env, export, unset)
//! ├── Output        (echo, history)
//! ├── Job control   (jobs, fg, bg, kill)
//! └── Shell         (exit)
//! ```

mod builtin;
mod context;
mod registry;
mod traits;

pub use builtin::register_builtins;
pub use context::BuiltinContext;
pub use registry::BuiltinRegistry;
pub use traits::Builtin;
