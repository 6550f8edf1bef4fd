//! Pure data types for chirsh — pipelines, jobs, exit statuses, notices.
//!
//! This crate is a leaf dependency with no OS calls and no threads. The
//! tokenizer produces these types, the kernel consumes them, and the REPL
//! renders them.

pub mod job;
pub mod pipeline;
pub mod result;

pub use job::*;
pub use pipeline::*;
pub use result::*;
