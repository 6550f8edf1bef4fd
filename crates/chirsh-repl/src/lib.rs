//! chirsh REPL — interactive front end for the chirsh kernel.
//!
//! Reads lines with rustyline, hands them to the [`Kernel`], and keeps a
//! persistent line history under the platform data directory.

pub mod prompt;

use std::path::PathBuf;

use anyhow::{Context, Result};
use rustyline::Editor;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;

use chirsh_kernel::{Kernel, KernelConfig};

/// REPL state: the kernel it drives.
pub struct Repl {
    kernel: Kernel,
}

impl Repl {
    /// Create a REPL with the interactive kernel configuration.
    pub fn new() -> Result<Self> {
        Self::with_config(KernelConfig::repl())
    }

    /// Create a REPL with a custom kernel configuration.
    pub fn with_config(config: KernelConfig) -> Result<Self> {
        let kernel = Kernel::new(config).context("Failed to create kernel")?;
        Ok(Self { kernel })
    }

    /// Run one line and return its status. Blank lines are skipped and
    /// return the previous status.
    pub fn process_line(&mut self, line: &str) -> i32 {
        if line.trim().is_empty() {
            return self.kernel.last_status();
        }
        self.kernel.execute(line)
    }

    /// Whether `exit` has run.
    pub fn should_exit(&self) -> bool {
        self.kernel.should_exit()
    }

    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    /// Stop the kernel's background work.
    pub fn shutdown(self) {
        self.kernel.shutdown();
    }
}

fn history_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.data_dir().join("chirsh").join("history.txt"))
}

fn save_history(rl: &mut Editor<(), DefaultHistory>, path: &Option<PathBuf>) {
    let Some(path) = path else {
        return;
    };
    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            tracing::warn!("Failed to create history directory: {}", e);
            return;
        }
    }
    if let Err(e) = rl.save_history(path) {
        tracing::warn!("Failed to save history: {}", e);
    }
}

/// Run the interactive REPL until `exit` or end of input. Returns the last
/// status.
pub fn run() -> Result<i32> {
    let mut rl: Editor<(), DefaultHistory> = Editor::new().context("Failed to create editor")?;

    let history_path = history_path();
    if let Some(ref path) = history_path {
        if let Err(e) = rl.load_history(path) {
            // Only log if it's not a "file not found" error (expected on first run)
            let is_not_found =
                matches!(&e, ReadlineError::Io(io_err) if io_err.kind() == std::io::ErrorKind::NotFound);
            if !is_not_found {
                tracing::warn!("Failed to load history: {}", e);
            }
        }
    }

    let mut repl = Repl::new()?;

    while !repl.should_exit() {
        match rl.readline(&prompt::build_prompt()) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    if let Err(e) = rl.add_history_entry(line.as_str()) {
                        tracing::warn!("Failed to add history entry: {}", e);
                    }
                }
                repl.process_line(&line);
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!();
                break;
            }
            Err(err) => {
                eprintln!("Error: {}", err);
                break;
            }
        }
    }

    save_history(&mut rl, &history_path);
    let status = repl.kernel().last_status();
    repl.shutdown();
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repl() -> Repl {
        Repl::with_config(KernelConfig::default()).unwrap()
    }

    #[test]
    fn test_process_line_runs_commands() {
        let mut repl = repl();
        assert_eq!(repl.process_line("true"), 0);
        assert_eq!(repl.process_line("false"), 1);
        repl.shutdown();
    }

    #[test]
    fn test_blank_line_keeps_status() {
        let mut repl = repl();
        repl.process_line("false");
        assert_eq!(repl.process_line("   "), 1);
        assert_eq!(repl.kernel().history().len(), 1);
    }

    #[test]
    fn test_exit_stops_loop() {
        let mut repl = repl();
        assert!(!repl.should_exit());
        repl.process_line("exit");
        assert!(repl.should_exit());
    }
}
