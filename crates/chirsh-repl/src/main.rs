//! chirsh CLI entry point.
//!
//! Usage:
//!   chirsh                      # Interactive REPL
//!   chirsh -c <command>         # Execute command and exit

use std::env;
use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use chirsh_kernel::{Kernel, KernelConfig};

fn main() -> ExitCode {
    // Initialize tracing (respects RUST_LOG env var). Stderr keeps job
    // output on stdout clean.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::FAILURE
        }
    }
}

fn exit_code(status: i32) -> ExitCode {
    ExitCode::from(u8::try_from(status).unwrap_or(1))
}

fn run() -> Result<ExitCode> {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(|s| s.as_str()) {
        None => {
            let status = chirsh_repl::run()?;
            Ok(exit_code(status))
        }

        Some("--help" | "-h") => {
            print_help();
            Ok(ExitCode::SUCCESS)
        }

        Some("--version" | "-V") => {
            println!(
                "chirsh {} ({} {})",
                env!("CARGO_PKG_VERSION"),
                env!("CHIRSH_GIT_HASH"),
                env!("CHIRSH_BUILD_DATE")
            );
            Ok(ExitCode::SUCCESS)
        }

        Some("-c") => {
            let cmd = args.get(2).context("-c requires a command argument")?;
            run_command(cmd)
        }

        Some(unknown) => {
            eprintln!("Unknown option: {unknown}");
            eprintln!("Run 'chirsh --help' for usage.");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn print_help() {
    println!(
        r#"chirsh v{}

Usage:
  chirsh                       Interactive REPL
  chirsh -c <command>          Execute command and exit

Options:
  -c <command>                 Execute command string and exit
  -h, --help                   Show this help
  -V, --version                Show version

Examples:
  chirsh                       # Start interactive REPL
  chirsh -c 'ls | wc -l'       # Run a pipeline
"#,
        env!("CARGO_PKG_VERSION")
    );
}

/// Run one line non-interactively; the exit code is its status.
fn run_command(cmd: &str) -> Result<ExitCode> {
    let mut kernel = Kernel::new(KernelConfig::command()).context("Failed to create kernel")?;
    let status = kernel.execute(cmd);
    kernel.shutdown();
    Ok(exit_code(status))
}
