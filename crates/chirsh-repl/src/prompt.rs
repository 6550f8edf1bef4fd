//! Prompt rendering: `user@host:cwd$ ` in colour.

use nix::unistd::{User, gethostname, getuid};

const GREEN: &str = "\x1b[32m";
const BLUE: &str = "\x1b[34m";
const YELLOW: &str = "\x1b[33m";
const RESET: &str = "\x1b[0m";

fn current_user() -> String {
    if let Ok(user) = std::env::var("USER") {
        return user;
    }
    match User::from_uid(getuid()) {
        Ok(Some(user)) => user.name,
        _ => "unknown".to_string(),
    }
}

fn current_host() -> String {
    gethostname()
        .map(|host| host.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "host".to_string())
}

fn current_dir() -> String {
    std::env::current_dir()
        .map(|dir| dir.display().to_string())
        .unwrap_or_else(|_| "?".to_string())
}

/// Render the prompt for the current user, host, and directory.
pub fn build_prompt() -> String {
    render(&current_user(), &current_host(), &current_dir())
}

fn render(user: &str, host: &str, dir: &str) -> String {
    format!("{GREEN}{user}{RESET}@{BLUE}{host}{RESET}:{YELLOW}{dir}{RESET}$ ")
}
