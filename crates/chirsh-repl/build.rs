//! Stamps `--version` with the source revision and build date.
//!
//! `SOURCE_DATE_EPOCH` pins the date for reproducible builds; otherwise the
//! current UTC date is used. Outside a git checkout the revision is
//! `unknown`.

use std::env;
use std::process::Command;

use chrono::{DateTime, Utc};

fn revision() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--always", "--dirty", "--abbrev=8"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let revision = String::from_utf8(output.stdout).ok()?;
    let revision = revision.trim();
    (!revision.is_empty()).then(|| revision.to_string())
}

fn build_date() -> String {
    let pinned = env::var("SOURCE_DATE_EPOCH")
        .ok()
        .and_then(|secs| secs.trim().parse::<i64>().ok())
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0));
    pinned.unwrap_or_else(Utc::now).format("%Y-%m-%d").to_string()
}

fn main() {
    println!("cargo::rerun-if-env-changed=SOURCE_DATE_EPOCH");
    let head = concat!(env!("CARGO_MANIFEST_DIR"), "/../../.git/HEAD");
    if std::path::Path::new(head).exists() {
        println!("cargo::rerun-if-changed={head}");
    }

    let revision = revision().unwrap_or_else(|| "unknown".to_string());
    println!("cargo::rustc-env=CHIRSH_GIT_HASH={revision}");
    println!("cargo::rustc-env=CHIRSH_BUILD_DATE={}", build_date());
}
