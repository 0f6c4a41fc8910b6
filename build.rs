//! Captures a commit hash and build timestamp at compile time, following
//! the example pack's CLI-adjacent crates' convention of a `build.rs`
//! writing env vars the crate reads back through `env!`.

use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn main() {
    let commit_hash = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    println!("cargo:rustc-env=SUSHI_COMMIT_HASH={commit_hash}");

    let build_date = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string());
    println!("cargo:rustc-env=SUSHI_BUILD_DATE={build_date}");

    println!("cargo:rerun-if-changed=.git/HEAD");
}
