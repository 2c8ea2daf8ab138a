use std::path::{Path, PathBuf};
use std::process::Command;

/// Short commit of the workspace checkout, or `None` outside git.
fn git_sha(workspace: &Path) -> Option<String> {
    let out = Command::new("git")
        .arg("-C")
        .arg(workspace)
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;
    if !out.status.success() {
        return None;
    }
    let sha = String::from_utf8_lossy(&out.stdout).trim().to_string();
    (!sha.is_empty()).then_some(sha)
}

fn main() {
    let crate_dir = PathBuf::from(std::env::var_os("CARGO_MANIFEST_DIR").unwrap_or_else(|| ".".into()));
    let workspace = crate_dir.join("..");

    let sha = git_sha(&workspace).unwrap_or_else(|| "unknown".to_string());
    println!("cargo:rustc-env=DAYGRID_BUILD_SHA={sha}");
}
