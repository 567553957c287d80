use std::process::Command;

/// Stamp the short commit hash into `AUTOPLAN_BUILD_SHA` for `autoplan --version`.
///
/// Release packaging can pin the value by exporting `AUTOPLAN_BUILD_SHA`
/// itself; outside a git checkout it falls back to "unknown".
fn main() {
    println!("cargo:rerun-if-env-changed=AUTOPLAN_BUILD_SHA");

    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    let workspace_root = format!("{manifest_dir}/..");
    println!("cargo:rerun-if-changed={workspace_root}/.git/HEAD");

    let sha = std::env::var("AUTOPLAN_BUILD_SHA")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .or_else(|| git_short_sha(&workspace_root))
        .unwrap_or_else(|| "unknown".to_string());

    println!("cargo:rustc-env=AUTOPLAN_BUILD_SHA={sha}");
}

fn git_short_sha(root: &str) -> Option<String> {
    let out = Command::new("git")
        .args(["-C", root, "rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;
    if !out.status.success() {
        return None;
    }
    let sha = String::from_utf8_lossy(&out.stdout).trim().to_string();
    (!sha.is_empty()).then_some(sha)
}
