use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// `~/.autoplan`, or `$AUTOPLAN_HOME` when set.
pub fn autoplan_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("AUTOPLAN_HOME") {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".autoplan"))
}

pub fn ensure_autoplan_home() -> Result<PathBuf> {
    let dir = autoplan_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

/// Write through a sibling temp file so a crash never leaves half a snapshot.
pub async fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let tmp = path.with_extension("tmp");
    tokio::fs::write(&tmp, contents)
        .await
        .with_context(|| format!("write {}", tmp.display()))?;
    tokio::fs::rename(&tmp, path)
        .await
        .with_context(|| format!("replace {}", path.display()))?;
    Ok(())
}
