//! Empty the build directory.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Remove everything inside `dir` except entries whose name starts with
/// `.git`, so a deploy repository survives between builds.
///
/// Creates `dir` if missing. Returns the number of top-level entries removed.
pub fn clean_build_dir(dir: &Path) -> Result<usize> {
    if !dir.exists() {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create build directory {}", dir.display()))?;
        return Ok(0);
    }

    let mut removed = 0;
    for entry in fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))? {
        let entry = entry?;
        if entry.file_name().to_string_lossy().starts_with(".git") {
            continue;
        }
        let path = entry.path();
        let result = if entry.file_type()?.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        result.with_context(|| format!("failed to remove {}", path.display()))?;
        removed += 1;
    }

    crate::debug!("clean"; "removed {} entries from {}", removed, dir.display());
    Ok(removed)
}
