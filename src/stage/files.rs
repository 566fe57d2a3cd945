//! Copy the deployable file set into the build directory.

use crate::config::PipelineConfig;
use crate::logger::plural_count;
use crate::utils::glob::FileSet;
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::fs;
use std::path::Path;

/// Copy the layout's include globs, minus its exclude globs, from the source
/// root into the build directory. Symlinks are followed and dotfiles are
/// included. Returns the number of files copied.
pub fn copy_files(config: &PipelineConfig) -> Result<usize> {
    let build = &config.build;
    let include = config.files.include_patterns(&build.web, &build.templates);
    let exclude = config
        .files
        .exclude_patterns(&build.web, &build.css_dir, &build.js_dir);
    let set = FileSet::new(&include, &exclude)?;

    let source = config.source_dir();
    let dest = config.build_dir();
    let files: Vec<_> = set
        .collect(source, true)?
        .into_iter()
        .filter(|p| !p.starts_with(dest))
        .collect();

    files
        .par_iter()
        .try_for_each(|path| copy_one(source, dest, path))?;

    crate::log!("files"; "{} copied ({} layout)", plural_count(files.len(), "file"), config.files.layout);
    Ok(files.len())
}

fn copy_one(source: &Path, dest: &Path, path: &Path) -> Result<()> {
    let rel = path.strip_prefix(source).unwrap_or(path);
    let target = dest.join(rel);
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::copy(path, &target)
        .with_context(|| format!("failed to copy {} to {}", path.display(), target.display()))?;
    Ok(())
}
