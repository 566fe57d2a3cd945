//! Glob-based file selection.
//!
//! Patterns are matched against `/`-separated paths relative to a base
//! directory. `*` stays inside one path component, `**` crosses directories,
//! and dotfiles are matched like any other file.
//!
//! ```ignore
//! let set = FileSet::new(&["web/**", "craft"], &["web/js/**", "**/*.map"])?;
//! for file in set.collect(&source_root, true)? { ... }
//! ```

use crate::utils::path::to_slash;
use glob::{MatchOptions, Pattern, PatternError};
use jwalk::WalkDir;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

const OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

#[derive(Debug, Error)]
#[error("invalid glob `{pattern}`: {source}")]
pub struct InvalidGlob {
    pub pattern: String,
    #[source]
    pub source: PatternError,
}

/// A directory entry under an included root could not be read.
#[derive(Debug, Error)]
#[error("failed to walk `{}`", path.display())]
pub struct WalkError {
    pub path: PathBuf,
    #[source]
    pub source: jwalk::Error,
}

/// Compiled include/exclude pattern set.
#[derive(Debug, Clone)]
pub struct FileSet {
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

impl FileSet {
    /// Compile patterns. Includes prefixed with `!` count as excludes.
    pub fn new<S: AsRef<str>>(include: &[S], exclude: &[S]) -> Result<Self, InvalidGlob> {
        let mut set = Self {
            include: Vec::with_capacity(include.len()),
            exclude: Vec::with_capacity(exclude.len()),
        };
        for raw in include {
            let raw = raw.as_ref();
            match raw.strip_prefix('!') {
                Some(negated) => set.exclude.push(compile(negated)?),
                None => set.include.push(compile(raw)?),
            }
        }
        for raw in exclude {
            set.exclude.push(compile(raw.as_ref().trim_start_matches('!'))?);
        }
        Ok(set)
    }

    /// Test a `/`-separated relative path.
    pub fn matches(&self, rel: &str) -> bool {
        self.include.iter().any(|p| p.matches_with(rel, OPTIONS)) && !self.excludes(rel)
    }

    /// All matching files under `base`, sorted and deduplicated.
    ///
    /// Only the literal directory prefix of each include pattern is walked.
    /// Missing roots are skipped. Any other walk failure is an error unless
    /// its path is excluded.
    pub fn collect(&self, base: &Path, follow_links: bool) -> Result<Vec<PathBuf>, WalkError> {
        let mut roots: BTreeSet<PathBuf> = self
            .include
            .iter()
            .map(|p| base.join(literal_prefix(p.as_str())))
            .collect();
        // Drop roots nested inside another root
        let snapshot: Vec<_> = roots.iter().cloned().collect();
        roots.retain(|r| !snapshot.iter().any(|o| o != r && r.starts_with(o)));

        let mut out = BTreeSet::new();
        for root in roots {
            if root.symlink_metadata().is_err() {
                continue;
            }
            if root.is_file() {
                if self.matches(&to_slash(&root, base)) {
                    out.insert(root);
                }
                continue;
            }
            let walk = WalkDir::new(&root).follow_links(follow_links).skip_hidden(false);
            for entry in walk {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(source) => {
                        let path = source.path().map_or_else(|| root.clone(), Path::to_path_buf);
                        if self.excludes(&to_slash(&path, base)) {
                            continue;
                        }
                        return Err(WalkError { path, source });
                    }
                };
                if !entry.file_type().is_file() {
                    continue;
                }
                let path = entry.path();
                if self.matches(&to_slash(&path, base)) {
                    out.insert(path);
                }
            }
        }
        Ok(out.into_iter().collect())
    }

    fn excludes(&self, rel: &str) -> bool {
        self.exclude.iter().any(|p| p.matches_with(rel, OPTIONS))
    }
}

fn compile(raw: &str) -> Result<Pattern, InvalidGlob> {
    Pattern::new(raw).map_err(|source| InvalidGlob {
        pattern: raw.to_string(),
        source,
    })
}

/// Leading path components that contain no glob metacharacters.
fn literal_prefix(pattern: &str) -> &str {
    let mut end = 0;
    for (idx, component) in pattern.split('/').enumerate() {
        if component.contains(['*', '?', '[']) {
            break;
        }
        end = if idx == 0 {
            component.len()
        } else {
            end + 1 + component.len()
        };
    }
    &pattern[..end]
}
