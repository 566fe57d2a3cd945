//! Content-hash revisioning of built assets.
//!
//! Every file matched under the revision base is renamed to
//! `stem.<fingerprint>.ext` and recorded in a [`Manifest`].

use super::{Manifest, RevError, Revision};
use crate::utils::glob::FileSet;
use crate::utils::hash::{fingerprint_file, is_fingerprint};
use crate::utils::path::to_slash;
use rayon::prelude::*;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Revision every file under `base` matching `patterns`.
///
/// Files that already carry a fingerprint are skipped, so a second run over
/// the same tree yields an empty manifest rather than double hashes. No
/// matches is not an error.
pub fn assign_revisions<S: AsRef<str>>(base: &Path, patterns: &[S]) -> Result<Manifest, RevError> {
    let set = FileSet::new(patterns, &[])?;
    let files: Vec<_> = set
        .collect(base, false)?
        .into_iter()
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| !is_revisioned(n))
        })
        .collect();

    let revisions = files
        .par_iter()
        .map(|path| revision_file(base, path))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(revisions.into_iter().collect())
}

fn revision_file(base: &Path, path: &Path) -> Result<Revision, RevError> {
    let hash = fingerprint_file(path).map_err(|e| RevError::io("read", path, e))?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let target = path.with_file_name(revisioned_name(&name, &hash));

    fs::rename(path, &target).map_err(|e| RevError::io("rename", path, e))?;

    let revision = Revision {
        original: to_slash(path, base),
        revisioned: to_slash(&target, base),
    };
    crate::debug!("revision"; "{} -> {}", revision.original, revision.revisioned);
    Ok(revision)
}

/// Delete files named in `previous` that `current` no longer points to.
///
/// Keeps the build tree from accumulating old revisions when it is not
/// cleaned between runs. Returns the number of files removed. A previous
/// entry that points outside `base` is an error and nothing is deleted.
pub fn prune_stale(base: &Path, previous: &Manifest, current: &Manifest) -> Result<usize, RevError> {
    let stale = previous
        .iter()
        .filter(|(original, old)| current.get(original) != Some(*old))
        .map(|(original, old)| {
            entry_path(base, old).ok_or_else(|| RevError::UnsafeEntry {
                original: original.to_string(),
                revisioned: old.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut removed = 0;
    for path in stale {
        match fs::remove_file(&path) {
            Ok(()) => removed += 1,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(RevError::io("delete", path, e)),
        }
    }
    Ok(removed)
}

/// Keep entries of `previous` that this run did not produce but whose
/// revisioned file is still on disk.
///
/// Re-running the stage over an uncleaned tree finds nothing new to hash;
/// without this the manifest would lose every earlier entry. Returns the
/// number of entries carried over.
pub fn carry_over(base: &Path, previous: &Manifest, current: &mut Manifest) -> usize {
    let kept: Vec<Revision> = previous
        .iter()
        .filter(|(original, revisioned)| {
            current.get(original).is_none()
                && entry_path(base, revisioned).is_some_and(|path| path.is_file())
        })
        .map(|(original, revisioned)| Revision {
            original: original.to_string(),
            revisioned: revisioned.to_string(),
        })
        .collect();
    let count = kept.len();
    for revision in kept {
        current.insert(revision);
    }
    count
}

/// `base.join(rel)` when `rel` is a plain relative path with no `..`, root
/// or prefix components.
fn entry_path(base: &Path, rel: &str) -> Option<PathBuf> {
    let rel = Path::new(rel);
    let mut components = rel.components().peekable();
    let plain = components.peek().is_some() && components.all(|c| matches!(c, Component::Normal(_)));
    plain.then(|| base.join(rel))
}

/// Insert `hash` before the last extension.
///
/// `main.js` → `main.<hash>.js`, `app.min.js` → `app.min.<hash>.js`,
/// `LICENSE` → `LICENSE.<hash>`.
pub fn revisioned_name(file_name: &str, hash: &str) -> String {
    match file_name.rfind('.') {
        Some(idx) if idx > 0 => format!("{}.{hash}{}", &file_name[..idx], &file_name[idx..]),
        _ => format!("{file_name}.{hash}"),
    }
}

/// Whether a file name already carries a fingerprint segment.
pub fn is_revisioned(file_name: &str) -> bool {
    let segments: Vec<&str> = file_name.split('.').collect();
    match segments.as_slice() {
        [stem, .., hash, _ext] if !stem.is_empty() && is_fingerprint(hash) => true,
        [stem, hash] if !stem.is_empty() && is_fingerprint(hash) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::hash::fingerprint;
    use tempfile::TempDir;

    #[test]
    fn test_revisioned_name() {
        assert_eq!(revisioned_name("main.js", "0123456789"), "main.0123456789.js");
        assert_eq!(revisioned_name("app.min.js", "0123456789"), "app.min.0123456789.js");
        assert_eq!(revisioned_name("LICENSE", "0123456789"), "LICENSE.0123456789");
        assert_eq!(revisioned_name(".htaccess", "0123456789"), ".htaccess.0123456789");
    }

    #[test]
    fn test_is_revisioned() {
        assert!(is_revisioned("main.0123456789.js"));
        assert!(is_revisioned("app.min.0123456789.js"));
        assert!(is_revisioned("LICENSE.0123456789"));
        assert!(!is_revisioned("main.js"));
        assert!(!is_revisioned("app.min.js"));
        assert!(!is_revisioned("main.0123.js"));
    }

    #[test]
    fn test_carry_over() {
        let dir = TempDir::new().unwrap();
        let base = dir.path();
        fs::write(base.join("main.0123456789.js"), "X").unwrap();

        let previous: Manifest = [
            Revision {
                original: "main.js".into(),
                revisioned: "main.0123456789.js".into(),
            },
            Revision {
                original: "gone.js".into(),
                revisioned: "gone.abcdef0123.js".into(),
            },
        ]
        .into_iter()
        .collect();

        let mut current = Manifest::new();
        assert_eq!(carry_over(base, &previous, &mut current), 1);
        assert_eq!(current.get("main.js"), Some("main.0123456789.js"));
        assert_eq!(current.get("gone.js"), None);
        assert_eq!(prune_stale(base, &previous, &current).unwrap(), 0);
        assert!(base.join("main.0123456789.js").is_file());
    }

    #[test]
    fn test_assign_revisions_renames() {
        let dir = TempDir::new().unwrap();
        let base = dir.path();
        fs::create_dir_all(base.join("js")).unwrap();
        fs::write(base.join("js/main.js"), "X").unwrap();
        fs::write(base.join("js/vendor.js"), "Y").unwrap();

        let manifest = assign_revisions(base, &["**/main.js"]).unwrap();
        let expected = format!("js/main.{}.js", fingerprint("X"));

        assert_eq!(manifest.len(), 1);
        assert_eq!(manifest.get("js/main.js"), Some(expected.as_str()));
        assert!(base.join(&expected).is_file());
        assert!(!base.join("js/main.js").exists());
        assert!(base.join("js/vendor.js").is_file());
    }

    #[test]
    fn test_assign_revisions_skips_revisioned() {
        let dir = TempDir::new().unwrap();
        let base = dir.path();
        fs::write(base.join("main.js"), "X").unwrap();

        let first = assign_revisions(base, &["**/*.js"]).unwrap();
        assert_eq!(first.len(), 1);
        let second = assign_revisions(base, &["**/*.js"]).unwrap();
        assert!(second.is_empty());
    }

    #[test]
    fn test_assign_revisions_no_match() {
        let dir = TempDir::new().unwrap();
        let manifest = assign_revisions(dir.path(), &["**/extra.css"]).unwrap();
        assert!(manifest.is_empty());
    }

    #[test]
    fn test_assign_revisions_bad_pattern() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            assign_revisions(dir.path(), &["**/[a-"]),
            Err(RevError::Glob(_))
        ));
    }

    #[test]
    fn test_prune_stale() {
        let dir = TempDir::new().unwrap();
        let base = dir.path();
        fs::write(base.join("main.aaaaaaaaaa.js"), "old").unwrap();
        fs::write(base.join("main.bbbbbbbbbb.js"), "new").unwrap();

        let previous: Manifest = [Revision {
            original: "main.js".into(),
            revisioned: "main.aaaaaaaaaa.js".into(),
        }]
        .into_iter()
        .collect();
        let current: Manifest = [Revision {
            original: "main.js".into(),
            revisioned: "main.bbbbbbbbbb.js".into(),
        }]
        .into_iter()
        .collect();

        assert_eq!(prune_stale(base, &previous, &current).unwrap(), 1);
        assert!(!base.join("main.aaaaaaaaaa.js").exists());
        assert!(base.join("main.bbbbbbbbbb.js").exists());
        assert_eq!(prune_stale(base, &current, &current).unwrap(), 0);
    }

    #[test]
    fn test_entry_outside_base_rejected() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("dist/web");
        fs::create_dir_all(&base).unwrap();
        let victim = dir.path().join("victim.txt");
        fs::write(&victim, "keep").unwrap();

        let previous: Manifest = [Revision {
            original: "x.js".into(),
            revisioned: "../../victim.txt".into(),
        }]
        .into_iter()
        .collect();

        let mut current = Manifest::new();
        assert_eq!(carry_over(&base, &previous, &mut current), 0);
        assert!(matches!(
            prune_stale(&base, &previous, &current),
            Err(RevError::UnsafeEntry { .. })
        ));
        assert!(victim.is_file());
    }

    #[test]
    fn test_entry_path() {
        let base = Path::new("/build");
        assert_eq!(entry_path(base, "js/main.0123456789.js"), Some(base.join("js/main.0123456789.js")));
        assert_eq!(entry_path(base, "/etc/passwd"), None);
        assert_eq!(entry_path(base, "js/../../x"), None);
        assert_eq!(entry_path(base, ""), None);
    }
}
