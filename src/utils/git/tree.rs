use anyhow::{Context, Result, anyhow};
use gix::{
    bstr::BString,
    objs::{Tree, tree},
};
use std::{fs, path::Path};

/// Builds git trees from the filesystem.
pub struct TreeBuilder<'a> {
    repo: &'a gix::Repository,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(repo: &'a gix::Repository) -> Self {
        Self { repo }
    }

    /// Build a git tree from a directory, writing blobs and subtrees.
    ///
    /// `.git` is skipped; everything else, dotfiles included, is committed.
    /// Empty directories produce no entry, as in git.
    pub fn build_from_dir(&self, dir: &Path) -> Result<Tree> {
        let mut entries = Vec::new();

        for entry in fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))? {
            let entry = entry?;
            let path = entry.path();
            let filename = filename(&entry)?;
            if filename == ".git" {
                continue;
            }

            if path.is_dir() {
                let sub_tree = self.build_from_dir(&path)?;
                if sub_tree.entries.is_empty() {
                    continue;
                }
                let oid = self.repo.write_object(&sub_tree)?.detach();
                entries.push(tree::Entry {
                    mode: tree::EntryKind::Tree.into(),
                    oid,
                    filename,
                });
            } else if path.is_file() {
                let contents = fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
                let oid = self.repo.write_blob(contents)?.detach();
                entries.push(tree::Entry {
                    mode: blob_kind(&path).into(),
                    oid,
                    filename,
                });
            }
        }

        sort_tree_entries(&mut entries);
        Ok(Tree { entries })
    }
}

fn filename(entry: &fs::DirEntry) -> Result<BString> {
    entry
        .file_name()
        .into_string()
        .map(Into::into)
        .map_err(|name| anyhow!("invalid UTF-8 in file name {name:?}"))
}

/// Keep the executable bit (the `craft` console script needs it).
#[cfg(unix)]
fn blob_kind(path: &Path) -> tree::EntryKind {
    use std::os::unix::fs::PermissionsExt;
    match fs::metadata(path) {
        Ok(meta) if meta.permissions().mode() & 0o111 != 0 => tree::EntryKind::BlobExecutable,
        _ => tree::EntryKind::Blob,
    }
}

#[cfg(not(unix))]
fn blob_kind(_path: &Path) -> tree::EntryKind {
    tree::EntryKind::Blob
}

/// Git orders tree entries by name, comparing directories as if they ended
/// with `/`: `foo-bar` < `foo.rs` < `foo/`.
fn sort_tree_entries(entries: &mut [tree::Entry]) {
    let tree_mode: tree::EntryMode = tree::EntryKind::Tree.into();
    entries.sort_by(|a, b| {
        let sort_key = |e: &tree::Entry| {
            let mut key = e.filename.to_vec();
            if e.mode == tree_mode {
                key.push(b'/');
            }
            key
        };
        sort_key(a).cmp(&sort_key(b))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use gix::objs::tree::{Entry, EntryKind};
    use tempfile::TempDir;

    fn null() -> gix::ObjectId {
        gix::ObjectId::null(gix::hash::Kind::Sha1)
    }

    #[test]
    fn test_sort_tree_entries() {
        let mut entries = vec![
            Entry { mode: EntryKind::Blob.into(), filename: "foo.rs".into(), oid: null() },
            Entry { mode: EntryKind::Tree.into(), filename: "foo".into(), oid: null() },
            Entry { mode: EntryKind::Blob.into(), filename: "foo-bar".into(), oid: null() },
        ];

        sort_tree_entries(&mut entries);

        assert_eq!(entries[0].filename, "foo-bar");
        assert_eq!(entries[1].filename, "foo.rs");
        assert_eq!(entries[2].filename, "foo");
    }

    #[test]
    fn test_build_from_dir_skips_git_and_empty_dirs() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let repo = gix::init(root).unwrap();
        fs::create_dir_all(root.join("web/js")).unwrap();
        fs::create_dir_all(root.join("storage")).unwrap();
        fs::write(root.join("web/js/main.0123456789.js"), "x").unwrap();
        fs::write(root.join(".htaccess"), "deny").unwrap();

        let tree = TreeBuilder::new(&repo).build_from_dir(root).unwrap();
        let names: Vec<_> = tree.entries.iter().map(|e| e.filename.to_string()).collect();
        assert_eq!(names, vec![".htaccess", "web"]);
    }
}
