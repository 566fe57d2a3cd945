//! Revision manifest: original name → revisioned name.
//!
//! Serialized as a flat, key-sorted JSON object:
//!
//! ```json
//! {
//!   "js/main.js": "js/main.1f0a3c9e2b.js",
//!   "styles/extra.css": "styles/extra.9d2e7b41c0.css"
//! }
//! ```

use super::RevError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// One processed asset, both names relative to the revision base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision {
    pub original: String,
    pub revisioned: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest(BTreeMap<String, String>);

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, revision: Revision) {
        self.0.insert(revision.original, revision.revisioned);
    }

    pub fn get(&self, original: &str) -> Option<&str> {
        self.0.get(original).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn load(path: &Path) -> Result<Self, RevError> {
        let content = fs::read_to_string(path).map_err(|e| RevError::io("read manifest", path, e))?;
        serde_json::from_str(&content).map_err(|source| RevError::Manifest {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), RevError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| RevError::io("create directory", parent, e))?;
        }
        let mut json = serde_json::to_string_pretty(self).map_err(|source| RevError::Manifest {
            path: path.to_path_buf(),
            source,
        })?;
        json.push('\n');
        fs::write(path, json).map_err(|e| RevError::io("write manifest", path, e))
    }
}

impl FromIterator<Revision> for Manifest {
    fn from_iter<I: IntoIterator<Item = Revision>>(iter: I) -> Self {
        let mut manifest = Self::new();
        for revision in iter {
            manifest.insert(revision);
        }
        manifest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn rev(original: &str, revisioned: &str) -> Revision {
        Revision {
            original: original.into(),
            revisioned: revisioned.into(),
        }
    }

    #[test]
    fn test_save_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/rev-manifest.json");
        let manifest: Manifest = [
            rev("styles/extra.css", "styles/extra.0123456789.css"),
            rev("js/main.js", "js/main.abcdef0123.js"),
        ]
        .into_iter()
        .collect();

        manifest.save(&path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        // keys are sorted
        assert!(text.find("js/main.js").unwrap() < text.find("styles/extra.css").unwrap());
        assert_eq!(Manifest::load(&path).unwrap(), manifest);
    }

    #[test]
    fn test_load_missing() {
        let dir = TempDir::new().unwrap();
        let err = Manifest::load(&dir.path().join("rev-manifest.json")).unwrap_err();
        assert!(matches!(err, RevError::Io { .. }));
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rev-manifest.json");
        fs::write(&path, "[1, 2]").unwrap();
        assert!(matches!(Manifest::load(&path), Err(RevError::Manifest { .. })));
    }
}
