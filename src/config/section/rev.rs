//! `[rev]` section configuration.
//!
//! ```toml
//! [rev]
//! base = "web"                       # relative to build dir
//! patterns = ["**/main.js", "**/extra.css"]
//! manifest = "rev-manifest.json"     # relative to project root
//! templates = ["**/_layout*.html"]   # relative to <build>/<build.templates>
//! ```

use crate::config::{ConfigDiagnostics, FieldPath};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevConfig {
    /// Set false to ship unrevisioned assets.
    pub enable: bool,

    /// Directory (inside the build dir) that manifest keys are relative to.
    pub base: PathBuf,

    /// Asset globs to revision, relative to `base`.
    pub patterns: Vec<String>,

    /// Manifest output path.
    pub manifest: PathBuf,

    /// Template globs to rewrite, relative to the build template directory.
    pub templates: Vec<String>,
}

impl Default for RevConfig {
    fn default() -> Self {
        Self {
            enable: true,
            base: "web".into(),
            patterns: vec!["**/main.js".into(), "**/extra.css".into()],
            manifest: "rev-manifest.json".into(),
            templates: vec!["**/_layout*.html".into()],
        }
    }
}

impl RevConfig {
    pub const PATTERNS: FieldPath = FieldPath::new("rev.patterns");
    pub const TEMPLATES: FieldPath = FieldPath::new("rev.templates");

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if !self.enable {
            return;
        }
        if self.patterns.is_empty() {
            diag.warn(Self::PATTERNS, "no asset patterns, nothing will be revisioned");
        }
        super::validate_patterns(Self::PATTERNS, &self.patterns, diag);
        super::validate_patterns(Self::TEMPLATES, &self.templates, diag);
    }
}
