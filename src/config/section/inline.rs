//! `[inline]` section configuration.
//!
//! ```toml
//! [inline]
//! marker = "process"       # <!-- process:css inline path --> ... <!-- /process -->
//! base = "web/styles"      # relative to build dir (default: <web>/<css_dir>)
//! ```

use crate::config::{ConfigDiagnostics, FieldPath};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InlineConfig {
    pub enable: bool,

    /// Marker word used in `<!-- word:type inline path -->` comments.
    pub marker: String,

    /// Directory (inside the build dir) that marker paths resolve against.
    /// Defaults to the compiled stylesheet directory.
    pub base: Option<PathBuf>,

    /// Template globs to process. Falls back to `rev.templates` when unset.
    pub templates: Option<Vec<String>>,
}

impl Default for InlineConfig {
    fn default() -> Self {
        Self {
            enable: true,
            marker: "process".into(),
            base: None,
            templates: None,
        }
    }
}

impl InlineConfig {
    pub const MARKER: FieldPath = FieldPath::new("inline.marker");
    pub const TEMPLATES: FieldPath = FieldPath::new("inline.templates");

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if !self.enable {
            return;
        }
        let valid = !self.marker.is_empty()
            && self
                .marker
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            diag.error_with_hint(
                Self::MARKER,
                format!("invalid marker `{}`", self.marker),
                "use letters, digits, `-` or `_`",
            );
        }
        if let Some(templates) = &self.templates {
            super::validate_patterns(Self::TEMPLATES, templates, diag);
        }
    }
}
