//! `[build]` section configuration.
//!
//! ```toml
//! [build]
//! source = "."              # Project root holding sass/, js/, templates/, web/
//! output = "dist"           # Build output directory (env: BUILD_DIR)
//! web = "web"               # Public web root inside source and output
//! css_dir = "styles"        # Stylesheet directory under web (env: CSS_DIR)
//! js_dir = "js"             # Script directory under web (env: JS_DIR)
//! templates = "templates"   # Template directory (env: TEMPLATES_DIR)
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Source root (env: SOURCE_ROOT).
    pub source: PathBuf,

    /// Build output directory.
    pub output: PathBuf,

    /// Public web root, relative to both source and output.
    pub web: PathBuf,

    /// Stylesheet output directory, relative to `web`.
    pub css_dir: PathBuf,

    /// Script output directory, relative to `web`.
    pub js_dir: PathBuf,

    /// Template directory, relative to source and output.
    pub templates: PathBuf,

    /// Empty the output directory before building (CLI only).
    #[serde(skip)]
    pub clean: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            source: ".".into(),
            output: "dist".into(),
            web: "web".into(),
            css_dir: "styles".into(),
            js_dir: "js".into(),
            templates: "templates".into(),
            clean: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::test_parse_config;
    use std::path::PathBuf;

    #[test]
    fn test_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.build.output, PathBuf::from("dist"));
        assert_eq!(config.build.web, PathBuf::from("web"));
        assert_eq!(config.build.css_dir, PathBuf::from("styles"));
        assert_eq!(config.build.js_dir, PathBuf::from("js"));
        assert_eq!(config.build.templates, PathBuf::from("templates"));
    }

    #[test]
    fn test_custom_dirs() {
        let config = test_parse_config("[build]\noutput = \"public\"\ncss_dir = \"css\"");
        assert_eq!(config.build.output, PathBuf::from("public"));
        assert_eq!(config.build.css_dir, PathBuf::from("css"));
    }
}
