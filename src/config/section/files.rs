//! `[files]` section configuration.
//!
//! Selects which project files are copied into the build directory.
//!
//! ```toml
//! [files]
//! layout = "legacy"            # legacy | current (env: CMS_MODE)
//! include = ["translations/**"]  # extra globs, relative to source root
//! exclude = ["web/uploads/**"]   # extra exclusions
//! ```

use crate::config::{ConfigDiagnostics, FieldPath};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// CMS project layout, selecting the copy list.
///
/// | Layout    | Ships                                                        |
/// |-----------|--------------------------------------------------------------|
/// | `legacy`  | `craft`, `vendor/`, `templates/`, `modules/`, `config/`, `web/` |
/// | `current` | `craft`, composer manifests, `config/`, `modules/`, `templates/`, `translations/`, `web/` (vendor installed on the server) |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    #[default]
    Legacy,
    Current,
}

impl Layout {
    /// Include globs for this layout.
    pub fn includes(self, web: &Path, templates: &Path) -> Vec<String> {
        let web = slash(web);
        let templates = slash(templates);
        let fixed: &[&str] = match self {
            Self::Legacy => &["craft", "vendor/**", "modules/**", "config/**"],
            Self::Current => &[
                "craft",
                "composer.json",
                "composer.lock",
                "config/**",
                "modules/**",
                "translations/**",
            ],
        };
        fixed
            .iter()
            .map(|s| s.to_string())
            .chain([format!("{templates}/**"), format!("{web}/**")])
            .collect()
    }

    /// Exclude globs for this layout.
    ///
    /// Compiled styles and scripts are excluded because the compile stages
    /// write them into the build directory directly.
    pub fn excludes(self, web: &Path, css_dir: &Path, js_dir: &Path) -> Vec<String> {
        let web = slash(web);
        let mut out = vec![
            format!("{web}/{}/**", slash(js_dir)),
            format!("{web}/{}/**", slash(css_dir)),
            format!("{web}/cpresources/**"),
            "**/*.map".to_string(),
            "**/*.swp".to_string(),
            "**/.DS_Store".to_string(),
        ];
        match self {
            Self::Legacy => out.push(format!("{web}/assets/**")),
            Self::Current => {
                out.push("vendor/**".to_string());
                out.push("storage/**".to_string());
            }
        }
        out
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Legacy => "legacy",
            Self::Current => "current",
        }
    }
}

impl FromStr for Layout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "legacy" => Ok(Self::Legacy),
            "current" => Ok(Self::Current),
            other => Err(format!("unknown layout `{other}`, expected `legacy` or `current`")),
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/").trim_matches('/').to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    pub layout: Layout,

    /// Additional include globs.
    pub include: Vec<String>,

    /// Additional exclude globs.
    pub exclude: Vec<String>,
}

impl FilesConfig {
    pub const INCLUDE: FieldPath = FieldPath::new("files.include");
    pub const EXCLUDE: FieldPath = FieldPath::new("files.exclude");

    /// Effective include globs (layout + extra).
    pub fn include_patterns(&self, web: &Path, templates: &Path) -> Vec<String> {
        let mut out = self.layout.includes(web, templates);
        out.extend(self.include.iter().cloned());
        out
    }

    /// Effective exclude globs (layout + extra).
    pub fn exclude_patterns(&self, web: &Path, css_dir: &Path, js_dir: &Path) -> Vec<String> {
        let mut out = self.layout.excludes(web, css_dir, js_dir);
        out.extend(self.exclude.iter().cloned());
        out
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        super::validate_patterns(Self::INCLUDE, &self.include, diag);
        super::validate_patterns(Self::EXCLUDE, &self.exclude, diag);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_layout_default_legacy() {
        let config = test_parse_config("");
        assert_eq!(config.files.layout, Layout::Legacy);
        assert!(config.files.include_patterns(Path::new("web"), Path::new("templates")).contains(&"vendor/**".to_string()));
    }

    #[test]
    fn test_layout_current() {
        let config = test_parse_config("[files]\nlayout = \"current\"");
        assert_eq!(config.files.layout, Layout::Current);
        assert!(!config.files.include_patterns(Path::new("web"), Path::new("templates")).contains(&"vendor/**".to_string()));

        let excludes = config
            .files
            .exclude_patterns(Path::new("web"), Path::new("styles"), Path::new("js"));
        assert!(excludes.contains(&"vendor/**".to_string()));
    }

    #[test]
    fn test_excludes_follow_dirs() {
        let excludes = Layout::Legacy.excludes(Path::new("web"), Path::new("css"), Path::new("dist/js"));
        assert!(excludes.contains(&"web/css/**".to_string()));
        assert!(excludes.contains(&"web/dist/js/**".to_string()));
        assert!(excludes.contains(&"web/assets/**".to_string()));
    }

    #[test]
    fn test_includes_follow_templates_dir() {
        let includes = Layout::Current.includes(Path::new("public"), Path::new("views"));
        assert!(includes.contains(&"views/**".to_string()));
        assert!(includes.contains(&"public/**".to_string()));
        assert!(!includes.contains(&"templates/**".to_string()));
    }

    #[test]
    fn test_layout_from_str() {
        assert_eq!("Legacy".parse::<Layout>().unwrap(), Layout::Legacy);
        assert_eq!(" current ".parse::<Layout>().unwrap(), Layout::Current);
        assert!("craft3".parse::<Layout>().is_err());
    }

    #[test]
    fn test_extra_patterns() {
        let config = test_parse_config("[files]\ninclude = [\"storage/rebrand/**\"]\nexclude = [\"web/uploads/**\"]");
        assert!(config.files.include_patterns(Path::new("web"), Path::new("templates")).contains(&"storage/rebrand/**".to_string()));
        let excludes = config
            .files
            .exclude_patterns(Path::new("web"), Path::new("styles"), Path::new("js"));
        assert_eq!(excludes.last().map(String::as_str), Some("web/uploads/**"));
    }
}
