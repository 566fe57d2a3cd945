//! `[styles]` section configuration.
//!
//! ```toml
//! [styles]
//! entries = ["sass/screen.scss", "sass/pdf.scss"]
//! command = ["sass", "$INPUT", "$OUTPUT"]
//! dev_args = ["--embed-source-map"]  # appended in development only
//! build_args = ["--no-source-map"]   # appended in production only
//! minify = true                       # lightningcss pass in production
//! ```
//!
//! Each entry compiles to `<web>/<css_dir>/<stem>.css`.

use crate::config::{ConfigDiagnostics, FieldPath};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StylesConfig {
    pub enable: bool,

    /// Stylesheet entry points, relative to the source root.
    pub entries: Vec<PathBuf>,

    /// Compiler command. `$INPUT` and `$OUTPUT` are substituted per entry.
    pub command: Vec<String>,

    /// Development-only arguments (source maps).
    pub dev_args: Vec<String>,

    /// Extra arguments for production builds.
    pub build_args: Vec<String>,

    /// Minify compiled CSS in production.
    pub minify: bool,
}

impl Default for StylesConfig {
    fn default() -> Self {
        Self {
            enable: true,
            entries: vec!["sass/screen.scss".into(), "sass/pdf.scss".into()],
            command: vec!["sass".into(), "$INPUT".into(), "$OUTPUT".into()],
            dev_args: vec!["--embed-source-map".into()],
            build_args: vec!["--no-source-map".into()],
            minify: true,
        }
    }
}

impl StylesConfig {
    pub const COMMAND: FieldPath = FieldPath::new("styles.command");
    pub const ENTRIES: FieldPath = FieldPath::new("styles.entries");

    /// Validate against the normalized (absolute) entry paths.
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if !self.enable {
            return;
        }
        super::validate_command(Self::COMMAND, &self.command, diag);

        for entry in &self.entries {
            if !entry.is_file() {
                diag.error(
                    Self::ENTRIES,
                    format!("stylesheet entry not found: {}", entry.display()),
                );
            }
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
        assert!(config.styles.enable);
        assert_eq!(
            config.styles.entries,
            vec![PathBuf::from("sass/screen.scss"), PathBuf::from("sass/pdf.scss")]
        );
        assert_eq!(config.styles.command[0], "sass");
        assert!(config.styles.minify);
    }

    #[test]
    fn test_custom_command() {
        let config = test_parse_config(
            r#"
[styles]
entries = ["src/scss/app.scss"]
command = ["npx", "sass", "$INPUT", "$OUTPUT"]
build_args = ["--style=compressed"]
minify = false
"#,
        );
        assert_eq!(config.styles.entries.len(), 1);
        assert_eq!(config.styles.command[1], "sass");
        assert_eq!(config.styles.build_args, vec!["--style=compressed"]);
        assert!(!config.styles.minify);
    }
}
