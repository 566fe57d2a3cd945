//! `[scripts]` section configuration.
//!
//! ```toml
//! [scripts]
//! entry = "js/main.js"        # env: JS_ENTRY
//! command = ["npx", "esbuild", "$INPUT", "--bundle", "--outfile=$OUTPUT"]
//! build_args = []             # appended in production only
//! minify = true               # oxc pass in production
//! ```
//!
//! The bundle is written to `<web>/<js_dir>/<name>.js`, where `name` defaults
//! to the entry file stem.

use crate::config::{ConfigDiagnostics, FieldPath};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptsConfig {
    pub enable: bool,

    /// Bundle entry point, relative to the source root.
    pub entry: PathBuf,

    /// Output bundle name without extension (defaults to the entry stem).
    pub name: Option<String>,

    /// Bundler command. `$INPUT` and `$OUTPUT` are substituted.
    pub command: Vec<String>,

    /// Development-only arguments (source maps).
    pub dev_args: Vec<String>,

    /// Extra arguments for production builds.
    pub build_args: Vec<String>,

    /// Minify the bundle in production.
    pub minify: bool,
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            enable: true,
            entry: "js/main.js".into(),
            name: None,
            command: vec![
                "npx".into(),
                "esbuild".into(),
                "$INPUT".into(),
                "--bundle".into(),
                "--outfile=$OUTPUT".into(),
            ],
            dev_args: vec!["--sourcemap=inline".into()],
            build_args: Vec::new(),
            minify: true,
        }
    }
}

impl ScriptsConfig {
    pub const COMMAND: FieldPath = FieldPath::new("scripts.command");
    pub const ENTRY: FieldPath = FieldPath::new("scripts.entry");

    /// Output bundle name without extension.
    pub fn bundle_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| {
            self.entry
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "main".into())
        })
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if !self.enable {
            return;
        }
        super::validate_command(Self::COMMAND, &self.command, diag);

        if !self.entry.is_file() {
            diag.error(
                Self::ENTRY,
                format!("script entry not found: {}", self.entry.display()),
            );
        }
    }
}
