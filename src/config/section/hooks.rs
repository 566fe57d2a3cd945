//! `[hooks]` configuration.
//!
//! # Example
//!
//! ```toml
//! # Run before the stage graph
//! [[hooks.pre]]
//! command = ["./scripts/gen-icons.sh"]
//!
//! # Run after every stage succeeded
//! [[hooks.post]]
//! name = "imagemin"
//! command = ["npx", "imagemin", "$REVLINE_BUILD_DIR/web/images", "--out-dir", "$REVLINE_BUILD_DIR/web/images"]
//! build_args = ["--plugin=mozjpeg"]
//! ```

use crate::config::{ConfigDiagnostics, FieldPath};
use serde::{Deserialize, Serialize};

/// Pre and post pipeline hooks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HooksConfig {
    pub pre: Vec<HookConfig>,
    pub post: Vec<HookConfig>,
}

impl HooksConfig {
    pub const PRE: FieldPath = FieldPath::new("hooks.pre");
    pub const POST: FieldPath = FieldPath::new("hooks.post");

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        for hook in self.pre.iter().filter(|h| h.enable) {
            super::validate_command(Self::PRE, &hook.command, diag);
        }
        for hook in self.post.iter().filter(|h| h.enable) {
            super::validate_command(Self::POST, &hook.command, diag);
        }
    }
}

/// A single hook command.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HookConfig {
    pub enable: bool,

    /// Display name for logging (defaults to command[0]).
    pub name: Option<String>,

    /// Command and arguments. `$REVLINE_*` variables are substituted.
    pub command: Vec<String>,

    /// Appended only in production mode.
    pub build_args: Vec<String>,

    /// Suppress output.
    pub quiet: bool,
}

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            enable: true,
            name: None,
            command: Vec::new(),
            build_args: Vec::new(),
            quiet: true,
        }
    }
}

impl HookConfig {
    /// `name` if set, otherwise `command[0]`.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .unwrap_or_else(|| self.command.first().map(String::as_str).unwrap_or("hook"))
    }
}
