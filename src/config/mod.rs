//! Pipeline configuration management for `revline.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! ├── types/         # ConfigError, diagnostics, field paths
//! ├── env.rs         # Environment snapshot (.env + process)
//! ├── util.rs        # Config file discovery
//! └── mod.rs         # PipelineConfig (this file)
//! ```
//!
//! # Load order
//!
//! 1. `revline.toml` (found by walking up from cwd), or defaults when absent
//! 2. environment overrides (`BUILD_DIR`, `CSS_DIR`, ... see [`env`])
//! 3. CLI overrides
//! 4. path normalization against the project root
//!
//! The result is immutable and passed around as `&PipelineConfig`.

pub mod env;
pub mod section;
pub mod types;
mod util;

use util::find_config_file;

pub use env::Environment;
pub use section::{
    BuildConfig, DeployConfig, DeployProvider, FilesConfig, HookConfig, HooksConfig,
    InlineConfig, Layout, RevConfig, ScriptsConfig, StylesConfig,
};
pub use types::{ConfigDiagnostics, ConfigError, FieldPath};

use crate::cli::{Cli, Commands};
use crate::core::BuildMode;
use crate::log;
use crate::utils::path::{join_root, normalize_path};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing revline.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Absolute path to the config file (may not exist)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory
    #[serde(skip)]
    pub root: PathBuf,

    /// Production or development (NODE_ENV / --dev)
    #[serde(skip)]
    pub mode: BuildMode,

    pub build: BuildConfig,
    pub styles: StylesConfig,
    pub scripts: ScriptsConfig,
    pub files: FilesConfig,
    pub rev: RevConfig,
    pub inline: InlineConfig,
    pub deploy: DeployConfig,
    pub hooks: HooksConfig,
}

impl PipelineConfig {
    /// Load configuration from CLI arguments.
    ///
    /// A missing config file is not an error: defaults apply and the
    /// current directory becomes the project root.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let (mut config, config_path) = match find_config_file(&cli.config) {
            Some(path) => (Self::from_path(&path)?, path),
            None => {
                crate::debug!("config"; "{} not found, using defaults", cli.config.display());
                (Self::default(), cwd.join(&cli.config))
            }
        };

        let root = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or(cwd);
        config.config_path = normalize_path(&config_path);
        config.root = normalize_path(&root);

        let env = Environment::capture(&config.root)?;
        config.apply_env(&env)?;
        config.apply_cli(cli);
        config.normalize_paths();

        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;

        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    pub fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {} are ignored: {}", display_path, fields.join(", "));
    }

    // ========================================================================
    // overrides
    // ========================================================================

    /// Apply environment overrides from a snapshot.
    pub fn apply_env(&mut self, env: &Environment) -> Result<(), ConfigError> {
        Self::update_path(&mut self.build.output, env.get(env::BUILD_DIR));
        Self::update_path(&mut self.build.css_dir, env.get(env::CSS_DIR));
        Self::update_path(&mut self.build.js_dir, env.get(env::JS_DIR));
        Self::update_path(&mut self.scripts.entry, env.get(env::JS_ENTRY));
        Self::update_path(&mut self.build.templates, env.get(env::TEMPLATES_DIR));
        Self::update_path(&mut self.build.source, env.get(env::SOURCE_ROOT));

        if let Some(value) = env.get(env::CMS_MODE) {
            self.files.layout = value.parse().map_err(|reason| ConfigError::Env {
                name: env::CMS_MODE,
                value: value.to_string(),
                reason,
            })?;
        }

        self.mode = BuildMode::from_node_env(env.get(env::NODE_ENV));
        Ok(())
    }

    /// Apply CLI overrides. CLI wins over environment and file.
    fn apply_cli(&mut self, cli: &Cli) {
        crate::logger::set_verbose(cli.verbose);

        Self::update_option(&mut self.build.output, cli.output.as_ref());
        Self::update_option(&mut self.build.source, cli.source.as_ref());
        if cli.dev {
            self.mode = BuildMode::Development;
        }

        match &cli.command {
            Commands::Build { no_clean } => self.build.clean = !no_clean,
            Commands::Deploy { force, .. } => {
                Self::update_option(&mut self.deploy.force, force.as_ref());
            }
            Commands::Run { .. } | Commands::Clean | Commands::Check => {}
        }
    }

    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    fn update_path(field: &mut PathBuf, value: Option<&str>) {
        if let Some(value) = value {
            *field = PathBuf::from(value);
        }
    }

    // ========================================================================
    // path normalization
    // ========================================================================

    /// Resolve root-relative paths to absolute ones.
    ///
    /// `web`, `css_dir`, `js_dir`, `templates`, `rev.base` and `inline.base`
    /// stay relative: they are joined onto source or build dir on demand.
    fn normalize_paths(&mut self) {
        let root = self.root.clone();

        self.build.source = join_root(&root, &self.build.source);
        self.build.output = join_root(&root, &self.build.output);
        self.rev.manifest = join_root(&root, &self.rev.manifest);

        let source = self.build.source.clone();
        self.scripts.entry = join_root(&source, &self.scripts.entry);
        for entry in &mut self.styles.entries {
            *entry = join_root(&source, entry);
        }

        if let Some(key) = self.deploy.ssh.key.take() {
            let expanded = shellexpand::tilde(&key.to_string_lossy()).into_owned();
            self.deploy.ssh.key = Some(join_root(&root, Path::new(&expanded)));
        }
    }

    // ========================================================================
    // derived paths
    // ========================================================================

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn source_dir(&self) -> &Path {
        &self.build.source
    }

    pub fn build_dir(&self) -> &Path {
        &self.build.output
    }

    /// Web root that compile stages write into: the build dir in
    /// production, the source tree in development.
    pub fn web_dir(&self) -> PathBuf {
        let base = if self.mode.is_dev() {
            self.source_dir()
        } else {
            self.build_dir()
        };
        base.join(&self.build.web)
    }

    pub fn styles_out_dir(&self) -> PathBuf {
        self.web_dir().join(&self.build.css_dir)
    }

    pub fn scripts_out_dir(&self) -> PathBuf {
        self.web_dir().join(&self.build.js_dir)
    }

    /// Directory that manifest keys are relative to.
    pub fn rev_base(&self) -> PathBuf {
        self.build_dir().join(&self.rev.base)
    }

    pub fn manifest_path(&self) -> &Path {
        &self.rev.manifest
    }

    /// Template directory inside the build dir.
    pub fn templates_dir(&self) -> PathBuf {
        self.build_dir().join(&self.build.templates)
    }

    /// Directory inline marker paths resolve against.
    pub fn inline_base(&self) -> PathBuf {
        match &self.inline.base {
            Some(base) => self.build_dir().join(base),
            None => self.build_dir().join(&self.build.web).join(&self.build.css_dir),
        }
    }

    /// Template globs for inlining, falling back to the rewrite globs.
    pub fn inline_templates(&self) -> &[String] {
        self.inline.templates.as_deref().unwrap_or(&self.rev.templates)
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate configuration; deploy settings only when deploying.
    ///
    /// Collects all validation errors and returns them at once.
    pub fn validate(&self, with_deploy: bool) -> Result<(), ConfigError> {
        let mut diag = ConfigDiagnostics::new();

        if !self.source_dir().is_dir() {
            diag.error(
                FieldPath::new("build.source"),
                format!("source root not found: {}", self.source_dir().display()),
            );
        }
        if self.build_dir() == self.source_dir() || self.source_dir().starts_with(self.build_dir()) {
            diag.error_with_hint(
                FieldPath::new("build.output"),
                "build directory would overwrite the source tree",
                "point build.output (or BUILD_DIR) at a separate directory",
            );
        }

        self.styles.validate(&mut diag);
        self.scripts.validate(&mut diag);
        self.files.validate(&mut diag);
        self.rev.validate(&mut diag);
        self.inline.validate(&mut diag);
        self.hooks.validate(&mut diag);
        if with_deploy {
            self.deploy.validate(&mut diag);
        }

        diag.print_warnings();
        diag.into_result().map_err(ConfigError::Diagnostics)
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config from TOML.
/// Panics if there are unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> PipelineConfig {
    let (parsed, ignored) = PipelineConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

/// A config rooted at `root` with build dir `<root>/dist`, paths normalized.
#[cfg(test)]
pub fn test_config_at(root: &Path, content: &str) -> PipelineConfig {
    let mut config = test_parse_config(content);
    config.root = root.to_path_buf();
    config.config_path = root.join("revline.toml");
    config.normalize_paths();
    config
}

// ============================================================================
// tests
// ============================================================================
