//! Stylesheet compilation and script bundling.
//!
//! Both stages run an external command with `$INPUT` and `$OUTPUT`
//! substituted, append the mode-specific arguments, and in production pass
//! the result through the minifier.

use crate::config::PipelineConfig;
use crate::hooks::resolve_args;
use crate::utils::exec::{Cmd, EMPTY_FILTER, FilterRule, SASS_FILTER};
use crate::utils::minify::minify_file;
use crate::utils::path::display_rel;
use anyhow::{Context, Result, bail};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Compile every stylesheet entry into `<web>/<css_dir>/<stem>.css`.
pub fn compile_styles(config: &PipelineConfig) -> Result<()> {
    let styles = &config.styles;
    let out_dir = config.styles_out_dir();
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    let mode_args = if config.mode.is_dev() {
        &styles.dev_args
    } else {
        &styles.build_args
    };
    let minify = styles.minify && !config.mode.is_dev();

    styles.entries.par_iter().try_for_each(|entry| {
        let output = out_dir.join(output_name(entry, "css"));
        let job = Job {
            stage: "styles",
            command: &styles.command,
            mode_args,
            filter: &SASS_FILTER,
            minify,
        };
        job.run(config, entry, &output)
    })
}

/// Bundle the script entry into `<web>/<js_dir>/<name>.js`.
pub fn bundle_scripts(config: &PipelineConfig) -> Result<()> {
    let scripts = &config.scripts;
    let out_dir = config.scripts_out_dir();
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    let output = out_dir.join(format!("{}.js", scripts.bundle_name()));
    let job = Job {
        stage: "scripts",
        command: &scripts.command,
        mode_args: if config.mode.is_dev() {
            &scripts.dev_args
        } else {
            &scripts.build_args
        },
        filter: &EMPTY_FILTER,
        minify: scripts.minify && !config.mode.is_dev(),
    };
    job.run(config, &scripts.entry, &output)
}

/// One compiler invocation.
struct Job<'a> {
    stage: &'static str,
    command: &'a [String],
    mode_args: &'a [String],
    filter: &'static FilterRule,
    minify: bool,
}

impl Job<'_> {
    fn run(&self, config: &PipelineConfig, input: &Path, output: &Path) -> Result<()> {
        let argv = command_line(self.command, self.mode_args, input, output);
        Cmd::from_slice(&argv)
            .cwd(config.root())
            .filter(self.filter)
            .run()
            .with_context(|| format!("failed to compile {}", display_rel(input, config.root())))?;

        if !output.is_file() {
            bail!(
                "`{}` did not produce {}",
                argv.first().map(String::as_str).unwrap_or_default(),
                display_rel(output, config.root())
            );
        }

        if self.minify {
            match minify_file(output)
                .with_context(|| format!("failed to minify {}", output.display()))?
            {
                Some(savings) => crate::debug!(
                    self.stage;
                    "{} minified {} -> {} bytes",
                    display_rel(output, config.root()),
                    savings.before,
                    savings.after
                ),
                None => crate::log!(
                    "warn";
                    "{} could not be parsed for minification, kept as compiled",
                    display_rel(output, config.root())
                ),
            }
        }

        crate::log!(self.stage; "{}", display_rel(output, config.root()));
        Ok(())
    }
}

/// Full argument vector: `command` with placeholders resolved, then the
/// mode arguments.
fn command_line(command: &[String], mode_args: &[String], input: &Path, output: &Path) -> Vec<String> {
    let mut vars = FxHashMap::default();
    vars.insert("INPUT".to_string(), input.display().to_string());
    vars.insert("OUTPUT".to_string(), output.display().to_string());

    let mut argv = resolve_args(command, &vars);
    argv.extend(resolve_args(mode_args, &vars));
    argv
}

/// `sass/screen.scss` → `screen.<ext>`.
fn output_name(entry: &Path, ext: &str) -> PathBuf {
    let stem = entry
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "index".into());
    PathBuf::from(format!("{stem}.{ext}"))
}
