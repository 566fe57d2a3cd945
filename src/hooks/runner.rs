//! Hook execution: environment variables and command execution.

use crate::config::{HookConfig, PipelineConfig};
use crate::utils::exec::{Cmd, SILENT_FILTER};
use anyhow::{Context, Result};
use rustc_hash::FxHashMap;

// ============================================================================
// Environment Variables
// ============================================================================

/// Build `$REVLINE_*` variables for hook execution.
pub fn build_revline_vars(config: &PipelineConfig) -> FxHashMap<String, String> {
    let mut vars = FxHashMap::default();
    vars.insert(
        "REVLINE_BUILD_DIR".into(),
        config.build_dir().display().to_string(),
    );
    vars.insert("REVLINE_ROOT".into(), config.root().display().to_string());
    vars.insert("REVLINE_MODE".into(), config.mode.as_str().into());
    vars
}

// ============================================================================
// Command Argument Resolution
// ============================================================================

/// Replace every `$NAME` in `args` with its value from `vars`.
///
/// Longer names are substituted first so `$OUTPUT_DIR` is never clobbered
/// by a shorter `$OUTPUT`.
pub fn resolve_args(args: &[String], vars: &FxHashMap<String, String>) -> Vec<String> {
    let mut keys: Vec<&String> = vars.keys().collect();
    keys.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    args.iter()
        .map(|arg| {
            keys.iter().fold(arg.clone(), |acc, key| {
                acc.replace(&format!("${key}"), &vars[*key])
            })
        })
        .collect()
}

// ============================================================================
// Hook Execution
// ============================================================================

/// Execute a single hook. `phase` is the log prefix (`pre` or `post`).
pub fn run_hook(hook: &HookConfig, config: &PipelineConfig, phase: &str) -> Result<()> {
    if !hook.enable || hook.command.is_empty() {
        return Ok(());
    }

    let vars = build_revline_vars(config);
    let mut resolved = resolve_args(&hook.command, &vars);
    if !config.mode.is_dev() {
        resolved.extend(resolve_args(&hook.build_args, &vars));
    }

    if !hook.quiet {
        crate::log!(phase; "`{}` running", hook.display_name());
    }

    let output = Cmd::from_slice(&resolved)
        .cwd(config.root())
        .envs(&vars)
        .pty(true)
        .filter(&SILENT_FILTER)
        .run()
        .with_context(|| format!("{phase} hook `{}` failed", hook.display_name()))?;

    if !hook.quiet {
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stdout = stdout.trim();
        if !stdout.is_empty() {
            println!("{stdout}");
        }
    }

    Ok(())
}

/// Execute all pre hooks in order.
pub fn run_pre_hooks(config: &PipelineConfig) -> Result<()> {
    for hook in &config.hooks.pre {
        run_hook(hook, config, "pre")?;
    }
    Ok(())
}

/// Execute all post hooks in order.
pub fn run_post_hooks(config: &PipelineConfig) -> Result<()> {
    for hook in &config.hooks.post {
        run_hook(hook, config, "post")?;
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
