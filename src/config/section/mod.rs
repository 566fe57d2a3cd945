//! Configuration section definitions.
//!
//! Each module corresponds to a section in `revline.toml`:
//!
//! | Module    | TOML Section  | Purpose                                  |
//! |-----------|---------------|------------------------------------------|
//! | `build`   | `[build]`     | Source/output directories                |
//! | `styles`  | `[styles]`    | Stylesheet compiler invocation           |
//! | `scripts` | `[scripts]`   | Script bundler invocation                |
//! | `files`   | `[files]`     | Deployable file set (layout variant)     |
//! | `rev`     | `[rev]`       | Revisioning and reference rewriting      |
//! | `inline`  | `[inline]`    | Critical asset inlining                  |
//! | `deploy`  | `[deploy]`    | Deployment transport                     |
//! | `hooks`   | `[hooks]`     | Pre/post pipeline commands               |

mod build;
mod deploy;
mod files;
mod hooks;
mod inline;
mod rev;
mod scripts;
mod styles;

pub use build::BuildConfig;
pub use deploy::{DeployConfig, DeployProvider, GitDeployConfig, SshDeployConfig};
pub use files::{FilesConfig, Layout};
pub use hooks::{HookConfig, HooksConfig};
pub use inline::InlineConfig;
pub use rev::RevConfig;
pub use scripts::ScriptsConfig;
pub use styles::StylesConfig;

use crate::config::{ConfigDiagnostics, FieldPath};

/// Package runners that fetch the real tool on demand.
const PACKAGE_RUNNERS: &[&str] = &["npx", "bunx", "pnpx", "yarn", "pnpm", "dlx"];

/// Check that an external command is configured and installed.
pub(crate) fn validate_command(field: FieldPath, command: &[String], diag: &mut ConfigDiagnostics) {
    let Some(program) = command.first() else {
        diag.error(field, format!("{} is empty", field.as_str()));
        return;
    };

    if which::which(program).is_ok() {
        return;
    }

    let hint = if PACKAGE_RUNNERS.contains(&program.as_str()) {
        let package = command.get(1).map(String::as_str).unwrap_or("the tool");
        format!("install Node.js so `{program}` can run {package}")
    } else {
        format!("install the command or update {}", field.as_str())
    };
    diag.error_with_hint(field, format!("`{program}` not found"), hint);
}

/// Check that glob patterns compile.
pub(crate) fn validate_patterns(field: FieldPath, patterns: &[String], diag: &mut ConfigDiagnostics) {
    for (idx, pattern) in patterns.iter().enumerate() {
        if let Err(e) = glob::Pattern::new(pattern.trim_start_matches('!')) {
            diag.error(field, format!("[{idx}] invalid glob `{pattern}`: {}", e.msg));
        }
    }
}
