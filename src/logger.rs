//! Logging utilities with colored output.
//!
//! - `log!` macro for formatted terminal output with colored prefixes
//! - `debug!` for output only shown with `--verbose`
//! - [`StageClock`] for "done in 1.2s" stage summaries
//!
//! ```ignore
//! log!("rev"; "{} assets revisioned", count);
//! debug!("rewrite"; "skipping ambiguous name {}", name);
//! ```

use crossterm::{
    execute,
    terminal::{Clear, ClearType},
};
use owo_colors::OwoColorize;
use std::{
    io::{Write, stdout},
    sync::atomic::{AtomicBool, Ordering},
    time::{Duration, Instant},
};

/// Global verbose flag (set by --verbose CLI argument)
static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Set verbose mode globally
pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::SeqCst);
}

/// Check if verbose mode is enabled
pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

// ============================================================================
// Log Macros
// ============================================================================

/// Log a message with a colored module prefix
///
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Log a debug message (only shown when --verbose is enabled)
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Log a message with a colored module prefix.
///
/// The whole line is written under one stdout lock so concurrent stages
/// never interleave inside a line.
#[inline]
pub fn log(module: &str, message: &str) {
    let module_lower = module.to_ascii_lowercase();
    let prefix = colorize_prefix(module, &module_lower);

    let mut stdout = stdout().lock();
    execute!(stdout, Clear(ClearType::UntilNewLine)).ok();
    writeln!(stdout, "{prefix} {message}").ok();
    stdout.flush().ok();
}

/// Apply color to a module prefix based on module type
#[inline]
fn colorize_prefix(module: &str, module_lower: &str) -> String {
    let prefix = format!("[{module}]");
    match module_lower {
        "error" => prefix.bright_red().bold().to_string(),
        "warning" | "warn" => prefix.yellow().bold().to_string(),
        "hint" => prefix.bright_cyan().bold().to_string(),
        "deploy" | "git" | "ssh" => prefix.bright_magenta().bold().to_string(),
        "revision" | "rewrite" | "inline" => prefix.bright_green().bold().to_string(),
        "pipeline" => prefix.bright_blue().bold().to_string(),
        _ => prefix.bright_yellow().bold().to_string(),
    }
}

// ============================================================================
// Stage timing
// ============================================================================

/// Measures a pipeline stage and logs its completion.
pub struct StageClock {
    stage: &'static str,
    started: Instant,
}

impl StageClock {
    pub fn start(stage: &'static str) -> Self {
        crate::debug!(stage; "started");
        Self {
            stage,
            started: Instant::now(),
        }
    }

    /// Log `done in …` for the stage.
    pub fn finish(self) {
        log(self.stage, &format!("done in {}", format_duration(self.started.elapsed())));
    }
}

/// Human-readable duration: `850ms`, `1.2s`, `2m 03s`.
pub fn format_duration(d: Duration) -> String {
    let ms = d.as_millis();
    if ms < 1000 {
        format!("{ms}ms")
    } else if ms < 60_000 {
        format!("{:.1}s", d.as_secs_f64())
    } else {
        let secs = d.as_secs();
        format!("{}m {:02}s", secs / 60, secs % 60)
    }
}

/// `1 file`, `3 files`.
pub fn plural_count(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(850)), "850ms");
        assert_eq!(format_duration(Duration::from_millis(1200)), "1.2s");
        assert_eq!(format_duration(Duration::from_secs(123)), "2m 03s");
    }

    #[test]
    fn test_plural_count() {
        assert_eq!(plural_count(0, "template"), "0 templates");
        assert_eq!(plural_count(1, "template"), "1 template");
        assert_eq!(plural_count(2, "block"), "2 blocks");
    }

    #[test]
    fn test_prefix_contains_module() {
        let prefix = colorize_prefix("Rewrite", "rewrite");
        assert!(prefix.contains("[Rewrite]"));
    }

    #[test]
    fn test_verbose_toggle() {
        set_verbose(true);
        assert!(is_verbose());
        set_verbose(false);
        assert!(!is_verbose());
    }
}
