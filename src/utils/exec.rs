//! External command execution.
//!
//! Every external collaborator of the pipeline (stylesheet compiler, bundler,
//! git, ssh, user hooks) is launched through [`Cmd`]. A command that cannot be
//! spawned or exits non-zero is an [`ExecError`]; callers propagate it and the
//! pipeline aborts.
//!
//! ```ignore
//! use crate::utils::exec::Cmd;
//!
//! Cmd::new("sass").args(["sass/screen.scss", "dist/web/styles/screen.css"]).cwd(root).run()?;
//!
//! // Interactive transports (credential prompts, colored output)
//! Cmd::new("git").args(["push", "origin", "HEAD:dist"]).cwd(build).pty(true).run()?;
//! ```

use crate::log;
use portable_pty::{CommandBuilder, NativePtySystem, PtySize, PtySystem};
use regex::Regex;
use std::{
    ffi::{OsStr, OsString},
    io::{self, Read},
    path::{Path, PathBuf},
    process::{Command, ExitStatus, Output, Stdio},
    sync::OnceLock,
};
use thiserror::Error;

/// Failure of an external tool invocation.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to launch `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("`{program}` {status}\n{detail}")]
    Failed {
        program: String,
        status: String,
        detail: String,
    },

    #[error("`{program}` pty error: {message}")]
    Pty { program: String, message: String },
}

/// Command builder for external process execution.
#[derive(Default)]
pub struct Cmd {
    program: OsString,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
    envs: Vec<(String, String)>,
    use_pty: bool,
    filter: Option<&'static FilterRule>,
}

impl Cmd {
    /// Create a new command builder.
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        Self {
            program: program.as_ref().to_owned(),
            ..Default::default()
        }
    }

    /// Create from a command array (e.g., `["sass"]` or `["npx", "esbuild"]`).
    pub fn from_slice<S: AsRef<OsStr>>(cmd: &[S]) -> Self {
        let mut iter = cmd.iter();
        let program = iter
            .next()
            .map(|s| s.as_ref().to_owned())
            .unwrap_or_default();
        Self {
            program,
            args: iter.map(|s| s.as_ref().to_owned()).collect(),
            ..Default::default()
        }
    }

    /// Add a single argument. Empty arguments are dropped.
    pub fn arg<S: AsRef<OsStr>>(mut self, arg: S) -> Self {
        let arg = arg.as_ref();
        if !arg.is_empty() {
            self.args.push(arg.to_owned());
        }
        self
    }

    /// Add multiple arguments. Empty arguments are dropped.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for arg in args {
            self = self.arg(arg);
        }
        self
    }

    /// Set working directory.
    pub fn cwd<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.cwd = Some(dir.as_ref().to_owned());
        self
    }

    /// Set environment variables for the subprocess.
    pub fn envs<K, V, I>(mut self, vars: I) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
        I: IntoIterator<Item = (K, V)>,
    {
        for (k, v) in vars {
            self.envs.push((k.as_ref().to_owned(), v.as_ref().to_owned()));
        }
        self
    }

    /// Run inside a pseudo-terminal so the tool can prompt for credentials.
    pub fn pty(mut self, enable: bool) -> Self {
        self.use_pty = enable;
        self
    }

    /// Set output filter for logging.
    pub fn filter(mut self, filter: &'static FilterRule) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Command line as a single string, for logs.
    pub fn display(&self) -> String {
        std::iter::once(&self.program)
            .chain(&self.args)
            .map(|s| {
                let s = s.to_string_lossy();
                if s.contains(' ') {
                    format!("'{s}'")
                } else {
                    s.into_owned()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Execute the command and return its output.
    pub fn run(self) -> Result<Output, ExecError> {
        let filter = self.filter.unwrap_or(&EMPTY_FILTER);
        crate::debug!("exec"; "{}", self.display());

        if self.use_pty {
            self.run_with_pty(filter)
        } else {
            self.run_piped(filter)
        }
    }

    fn program_name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }

    fn spawn_error(&self, source: io::Error) -> ExecError {
        ExecError::Spawn {
            program: self.program_name(),
            source,
        }
    }

    /// Plain execution with captured stdout/stderr.
    fn run_piped(self, filter: &'static FilterRule) -> Result<Output, ExecError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .envs(self.envs.iter().cloned())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }

        let child = cmd.spawn().map_err(|e| self.spawn_error(e))?;

        let output = child.wait_with_output().map_err(|e| self.spawn_error(e))?;
        let name = self.program_name();

        if !output.status.success() {
            return Err(failure(&name, &output, filter));
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        filter.log(&name, stderr.trim());
        Ok(output)
    }

    /// Execution inside a pseudo-terminal.
    fn run_with_pty(self, filter: &'static FilterRule) -> Result<Output, ExecError> {
        let name = self.program_name();
        let pty_err = |e: &dyn std::fmt::Display| ExecError::Pty {
            program: name.clone(),
            message: e.to_string(),
        };

        let mut builder = CommandBuilder::new(&self.program);
        builder.args(&self.args);
        for (k, v) in &self.envs {
            builder.env(k, v);
        }
        if let Some(dir) = &self.cwd {
            builder.cwd(dir);
        }

        let pair = NativePtySystem::default()
            .openpty(PtySize {
                rows: 24,
                cols: 80,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| pty_err(&e))?;

        let mut child = pair.slave.spawn_command(builder).map_err(|e| pty_err(&e))?;
        drop(pair.slave);

        // PTY blocks until EOF
        let mut reader = pair.master.try_clone_reader().map_err(|e| pty_err(&e))?;
        let reader_handle = std::thread::spawn(move || {
            let mut output = String::new();
            let _ = reader.read_to_string(&mut output);
            output
        });

        let status = child.wait().map_err(|e| pty_err(&e))?;
        drop(pair.master);

        let output = reader_handle
            .join()
            .map_err(|_| pty_err(&"output reader thread panicked"))?;

        if !status.success() {
            return Err(ExecError::Failed {
                program: name,
                status: format!("exited with code {}", status.exit_code()),
                detail: strip_ansi(output.trim()).into_owned(),
            });
        }

        filter.log(&name, &output);

        Ok(Output {
            status: exit_status_from_code(status.exit_code()),
            stdout: output.into_bytes(),
            stderr: Vec::new(),
        })
    }
}

#[cfg(unix)]
#[allow(clippy::cast_possible_wrap)]
fn exit_status_from_code(code: u32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    ExitStatus::from_raw((code as i32) << 8)
}

#[cfg(windows)]
fn exit_status_from_code(code: u32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;
    ExitStatus::from_raw(code)
}

// ============================================================================
// Output Filtering
// ============================================================================

/// Filter rule for command output logging.
///
/// Used to reduce noise by skipping known warnings or irrelevant messages.
pub struct FilterRule {
    /// Prefixes to skip when logging output.
    pub skip_prefixes: &'static [&'static str],
}

impl FilterRule {
    pub const fn new(skip_prefixes: &'static [&'static str]) -> Self {
        Self { skip_prefixes }
    }

    fn should_skip(&self, line: &str) -> bool {
        line.is_empty() || self.skip_prefixes.iter().any(|p| line.starts_with(p))
    }

    /// Log output lines that pass the filter.
    pub fn log(&self, name: &str, output: &str) {
        let lines: Vec<_> = output
            .lines()
            .map(strip_ansi)
            .filter(|line| !self.should_skip(line.trim()))
            .collect();

        if !lines.is_empty() {
            log!(name; "{}", lines.join("\n"));
        }
    }
}

/// Empty filter (no skipping).
pub const EMPTY_FILTER: FilterRule = FilterRule::new(&[]);

/// Silent filter (skip all output).
pub const SILENT_FILTER: FilterRule = FilterRule::new(&[""]);

/// Sass prints deprecation chatter on stderr even on success.
pub const SASS_FILTER: FilterRule = FilterRule::new(&[
    "DEPRECATION WARNING",
    "Deprecation",
    "More info",
    "╷",
    "│",
    "╵",
]);

fn strip_ansi(s: &str) -> std::borrow::Cow<'_, str> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"\x1b\[[0-9;]*m").expect("valid ANSI regex"));
    re.replace_all(s, "")
}

fn failure(name: &str, output: &Output, filter: &'static FilterRule) -> ExecError {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);

    let mut detail = filter
        .skip_prefixes
        .iter()
        .filter(|p| !p.is_empty())
        .fold(stderr.trim(), |s, p| s.trim_start_matches(p).trim_start())
        .to_string();

    let stdout = stdout.trim();
    if !stdout.is_empty() {
        if !detail.is_empty() {
            detail.push('\n');
        }
        detail.push_str(stdout);
    }

    ExecError::Failed {
        program: name.to_string(),
        status: output.status.to_string(),
        detail: strip_ansi(&detail).into_owned(),
    }
}
