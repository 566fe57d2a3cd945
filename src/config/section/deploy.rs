//! `[deploy]` section configuration.
//!
//! Chooses how the finished build directory leaves the machine.
//!
//! # Example
//!
//! ```toml
//! [deploy]
//! provider = "git"            # git | ssh
//! force = false               # Force push (overwrites remote history)
//!
//! [deploy.git]
//! url = "git@example.com:studio/site.git"   # Added as `remote` when missing
//! remote = "origin"
//! branch = "gulp-dist"
//!
//! [deploy.ssh]
//! host = "web1.example.com"
//! user = "deploy"
//! port = 22
//! path = "/var/www/site"
//! key = "~/.ssh/deploy_ed25519"
//! command = "git pull"
//! ```

use crate::config::{ConfigDiagnostics, FieldPath};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Deployment transport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeployProvider {
    /// Commit the build dir and push it to a branch.
    #[default]
    Git,
    /// Ask the server to pull over ssh.
    Ssh,
}

impl fmt::Display for DeployProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Git => "git",
            Self::Ssh => "ssh",
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    pub provider: DeployProvider,

    /// Force push (overwrites remote history).
    pub force: bool,

    pub git: GitDeployConfig,
    pub ssh: SshDeployConfig,
}

impl DeployConfig {
    pub const GIT_URL: FieldPath = FieldPath::new("deploy.git.url");
    pub const GIT_BRANCH: FieldPath = FieldPath::new("deploy.git.branch");
    pub const SSH_HOST: FieldPath = FieldPath::new("deploy.ssh.host");
    pub const SSH_PATH: FieldPath = FieldPath::new("deploy.ssh.path");
    pub const SSH_KEY: FieldPath = FieldPath::new("deploy.ssh.key");

    /// Validate the selected provider. Only called for `deploy`.
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        match self.provider {
            DeployProvider::Git => self.git.validate(diag),
            DeployProvider::Ssh => self.ssh.validate(diag),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitDeployConfig {
    /// Remote URL (HTTPS or scp-like). Empty uses the existing remote.
    pub url: String,

    pub remote: String,

    /// Target branch on the remote.
    pub branch: String,
}

impl Default for GitDeployConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            remote: "origin".to_string(),
            branch: "gulp-dist".to_string(),
        }
    }
}

impl GitDeployConfig {
    fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.branch.trim().is_empty() || self.branch.contains(char::is_whitespace) {
            diag.error(
                DeployConfig::GIT_BRANCH,
                format!("invalid branch name `{}`", self.branch),
            );
        }
        if !self.url.is_empty() && !is_remote_url(&self.url) {
            diag.error_with_hint(
                DeployConfig::GIT_URL,
                format!("`{}` is not a git remote url", self.url),
                "use https://host/repo.git or user@host:repo.git",
            );
        }
        if which::which("git").is_err() {
            diag.error_with_hint(
                DeployConfig::GIT_URL,
                "`git` not found",
                "install git to push the build directory",
            );
        }
    }
}

/// Accept URL-style remotes (`https://`, `ssh://`, `file://`) and scp-like
/// `user@host:path`.
fn is_remote_url(s: &str) -> bool {
    if s.contains("://") {
        return url::Url::parse(s).is_ok_and(|u| u.has_host() || u.scheme() == "file");
    }
    match s.split_once(':') {
        Some((host, path)) => !host.is_empty() && !path.is_empty() && !host.contains('/'),
        None => false,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SshDeployConfig {
    pub host: String,
    pub user: Option<String>,
    pub port: Option<u16>,

    /// Checkout directory on the server.
    pub path: String,

    /// Identity file, `~` expanded.
    pub key: Option<PathBuf>,

    /// Command run inside `path`.
    pub command: String,
}

impl Default for SshDeployConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            user: None,
            port: None,
            path: String::new(),
            key: None,
            command: "git pull".to_string(),
        }
    }
}

impl SshDeployConfig {
    /// `user@host`, or just `host` without a user.
    pub fn destination(&self) -> String {
        match &self.user {
            Some(user) => format!("{user}@{}", self.host),
            None => self.host.clone(),
        }
    }

    fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.host.is_empty() {
            diag.error(DeployConfig::SSH_HOST, "ssh deploy needs a host");
        }
        if self.path.is_empty() {
            diag.error(DeployConfig::SSH_PATH, "ssh deploy needs the remote checkout path");
        }
        if let Some(key) = &self.key
            && !key.is_file()
        {
            diag.error(
                DeployConfig::SSH_KEY,
                format!("identity file not found: {}", key.display()),
            );
        }
        if which::which("ssh").is_err() {
            diag.error_with_hint(DeployConfig::SSH_HOST, "`ssh` not found", "install an OpenSSH client");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PipelineConfig, test_parse_config};

    #[test]
    fn test_deploy_config_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.deploy.provider, DeployProvider::Git);
        assert!(!config.deploy.force);
        assert_eq!(config.deploy.git.remote, "origin");
        assert_eq!(config.deploy.git.branch, "gulp-dist");
        assert_eq!(config.deploy.ssh.command, "git pull");
    }

    #[test]
    fn test_deploy_config_ssh() {
        let config = test_parse_config(
            r#"[deploy]
provider = "ssh"

[deploy.ssh]
host = "web1.example.com"
user = "deploy"
port = 2222
path = "/var/www/site"
key = "~/.ssh/id_deploy""#,
        );
        assert_eq!(config.deploy.provider, DeployProvider::Ssh);
        assert_eq!(config.deploy.ssh.destination(), "deploy@web1.example.com");
        assert_eq!(config.deploy.ssh.port, Some(2222));
    }

    #[test]
    fn test_ssh_requires_host_and_path() {
        let mut diag = ConfigDiagnostics::new();
        SshDeployConfig::default().validate(&mut diag);
        let fields: Vec<_> = diag.errors().iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"deploy.ssh.host"));
        assert!(fields.contains(&"deploy.ssh.path"));
    }

    #[test]
    fn test_is_remote_url() {
        assert!(is_remote_url("https://github.com/user/repo.git"));
        assert!(is_remote_url("git@github.com:user/repo.git"));
        assert!(is_remote_url("ssh://git@example.com:2222/site.git"));
        assert!(!is_remote_url("not a url"));
        assert!(!is_remote_url("https://"));
    }

    #[test]
    fn test_deploy_unknown_field_detected() {
        let content = "[deploy.git]\nunknown = \"field\"";
        let (_, ignored) = PipelineConfig::parse_with_ignored(content).unwrap();
        assert!(ignored.iter().any(|f| f.contains("unknown")));
    }
}
