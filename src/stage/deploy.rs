//! Hand the finished build directory to the deploy transport.

use crate::config::section::{GitDeployConfig, SshDeployConfig};
use crate::config::{DeployProvider, PipelineConfig};
use crate::utils::exec::{Cmd, SILENT_FILTER};
use crate::utils::git;
use anyhow::{Context, Result};
use std::path::Path;

pub fn deploy(config: &PipelineConfig) -> Result<()> {
    match config.deploy.provider {
        DeployProvider::Git => deploy_git(config.build_dir(), &config.deploy.git, config.deploy.force),
        DeployProvider::Ssh => deploy_ssh(&config.deploy.ssh),
    }
}

/// Commit the build dir onto the deploy branch and push it.
fn deploy_git(build_dir: &Path, git_config: &GitDeployConfig, force: bool) -> Result<()> {
    let repo = git::open_or_init(build_dir)?;
    let branch = &git_config.branch;

    if git::commit_all(&repo, branch, "Deploy build")?.is_none() {
        crate::log!("git"; "{} is up to date", branch);
    }

    ensure_remote(build_dir, git_config)?;

    let refspec = format!("refs/heads/{branch}:refs/heads/{branch}");
    let remote = git_config.remote.as_str();
    crate::log!("deploy"; "pushing {} to {}", branch, remote);
    Cmd::new("git")
        .args(push_args(remote, &refspec, force))
        .cwd(build_dir)
        .pty(true)
        .run()
        .with_context(|| format!("failed to push {branch} to {remote}"))?;
    Ok(())
}

/// Add `remote` pointing at `url` when the repository lacks it.
fn ensure_remote(build_dir: &Path, git_config: &GitDeployConfig) -> Result<()> {
    let exists = Cmd::new("git")
        .args(["remote", "get-url", git_config.remote.as_str()])
        .cwd(build_dir)
        .filter(&SILENT_FILTER)
        .run()
        .is_ok();
    if exists || git_config.url.is_empty() {
        return Ok(());
    }

    crate::log!("git"; "adding remote {} -> {}", git_config.remote, git_config.url);
    Cmd::new("git")
        .args(["remote", "add", git_config.remote.as_str(), git_config.url.as_str()])
        .cwd(build_dir)
        .run()?;
    Ok(())
}

fn push_args<'a>(remote: &'a str, refspec: &'a str, force: bool) -> Vec<&'a str> {
    let mut args = vec!["push"];
    if force {
        args.push("--force");
    }
    args.extend([remote, refspec]);
    args
}

/// Ask the server to update its checkout.
fn deploy_ssh(ssh: &SshDeployConfig) -> Result<()> {
    let destination = ssh.destination();
    crate::log!("ssh"; "{}: {}", destination, ssh.command);
    Cmd::from_slice(&ssh_args(ssh))
        .pty(true)
        .run()
        .with_context(|| format!("remote command on {destination} failed"))?;
    Ok(())
}

fn ssh_args(ssh: &SshDeployConfig) -> Vec<String> {
    let mut args = vec!["ssh".to_string()];
    if let Some(key) = &ssh.key {
        args.push("-i".into());
        args.push(key.display().to_string());
    }
    if let Some(port) = ssh.port {
        args.push("-p".into());
        args.push(port.to_string());
    }
    args.push(ssh.destination());
    args.push(format!("cd {} && {}", shell_quote(&ssh.path), ssh.command));
    args
}

/// Single-quote for the remote shell.
fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_push_args() {
        assert_eq!(
            push_args("origin", "refs/heads/gulp-dist:refs/heads/gulp-dist", false),
            vec!["push", "origin", "refs/heads/gulp-dist:refs/heads/gulp-dist"]
        );
        assert_eq!(push_args("origin", "x:x", true), vec!["push", "--force", "origin", "x:x"]);
    }

    #[test]
    fn test_ssh_args() {
        let ssh = SshDeployConfig {
            host: "web1.example.com".into(),
            user: Some("deploy".into()),
            port: Some(2222),
            path: "/var/www/site".into(),
            key: Some(PathBuf::from("/home/me/.ssh/id_deploy")),
            command: "git pull".into(),
        };
        assert_eq!(
            ssh_args(&ssh),
            vec![
                "ssh",
                "-i",
                "/home/me/.ssh/id_deploy",
                "-p",
                "2222",
                "deploy@web1.example.com",
                "cd '/var/www/site' && git pull",
            ]
        );
    }

    #[test]
    fn test_ssh_args_minimal() {
        let ssh = SshDeployConfig {
            host: "web1".into(),
            path: "/srv/it's".into(),
            ..SshDeployConfig::default()
        };
        assert_eq!(ssh_args(&ssh), vec!["ssh", "web1", r"cd '/srv/it'\''s' && git pull"]);
    }
}
