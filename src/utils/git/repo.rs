use crate::log;
use anyhow::{Context, Result, bail};
use gix::{ObjectId, ThreadSafeRepository};
use std::path::Path;

use super::tree::TreeBuilder;

/// Open the repository at `root`, creating it if there is none.
pub fn open_or_init(root: &Path) -> Result<ThreadSafeRepository> {
    if root.join(".git").exists() {
        let repo = gix::open(root)
            .with_context(|| format!("failed to open repository at {}", root.display()))?;
        return Ok(repo.into_sync());
    }
    log!("git"; "initializing repository in {}", root.display());
    let repo = gix::init(root)
        .with_context(|| format!("failed to initialize repository at {}", root.display()))?;
    Ok(repo.into_sync())
}

/// Commit the whole work tree onto `refs/heads/<branch>`.
///
/// Returns `None` when the tree is identical to the branch tip.
pub fn commit_all(repo: &ThreadSafeRepository, branch: &str, message: &str) -> Result<Option<ObjectId>> {
    if message.trim().is_empty() {
        bail!("commit message cannot be empty");
    }

    let repo_local = repo.to_thread_local();
    let root = repo_local
        .workdir()
        .context("deploy repository has no work tree")?
        .to_path_buf();

    let tree = TreeBuilder::new(&repo_local).build_from_dir(&root)?;
    let tree_id = repo_local.write_object(&tree)?.detach();

    let reference = format!("refs/heads/{branch}");
    let parent = branch_tip(&repo_local, &reference);
    if let Some(parent) = parent
        && repo_local.find_commit(parent)?.tree_id()?.detach() == tree_id
    {
        return Ok(None);
    }

    let commit_id = repo_local
        .commit(reference.as_str(), message, tree_id, parent)
        .with_context(|| format!("failed to commit onto {branch}"))?
        .detach();

    log!("git"; "commit {commit_id} on {branch}");
    Ok(Some(commit_id))
}

/// Current commit of `reference`, `None` for an unborn branch.
fn branch_tip(repo: &gix::Repository, reference: &str) -> Option<ObjectId> {
    repo.find_reference(reference)
        .ok()
        .and_then(|r| r.target().try_id().map(ToOwned::to_owned))
}
