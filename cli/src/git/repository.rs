//! Checkout target resolution using git2 (libgit2).
//!
//! Turns what a user types into the descriptors the argument builders
//! consume. Reads only; every mutation goes through the git binary.

use std::path::{Path, PathBuf};

use git2::{BranchType, Repository};
use tracing::debug;

use crate::git::error::GitError;
use crate::git::types::{BranchTarget, CommitTarget};

/// A working tree on disk.
#[derive(Debug, Clone)]
pub struct LocalRepository {
    workdir: PathBuf,
}

impl LocalRepository {
    /// Opens the repository containing `path`, walking up as git does.
    ///
    /// # Errors
    ///
    /// Returns [`GitError::NotARepository`] if no repository contains the
    /// path, or an error for bare repositories.
    pub fn discover(path: impl AsRef<Path>) -> Result<Self, GitError> {
        let repo = Repository::discover(path.as_ref()).map_err(|_| GitError::NotARepository)?;
        let workdir = repo
            .workdir()
            .ok_or_else(|| GitError::Git2("Bare repository not supported".to_string()))?;

        Ok(Self {
            workdir: workdir.to_path_buf(),
        })
    }

    /// Root of the working tree.
    #[must_use]
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn repo(&self) -> Result<Repository, GitError> {
        Repository::open(&self.workdir).map_err(|e| GitError::Git2(e.to_string()))
    }

    /// Resolves a branch name.
    ///
    /// A local branch wins. A remote-tracking name such as `origin/topic`
    /// resolves to the local `topic` when that exists, and otherwise to a
    /// target that creates it.
    ///
    /// # Errors
    ///
    /// Returns [`GitError::BranchNotFound`] if neither a local nor a
    /// remote-tracking branch has this name.
    pub fn resolve_branch(&self, name: &str) -> Result<BranchTarget, GitError> {
        let repo = self.repo()?;

        if repo.find_branch(name, BranchType::Local).is_ok() {
            return Ok(BranchTarget::local(name));
        }

        let remote_branch = repo
            .find_branch(name, BranchType::Remote)
            .map_err(|_| GitError::BranchNotFound(name.to_string()))?;
        let refname = remote_branch
            .get()
            .name()
            .ok_or_else(|| GitError::Git2("Invalid reference name".to_string()))?;
        let remote = repo
            .branch_remote_name(refname)
            .map_err(|e| GitError::Git2(format!("Cannot find remote for '{name}': {e}")))?;
        let remote = remote
            .as_str()
            .ok_or_else(|| GitError::Git2("Invalid remote name".to_string()))?;

        let local_name = name
            .strip_prefix(remote)
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| GitError::BranchNotFound(name.to_string()))?;

        if repo.find_branch(local_name, BranchType::Local).is_ok() {
            debug!(branch = name, local = local_name, "remote branch has a local counterpart");
            return Ok(BranchTarget::local(local_name));
        }

        Ok(BranchTarget::remote(name, local_name))
    }

    /// The remote `branch` talks to: the remote owning a remote-tracking
    /// branch, or the configured upstream remote of a local one. `None` for
    /// a local branch without an upstream.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository cannot be opened.
    pub fn remote_of(&self, branch: &BranchTarget) -> Result<Option<String>, GitError> {
        let repo = self.repo()?;
        let found = if branch.is_remote_tracking {
            repo.branch_remote_name(&format!("refs/remotes/{}", branch.name))
        } else {
            repo.branch_upstream_remote(&format!("refs/heads/{}", branch.name))
        };
        let remote = match found {
            Ok(buf) => buf.as_str().map(String::from),
            Err(e) => {
                debug!(branch = %branch.name, error = %e, "branch has no remote");
                None
            },
        };
        Ok(remote)
    }

    /// Resolves any revision git understands to the commit it names.
    ///
    /// # Errors
    ///
    /// Returns [`GitError::CommitNotFound`] if the revision does not resolve
    /// to a commit.
    pub fn resolve_commit(&self, revision: &str) -> Result<CommitTarget, GitError> {
        let repo = self.repo()?;
        let commit = repo
            .revparse_single(revision)
            .and_then(|object| object.peel_to_commit())
            .map_err(|_| GitError::CommitNotFound(revision.to_string()))?;

        Ok(CommitTarget::new(commit.id().to_string()))
    }

    /// URL of `remote`, or `None` if no such remote is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository configuration cannot be read.
    pub fn remote_url(&self, remote: &str) -> Result<Option<String>, GitError> {
        let repo = self.repo()?;
        let url = match repo.find_remote(remote) {
            Ok(found) => found.url().map(String::from),
            Err(e) if e.code() == git2::ErrorCode::NotFound => None,
            Err(e) => return Err(GitError::Git2(format!("Cannot read remote '{remote}': {e}"))),
        };
        Ok(url)
    }

    /// The checked-out branch, or `None` when HEAD is detached.
    ///
    /// # Errors
    ///
    /// Returns an error if HEAD cannot be read.
    pub fn current_branch(&self) -> Result<Option<String>, GitError> {
        let repo = self.repo()?;
        let head = repo
            .head()
            .map_err(|e| GitError::Git2(format!("Cannot get HEAD: {e}")))?;

        if head.is_branch() {
            Ok(head.shorthand().map(String::from))
        } else {
            Ok(None)
        }
    }

    /// Full SHA of the commit HEAD points at.
    ///
    /// # Errors
    ///
    /// Returns an error if HEAD does not point at a commit.
    pub fn head_sha(&self) -> Result<String, GitError> {
        let repo = self.repo()?;
        let commit = repo
            .head()
            .and_then(|head| head.peel_to_commit())
            .map_err(|e| GitError::Git2(format!("Cannot get commit: {e}")))?;

        Ok(commit.id().to_string())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::fs;
    use std::path::Path;

    use git2::{Oid, Repository, Signature};
    use tempfile::TempDir;

    /// Commits `content` to `file` on the current branch.
    pub fn commit_file(repo: &Repository, file: &str, content: &str, message: &str) -> Oid {
        let workdir = repo.workdir().unwrap();
        fs::write(workdir.join(file), content).unwrap();

        let mut index = repo.index().unwrap();
        index.add_path(Path::new(file)).unwrap();
        index.write().unwrap();
        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();

        let sig = Signature::now("Test", "test@test.com").unwrap();
        let parents = match repo.head() {
            Ok(head) => vec![head.peel_to_commit().unwrap()],
            Err(_) => Vec::new(),
        };
        let parents: Vec<_> = parents.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap()
    }

    fn switch(repo: &Repository, refname: &str) {
        repo.set_head(refname).unwrap();
        repo.checkout_head(Some(git2::build::CheckoutBuilder::new().force()))
            .unwrap();
    }

    /// An upstream repository with a `feature-x` branch that changes
    /// `README.md` and adds `feature.txt`, and a clone of it where
    /// `feature-x` exists only as `origin/feature-x`.
    pub fn upstream_and_clone() -> (TempDir, TempDir, Repository) {
        let upstream_dir = TempDir::new().unwrap();
        let upstream = Repository::init(upstream_dir.path()).unwrap();
        let base = commit_file(&upstream, "README.md", "base\n", "Initial commit");
        let default_ref = upstream.head().unwrap().name().unwrap().to_string();
        let base = upstream.find_commit(base).unwrap();
        upstream.branch("feature-x", &base, false).unwrap();

        switch(&upstream, "refs/heads/feature-x");
        commit_file(&upstream, "README.md", "feature\n", "Update readme");
        commit_file(&upstream, "feature.txt", "feature\n", "Add feature");
        switch(&upstream, &default_ref);

        let clone_dir = TempDir::new().unwrap();
        let clone = Repository::clone(upstream_dir.path().to_str().unwrap(), clone_dir.path())
            .unwrap();
        (upstream_dir, clone_dir, clone)
    }
}
