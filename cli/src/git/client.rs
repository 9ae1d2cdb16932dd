//! The operations gitexec exposes upward.
//!
//! [`GitClient`] builds arguments, the environment overlay and the error
//! table for each operation, runs git through its [`ProcessRunner`], reports
//! progress when a sink is attached, and classifies failures:
//! - [`GitClient::checkout`] (or [`GitClient::checkout_branch`] / [`GitClient::checkout_commit`]) - Move HEAD, with progress
//! - [`GitClient::checkout_paths`] - Restore paths from HEAD
//! - [`GitClient::checkout_conflicted_file`] - Resolve a conflict by taking one side
//! - [`GitClient::fetch`] - Update remote-tracking branches, with progress
//!
//! # Concurrency
//!
//! Independent repositories may be operated on concurrently through one
//! client. Callers must not run two mutating operations (any checkout)
//! against the same repository at the same time; nothing here prevents it
//! and git's own index lock is the only guard.

use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::auth::{Account, RemoteEnvironment};
use crate::git::adapter::{run_with_progress, ProgressScope, ProgressSink};
use crate::git::args::{
    checkout_branch_args, checkout_commit_args, checkout_conflicted_args, checkout_paths_args,
    fetch_args, FeatureFlags,
};
use crate::git::classify::{classify, ErrorTable};
use crate::git::error::GitError;
use crate::git::process::{DiscardOutput, ExecutionResult, GitProcess, OperationRequest, ProcessRunner};
use crate::git::progress::{checkout_stages, fetch_stages, ProgressParser, ProgressStage};
use crate::git::types::{BranchTarget, CheckoutTarget, CommitTarget, ConflictSide, OperationKind};

/// Optional progress sink for one call.
pub type Progress<'a> = Option<&'a mut (dyn ProgressSink + Send)>;

/// One fully-described git call, before it becomes a request.
struct Invocation {
    kind: OperationKind,
    target: String,
    args: Vec<String>,
    error_table: ErrorTable,
    stages: Vec<ProgressStage>,
}

/// Runs git operations against repositories on disk.
pub struct GitClient<R: ProcessRunner = GitProcess> {
    runner: R,
    features: Arc<dyn FeatureFlags>,
    environment: RemoteEnvironment,
    cancel: Option<CancellationToken>,
}

impl GitClient<GitProcess> {
    /// Creates a client running `git` from PATH.
    #[must_use]
    pub fn new(features: Arc<dyn FeatureFlags>) -> Self {
        Self::with_runner(GitProcess::default(), features)
    }
}

impl<R: ProcessRunner> GitClient<R> {
    /// Creates a client with a custom runner.
    #[must_use]
    pub fn with_runner(runner: R, features: Arc<dyn FeatureFlags>) -> Self {
        Self {
            runner,
            features,
            environment: RemoteEnvironment::new(),
            cancel: None,
        }
    }

    /// Sets how the environment overlay is built.
    #[must_use]
    pub fn with_environment(mut self, environment: RemoteEnvironment) -> Self {
        self.environment = environment;
        self
    }

    /// Cancelling `token` kills every invocation this client has in flight;
    /// they fail with [`ErrorKind::Canceled`](crate::git::ErrorKind::Canceled).
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// The underlying runner.
    pub const fn runner(&self) -> &R {
        &self.runner
    }

    /// Checks out `target`, moving HEAD to a branch or detaching it at a
    /// commit.
    ///
    /// # Errors
    ///
    /// Returns [`GitError::Classified`] if git fails and
    /// [`GitError::Environment`] if it cannot be started.
    pub async fn checkout(
        &self,
        repo: &Path,
        account: Option<&Account>,
        target: &CheckoutTarget,
        progress: Progress<'_>,
    ) -> Result<(), GitError> {
        let features = self.features.as_ref();
        let with_progress = progress.is_some();
        let args = match target {
            CheckoutTarget::Branch(branch) => checkout_branch_args(branch, features, with_progress),
            CheckoutTarget::Commit(commit) => checkout_commit_args(commit, features, with_progress),
        };
        let invocation = Invocation {
            kind: OperationKind::Checkout,
            target: target.label().to_string(),
            args,
            error_table: ErrorTable::checkout(),
            stages: checkout_stages(features.lfs_progress()),
        };
        self.execute(repo, account, invocation, progress).await?;
        Ok(())
    }

    /// Checks out `branch`, creating the local branch for a remote-tracking
    /// target without one.
    ///
    /// # Errors
    ///
    /// See [`GitClient::checkout`].
    pub async fn checkout_branch(
        &self,
        repo: &Path,
        account: Option<&Account>,
        branch: &BranchTarget,
        progress: Progress<'_>,
    ) -> Result<(), GitError> {
        let target = CheckoutTarget::Branch(branch.clone());
        self.checkout(repo, account, &target, progress).await
    }

    /// Checks out `commit`, detaching HEAD.
    ///
    /// # Errors
    ///
    /// See [`GitClient::checkout`].
    pub async fn checkout_commit(
        &self,
        repo: &Path,
        account: Option<&Account>,
        commit: &CommitTarget,
        progress: Progress<'_>,
    ) -> Result<(), GitError> {
        let target = CheckoutTarget::Commit(commit.clone());
        self.checkout(repo, account, &target, progress).await
    }

    /// Restores `paths`, relative to the repository root, from HEAD.
    /// An empty list does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`GitError::Classified`] if git fails and
    /// [`GitError::Environment`] if it cannot be started.
    pub async fn checkout_paths(&self, repo: &Path, paths: &[String]) -> Result<(), GitError> {
        if paths.is_empty() {
            return Ok(());
        }
        let invocation = Invocation {
            kind: OperationKind::Checkout,
            target: paths.join(", "),
            args: checkout_paths_args(paths),
            error_table: ErrorTable::new(),
            stages: Vec::new(),
        };
        self.execute(repo, None, invocation, None).await?;
        Ok(())
    }

    /// Replaces the conflicted `path` with the version from `side`.
    ///
    /// # Errors
    ///
    /// Returns [`GitError::Classified`] if git fails and
    /// [`GitError::Environment`] if it cannot be started.
    pub async fn checkout_conflicted_file(
        &self,
        repo: &Path,
        path: &str,
        side: ConflictSide,
    ) -> Result<(), GitError> {
        let invocation = Invocation {
            kind: OperationKind::Checkout,
            target: path.to_string(),
            args: checkout_conflicted_args(path, side),
            error_table: ErrorTable::new(),
            stages: Vec::new(),
        };
        self.execute(repo, None, invocation, None).await?;
        Ok(())
    }

    /// Fetches `remote`, pruning deleted branches.
    ///
    /// # Errors
    ///
    /// Returns [`GitError::Classified`] if git fails and
    /// [`GitError::Environment`] if it cannot be started.
    pub async fn fetch(
        &self,
        repo: &Path,
        account: Option<&Account>,
        remote: &str,
        progress: Progress<'_>,
    ) -> Result<(), GitError> {
        let invocation = Invocation {
            kind: OperationKind::Fetch,
            target: remote.to_string(),
            args: fetch_args(remote, progress.is_some()),
            error_table: ErrorTable::fetch(),
            stages: fetch_stages(),
        };
        self.execute(repo, account, invocation, progress).await?;
        Ok(())
    }

    #[instrument(
        skip_all,
        fields(kind = %invocation.kind, target = %invocation.target, repo = %repo.display())
    )]
    async fn execute(
        &self,
        repo: &Path,
        account: Option<&Account>,
        invocation: Invocation,
        progress: Progress<'_>,
    ) -> Result<ExecutionResult, GitError> {
        let Invocation {
            kind,
            target,
            args,
            error_table,
            stages,
        } = invocation;

        let mut request = OperationRequest::new(args, repo)
            .with_env(self.environment.overlay(account))
            .with_error_table(error_table);
        if let Some(token) = &self.cancel {
            request = request.with_cancellation(token.child_token());
        }
        debug!(authenticated = account.is_some(), "running git");

        let outcome = match progress {
            Some(sink) => {
                let scope = ProgressScope::new(kind, target.clone());
                let parser = ProgressParser::new(stages);
                run_with_progress(&self.runner, &request, parser, scope, sink).await
            },
            None => self.runner.run(&request, &mut DiscardOutput).await,
        };

        outcome.map_err(|err| match err {
            GitError::Execution(failure) => {
                let classified = classify(failure, request.error_table(), kind, &target);
                warn!(
                    kind = %classified.kind,
                    signature = classified.signature.as_ref().map(|s| s.name.as_str()),
                    "git failed"
                );
                GitError::Classified(classified)
            },
            other => other,
        })
    }
}
