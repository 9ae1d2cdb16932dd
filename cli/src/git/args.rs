//! Argument construction for git operations.
//!
//! Everything here is pure: given operation parameters it returns the exact
//! argument list passed after the git binary. Feature flags are queried on
//! every call so a flag flipped at runtime takes effect on the next build.

use crate::git::types::{BranchTarget, CommitTarget, ConflictSide};

/// Runtime feature switches consulted while building arguments.
#[cfg_attr(test, mockall::automock)]
pub trait FeatureFlags: Send + Sync {
    /// Whether checkouts recurse into submodules.
    fn recurse_submodules(&self) -> bool;

    /// Whether Git LFS progress stages are reported.
    fn lfs_progress(&self) -> bool;
}

const RECURSE_SUBMODULES: &str = "--recurse-submodules";

/// Arguments placed ahead of the subcommand for anything that may reach a
/// remote. Credential helpers are disabled so only the askpass program in
/// the environment overlay can answer credential prompts.
#[must_use]
pub fn network_args() -> Vec<String> {
    vec!["-c".to_string(), "credential.helper=".to_string()]
}

/// `<network args> checkout [--progress]`.
#[must_use]
pub fn checkout_base_args(with_progress: bool) -> Vec<String> {
    let mut args = network_args();
    args.push("checkout".to_string());
    if with_progress {
        args.push("--progress".to_string());
    }
    args
}

/// Full argument list for checking out a branch.
///
/// A remote-tracking branch without a local counterpart creates one with
/// `-b`. The list always ends with `--` so a branch name can never be read
/// as an option or a path.
#[must_use]
pub fn checkout_branch_args(
    branch: &BranchTarget,
    flags: &dyn FeatureFlags,
    with_progress: bool,
) -> Vec<String> {
    let mut args = checkout_base_args(with_progress);
    args.push(branch.name.clone());
    if branch.is_remote_tracking {
        if let Some(local_name) = &branch.local_name_if_remote {
            args.push("-b".to_string());
            args.push(local_name.clone());
        }
    }
    if flags.recurse_submodules() {
        args.push(RECURSE_SUBMODULES.to_string());
    }
    args.push("--".to_string());
    args
}

/// Full argument list for checking out a commit; the SHA is always last.
#[must_use]
pub fn checkout_commit_args(
    commit: &CommitTarget,
    flags: &dyn FeatureFlags,
    with_progress: bool,
) -> Vec<String> {
    let mut args = checkout_base_args(with_progress);
    if flags.recurse_submodules() {
        args.push(RECURSE_SUBMODULES.to_string());
    }
    args.push(commit.sha.clone());
    args
}

/// Restores `paths` from HEAD. Purely local, so no network arguments.
#[must_use]
pub fn checkout_paths_args(paths: &[String]) -> Vec<String> {
    let mut args = vec!["checkout".to_string(), "HEAD".to_string(), "--".to_string()];
    args.extend(paths.iter().cloned());
    args
}

/// Resolves a conflicted path by taking one side.
#[must_use]
pub fn checkout_conflicted_args(path: &str, side: ConflictSide) -> Vec<String> {
    vec![
        "checkout".to_string(),
        side.flag().to_string(),
        "--".to_string(),
        path.to_string(),
    ]
}

/// `<network args> fetch [--progress] --prune <remote>`.
#[must_use]
pub fn fetch_args(remote: &str, with_progress: bool) -> Vec<String> {
    let mut args = network_args();
    args.push("fetch".to_string());
    if with_progress {
        args.push("--progress".to_string());
    }
    args.push("--prune".to_string());
    args.push(remote.to_string());
    args
}
