//! Git-related types for gitexec.
//!
//! This module defines the descriptors operations act on:
//! - [`OperationKind`] - Which kind of git operation is running
//! - [`BranchTarget`] / [`CommitTarget`] - What a checkout moves to
//! - [`CheckoutTarget`] - Either of the above
//! - [`ConflictSide`] - Which side resolves a conflicted path

use std::fmt;

/// The kind of git operation an invocation performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// `git checkout` of a branch, commit or paths.
    Checkout,
    /// `git fetch` from a remote.
    Fetch,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Checkout => write!(f, "checkout"),
            Self::Fetch => write!(f, "fetch"),
        }
    }
}

/// A branch to check out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchTarget {
    /// Full short name, e.g. `main` or `origin/feature-x`.
    pub name: String,

    /// Whether `name` refers to a remote-tracking branch.
    pub is_remote_tracking: bool,

    /// Name of the local branch to create when checking out a
    /// remote-tracking branch that has no local counterpart yet.
    pub local_name_if_remote: Option<String>,
}

impl BranchTarget {
    /// A local branch.
    #[must_use]
    pub fn local(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_remote_tracking: false,
            local_name_if_remote: None,
        }
    }

    /// A remote-tracking branch that still needs a local branch.
    #[must_use]
    pub fn remote(name: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_remote_tracking: true,
            local_name_if_remote: Some(local_name.into()),
        }
    }

    /// The local branch name HEAD will point at after checkout.
    #[must_use]
    pub fn checked_out_name(&self) -> &str {
        self.local_name_if_remote.as_deref().unwrap_or(&self.name)
    }
}

/// A commit to check out (detached HEAD).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitTarget {
    /// Full object id.
    pub sha: String,

    /// Abbreviated form for display.
    pub short_sha: String,
}

impl CommitTarget {
    /// Creates a commit target, abbreviating the SHA to seven characters.
    #[must_use]
    pub fn new(sha: impl Into<String>) -> Self {
        let sha = sha.into();
        let short_sha = sha.chars().take(7).collect();
        Self { sha, short_sha }
    }
}

/// Anything a checkout can move HEAD to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutTarget {
    /// A branch.
    Branch(BranchTarget),
    /// A commit.
    Commit(CommitTarget),
}

impl CheckoutTarget {
    /// Display form used in progress events and errors.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Branch(branch) => &branch.name,
            Self::Commit(commit) => &commit.short_sha,
        }
    }
}

/// Which side of a conflict to keep for a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictSide {
    /// The version on the current branch.
    Ours,
    /// The version being merged in.
    Theirs,
}

impl ConflictSide {
    /// The `git checkout` flag selecting this side.
    #[must_use]
    pub const fn flag(self) -> &'static str {
        match self {
            Self::Ours => "--ours",
            Self::Theirs => "--theirs",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_target_abbreviates_sha() {
        let commit = CommitTarget::new("0123456789abcdef0123456789abcdef01234567");
        assert_eq!(commit.short_sha, "0123456");

        let short = CommitTarget::new("abc123");
        assert_eq!(short.short_sha, "abc123");
    }

    #[test]
    fn checked_out_name_prefers_local_name() {
        assert_eq!(BranchTarget::local("main").checked_out_name(), "main");
        assert_eq!(
            BranchTarget::remote("origin/feature-x", "feature-x").checked_out_name(),
            "feature-x"
        );
    }

    #[test]
    fn checkout_target_labels() {
        let branch = CheckoutTarget::Branch(BranchTarget::local("main"));
        assert_eq!(branch.label(), "main");

        let commit = CheckoutTarget::Commit(CommitTarget::new("0123456789abcdef"));
        assert_eq!(commit.label(), "0123456");
    }

    #[test]
    fn conflict_side_flags() {
        assert_eq!(ConflictSide::Ours.flag(), "--ours");
        assert_eq!(ConflictSide::Theirs.flag(), "--theirs");
    }
}
