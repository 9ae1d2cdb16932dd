//! Command-line argument parsing.

use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use url::Url;

use crate::git::ConflictSide;

/// Run git checkouts and fetches with live progress and classified errors.
#[derive(Parser, Debug)]
#[command(name = "gitexec")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Repository to operate on.
    #[arg(short = 'C', long = "repo", global = true, default_value = ".")]
    pub repo: PathBuf,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check out a branch, commit or paths.
    Checkout {
        #[command(subcommand)]
        command: CheckoutCommands,
    },

    /// Fetch from a remote, pruning deleted branches.
    Fetch {
        /// Remote to fetch.
        #[arg(default_value = "origin")]
        remote: String,

        #[command(flatten)]
        remote_opts: RemoteOpts,
    },

    /// Manage stored credentials.
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },

    /// Answer a git credential prompt (invoked by git as `GIT_ASKPASS`).
    #[command(hide = true)]
    Askpass {
        /// The prompt git printed.
        prompt: String,
    },

    /// Generate shell completion scripts.
    ///
    /// Outputs completion script for the specified shell.
    /// Follow shell-specific instructions to install.
    Completions {
        /// Shell to generate completions for.
        #[arg(value_enum)]
        shell: ShellType,
    },
}

/// Options shared by commands that may reach a remote.
#[derive(Args, Debug, Clone, Default)]
pub struct RemoteOpts {
    /// Host to authenticate against (defaults to the remote's URL).
    #[arg(long)]
    pub endpoint: Option<Url>,

    /// Do not show progress.
    #[arg(long)]
    pub no_progress: bool,
}

/// Checkout subcommands.
#[derive(Subcommand, Debug)]
pub enum CheckoutCommands {
    /// Check out a branch.
    ///
    /// A remote-tracking branch such as `origin/topic` creates the local
    /// branch `topic` when it does not exist yet.
    Branch {
        /// Local or remote-tracking branch name.
        name: String,

        #[command(flatten)]
        remote_opts: RemoteOpts,
    },

    /// Check out a commit, detaching HEAD.
    Commit {
        /// Any revision that names a commit.
        revision: String,

        #[command(flatten)]
        remote_opts: RemoteOpts,
    },

    /// Restore paths from HEAD, discarding local changes to them.
    Paths {
        /// Paths relative to the repository root.
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Resolve a conflicted path by taking one side.
    Conflicted {
        /// The conflicted path.
        path: String,

        /// Side to keep.
        #[arg(long, value_enum)]
        side: SideArg,
    },
}

/// Authentication subcommands.
#[derive(Subcommand, Debug)]
pub enum AuthCommands {
    /// Store a token for a host. The token is read from stdin.
    Login {
        /// Host URL, e.g. `https://github.com`.
        endpoint: Url,

        /// Login name on the host.
        #[arg(short, long)]
        login: String,
    },

    /// Remove the stored token for a host.
    Logout {
        /// Host URL.
        endpoint: Url,
    },

    /// Show whether a token is stored for a host.
    Status {
        /// Host URL.
        endpoint: Url,
    },
}

/// Side argument for CLI.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SideArg {
    Ours,
    Theirs,
}

impl From<SideArg> for ConflictSide {
    fn from(arg: SideArg) -> Self {
        match arg {
            SideArg::Ours => Self::Ours,
            SideArg::Theirs => Self::Theirs,
        }
    }
}

/// Supported shell types for completions.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ShellType {
    Bash,
    Zsh,
    Fish,
}

/// Recognizes git running this binary as `GIT_ASKPASS`.
///
/// Git passes the prompt as the only argument, so the invocation is
/// `gitexec "<prompt>"` rather than `gitexec askpass "<prompt>"`. Only
/// honoured under a gitexec overlay (`under_overlay`), and never for an
/// argument clap would accept on its own.
pub fn askpass_prompt(args: &[String], under_overlay: bool) -> Option<&str> {
    if !under_overlay {
        return None;
    }
    let [_, prompt] = args else {
        return None;
    };
    if prompt.starts_with('-') || Cli::command().find_subcommand(prompt).is_some() {
        return None;
    }
    Some(prompt.as_str())
}
