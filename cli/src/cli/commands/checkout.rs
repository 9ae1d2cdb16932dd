//! Checkout and fetch command handlers.

use std::path::Path;

use tokio_util::sync::CancellationToken;

use crate::auth::CredentialStore;
use crate::cli::args::RemoteOpts;
use crate::cli::progress::TerminalProgress;
use crate::cli::session::Session;
use crate::config::load_config;
use crate::error::Result;
use crate::git::{ConflictSide, ProgressSink};

/// Remote consulted for credentials when the target names none.
const DEFAULT_REMOTE: &str = "origin";

fn progress_display(opts: &RemoteOpts) -> Option<TerminalProgress<std::io::Stderr>> {
    (!opts.no_progress).then(TerminalProgress::stderr)
}

fn as_sink<W>(display: &mut Option<TerminalProgress<W>>) -> Option<&mut (dyn ProgressSink + Send)>
where
    W: std::io::Write + Send,
{
    display
        .as_mut()
        .map(|display| display as &mut (dyn ProgressSink + Send))
}

/// Handle the `gitexec checkout branch` command.
pub async fn handle_checkout_branch(
    repo: &Path,
    name: &str,
    opts: &RemoteOpts,
    cancel: CancellationToken,
) -> Result<()> {
    let config = load_config()?;
    let session = Session::open(repo, &config, cancel)?;
    let target = session.repo.resolve_branch(name)?;
    let remote = session
        .repo
        .remote_of(&target)?
        .unwrap_or_else(|| DEFAULT_REMOTE.to_string());
    let account = session.account(opts.endpoint.as_ref(), &remote, &CredentialStore::new())?;

    let mut display = progress_display(opts);
    session
        .client
        .checkout_branch(session.repo.workdir(), account.as_ref(), &target, as_sink(&mut display))
        .await?;

    if target.local_name_if_remote.is_some() {
        println!(
            "Switched to a new branch '{}' tracking '{}'.",
            target.checked_out_name(),
            target.name
        );
    } else {
        println!("Switched to branch '{}'.", target.checked_out_name());
    }
    Ok(())
}

/// Handle the `gitexec checkout commit` command.
pub async fn handle_checkout_commit(
    repo: &Path,
    revision: &str,
    opts: &RemoteOpts,
    cancel: CancellationToken,
) -> Result<()> {
    let config = load_config()?;
    let session = Session::open(repo, &config, cancel)?;
    let target = session.repo.resolve_commit(revision)?;
    let account = session.account(opts.endpoint.as_ref(), DEFAULT_REMOTE, &CredentialStore::new())?;

    let mut display = progress_display(opts);
    session
        .client
        .checkout_commit(session.repo.workdir(), account.as_ref(), &target, as_sink(&mut display))
        .await?;

    println!("HEAD is now at {}.", target.short_sha);
    Ok(())
}

/// Handle the `gitexec checkout paths` command.
pub async fn handle_checkout_paths(
    repo: &Path,
    paths: &[String],
    cancel: CancellationToken,
) -> Result<()> {
    let config = load_config()?;
    let session = Session::open(repo, &config, cancel)?;
    session
        .client
        .checkout_paths(session.repo.workdir(), paths)
        .await?;

    println!("Restored {} path(s) from HEAD.", paths.len());
    Ok(())
}

/// Handle the `gitexec checkout conflicted` command.
pub async fn handle_checkout_conflicted(
    repo: &Path,
    path: &str,
    side: ConflictSide,
    cancel: CancellationToken,
) -> Result<()> {
    let config = load_config()?;
    let session = Session::open(repo, &config, cancel)?;
    session
        .client
        .checkout_conflicted_file(session.repo.workdir(), path, side)
        .await?;

    println!("Resolved '{path}' using {}.", side.flag().trim_start_matches('-'));
    Ok(())
}

/// Handle the `gitexec fetch` command.
pub async fn handle_fetch(
    repo: &Path,
    remote: &str,
    opts: &RemoteOpts,
    cancel: CancellationToken,
) -> Result<()> {
    let config = load_config()?;
    let session = Session::open(repo, &config, cancel)?;
    let account = session.account(opts.endpoint.as_ref(), remote, &CredentialStore::new())?;

    let mut display = progress_display(opts);
    session
        .client
        .fetch(session.repo.workdir(), account.as_ref(), remote, as_sink(&mut display))
        .await?;

    println!("Fetched '{remote}'.");
    Ok(())
}
