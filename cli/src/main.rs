//! gitexec CLI - git checkouts and fetches with live progress
//!
//! Wraps the git binary, showing a single progress line on stderr and
//! reporting failures by kind, with a login hint for authentication errors.

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use gitexec::auth::environment::ASKPASS_ENDPOINT_VAR;
use gitexec::cli::commands;
use gitexec::cli::{askpass_prompt, AuthCommands, CheckoutCommands, Cli, Commands};
use gitexec::config::env;
use gitexec::error::{GitexecError, Result};
use gitexec::git::ErrorKind;

/// Conventional exit status for a run interrupted by Ctrl-C.
const EXIT_INTERRUPTED: i32 = 130;

#[tokio::main]
async fn main() {
    // Git runs GIT_ASKPASS as `<program> "<prompt>"`, which clap cannot parse
    let args: Vec<String> = std::env::args_os()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();
    if let Some(prompt) = askpass_prompt(&args, std::env::var_os(ASKPASS_ENDPOINT_VAR).is_some()) {
        std::process::exit(match commands::handle_askpass(prompt) {
            Ok(()) => 0,
            Err(e) => {
                eprintln!("Error: {e}");
                1
            },
        });
    }

    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging; stdout stays clean for askpass answers
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(env::LOG_LEVEL).unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    // Run the command
    if let Err(e) = run(cli, cancel).await {
        std::process::exit(report(&e));
    }
}

/// Prints `err` for a human and returns the exit status.
fn report(err: &GitexecError) -> i32 {
    eprintln!("Error: {err}");

    if let GitexecError::Git(git_err) = err {
        if let Some(classified) = git_err.classified() {
            if classified.kind == ErrorKind::Canceled {
                return EXIT_INTERRUPTED;
            }
            let stderr = classified.stderr.trim();
            if !stderr.is_empty() && stderr != classified.summary() {
                eprintln!();
                for line in stderr.lines() {
                    eprintln!("  {line}");
                }
            }
        }
        if git_err.is_authentication() {
            eprintln!();
            eprintln!("Run 'gitexec auth login <host-url> --login <name>' to store credentials, then retry.");
        }
    }

    1
}

async fn run(cli: Cli, cancel: CancellationToken) -> Result<()> {
    let repo = cli.repo;
    match cli.command {
        Commands::Checkout { command } => match command {
            CheckoutCommands::Branch { name, remote_opts } => {
                commands::handle_checkout_branch(&repo, &name, &remote_opts, cancel).await
            },
            CheckoutCommands::Commit {
                revision,
                remote_opts,
            } => commands::handle_checkout_commit(&repo, &revision, &remote_opts, cancel).await,
            CheckoutCommands::Paths { paths } => {
                commands::handle_checkout_paths(&repo, &paths, cancel).await
            },
            CheckoutCommands::Conflicted { path, side } => {
                commands::handle_checkout_conflicted(&repo, &path, side.into(), cancel).await
            },
        },
        Commands::Fetch {
            remote,
            remote_opts,
        } => commands::handle_fetch(&repo, &remote, &remote_opts, cancel).await,
        Commands::Auth { command } => match command {
            AuthCommands::Login { endpoint, login } => commands::handle_login(&endpoint, &login),
            AuthCommands::Logout { endpoint } => commands::handle_logout(&endpoint),
            AuthCommands::Status { endpoint } => commands::handle_status(&endpoint),
        },
        Commands::Askpass { prompt } => commands::handle_askpass(&prompt),
        Commands::Completions { shell } => commands::handle_completions(shell),
    }
}
