//! gitexec - git command execution core
//!
//! Runs the external git binary for checkouts and fetches, turns its
//! `--progress` output into ordered, monotonic progress events, and
//! classifies failures (authentication, network, cancellation) against
//! per-operation signature tables. Start with [`git::GitClient`].

pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod git;
