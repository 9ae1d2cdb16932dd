//! CLI module for gitexec.

pub mod args;
pub mod commands;
pub mod progress;
pub mod session;

pub use args::{askpass_prompt, AuthCommands, CheckoutCommands, Cli, Commands, RemoteOpts};
