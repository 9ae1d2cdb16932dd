//! Authentication module for gitexec.
//!
//! This module keeps per-host credentials in the OS keyring and turns an
//! optional [`Account`] into the environment overlay of a git invocation.
//! Git reaches the stored token only through the askpass helper.

pub mod account;
pub mod askpass;
pub mod credentials;
pub mod environment;

pub use account::{endpoint_origin, Account, StoredCredential};
pub use credentials::{CredentialSource, CredentialStore};
pub use environment::RemoteEnvironment;
