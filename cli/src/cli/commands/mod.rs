//! Command implementations.

pub mod auth;
pub mod checkout;
pub mod completions;

pub use auth::{handle_askpass, handle_login, handle_logout, handle_status};
pub use checkout::{
    handle_checkout_branch, handle_checkout_commit, handle_checkout_conflicted,
    handle_checkout_paths, handle_fetch,
};
pub use completions::handle_completions;
