//! Git command execution for gitexec.
//!
//! Runs the external git binary for checkouts and fetches, streams and
//! parses its progress output, and classifies failures:
//! - Argument building and feature flags ([`args`])
//! - Subprocess execution ([`process`]) and progress reporting ([`adapter`])
//! - Failure classification ([`classify`])
//! - Target resolution ([`repository`])
//! - The operation surface ([`GitClient`])

pub mod adapter;
pub mod args;
pub mod classify;
pub mod client;
pub mod error;
pub mod process;
pub mod progress;
pub mod repository;
pub mod types;

#[cfg(test)]
mod testing;

pub use adapter::{run_with_progress, ProgressEvent, ProgressScope, ProgressSink};
pub use args::FeatureFlags;
pub use classify::{classify, ErrorSignature, ErrorTable};
pub use client::{GitClient, Progress};
pub use error::{ClassifiedError, ErrorKind, ExecutionError, GitError, MatchedSignature};
pub use process::{
    DiscardOutput, EnvOverlay, ExecutionResult, GitProcess, OperationRequest, OutputConsumer,
    OutputStream, ProcessRunner,
};
pub use progress::{ParsedLine, ProgressParser, ProgressStage};
pub use repository::LocalRepository;
pub use types::{BranchTarget, CheckoutTarget, CommitTarget, ConflictSide, OperationKind};

#[cfg(test)]
pub use args::MockFeatureFlags;
