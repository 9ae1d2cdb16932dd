//! Git subprocess execution.
//!
//! This module provides the process layer every operation goes through:
//! - [`OperationRequest`] - Immutable description of one invocation
//! - [`ProcessRunner`] - Trait for running a request (enables scripted fakes)
//! - [`GitProcess`] - Implementation spawning the git binary with tokio
//!
//! stdout and stderr are read concurrently as they become readable. Every
//! chunk is handed to the request's [`OutputConsumer`] before it is buffered,
//! so a progress parser sees bytes in arrival order. There is no timeout at
//! this layer; long fetches are expected. Cancellation goes through the
//! request's [`CancellationToken`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::git::classify::ErrorTable;
use crate::git::error::{ExecutionError, GitError};

const READ_BUFFER_SIZE: usize = 8 * 1024;

/// Environment variables merged over the inherited process environment.
pub type EnvOverlay = BTreeMap<String, String>;

/// Everything needed to run git once.
#[derive(Debug, Clone)]
pub struct OperationRequest {
    args: Vec<String>,
    working_dir: PathBuf,
    env: EnvOverlay,
    error_table: ErrorTable,
    cancel: Option<CancellationToken>,
}

impl OperationRequest {
    /// Creates a request running `git <args>` inside `working_dir`.
    pub fn new<I, S>(args: I, working_dir: impl AsRef<Path>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            working_dir: working_dir.as_ref().to_path_buf(),
            env: EnvOverlay::new(),
            error_table: ErrorTable::new(),
            cancel: None,
        }
    }

    /// Sets the environment overlay.
    #[must_use]
    pub fn with_env(mut self, env: EnvOverlay) -> Self {
        self.env = env;
        self
    }

    /// Sets the table failures are classified against.
    #[must_use]
    pub fn with_error_table(mut self, table: ErrorTable) -> Self {
        self.error_table = table;
        self
    }

    /// Attaches a token that kills the process when cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Arguments passed after the binary.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Directory the process runs in.
    #[must_use]
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Environment overlay.
    #[must_use]
    pub const fn env(&self) -> &EnvOverlay {
        &self.env
    }

    /// Table used to classify failures.
    #[must_use]
    pub const fn error_table(&self) -> &ErrorTable {
        &self.error_table
    }

    /// Cancellation token, if any.
    #[must_use]
    pub const fn cancellation(&self) -> Option<&CancellationToken> {
        self.cancel.as_ref()
    }
}

/// Output of a successful invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Always zero; kept for callers that log it.
    pub exit_code: i32,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

/// Which pipe a chunk came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    /// Standard output.
    Stdout,
    /// Standard error.
    Stderr,
}

/// Receives output chunks while the process runs.
pub trait OutputConsumer {
    /// Called once per chunk, in the order chunks were read.
    fn on_output(&mut self, stream: OutputStream, chunk: &[u8]);
}

/// Consumer that ignores all output.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardOutput;

impl OutputConsumer for DiscardOutput {
    fn on_output(&mut self, _stream: OutputStream, _chunk: &[u8]) {}
}

/// Trait for running git requests (enables scripted runners in tests).
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Runs `request` to completion, streaming output into `consumer`.
    ///
    /// # Errors
    ///
    /// Returns [`GitError::Environment`] if the process could not be started
    /// and [`GitError::Execution`] if it exited unsuccessfully.
    async fn run(
        &self,
        request: &OperationRequest,
        consumer: &mut (dyn OutputConsumer + Send),
    ) -> Result<ExecutionResult, GitError>;
}

/// Runs requests against a real git binary.
#[derive(Debug, Clone)]
pub struct GitProcess {
    binary: PathBuf,
}

impl Default for GitProcess {
    fn default() -> Self {
        Self::new("git")
    }
}

impl GitProcess {
    /// Creates a runner for the given binary (name on PATH or full path).
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// The binary this runner spawns.
    #[must_use]
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    fn command(&self, request: &OperationRequest) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.args(request.args())
            .current_dir(request.working_dir())
            .envs(request.env())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl ProcessRunner for GitProcess {
    #[instrument(
        skip(self, request, consumer),
        fields(args = %request.args().join(" "), cwd = %request.working_dir().display())
    )]
    async fn run(
        &self,
        request: &OperationRequest,
        consumer: &mut (dyn OutputConsumer + Send),
    ) -> Result<ExecutionResult, GitError> {
        let mut child = self
            .command(request)
            .spawn()
            .map_err(|e| GitError::Environment {
                binary: self.binary.display().to_string(),
                reason: e.to_string(),
            })?;
        debug!(pid = ?child.id(), "spawned git");

        let (Some(mut stdout), Some(mut stderr)) = (child.stdout.take(), child.stderr.take())
        else {
            return Err(GitError::Environment {
                binary: self.binary.display().to_string(),
                reason: "failed to capture output pipes".to_string(),
            });
        };

        // A token nobody holds never fires.
        let cancel = request.cancellation().cloned().unwrap_or_default();
        let mut canceled = false;

        let mut out_buf = vec![0u8; READ_BUFFER_SIZE];
        let mut err_buf = vec![0u8; READ_BUFFER_SIZE];
        let mut captured_out = Vec::new();
        let mut captured_err = Vec::new();
        let mut out_open = true;
        let mut err_open = true;

        // Helpers git spawns (remote-https, ssh) inherit the pipes and may
        // outlive a killed git, so a cancel stops reading instead of draining.
        while (out_open || err_open) && !canceled {
            tokio::select! {
                read = stdout.read(&mut out_buf), if out_open => {
                    out_open = forward(read, &out_buf, OutputStream::Stdout, consumer, &mut captured_out);
                }
                read = stderr.read(&mut err_buf), if err_open => {
                    err_open = forward(read, &err_buf, OutputStream::Stderr, consumer, &mut captured_err);
                }
                () = cancel.cancelled(), if !canceled => {
                    debug!("cancellation requested, killing git");
                    canceled = true;
                    if let Err(e) = child.start_kill() {
                        warn!(error = %e, "failed to kill git");
                    }
                }
            }
        }

        // Orphaned helpers get EPIPE on their next write.
        drop((stdout, stderr));

        // Pipes can close before the process exits; keep honouring the token.
        let waited = tokio::select! {
            status = child.wait() => status,
            () = cancel.cancelled(), if !canceled => {
                canceled = true;
                if let Err(e) = child.start_kill() {
                    warn!(error = %e, "failed to kill git");
                }
                child.wait().await
            }
        };
        let status = waited.map_err(|e| GitError::Environment {
            binary: self.binary.display().to_string(),
            reason: format!("failed to wait for process: {e}"),
        })?;

        let stdout = String::from_utf8_lossy(&captured_out).into_owned();
        let stderr = String::from_utf8_lossy(&captured_err).into_owned();

        if status.success() && !canceled {
            debug!("git exited successfully");
            return Ok(ExecutionResult {
                exit_code: 0,
                stdout,
                stderr,
            });
        }

        debug!(code = ?status.code(), canceled, "git failed");
        Err(GitError::Execution(ExecutionError {
            exit_code: status.code(),
            stdout,
            stderr,
            canceled,
        }))
    }
}

/// Hands one read result to the consumer and the capture buffer. Returns
/// whether the pipe is still open.
fn forward(
    read: std::io::Result<usize>,
    buf: &[u8],
    stream: OutputStream,
    consumer: &mut (dyn OutputConsumer + Send),
    captured: &mut Vec<u8>,
) -> bool {
    match read {
        Ok(0) => false,
        Ok(n) => {
            consumer.on_output(stream, &buf[..n]);
            captured.extend_from_slice(&buf[..n]);
            true
        }
        Err(e) => {
            warn!(?stream, error = %e, "failed to read git output");
            false
        }
    }
}
