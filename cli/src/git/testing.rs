//! Scripted [`ProcessRunner`] for tests.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::git::error::{ExecutionError, GitError};
use crate::git::process::{
    ExecutionResult, OperationRequest, OutputConsumer, OutputStream, ProcessRunner,
};

/// How a scripted invocation ends.
pub enum Outcome {
    Success,
    Failure { exit_code: i32, stderr: String },
    SpawnFailure,
}

/// Replays canned output chunks and records every request it receives.
pub struct ScriptedRunner {
    chunks: Vec<(OutputStream, Vec<u8>)>,
    outcome: Outcome,
    before_run: Option<Box<dyn Fn() + Send + Sync>>,
    requests: Mutex<Vec<OperationRequest>>,
}

impl ScriptedRunner {
    pub fn new(outcome: Outcome) -> Self {
        Self {
            chunks: Vec::new(),
            outcome,
            before_run: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn stderr(mut self, chunk: &str) -> Self {
        self.chunks
            .push((OutputStream::Stderr, chunk.as_bytes().to_vec()));
        self
    }

    pub fn stdout(mut self, chunk: &str) -> Self {
        self.chunks
            .push((OutputStream::Stdout, chunk.as_bytes().to_vec()));
        self
    }

    pub fn before_run(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.before_run = Some(Box::new(hook));
        self
    }

    pub fn requests(&self) -> Vec<OperationRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_args(&self) -> Vec<String> {
        self.requests()
            .last()
            .map(|r| r.args().to_vec())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ProcessRunner for ScriptedRunner {
    async fn run(
        &self,
        request: &OperationRequest,
        consumer: &mut (dyn OutputConsumer + Send),
    ) -> Result<ExecutionResult, GitError> {
        if let Some(hook) = &self.before_run {
            hook();
        }
        self.requests.lock().unwrap().push(request.clone());

        if matches!(self.outcome, Outcome::SpawnFailure) {
            return Err(GitError::Environment {
                binary: "git".to_string(),
                reason: "No such file or directory (os error 2)".to_string(),
            });
        }

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        for (stream, chunk) in &self.chunks {
            consumer.on_output(*stream, chunk);
            match stream {
                OutputStream::Stdout => stdout.extend_from_slice(chunk),
                OutputStream::Stderr => stderr.extend_from_slice(chunk),
            }
        }

        let stdout = String::from_utf8_lossy(&stdout).into_owned();
        let mut stderr = String::from_utf8_lossy(&stderr).into_owned();

        match &self.outcome {
            Outcome::Success | Outcome::SpawnFailure => Ok(ExecutionResult {
                exit_code: 0,
                stdout,
                stderr,
            }),
            Outcome::Failure {
                exit_code,
                stderr: tail,
            } => {
                stderr.push_str(tail);
                Err(GitError::Execution(ExecutionError {
                    exit_code: Some(*exit_code),
                    stdout,
                    stderr,
                    canceled: false,
                }))
            }
        }
    }
}
