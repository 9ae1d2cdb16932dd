//! Progress reporting on top of a [`ProcessRunner`].
//!
//! [`run_with_progress`] decorates a single invocation: it emits a zero
//! progress event before the process is spawned, turns every parsed progress
//! line on stderr into a [`ProgressEvent::Progress`], and finishes with
//! exactly one [`ProgressEvent::Complete`] before returning. Nothing is
//! emitted once the call has returned.

use tracing::trace;

use crate::git::error::GitError;
use crate::git::process::{
    ExecutionResult, OperationRequest, OutputConsumer, OutputStream, ProcessRunner,
};
use crate::git::progress::{ParsedLine, ProgressParser};
use crate::git::types::OperationKind;

/// Structured progress of one invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// The operation entered a new stage.
    Context {
        /// Operation kind.
        kind: OperationKind,
        /// What the operation acts on.
        target: String,
        /// Stage title as git prints it.
        stage: String,
    },
    /// Overall completion moved.
    Progress {
        /// Operation kind.
        kind: OperationKind,
        /// What the operation acts on.
        target: String,
        /// Completion in `[0, 1]`, never lower than the previous event.
        value: f64,
        /// The git output line behind this value, if any.
        description: Option<String>,
    },
    /// The invocation settled. Always the last event.
    Complete {
        /// Operation kind.
        kind: OperationKind,
        /// What the operation acts on.
        target: String,
        /// Whether git exited successfully.
        succeeded: bool,
    },
}

impl ProgressEvent {
    /// The progress value, for [`ProgressEvent::Progress`] events.
    #[must_use]
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Progress { value, .. } => Some(*value),
            _ => None,
        }
    }
}

/// Receives progress events synchronously, in order.
///
/// A panicking sink aborts the emission in progress; the subprocess is
/// killed when the invocation future is dropped.
pub trait ProgressSink {
    /// Called once per event.
    fn on_event(&mut self, event: &ProgressEvent);
}

impl<F: FnMut(&ProgressEvent)> ProgressSink for F {
    fn on_event(&mut self, event: &ProgressEvent) {
        self(event);
    }
}

/// What an invocation reports progress about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressScope {
    /// Operation kind.
    pub kind: OperationKind,
    /// Display form of the target.
    pub target: String,
    /// Description for the initial event.
    pub description: Option<String>,
}

impl ProgressScope {
    /// Creates a scope with no initial description.
    pub fn new(kind: OperationKind, target: impl Into<String>) -> Self {
        Self {
            kind,
            target: target.into(),
            description: None,
        }
    }
}

/// Per-invocation callback state.
struct ProgressTracker<'a> {
    scope: ProgressScope,
    parser: ProgressParser,
    sink: &'a mut (dyn ProgressSink + Send),
    last_value: f64,
    stage: Option<String>,
}

impl<'a> ProgressTracker<'a> {
    fn new(
        scope: ProgressScope,
        parser: ProgressParser,
        sink: &'a mut (dyn ProgressSink + Send),
    ) -> Self {
        Self {
            scope,
            parser,
            sink,
            last_value: 0.0,
            stage: None,
        }
    }

    fn start(&mut self) {
        let description = self.scope.description.clone();
        self.emit_progress(0.0, description);
    }

    fn handle(&mut self, line: ParsedLine) {
        match line {
            ParsedLine::Progress {
                percent,
                stage,
                text,
            } => {
                if self.stage.as_deref() != Some(stage.as_str()) {
                    self.sink.on_event(&ProgressEvent::Context {
                        kind: self.scope.kind,
                        target: self.scope.target.clone(),
                        stage: stage.clone(),
                    });
                    self.stage = Some(stage);
                }
                self.emit_progress(percent, Some(text));
            }
            ParsedLine::Raw { text } => trace!(line = %text, "git output"),
        }
    }

    fn emit_progress(&mut self, value: f64, description: Option<String>) {
        let value = value.max(self.last_value);
        self.last_value = value;
        self.sink.on_event(&ProgressEvent::Progress {
            kind: self.scope.kind,
            target: self.scope.target.clone(),
            value,
            description,
        });
    }

    fn complete(mut self, succeeded: bool) {
        for line in self.parser.finish() {
            self.handle(line);
        }
        self.sink.on_event(&ProgressEvent::Complete {
            kind: self.scope.kind,
            target: self.scope.target.clone(),
            succeeded,
        });
    }
}

impl OutputConsumer for ProgressTracker<'_> {
    fn on_output(&mut self, stream: OutputStream, chunk: &[u8]) {
        // git writes progress to stderr only
        if stream != OutputStream::Stderr {
            return;
        }
        for line in self.parser.feed(chunk) {
            self.handle(line);
        }
    }
}

/// Runs `request` while reporting progress to `sink`.
///
/// The parser is consumed: its line buffer belongs to this invocation.
///
/// # Errors
///
/// Returns whatever the runner returns; progress reporting never fails.
pub async fn run_with_progress<R>(
    runner: &R,
    request: &OperationRequest,
    parser: ProgressParser,
    scope: ProgressScope,
    sink: &mut (dyn ProgressSink + Send),
) -> Result<ExecutionResult, GitError>
where
    R: ProcessRunner + ?Sized,
{
    let mut tracker = ProgressTracker::new(scope, parser, sink);
    tracker.start();
    let result = runner.run(request, &mut tracker).await;
    tracker.complete(result.is_ok());
    result
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::git::progress::checkout_stages;
    use crate::git::testing::{Outcome, ScriptedRunner};

    fn scope() -> ProgressScope {
        ProgressScope::new(OperationKind::Checkout, "origin/feature-x")
    }

    fn request() -> OperationRequest {
        OperationRequest::new(["checkout", "--progress", "main", "--"], "/tmp")
    }

    fn collect(events: &mut Vec<ProgressEvent>) -> impl FnMut(&ProgressEvent) + Send + '_ {
        move |event: &ProgressEvent| events.push(event.clone())
    }

    #[tokio::test]
    async fn initial_event_is_emitted_before_the_process_starts() {
        let events: Arc<Mutex<Vec<ProgressEvent>>> = Arc::default();
        let seen_at_start: Arc<Mutex<Option<usize>>> = Arc::default();

        let observed_events = Arc::clone(&events);
        let observed_seen = Arc::clone(&seen_at_start);
        let runner = ScriptedRunner::new(Outcome::Success).before_run(move || {
            *observed_seen.lock().unwrap() = Some(observed_events.lock().unwrap().len());
        });

        let sink_events = Arc::clone(&events);
        let mut sink = move |event: &ProgressEvent| sink_events.lock().unwrap().push(event.clone());
        run_with_progress(
            &runner,
            &request(),
            ProgressParser::new(checkout_stages(false)),
            scope(),
            &mut sink,
        )
        .await
        .unwrap();

        assert_eq!(*seen_at_start.lock().unwrap(), Some(1));
        let events = events.lock().unwrap();
        assert_eq!(events[0].value(), Some(0.0));
    }

    #[tokio::test]
    async fn parsed_progress_becomes_ordered_events_ending_in_complete() {
        let runner = ScriptedRunner::new(Outcome::Success)
            .stderr("Receiving objects:  50% (1/2)\rReceiving obj")
            .stderr("ects: 100% (2/2), done.\n")
            .stdout("Switched to a new branch 'feature-x'\n")
            .stderr("Checking out files: 100% (3/3), done.\n");

        let mut events = Vec::new();
        run_with_progress(
            &runner,
            &request(),
            ProgressParser::new(checkout_stages(false)),
            scope(),
            &mut collect(&mut events),
        )
        .await
        .unwrap();

        let values: Vec<f64> = events.iter().filter_map(ProgressEvent::value).collect();
        assert_eq!(values.len(), 4);
        assert!((values[1] - 0.15).abs() < 1e-9);
        assert!((values[3] - 1.0).abs() < 1e-9);
        assert!(values.windows(2).all(|w| w[0] <= w[1]));

        let stages: Vec<&str> = events
            .iter()
            .filter_map(|e| match e {
                ProgressEvent::Context { stage, .. } => Some(stage.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(stages, vec!["Receiving objects", "Checking out files"]);

        assert_eq!(
            events.last(),
            Some(&ProgressEvent::Complete {
                kind: OperationKind::Checkout,
                target: "origin/feature-x".to_string(),
                succeeded: true,
            })
        );
        let completes = events
            .iter()
            .filter(|e| matches!(e, ProgressEvent::Complete { .. }))
            .count();
        assert_eq!(completes, 1);
    }

    #[tokio::test]
    async fn values_never_decrease_even_if_git_goes_backwards() {
        let runner = ScriptedRunner::new(Outcome::Success)
            .stderr("Checking out files:  80% (8/10)\r")
            .stderr("Receiving objects:  10% (1/10)\r")
            .stderr("Checking out files:  90% (9/10)\r");

        let mut events = Vec::new();
        run_with_progress(
            &runner,
            &request(),
            ProgressParser::new(checkout_stages(false)),
            scope(),
            &mut collect(&mut events),
        )
        .await
        .unwrap();

        let values: Vec<f64> = events.iter().filter_map(ProgressEvent::value).collect();
        assert!(values.windows(2).all(|w| w[0] <= w[1]), "{values:?}");
    }

    #[tokio::test]
    async fn raw_lines_produce_no_events() {
        let runner = ScriptedRunner::new(Outcome::Success)
            .stderr("Switched to branch 'main'\n")
            .stderr("Your branch is up to date with 'origin/main'.\n");

        let mut events = Vec::new();
        run_with_progress(
            &runner,
            &request(),
            ProgressParser::new(checkout_stages(false)),
            scope(),
            &mut collect(&mut events),
        )
        .await
        .unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].value(), Some(0.0));
        assert!(matches!(events[1], ProgressEvent::Complete { succeeded: true, .. }));
    }

    #[tokio::test]
    async fn failure_completes_once_and_returns_the_error() {
        let runner = ScriptedRunner::new(Outcome::Failure {
            exit_code: 128,
            stderr: "fatal: Authentication failed for 'https://x/'\n".to_string(),
        })
        .stderr("Receiving objects:  10% (1/10)\r");

        let mut events = Vec::new();
        let err = run_with_progress(
            &runner,
            &request(),
            ProgressParser::new(checkout_stages(false)),
            scope(),
            &mut collect(&mut events),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, GitError::Execution(_)));
        assert!(matches!(
            events.last(),
            Some(ProgressEvent::Complete { succeeded: false, .. })
        ));
    }

    #[tokio::test]
    async fn trailing_unterminated_progress_is_flushed_before_complete() {
        let runner = ScriptedRunner::new(Outcome::Success)
            .stderr("Checking out files: 100% (3/3)");

        let mut events = Vec::new();
        run_with_progress(
            &runner,
            &request(),
            ProgressParser::new(checkout_stages(false)),
            scope(),
            &mut collect(&mut events),
        )
        .await
        .unwrap();

        let n = events.len();
        assert!((events[n - 2].value().unwrap() - 1.0).abs() < 1e-9);
        assert!(matches!(events[n - 1], ProgressEvent::Complete { .. }));
    }

    #[tokio::test]
    async fn initial_description_comes_from_the_scope() {
        let runner = ScriptedRunner::new(Outcome::Success);
        let mut scope = scope();
        scope.description = Some("Preparing".to_string());

        let mut events = Vec::new();
        run_with_progress(
            &runner,
            &request(),
            ProgressParser::new(checkout_stages(false)),
            scope,
            &mut collect(&mut events),
        )
        .await
        .unwrap();

        match &events[0] {
            ProgressEvent::Progress { description, .. } => {
                assert_eq!(description.as_deref(), Some("Preparing"));
            }
            other => panic!("unexpected first event: {other:?}"),
        }
    }
}
