//! Single-line progress display on stderr.

use std::io::Write;

use crate::git::{ProgressEvent, ProgressSink};

/// Rewrites one terminal line per progress event and ends it on completion.
pub struct TerminalProgress<W: Write + Send> {
    out: W,
    stage: Option<String>,
    width: usize,
}

impl TerminalProgress<std::io::Stderr> {
    /// Progress on standard error.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(std::io::stderr())
    }
}

impl<W: Write + Send> TerminalProgress<W> {
    /// Progress written to `out`.
    pub const fn new(out: W) -> Self {
        Self {
            out,
            stage: None,
            width: 0,
        }
    }

    /// Consumes the display, returning the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn redraw(&mut self, line: &str) {
        // pad over whatever the previous, possibly longer, line left behind
        let pad = self.width.saturating_sub(line.len());
        let _ = write!(self.out, "\r{line}{}", " ".repeat(pad));
        let _ = self.out.flush();
        self.width = line.len();
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn percent(value: f64) -> u8 {
    (value * 100.0).round().clamp(0.0, 100.0) as u8
}

impl<W: Write + Send> ProgressSink for TerminalProgress<W> {
    fn on_event(&mut self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Context { stage, .. } => self.stage = Some(stage.clone()),
            ProgressEvent::Progress {
                kind,
                target,
                value,
                ..
            } => {
                let line = match &self.stage {
                    Some(stage) => format!("{kind} {target}: {stage} {:>3}%", percent(*value)),
                    None => format!("{kind} {target}: {:>3}%", percent(*value)),
                };
                self.redraw(&line);
            },
            ProgressEvent::Complete { succeeded, .. } => {
                if *succeeded {
                    let _ = writeln!(self.out, " done");
                } else {
                    let _ = writeln!(self.out);
                }
            },
        }
    }
}
