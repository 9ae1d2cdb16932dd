//! Parsing of git's `--progress` output.
//!
//! Git writes progress to stderr and rewrites a line in place with `\r`, so
//! a single update can arrive split across any number of pipe reads. The
//! [`ProgressParser`] buffers raw bytes, cuts them on `\r` or `\n`, and
//! matches each complete line against an ordered list of [`ProgressStage`]s.
//! Each stage owns a slice of the overall `[0, 1]` range proportional to its
//! weight.
//!
//! The parser is advisory: anything it does not recognize comes back as
//! [`ParsedLine::Raw`] and nothing here can fail.

use std::sync::LazyLock;

use regex::Regex;

/// `Receiving objects:  45% (450/1000), 1.20 MiB | 2.00 MiB/s`, optionally
/// prefixed with `remote: `.
static PROGRESS_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:remote:\s*)?([^:]+):\s+(\d{1,3})%(?:\s+\((\d+)/(\d+)\))?")
        .expect("valid progress regex")
});

/// A named phase of a git operation and its share of the total work.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressStage {
    /// Title exactly as git prints it before the colon.
    pub title: &'static str,
    /// Other titles git versions have used for the same phase.
    pub aliases: &'static [&'static str],
    /// Relative weight; weights need not sum to one.
    pub weight: f64,
}

impl ProgressStage {
    const fn new(title: &'static str, weight: f64) -> Self {
        Self {
            title,
            aliases: &[],
            weight,
        }
    }

    const fn with_aliases(mut self, aliases: &'static [&'static str]) -> Self {
        self.aliases = aliases;
        self
    }

    fn matches(&self, title: &str) -> bool {
        self.title == title || self.aliases.contains(&title)
    }
}

const RECEIVING_OBJECTS: &str = "Receiving objects";
const RESOLVING_DELTAS: &str = "Resolving deltas";
const CHECKING_OUT_FILES: &str = "Checking out files";
const UPDATING_FILES: &str = "Updating files";
const COMPRESSING_OBJECTS: &str = "Compressing objects";
const FILTERING_CONTENT: &str = "Filtering content";
const DOWNLOADING_LFS_OBJECTS: &str = "Downloading LFS objects";

/// Stages of a checkout. Objects are only transferred for partial clones or
/// submodules, so the checkout itself carries most of the weight. With LFS
/// enabled the smudge filter gets a share of it, ordered before the checkout
/// stage because git reports `Updating files: 100%` last. Newer git prints
/// `Updating files` for the checkout phase.
#[must_use]
pub fn checkout_stages(lfs: bool) -> Vec<ProgressStage> {
    let mut stages = vec![
        ProgressStage::new(RECEIVING_OBJECTS, 0.3),
        ProgressStage::new(RESOLVING_DELTAS, 0.1),
    ];
    if lfs {
        stages.push(ProgressStage::new(DOWNLOADING_LFS_OBJECTS, 0.1));
        stages.push(ProgressStage::new(FILTERING_CONTENT, 0.1));
        stages.push(ProgressStage::new(CHECKING_OUT_FILES, 0.4).with_aliases(&[UPDATING_FILES]));
    } else {
        stages.push(ProgressStage::new(CHECKING_OUT_FILES, 0.6).with_aliases(&[UPDATING_FILES]));
    }
    stages
}

/// Stages of a fetch.
#[must_use]
pub fn fetch_stages() -> Vec<ProgressStage> {
    vec![
        ProgressStage::new(COMPRESSING_OBJECTS, 0.1),
        ProgressStage::new(RECEIVING_OBJECTS, 0.7),
        ProgressStage::new(RESOLVING_DELTAS, 0.2),
    ]
}

/// One complete line of git output.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedLine {
    /// A recognized progress line.
    Progress {
        /// Overall completion in `[0, 1]`.
        percent: f64,
        /// Stage title.
        stage: String,
        /// The line as git printed it.
        text: String,
    },
    /// Anything else.
    Raw {
        /// The line as git printed it.
        text: String,
    },
}

/// Line-reassembling progress parser. Owned by exactly one invocation.
#[derive(Debug)]
pub struct ProgressParser {
    stages: Vec<ProgressStage>,
    total_weight: f64,
    pending: Vec<u8>,
}

impl ProgressParser {
    /// Creates a parser recognizing `stages`, in priority order.
    #[must_use]
    pub fn new(stages: Vec<ProgressStage>) -> Self {
        let total_weight = stages.iter().map(|s| s.weight).sum();
        Self {
            stages,
            total_weight,
            pending: Vec::new(),
        }
    }

    /// Feeds a chunk and returns every line it completed.
    pub fn feed(&mut self, chunk: impl AsRef<[u8]>) -> Vec<ParsedLine> {
        let mut lines = Vec::new();
        for &byte in chunk.as_ref() {
            if byte == b'\r' || byte == b'\n' {
                self.flush_line(&mut lines);
            } else {
                self.pending.push(byte);
            }
        }
        lines
    }

    /// Flushes a trailing line that never got its terminator.
    pub fn finish(&mut self) -> Vec<ParsedLine> {
        let mut lines = Vec::new();
        self.flush_line(&mut lines);
        lines
    }

    fn flush_line(&mut self, lines: &mut Vec<ParsedLine>) {
        if self.pending.is_empty() {
            return;
        }
        let raw = std::mem::take(&mut self.pending);
        let text = String::from_utf8_lossy(&raw);
        let text = text.trim();
        if !text.is_empty() {
            lines.push(self.parse_line(text));
        }
    }

    /// Matches one complete line.
    #[must_use]
    pub fn parse_line(&self, line: &str) -> ParsedLine {
        self.parse_progress(line).unwrap_or_else(|| ParsedLine::Raw {
            text: line.to_string(),
        })
    }

    fn parse_progress(&self, line: &str) -> Option<ParsedLine> {
        let captures = PROGRESS_LINE.captures(line)?;
        let title = captures.get(1)?.as_str().trim();
        let stage_percent: u32 = captures.get(2)?.as_str().parse().ok()?;
        if stage_percent > 100 || self.total_weight <= 0.0 {
            return None;
        }

        let mut offset = 0.0;
        for stage in &self.stages {
            if stage.matches(title) {
                let within = stage.weight * f64::from(stage_percent) / 100.0;
                let percent = ((offset + within) / self.total_weight).clamp(0.0, 1.0);
                return Some(ParsedLine::Progress {
                    percent,
                    stage: stage.title.to_string(),
                    text: line.to_string(),
                });
            }
            offset += stage.weight;
        }
        None
    }
}
